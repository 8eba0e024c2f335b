use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Person {
	pub id: u64,
	pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Membership {
	pub person: Person,
}

/// Maps upstream user ids to display names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserLookup {
	users: HashMap<u64, String>,
}

impl UserLookup {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_memberships(memberships: &[Membership]) -> Self {
		let mut lookup = Self::new();
		for membership in memberships {
			lookup.add_user(membership.person.id, &membership.person.name);
		}
		lookup
	}

	pub fn add_user(&mut self, id: u64, name: &str) {
		self.users.insert(id, name.to_string());
	}

	pub fn get_user(&self, id: u64) -> Option<&str> {
		self.users.get(&id).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.users.len()
	}

	pub fn is_empty(&self) -> bool {
		self.users.is_empty()
	}
}
