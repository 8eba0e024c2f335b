pub mod project;
pub mod ticket;
pub mod ticket_set;
pub mod user_lookup;
