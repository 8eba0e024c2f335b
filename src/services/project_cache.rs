use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::project::{Project, ProjectKey};
use crate::services::data_source::DataSource;
use crate::services::project_loader::{LoadError, ProjectLoader};

struct Entry {
    generation: u64,
    cell: Arc<OnceCell<Arc<Project>>>,
}

#[derive(Default)]
struct Entries {
    next_generation: u64,
    by_key: HashMap<ProjectKey, Entry>,
}

/// Loaded projects keyed by project id and token.
///
/// Concurrent requests for a key share a single load. The map lock only
/// guards map operations and is released before any request is made.
pub struct ProjectCache {
    loader: ProjectLoader,
    entries: Mutex<Entries>,
}

impl ProjectCache {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            loader: ProjectLoader::new(source),
            entries: Mutex::new(Entries::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn get(&self, key: &ProjectKey) -> Result<Arc<Project>, LoadError> {
        let (generation, cell) = {
            let mut entries = self.lock();
            let Entries {
                next_generation,
                by_key,
            } = &mut *entries;
            let entry = by_key.entry(key.clone()).or_insert_with(|| {
                *next_generation += 1;
                Entry {
                    generation: *next_generation,
                    cell: Arc::new(OnceCell::new()),
                }
            });
            if let Some(project) = entry.cell.get() {
                debug!(project_id = key.project_id, "project cache hit");
                return Ok(Arc::clone(project));
            }
            (entry.generation, Arc::clone(&entry.cell))
        };

        info!(project_id = key.project_id, "project cache miss, loading");
        let loaded = cell
            .get_or_try_init(|| async { self.loader.load(key).await.map(Arc::new) })
            .await
            .map(Arc::clone);

        let mut entries = self.lock();
        let authoritative = entries
            .by_key
            .get(key)
            .is_some_and(|entry| entry.generation == generation);
        match &loaded {
            Ok(_) if !authoritative => {
                info!(project_id = key.project_id, "project flushed while loading, not cached");
            }
            Err(_) if authoritative && cell.get().is_none() => {
                entries.by_key.remove(key);
            }
            _ => {}
        }
        loaded
    }

    /// Drops the cached project for `key`. Flushing an absent key is a no-op.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn flush(&self, key: &ProjectKey) {
        if self.lock().by_key.remove(key).is_some() {
            info!(project_id = key.project_id, "project flushed from cache");
        }
    }

    /// Flushes `old` when the configuration moved to a different key.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn reconfigure(&self, old: &ProjectKey, new: &ProjectKey) {
        if old != new {
            self.flush(old);
        }
    }

    /// Number of loaded projects.
    pub fn len(&self) -> usize {
        self.lock()
            .by_key
            .values()
            .filter(|entry| entry.cell.initialized())
            .count()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
