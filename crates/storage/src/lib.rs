pub mod backend;
pub mod cache;
pub mod patch;
pub mod rest;
pub mod session;

#[cfg(test)]
pub(crate) mod test_data;

use std::sync::Arc;

use backend::ScheduleBackend;
use cache::QueryCache;

/// Everything the calendar reads from and writes to.
#[derive(Clone)]
pub struct Storage {
    pub backend: Arc<dyn ScheduleBackend>,
    pub cache: Arc<QueryCache>,
}

impl Storage {
    pub fn new(backend: Arc<dyn ScheduleBackend>) -> Self {
        Storage {
            backend,
            cache: QueryCache::new(),
        }
    }
}
