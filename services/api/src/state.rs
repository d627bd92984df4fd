//! Application state shared across handlers

use std::sync::Arc;

use auth::SessionGuard;
use common::clock::Clock;
use media::ImageIngestor;
use records::RecordStore;
use tokio::sync::Mutex;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Mutations are serialized through this lock
    pub records: Arc<Mutex<RecordStore>>,
    pub sessions: SessionGuard,
    pub ingestor: ImageIngestor,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        records: RecordStore,
        sessions: SessionGuard,
        ingestor: ImageIngestor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            sessions,
            ingestor,
            clock,
        }
    }
}
