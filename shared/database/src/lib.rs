pub mod repositories;

pub use repositories::*;

use std::sync::Arc;

use labqc_models::{InventoryItem, Sample};

pub type SampleRepository = InMemoryRepository<Sample>;
pub type InventoryRepository = InMemoryRepository<InventoryItem>;

/// The stores shared by the workflow and ledger services.
#[derive(Clone)]
pub struct Repositories {
    pub samples: Arc<SampleRepository>,
    pub inventory: Arc<InventoryRepository>,
    pub audit: Arc<AuditRepository>,
}

pub fn initialize_repositories() -> Repositories {
    tracing::debug!("Initializing in-memory repositories");

    Repositories {
        samples: Arc::new(InMemoryRepository::new("sample")),
        inventory: Arc::new(InMemoryRepository::new("inventory item")),
        audit: Arc::new(AuditRepository::new()),
    }
}

impl Default for Repositories {
    fn default() -> Self {
        initialize_repositories()
    }
}
