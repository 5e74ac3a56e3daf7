// ==========================================
// Asset inventory - repository layer
// ==========================================
// SQLite access only. Repositories share one Arc<Mutex<Connection>>,
// which serializes every write.
// ==========================================

pub mod count_repo;
pub mod error;
pub mod import_batch_repo;
pub mod inventory_repo;
pub mod movement_repo;

/// Statuses stored as finalized (legacy value included)
pub(crate) const FINALIZED_SQL: &str = "('finalized', 'finalizado')";

pub use count_repo::CountRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use import_batch_repo::ImportBatchRepository;
pub use inventory_repo::InventoryCycleRepository;
pub use movement_repo::MovementRepository;
