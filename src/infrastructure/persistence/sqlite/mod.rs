//! SQLite 持久化实现

mod database;
mod ledger_store;
mod task_store;
mod voice_repo;

pub use database::{create_pool, run_migrations, DatabaseConfig, DbPool};
pub use ledger_store::SqliteLedgerStore;
pub use task_store::SqliteTaskStore;
pub use voice_repo::SqliteVoiceRepository;
