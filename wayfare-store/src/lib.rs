pub mod app_config;
pub mod database;
pub mod memory;
pub mod pg;
pub mod sessions;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use sessions::PendingSearchStore;
