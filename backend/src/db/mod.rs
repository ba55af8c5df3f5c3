pub mod connection;
pub mod migrations;
pub mod directory;
pub mod users;
pub mod swipes;
pub mod matches;
pub mod messages;
pub mod calls;
pub mod confessions;
pub mod notifications;
pub mod postgres;
pub mod memory;

pub use connection::{get_db_pool, DatabaseConfig};
pub use directory::{Directory, StoreError, StoreResult};
pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;
