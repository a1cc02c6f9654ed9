pub mod memory;
pub mod sqlite;
pub mod trait_def;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use trait_def::{
    matches_query, page_bounds, same_long_url, search_needle, Storage, StorageError,
    StorageResult,
};
