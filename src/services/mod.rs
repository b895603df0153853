// Service exports
pub mod appwrite;
pub mod cache;
pub mod directory;
pub mod memory;
pub mod outreach;
pub mod postgres;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections};
pub use cache::{CacheStats, CachedDirectory};
pub use directory::{DirectoryError, ProfileDirectory};
pub use memory::{InMemoryDirectory, InMemoryFundingStore};
pub use outreach::{DispatchError, HttpOutreachDispatcher, OutreachDispatch, OutreachDispatcher};
pub use postgres::PostgresClient;
pub use store::{FundingStore, StoreError};
