pub mod error;
pub mod models;
pub mod trait_client;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{PersistError, Result};
pub use models::{Conversation, ConversationSummary};
pub use trait_client::PersistenceClient;
pub use memory::MemoryPersistenceClient;
#[cfg(feature = "sqlite")]
pub use sqlite::SqlitePersistenceClient;
