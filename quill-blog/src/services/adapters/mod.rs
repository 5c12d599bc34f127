pub mod memory_adapter;
#[cfg(feature = "mongo")]
pub mod mongo_adapter;

pub use memory_adapter::MemoryStore;
#[cfg(feature = "mongo")]
pub use mongo_adapter::MongoStore;
