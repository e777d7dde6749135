pub mod config;
pub mod event;
pub mod resource_kind;
pub mod storage;

pub use event::StorageObjectCreated;
pub use resource_kind::ResourceKind;
