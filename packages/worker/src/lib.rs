pub mod config;
pub mod error;
pub mod processor;

pub use config::{WorkerAppConfig, WorkerConfig};
pub use error::{Result, WorkerError};
pub use processor::{ContentProcessor, LoggingProcessor, handle_delivery};
