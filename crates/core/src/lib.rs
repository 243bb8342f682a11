pub mod config;
pub mod error;

pub use error::{WatchError, WatchResult};
