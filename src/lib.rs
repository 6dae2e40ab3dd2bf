pub mod activity;
pub mod cli;
pub mod config;
pub mod diff;
pub mod entity;
pub mod error;
pub mod permission;
pub mod scoring;
pub mod storage;

pub use config::Config;
pub use error::{IdeastormError, Result};
pub use permission::{authorize, Mode, Target};
pub use storage::SqliteStore;
