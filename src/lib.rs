pub mod agents;
pub mod error;

pub mod handlers;
pub mod init;
pub mod models;
pub mod storage;
pub mod tools;
pub mod types;

pub use crate::agents::MasterAgent;
pub use crate::storage::{AiConfig, AppState};
