// Public module exports
pub mod classifier;
pub mod master_agent;
pub mod session;

// Re-export main types for convenience
pub use classifier::classify_response;
pub use master_agent::MasterAgent;
pub use session::Session;
