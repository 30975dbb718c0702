//! Network layer - HTTP transport and single-flight request execution

pub mod client;
pub mod manager;

pub use manager::ExecutionManager;
