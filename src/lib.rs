//! # Lull
//!
//! Request collection and execution engine for a terminal REST client.
//!
//! ## Features
//! - Hierarchical collection of request groups, persisted as one JSON file
//! - HTTP methods: GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS
//! - Request bodies with on-demand JSON formatting
//! - Multi-value headers
//! - Auth support (Basic, OAuth2 client credentials)
//! - Single-flight execution with cancellation
//!
//! ## Architecture
//! Actor-based with channels:
//! - Presentation layer - sends `UiEvent`s, receives `RenderState`
//! - App layer - owns the state store, processes events
//! - Network layer (Tokio) - executes one exchange at a time

pub mod auth;
pub mod app;
pub mod collection;
pub mod config;
pub mod constants;
pub mod error;
pub mod messages;
pub mod models;
pub mod network;
pub mod parsers;
pub mod storage;

// Re-export commonly used types
pub use auth::Authentication;
pub use app::{AppActor, AppState};
pub use collection::{Collection, Item, RequestItem};
pub use config::Config;
pub use messages::{Completion, ExchangeRequest, RenderState, UiEvent};
pub use models::{HttpMethod, HttpResult, RequestBody};
pub use network::ExecutionManager;
pub use storage::StateStore;
