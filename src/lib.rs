// src/lib.rs

pub mod concurrency;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod models;
pub mod policy;
pub mod relations;
pub mod session;
pub mod state;
pub mod store;
pub mod views;

// Re-export specific items for convenience
pub use concurrency::{GradingState, SubmissionDraft};
pub use error::GatewayError;
pub use gateway::{Gateway, HttpGateway, MemoryGateway};
pub use session::Session;
pub use state::AppState;
