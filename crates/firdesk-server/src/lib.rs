//! HTTP surface: FAQ chat, incident classification, keyword triage, health.

mod error;
mod routes;
mod state;

pub use error::{ApiError, INTERNAL_ERROR_MESSAGE};
pub use routes::{
    ChatRequest, ChatResponse, ClassifyRequest, HealthResponse, TriageRequest, router, serve,
};
pub use state::AppState;
