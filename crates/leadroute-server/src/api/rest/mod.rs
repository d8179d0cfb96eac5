//! REST API implementation
//!
//! - types: Request/response type definitions
//! - extractors: JSON extractor with readable rejections
//! - handlers: API endpoint handlers
//! - router: Router creation and configuration

mod extractors;
mod handlers;
mod router;
pub mod types;

pub use extractors::JsonExtractor;
pub use router::create_router;
pub use types::{AppState, HealthResponse, RouteResponsePayload};
