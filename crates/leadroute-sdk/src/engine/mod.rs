//! RoutingEngine - main API for routing leads
//!
//! - `types`: result types returned by the persisting entry points
//! - `routing`: the engine itself (L2, L3 and recon routing, assign-and-persist)

mod routing;
mod types;

pub(crate) use routing::describe;
pub use routing::RoutingEngine;
pub use types::{LeadAssignment, UniversityRouting};
