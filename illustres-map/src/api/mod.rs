//! HTTP API handlers
//!
//! REST endpoints for user input and state inspection, plus the SSE stream
//! of map commands.

pub mod health;
pub mod search;
pub mod sse;
pub mod state;

pub use health::health_routes;
pub use search::search_routes;
pub use sse::map_event_stream;
pub use state::state_routes;
