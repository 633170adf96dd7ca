//! HTTP API
//!
//! axum control surface; a second command source next to chat.

pub mod handlers;
pub mod server;
pub mod sse;

pub use handlers::{ApiError, MusicData};
pub use server::{create_router, AppContext};
