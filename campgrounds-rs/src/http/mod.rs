//! HTTP layer: Axum router, session plumbing, pages, and handlers.
//!
//! Serves the campground listing UI (`/campgrounds`), the auth pages
//! (`/register`, `/login`, `/logout`), and a JSON liveness endpoint (`/health`).

mod error;
mod handlers;
mod pages;
mod session;
mod state;


pub use handlers::router;
pub use state::{AppState, SessionStore};
