//! Snippetbox kernel library.
//!
//! Exposes the router, stores and request pipeline so the binary and the
//! integration tests assemble the same application. The server entry point
//! is the `snippetbox` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod theme;

pub use config::Config;
pub use routes::app;
pub use session::SessionConfig;
pub use state::AppState;
