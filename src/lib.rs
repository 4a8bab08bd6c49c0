//! Creator Scout library
//!
//! Finds YouTube creators for a free-form request: an LLM turns the request
//! into search keywords, and every YouTube Data API call draws its key from
//! a rotating pool that fails over when a key runs out of quota.

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod services;

// Re-export commonly used types
pub use config::Settings;
pub use error::ApiError;
pub use server::App;
