//! API endpoint handlers module
//!
//! Contains all HTTP endpoint handler implementations.

pub mod channels;
pub mod health;
pub mod keywords;
pub mod recommendations;
