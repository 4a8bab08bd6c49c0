//! Schema module
//!
//! Wire types for the upstream APIs this service calls.

pub mod openai;
pub mod youtube;
