//! Error module

mod types;

pub use types::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;
