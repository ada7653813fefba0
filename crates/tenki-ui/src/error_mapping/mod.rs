//! Maps forecast errors to tenki_core::AppError for consistent user-facing messages.

pub mod forecast;

pub use forecast::{batch_error, fetch_error};
