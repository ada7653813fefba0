//! Presentation-side services for Tenki
//!
//! Owns the selection lifecycle: batches run on a tokio runtime and hand their
//! results back to a single presentation thread over an mpsc channel.

pub mod app_services;
pub mod coordinator;
pub mod error_mapping;
pub mod presenter;
pub mod services;

pub use app_services::AppServices;
pub use coordinator::SelectionCoordinator;
pub use presenter::{Presenter, TextPresenter};
pub use services::ForecastServiceMessage;
