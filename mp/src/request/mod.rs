//! Outbound request lifecycle
//!
//! Timed, abortable calls to the backend with classified failures.

mod error;
mod lifecycle;

pub use error::RequestError;
pub use lifecycle::{DEFAULT_TIMEOUT, RequestHandle, RequestLifecycleManager};
