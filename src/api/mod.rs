//! API client module for REST communication with the clinical records backend

mod client;
mod error;
mod traits;
mod types;

pub use client::{ApiClient, ApiConfig};
pub use error::{ApiError, Result};
pub use traits::ClinicApi;
pub use types::*;

#[cfg(test)]
pub use traits::MockClinicApi;
