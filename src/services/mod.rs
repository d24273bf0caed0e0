//! External collaborators the session dispatcher calls into.
//!
//! Each collaborator is an async trait with one concrete implementation. The
//! session layer only sees the traits, so tests swap in in-memory fakes.

pub mod media;
pub mod payment;
pub mod spreadsheet;

pub use media::{FileMediaStore, MediaStore};
pub use payment::{payment_url_or_empty, PaymentService, YooKassaClient};
pub use spreadsheet::{SheetsClient, Spreadsheet};

/// Shared HTTP client for every outbound call, bounded by the network timeout.
pub fn http_client() -> crate::core::error::AppResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(crate::core::config::network::timeout())
        .build()?)
}
