//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fakes;

#[allow(unused_imports)]
pub use fakes::{FakeMediaStore, FakeSheet, FakeTransport, Harness};
