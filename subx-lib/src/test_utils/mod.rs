//! Test utilities for SubX.
//!
//! - [`MockSubxApi`]: in-memory [`SubxApi`](crate::SubxApi) with switchable failures
//! - [`EventLog`]: shared call log to assert ordering across components
//! - fixtures for subscribers, offerings and receipts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use subx_lib::test_utils::{ApiOperation, EventLog, MockSubxApi};
//!
//! let log = EventLog::new();
//! let api = MockSubxApi::with_log(log.clone());
//! api.fail(ApiOperation::SubmitReceipt);
//!
//! // ... drive the code under test ...
//! assert_eq!(log.count("api:submit_receipt"), 1);
//! ```

mod fixtures;
mod mock_api;

pub use fixtures::{entitlement, offering, package, product, subscriber, subscription};
pub use mock_api::{ApiOperation, EventLog, MockSubxApi};
