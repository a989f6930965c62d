//! Test support utilities for the IQA pipeline.
//!
//! Provides mocks, synthetic image builders, and a static HTTP server for
//! testing the scoring pipeline without real stores or remote hosts.
//!
//! # Example
//!
//! ```
//! use iqa_core::WorkItem;
//! use iqa_test_support::{MockFetcher, MockStore, SyntheticImageBuilder};
//!
//! let original = SyntheticImageBuilder::checkerboard(64, 64);
//! let fetcher = MockFetcher::new()
//!     .with_image("mem://1/orig", &original)
//!     .with_image("mem://1/enh", &original);
//! let store = MockStore::new(vec![WorkItem::pending("1", "mem://1/orig", "mem://1/enh")]);
//! ```

mod builders;
mod http_server;
mod mocks;

pub use builders::{png_bytes, SyntheticImageBuilder};
pub use http_server::StaticHttpServer;
pub use mocks::{MockFetcher, MockProgressSink, MockReportOutput, MockStore};
