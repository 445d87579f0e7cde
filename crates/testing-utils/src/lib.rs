//! # Balancer Testing Utils
//!
//! Shared testing utilities for the scrape balancer workspace.
//!
//! - **Mock Registry**: in-memory `TargetRegistry` that records every write
//! - **Fake Worker Nodes**: real HTTP servers on `127.0.0.1:0` that imitate a remote scraper
//! - **Test Data Builders**: targets and jobs with sensible defaults
//! - **Helpers**: polling utilities for fire-and-forget side effects
//!
//! ```toml
//! [dev-dependencies]
//! balancer-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod fake_worker;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use fake_worker::*;
pub use helpers::*;
pub use mocks::*;
