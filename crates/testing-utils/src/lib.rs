//! # Orchestrator Testing Utils
//!
//! Shared testing utilities for the orchestration workspace.
//!
//! ## Features
//!
//! - **Mock Repositories**: In-memory implementations of every persistence gateway trait,
//!   with failure injection and call counters
//! - **Mock Collaborators**: Cancellation transport, local task handler, external sinks and log store
//! - **Test Data Builders**: Utilities for creating test data
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! orchestrator-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! ```rust
//! use orchestrator_testing_utils::mocks::*;
//! use orchestrator_testing_utils::builders::TaskBuilder;
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
