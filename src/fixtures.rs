//! Fixture loading module.
//!
//! This module provides fixture discovery, dependency ordering and batched
//! persistence.
//!
//! # Examples
//!
//! ```rust,no_run
//! use seedling::fixtures::{FixtureLoader, LoadOptions, LoaderSettings, RepositoryRegistry};
//! ```

pub use seedling_fixtures::*;
