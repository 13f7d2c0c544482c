//! Common test utilities for hypersync-stream integration tests

#[allow(dead_code)]
pub mod archive;
#[allow(dead_code)]
pub mod config;

#[allow(unused_imports)]
pub use archive::*;
#[allow(unused_imports)]
pub use config::*;
