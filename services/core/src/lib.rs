//! Vidmeta core
//!
//! Shared plumbing for the vidmeta tools: the [`ObjectStore`] seam with its
//! S3 and in-memory backends, the existence probe built on it, and the
//! configuration and logging setup used by both binaries.
//!
//! ```text
//!   vidmeta-collector ──┐                 ┌──▶ S3ObjectStore ──▶ S3 bucket
//!                       ├──▶ ObjectStore ─┤
//!   vidmeta-publisher ──┘                 └──▶ InMemoryObjectStore (tests)
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod s3;
pub mod store;

pub use self::config::{load_layered, ConfigValidationError, LogFormat, LoggingConfig, S3Config};
pub use error::StoreError;
pub use logging::init_tracing;
pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;
pub use store::{object_exists, ObjectStore};
