//! b2-core: Core library for the b2 API client
//!
//! This crate provides the HTTP-independent pieces of the B2 client:
//! - Account credentials and their environment fallback
//! - The error taxonomy shared by all operations
//! - The wire data model (buckets, files, upload targets)
//!
//! This crate is designed to be independent of any specific HTTP stack,
//! allowing the wire model and errors to be tested without a network.

pub mod credentials;
pub mod error;
pub mod types;

pub use credentials::Credentials;
pub use error::{Error, Result};
pub use types::{AuthSession, Bucket, FileInfo, FileVersionList, UploadTarget, UploadedPart};
