//! b2-client: Backblaze B2 API client
//!
//! This crate provides [`B2Client`], a reqwest-based client for the B2
//! object-storage HTTP API. It handles the authorization handshake, bucket
//! and file lifecycle operations, downloads, and uploads. Payloads above
//! the account's minimum part size take the chunked large-file path: the
//! payload is split into parts, each uploaded sequentially with its SHA-1
//! digest, and the file is finalized from the ordered part hashes.
//!
//! ```no_run
//! use b2_client::B2Client;
//! use b2_core::Credentials;
//!
//! # async fn run() -> b2_core::Result<()> {
//! let client = B2Client::connect(Credentials::from_env()?).await?;
//! let buckets = client.list_buckets().await?;
//! client
//!     .upload_file(&buckets[0].bucket_id, "hello.txt", b"hello".to_vec(), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod multipart;

pub use client::B2Client;
