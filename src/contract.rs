//! # contract: abstract interfaces for every capability
//!
//! This module defines one trait per capability (email, object storage,
//! electronic signature, web search) and the concrete request/response types
//! they exchange. A capability trait is the whole contract between callers
//! and providers: callers never inspect which concrete variant the factory
//! handed them.
//!
//! ## Interface & Extensibility
//! - Implement a trait to add a provider (vendor API client, local mock).
//! - All methods are async, returning [`crate::error::ServiceError`] typed
//!   failures; mocks must mirror the real variant's error taxonomy for the
//!   conditions callers handle (not-found, remote rejection).
//! - Every method call emits exactly one call-log record on completion via
//!   the injected [`crate::logger::CallLogger`].
//!
//! ## Mocking & Testing
//! - Traits are annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::Result;

/// Result of a completed upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    /// Provider URL for the stored object (e.g. `mock-s3://bucket/key`).
    pub url: String,
    pub bucket: String,
    pub key: String,
    pub size_bytes: u64,
    /// SHA-256 of the stored content, hex-encoded.
    pub content_hash: String,
}

/// One object in a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectEntry {
    pub key: String,
    pub size_bytes: u64,
    /// RFC-3339 modification timestamp.
    pub last_modified: String,
}

/// Object storage behind a bucket/key namespace.
///
/// Listing order is backend-defined; no ordering guarantee is promised
/// across providers.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Store the file at `local_path` under `bucket`/`key`.
    ///
    /// Fails with `NotFound` if `local_path` does not exist and `Remote` if
    /// the backing store rejects the write.
    async fn upload_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<UploadReceipt>;

    /// Fetch `bucket`/`key` into `local_path`, returning the written path.
    /// Fails with `NotFound` if the object does not exist.
    async fn download_file(&self, bucket: &str, key: &str, local_path: &Path) -> Result<PathBuf>;

    /// Remove `bucket`/`key`. Fails with `NotFound` if the object is absent.
    async fn delete_file(&self, bucket: &str, key: &str) -> Result<()>;

    /// Eagerly materialized listing of `bucket`, optionally filtered by key
    /// prefix. An absent bucket lists as empty.
    async fn list_files<'a>(&self, bucket: &str, prefix: Option<&'a str>) -> Result<Vec<ObjectEntry>>;

    /// Time-limited access URL for `bucket`/`key`. Fails with `NotFound` if
    /// the object is absent.
    async fn presigned_url(&self, bucket: &str, key: &str, expires_in_secs: u64)
        -> Result<String>;

    /// Create `bucket` if it does not already exist.
    async fn create_bucket(&self, bucket: &str) -> Result<()>;
}

/// An outgoing email message.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    /// Plain text, or HTML when `html` is set.
    pub content: String,
    /// Sender override; the provider's default sender applies when `None`.
    pub from_email: Option<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    /// Local files to attach. Each path must exist.
    pub attachments: Vec<PathBuf>,
    pub html: bool,
}

impl OutgoingEmail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, content: impl Into<String>) -> Self {
        OutgoingEmail {
            to: to.into(),
            subject: subject.into(),
            content: content.into(),
            from_email: None,
            cc: Vec::new(),
            bcc: Vec::new(),
            attachments: Vec::new(),
            html: false,
        }
    }
}

/// Result of an accepted send.
#[derive(Debug, Clone, Serialize)]
pub struct EmailReceipt {
    pub message_id: String,
    pub to: String,
    pub accepted_at: String,
}

/// Outcome of a bulk send. Individual failures do not abort the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BulkEmailReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

/// Email transport.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Send one message.
    ///
    /// Sending is not idempotent: implementations must not re-attempt after
    /// a transient failure, because the vendor may already have accepted the
    /// message.
    async fn send_email(&self, message: OutgoingEmail) -> Result<EmailReceipt>;

    /// Send the same subject/content to every recipient, reporting
    /// per-recipient success counts.
    async fn send_bulk_email(
        &self,
        recipients: Vec<String>,
        subject: String,
        content: String,
        html: bool,
    ) -> Result<BulkEmailReport>;

    /// Syntactic validity of an address, without touching the network.
    fn validate_address(&self, address: &str) -> bool;
}

/// One requested signer on an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub name: String,
    pub email: String,
}

/// A signature request: one document plus its signers.
#[derive(Debug, Clone)]
pub struct EnvelopeRequest {
    pub document_path: PathBuf,
    pub signers: Vec<Signer>,
    pub subject: String,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
}

/// Envelope lifecycle. `Sent` envelopes may complete or be voided; both end
/// states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeState {
    Sent,
    Completed,
    Voided,
}

/// Envelope info returned on creation.
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeReceipt {
    pub envelope_id: String,
    pub status: EnvelopeState,
    pub signers: Vec<Signer>,
    pub created_at: String,
}

/// Current status of an envelope.
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeStatus {
    pub envelope_id: String,
    pub status: EnvelopeState,
    pub created_at: String,
    pub sent_at: Option<String>,
    pub completed_at: Option<String>,
    pub voided_at: Option<String>,
    pub void_reason: Option<String>,
    pub signers: Vec<Signer>,
}

/// A downloaded signed document and its signature audit file.
#[derive(Debug, Clone, Serialize)]
pub struct SignedDocument {
    pub envelope_id: String,
    pub document_path: PathBuf,
    pub signature_log_path: PathBuf,
    pub completed_at: Option<String>,
}

/// Electronic signature workflow over envelopes.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SignatureService: Send + Sync {
    /// Create and send an envelope for the document at
    /// `request.document_path`. Fails with `NotFound` if the document does
    /// not exist. Not idempotent: never retried blindly.
    async fn create_envelope(&self, request: EnvelopeRequest) -> Result<EnvelopeReceipt>;

    /// Current status of `envelope_id`. Fails with `NotFound` for unknown
    /// envelopes.
    async fn envelope_status(&self, envelope_id: &str) -> Result<EnvelopeStatus>;

    /// Download the signed document for a completed envelope into
    /// `output_path`. Fails with `Remote` while the envelope is not yet
    /// completed.
    async fn download_signed_document(
        &self,
        envelope_id: &str,
        output_path: &Path,
    ) -> Result<SignedDocument>;

    /// Void a sent envelope. Completed and already-voided envelopes cannot
    /// be voided.
    async fn void_envelope(&self, envelope_id: &str, reason: &str) -> Result<EnvelopeStatus>;
}

/// Knobs for a text search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub num_results: usize,
    /// Language code, e.g. "en".
    pub language: String,
    /// Region code for localized results.
    pub region: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            num_results: 10,
            language: "en".to_string(),
            region: None,
        }
    }
}

/// One text search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub display_url: String,
    pub snippet: String,
    /// 1-based rank within the result page.
    pub position: usize,
}

/// One image search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHit {
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
    pub source_url: String,
    pub width: u32,
    pub height: u32,
    pub position: usize,
}

/// Web search.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Run a text query. Reads are idempotent; implementations may retry
    /// transient remote failures up to their configured attempt bound.
    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>>;

    /// Run an image query.
    async fn search_images(&self, query: &str, num_results: usize) -> Result<Vec<ImageHit>>;
}
