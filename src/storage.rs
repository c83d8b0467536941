//! Filesystem-backed mock object storage.
//!
//! A bucket is a directory under `base_path`; an object is a file under its
//! bucket, with `/` in keys mapping to subdirectories. State is plain files
//! so demo output stays auditable. No artificial delays are introduced and
//! the error taxonomy mirrors a real object store (not-found, rejected
//! write), so switching providers never changes caller-visible handling.
//!
//! Concurrent writers to one bucket directory are not supported; listings
//! can interleave. Accepted limitation for a local mock.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::SharedSettings;
use crate::contract::{ObjectEntry, StorageService, UploadReceipt};
use crate::error::{Result, ServiceError};
use crate::logger::{CallLogger, CallStatus, LogRecord};

const CAPABILITY: &str = "storage_service";
const PROVIDER: &str = "MockS3";
const METADATA_SUFFIX: &str = ".metadata.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockS3Settings {
    pub base_path: PathBuf,
    pub default_bucket: Option<String>,
    pub create_buckets_automatically: bool,
}

impl Default for MockS3Settings {
    fn default() -> Self {
        MockS3Settings {
            base_path: PathBuf::from("collected_data/mock_s3"),
            default_bucket: Some("default-bucket".to_string()),
            create_buckets_automatically: true,
        }
    }
}

pub struct MockS3Service {
    base_path: PathBuf,
    max_file_size_mb: u64,
    logger: CallLogger,
}

impl MockS3Service {
    pub fn new(
        settings: MockS3Settings,
        shared: SharedSettings,
        logger: CallLogger,
    ) -> Result<Self> {
        std::fs::create_dir_all(&settings.base_path)?;
        if settings.create_buckets_automatically {
            if let Some(bucket) = &settings.default_bucket {
                std::fs::create_dir_all(settings.base_path.join(bucket))?;
            }
        }
        Ok(MockS3Service {
            base_path: settings.base_path,
            max_file_size_mb: shared.max_file_size_mb,
            logger,
        })
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.base_path.join(bucket).join(key)
    }

    fn object_url(bucket: &str, key: &str) -> String {
        format!("mock-s3://{bucket}/{key}")
    }

    fn log(&self, action: &str, status: CallStatus, details: serde_json::Value) {
        self.logger
            .record(LogRecord::new(CAPABILITY, PROVIDER, action, status, details));
    }

    fn fail(
        &self,
        action: &str,
        details: serde_json::Value,
        error: ServiceError,
    ) -> ServiceError {
        let mut details = details;
        if let Some(map) = details.as_object_mut() {
            map.insert("error".to_string(), error.to_string().into());
        }
        self.log(action, CallStatus::Failure, details);
        error
    }
}

/// Sidecar file carrying caller-supplied object metadata; excluded from
/// listings.
fn sidecar_path(object_path: &Path) -> PathBuf {
    let mut name = object_path.as_os_str().to_os_string();
    name.push(METADATA_SUFFIX);
    PathBuf::from(name)
}

fn rfc3339_mtime(path: &Path) -> Result<String> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified).to_rfc3339())
}

fn visit_bucket(
    dir: &Path,
    bucket_root: &Path,
    entries: &mut Vec<ObjectEntry>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            visit_bucket(&path, bucket_root, entries)?;
        } else if path.is_file() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.ends_with(METADATA_SUFFIX) {
                debug!(path = %path.display(), "Skipping metadata sidecar");
                continue;
            }
            let relative = path
                .strip_prefix(bucket_root)
                .map_err(|e| ServiceError::Config(format!("listing escaped bucket root: {e}")))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            entries.push(ObjectEntry {
                size_bytes: std::fs::metadata(&path)?.len(),
                last_modified: rfc3339_mtime(&path)?,
                key,
            });
        }
    }
    Ok(())
}

#[async_trait]
impl StorageService for MockS3Service {
    async fn upload_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<UploadReceipt> {
        let details = serde_json::json!({"bucket": bucket, "key": key, "file": local_path.display().to_string()});

        if !local_path.exists() {
            return Err(self.fail(
                "upload_file",
                details,
                ServiceError::NotFound(format!("source file not found: {}", local_path.display())),
            ));
        }

        let size_bytes = std::fs::metadata(local_path)?.len();
        let size_mb = size_bytes / (1024 * 1024);
        if size_mb > self.max_file_size_mb {
            return Err(self.fail(
                "upload_file",
                details,
                ServiceError::Remote(format!(
                    "file too large: {size_mb}MB (max: {}MB)",
                    self.max_file_size_mb
                )),
            ));
        }

        let dest = self.object_path(bucket, key);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(local_path, &dest)?;

        if let Some(meta) = &metadata {
            std::fs::write(sidecar_path(&dest), serde_json::to_string_pretty(meta)?)?;
        }

        let content = std::fs::read(&dest)?;
        let content_hash = {
            let mut hasher = Sha256::new();
            hasher.update(&content);
            format!("{:x}", hasher.finalize())
        };

        let receipt = UploadReceipt {
            url: Self::object_url(bucket, key),
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes,
            content_hash,
        };

        self.log(
            "upload_file",
            CallStatus::Success,
            serde_json::json!({
                "bucket": bucket,
                "key": key,
                "url": receipt.url,
                "size_bytes": size_bytes,
            }),
        );
        Ok(receipt)
    }

    async fn download_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<PathBuf> {
        let details = serde_json::json!({"bucket": bucket, "key": key, "local_path": local_path.display().to_string()});

        let source = self.object_path(bucket, key);
        if !source.exists() {
            return Err(self.fail(
                "download_file",
                details,
                ServiceError::NotFound(format!("{bucket}/{key}")),
            ));
        }

        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&source, local_path)?;

        self.log("download_file", CallStatus::Success, details);
        Ok(local_path.to_path_buf())
    }

    async fn delete_file(&self, bucket: &str, key: &str) -> Result<()> {
        let details = serde_json::json!({"bucket": bucket, "key": key});

        let path = self.object_path(bucket, key);
        if !path.exists() {
            return Err(self.fail(
                "delete_file",
                details,
                ServiceError::NotFound(format!("{bucket}/{key}")),
            ));
        }

        std::fs::remove_file(&path)?;
        let sidecar = sidecar_path(&path);
        if sidecar.exists() {
            std::fs::remove_file(&sidecar)?;
        }

        self.log("delete_file", CallStatus::Success, details);
        Ok(())
    }

    async fn list_files<'a>(&self, bucket: &str, prefix: Option<&'a str>) -> Result<Vec<ObjectEntry>> {
        let bucket_root = self.base_path.join(bucket);
        if !bucket_root.exists() {
            self.log(
                "list_files",
                CallStatus::Success,
                serde_json::json!({"bucket": bucket, "count": 0, "bucket_exists": false}),
            );
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        visit_bucket(&bucket_root, &bucket_root, &mut entries)?;
        if let Some(prefix) = prefix {
            entries.retain(|entry| entry.key.starts_with(prefix));
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        self.log(
            "list_files",
            CallStatus::Success,
            serde_json::json!({"bucket": bucket, "prefix": prefix, "count": entries.len()}),
        );
        Ok(entries)
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in_secs: u64,
    ) -> Result<String> {
        let details = serde_json::json!({"bucket": bucket, "key": key, "expires_in_secs": expires_in_secs});

        if !self.object_path(bucket, key).exists() {
            return Err(self.fail(
                "presigned_url",
                details,
                ServiceError::NotFound(format!("{bucket}/{key}")),
            ));
        }

        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in_secs as i64);
        let url = format!(
            "{}?expires_at={}",
            Self::object_url(bucket, key),
            expires_at.to_rfc3339()
        );

        self.log("presigned_url", CallStatus::Success, details);
        Ok(url)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        std::fs::create_dir_all(self.base_path.join(bucket))?;
        self.log(
            "create_bucket",
            CallStatus::Success,
            serde_json::json!({"bucket": bucket}),
        );
        Ok(())
    }
}
