//! Mock electronic signature provider.
//!
//! Each envelope is one directory under `output_dir` holding the original
//! document (`original_<name>`) and an `envelope_metadata.json` status file,
//! so the whole workflow is auditable on disk. Envelopes move from `sent` to
//! `completed` or `voided`; a sent envelope auto-completes once enough time
//! has elapsed, evaluated only on explicit status queries.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::contract::{
    EnvelopeReceipt, EnvelopeRequest, EnvelopeState, EnvelopeStatus, SignatureService,
    SignedDocument, Signer,
};
use crate::error::{Result, ServiceError};
use crate::logger::{CallLogger, CallStatus, LogRecord};

const CAPABILITY: &str = "signature_service";
const PROVIDER: &str = "MockDocuSign";
const METADATA_FILE: &str = "envelope_metadata.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockDocuSignSettings {
    pub output_dir: PathBuf,
    pub default_signer_name: String,
    pub default_signer_email: String,
    /// Minutes after which a sent envelope reports itself completed. Zero
    /// completes on the next status query; negative disables auto-completion.
    pub auto_complete_after_minutes: i64,
}

impl Default for MockDocuSignSettings {
    fn default() -> Self {
        MockDocuSignSettings {
            output_dir: PathBuf::from("collected_data/signatures"),
            default_signer_name: "Test Signer".to_string(),
            default_signer_email: "signer@example.com".to_string(),
            auto_complete_after_minutes: 5,
        }
    }
}

/// Envelope state persisted to `envelope_metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EnvelopeData {
    envelope_id: String,
    status: EnvelopeState,
    subject: String,
    message: String,
    document: PathBuf,
    signers: Vec<Signer>,
    metadata: serde_json::Value,
    created_at: String,
    sent_at: Option<String>,
    completed_at: Option<String>,
    voided_at: Option<String>,
    void_reason: Option<String>,
}

impl EnvelopeData {
    fn to_status(&self) -> EnvelopeStatus {
        EnvelopeStatus {
            envelope_id: self.envelope_id.clone(),
            status: self.status,
            created_at: self.created_at.clone(),
            sent_at: self.sent_at.clone(),
            completed_at: self.completed_at.clone(),
            voided_at: self.voided_at.clone(),
            void_reason: self.void_reason.clone(),
            signers: self.signers.clone(),
        }
    }
}

fn state_name(state: EnvelopeState) -> &'static str {
    match state {
        EnvelopeState::Sent => "sent",
        EnvelopeState::Completed => "completed",
        EnvelopeState::Voided => "voided",
    }
}

pub struct MockDocuSignService {
    output_dir: PathBuf,
    default_signer: Signer,
    auto_complete_after_minutes: i64,
    logger: CallLogger,
}

impl MockDocuSignService {
    pub fn new(settings: MockDocuSignSettings, logger: CallLogger) -> Result<Self> {
        std::fs::create_dir_all(&settings.output_dir)?;
        Ok(MockDocuSignService {
            output_dir: settings.output_dir,
            default_signer: Signer {
                name: settings.default_signer_name,
                email: settings.default_signer_email,
            },
            auto_complete_after_minutes: settings.auto_complete_after_minutes,
            logger,
        })
    }

    fn envelope_dir(&self, envelope_id: &str) -> PathBuf {
        self.output_dir.join(envelope_id)
    }

    fn load(&self, envelope_id: &str) -> Result<EnvelopeData> {
        let metadata_file = self.envelope_dir(envelope_id).join(METADATA_FILE);
        if !metadata_file.exists() {
            return Err(ServiceError::NotFound(format!(
                "envelope not found: {envelope_id}"
            )));
        }
        let contents = std::fs::read_to_string(metadata_file)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, data: &EnvelopeData) -> Result<()> {
        let metadata_file = self.envelope_dir(&data.envelope_id).join(METADATA_FILE);
        std::fs::write(metadata_file, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }

    /// Flip a sent envelope to completed once the configured number of
    /// minutes has passed since creation.
    fn auto_complete(&self, data: &mut EnvelopeData) -> Result<()> {
        if data.status != EnvelopeState::Sent || self.auto_complete_after_minutes < 0 {
            return Ok(());
        }
        let created = DateTime::parse_from_rfc3339(&data.created_at)
            .map_err(|e| ServiceError::Config(format!("corrupt envelope timestamp: {e}")))?;
        let elapsed = Utc::now().signed_duration_since(created.with_timezone(&Utc));
        if elapsed.num_minutes() >= self.auto_complete_after_minutes {
            data.status = EnvelopeState::Completed;
            data.completed_at = Some(Utc::now().to_rfc3339());
            self.save(data)?;
            info!(envelope_id = %data.envelope_id, "Envelope auto-completed");
        }
        Ok(())
    }

    fn log(&self, action: &str, status: CallStatus, details: serde_json::Value) {
        self.logger
            .record(LogRecord::new(CAPABILITY, PROVIDER, action, status, details));
    }

    fn fail(&self, action: &str, envelope_id: &str, error: ServiceError) -> ServiceError {
        self.log(
            action,
            CallStatus::Failure,
            serde_json::json!({"envelope_id": envelope_id, "error": error.to_string()}),
        );
        error
    }
}

#[async_trait]
impl SignatureService for MockDocuSignService {
    async fn create_envelope(&self, request: EnvelopeRequest) -> Result<EnvelopeReceipt> {
        if !request.document_path.exists() {
            return Err(self.fail(
                "create_envelope",
                "",
                ServiceError::NotFound(format!(
                    "document not found: {}",
                    request.document_path.display()
                )),
            ));
        }

        let envelope_id = format!("mock-env-{}", &Uuid::new_v4().simple().to_string()[..16]);
        let signers = if request.signers.is_empty() {
            vec![self.default_signer.clone()]
        } else {
            request.signers
        };

        let envelope_dir = self.envelope_dir(&envelope_id);
        std::fs::create_dir_all(&envelope_dir)?;

        let document_name = request
            .document_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        std::fs::copy(
            &request.document_path,
            envelope_dir.join(format!("original_{document_name}")),
        )?;

        let now = Utc::now().to_rfc3339();
        let data = EnvelopeData {
            envelope_id: envelope_id.clone(),
            status: EnvelopeState::Sent,
            subject: request.subject,
            message: request.message,
            document: request.document_path.clone(),
            signers: signers.clone(),
            metadata: request.metadata.unwrap_or(serde_json::Value::Null),
            created_at: now.clone(),
            sent_at: Some(now.clone()),
            completed_at: None,
            voided_at: None,
            void_reason: None,
        };
        self.save(&data)?;

        self.log(
            "create_envelope",
            CallStatus::Success,
            serde_json::json!({
                "envelope_id": envelope_id,
                "document": request.document_path.display().to_string(),
                "signers_count": signers.len(),
            }),
        );
        Ok(EnvelopeReceipt {
            envelope_id,
            status: EnvelopeState::Sent,
            signers,
            created_at: now,
        })
    }

    async fn envelope_status(&self, envelope_id: &str) -> Result<EnvelopeStatus> {
        let mut data = match self.load(envelope_id) {
            Ok(data) => data,
            Err(e) => return Err(self.fail("envelope_status", envelope_id, e)),
        };
        self.auto_complete(&mut data)?;

        self.log(
            "envelope_status",
            CallStatus::Success,
            serde_json::json!({"envelope_id": envelope_id, "envelope_status": state_name(data.status)}),
        );
        Ok(data.to_status())
    }

    async fn download_signed_document(
        &self,
        envelope_id: &str,
        output_path: &Path,
    ) -> Result<SignedDocument> {
        let mut data = match self.load(envelope_id) {
            Ok(data) => data,
            Err(e) => return Err(self.fail("download_signed_document", envelope_id, e)),
        };
        self.auto_complete(&mut data)?;

        if data.status != EnvelopeState::Completed {
            return Err(self.fail(
                "download_signed_document",
                envelope_id,
                ServiceError::Remote(format!(
                    "envelope not completed yet (status: {})",
                    state_name(data.status)
                )),
            ));
        }

        let envelope_dir = self.envelope_dir(envelope_id);
        let original = std::fs::read_dir(&envelope_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("original_"))
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                self.fail(
                    "download_signed_document",
                    envelope_id,
                    ServiceError::Remote("original document not found".to_string()),
                )
            })?;

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&original, output_path)?;

        let signature_log_path = output_path.with_extension("signatures.json");
        let signature_info = serde_json::json!({
            "envelope_id": envelope_id,
            "document": output_path.file_name().and_then(|n| n.to_str()),
            "signed_at": data.completed_at,
            "signers": data.signers,
        });
        std::fs::write(
            &signature_log_path,
            serde_json::to_string_pretty(&signature_info)?,
        )?;

        self.log(
            "download_signed_document",
            CallStatus::Success,
            serde_json::json!({
                "envelope_id": envelope_id,
                "signed_document_path": output_path.display().to_string(),
            }),
        );
        Ok(SignedDocument {
            envelope_id: envelope_id.to_string(),
            document_path: output_path.to_path_buf(),
            signature_log_path,
            completed_at: data.completed_at,
        })
    }

    async fn void_envelope(&self, envelope_id: &str, reason: &str) -> Result<EnvelopeStatus> {
        let mut data = match self.load(envelope_id) {
            Ok(data) => data,
            Err(e) => return Err(self.fail("void_envelope", envelope_id, e)),
        };

        match data.status {
            EnvelopeState::Completed => {
                return Err(self.fail(
                    "void_envelope",
                    envelope_id,
                    ServiceError::Remote("cannot void completed envelope".to_string()),
                ));
            }
            EnvelopeState::Voided => {
                return Err(self.fail(
                    "void_envelope",
                    envelope_id,
                    ServiceError::Remote("envelope already voided".to_string()),
                ));
            }
            EnvelopeState::Sent => {}
        }

        data.status = EnvelopeState::Voided;
        data.voided_at = Some(Utc::now().to_rfc3339());
        data.void_reason = Some(reason.to_string());
        self.save(&data)?;

        self.log(
            "void_envelope",
            CallStatus::Success,
            serde_json::json!({"envelope_id": envelope_id, "reason": reason}),
        );
        Ok(data.to_status())
    }
}
