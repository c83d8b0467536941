//! High-level demo orchestration: one illustrative scenario per capability.
//!
//! Each step obtains its service through the factory and exercises a short
//! call sequence against whichever provider the configuration selects. The
//! steps are independent; no data flows between them. Wiring failures
//! (missing configuration, unknown provider, missing credential) abort the
//! whole demo, while failures inside an illustrative call sequence are
//! recorded in the report and the remaining steps still run.
//!
//! # Major Types
//! - [`DemoReport`]: per-step outcomes for display and tests
//!
//! # Error Handling
//! Factory errors propagate immediately; step errors are captured as
//! [`StepOutcome::Failed`] with the error text.

use tracing::{error, info};

use crate::config::RawConfig;
use crate::contract::{
    EmailService, EnvelopeRequest, OutgoingEmail, SearchOptions, SearchService,
    SignatureService, StorageService,
};
use crate::error::Result;
use crate::factory;
use crate::logger::CallLogger;
use crate::pdf;

#[derive(Debug)]
pub enum StepOutcome {
    Passed,
    Failed,
}

#[derive(Debug)]
pub struct StepReport {
    pub capability: &'static str,
    pub outcome: StepOutcome,
    pub detail: String,
}

#[derive(Debug, Default)]
pub struct DemoReport {
    pub steps: Vec<StepReport>,
}

impl DemoReport {
    pub fn failed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Failed))
            .count()
    }

    fn push(&mut self, capability: &'static str, result: Result<String>) {
        match result {
            Ok(detail) => {
                info!(capability, %detail, "[DEMO] Step passed");
                self.steps.push(StepReport {
                    capability,
                    outcome: StepOutcome::Passed,
                    detail,
                });
            }
            Err(e) => {
                error!(capability, error = %e, "[DEMO] Step failed");
                self.steps.push(StepReport {
                    capability,
                    outcome: StepOutcome::Failed,
                    detail: e.to_string(),
                });
            }
        }
    }
}

/// Run every capability demo the configuration declares a section for.
pub async fn run_demo(config: &RawConfig) -> Result<DemoReport> {
    let logger = CallLogger::jsonl(&config.logging.log_file)?;
    let scratch = tempfile::tempdir()?;
    let mut report = DemoReport::default();

    if config.storage_service.is_some() {
        info!("[DEMO] Starting storage step");
        let service = factory::create_storage_service(config, &logger)?;
        report.push(
            "storage_service",
            storage_step(service.as_ref(), scratch.path()).await,
        );
    }

    if config.email_service.is_some() {
        info!("[DEMO] Starting email step");
        let service = factory::create_email_service(config, &logger)?;
        report.push("email_service", email_step(service.as_ref()).await);
    }

    if config.signature_service.is_some() {
        info!("[DEMO] Starting signature step");
        let service = factory::create_signature_service(config, &logger)?;
        report.push(
            "signature_service",
            signature_step(service.as_ref(), scratch.path()).await,
        );
    }

    if config.search_service.is_some() {
        info!("[DEMO] Starting search step");
        let service = factory::create_search_service(config, &logger)?;
        report.push("search_service", search_step(service.as_ref()).await);
    }

    Ok(report)
}

/// Upload, list, round-trip download, presigned URL.
async fn storage_step(service: &dyn StorageService, scratch: &std::path::Path) -> Result<String> {
    let sample = scratch.join("test.txt");
    std::fs::write(&sample, b"switchboard storage demo payload\n")?;

    let receipt = service
        .upload_file(&sample, "demo-bucket", "docs/test.txt", None)
        .await?;
    let listed = service.list_files("demo-bucket", Some("docs/")).await?;
    let downloaded = service
        .download_file("demo-bucket", "docs/test.txt", &scratch.join("roundtrip.txt"))
        .await?;
    let url = service
        .presigned_url("demo-bucket", "docs/test.txt", 3600)
        .await?;

    let original = std::fs::read(&sample)?;
    let roundtrip = std::fs::read(&downloaded)?;
    if original != roundtrip {
        return Err(crate::error::ServiceError::Remote(
            "round-trip produced different bytes".to_string(),
        ));
    }

    Ok(format!(
        "uploaded {} ({} bytes), {} object(s) listed, presigned: {url}",
        receipt.url, receipt.size_bytes, listed.len()
    ))
}

/// One message to a demo recipient.
async fn email_step(service: &dyn EmailService) -> Result<String> {
    let mut message = OutgoingEmail::new(
        "recipient@example.com",
        "Switchboard demo",
        "This message was produced by the capability demo.",
    );
    message.cc = vec!["observer@example.com".to_string()];

    let receipt = service.send_email(message).await?;
    Ok(format!(
        "message {} accepted for {}",
        receipt.message_id, receipt.to
    ))
}

/// Generate an agreement PDF, send it for signature, query and void.
async fn signature_step(
    service: &dyn SignatureService,
    scratch: &std::path::Path,
) -> Result<String> {
    let agreement = scratch.join("agreement.pdf");
    let clauses: Vec<String> = (1..=5)
        .map(|i| format!("Clause {i}: the parties agree to disagree."))
        .collect();
    pdf::write_text_pdf(&agreement, "Demo Agreement", &clauses)
        .map_err(|e| crate::error::ServiceError::Config(format!("pdf generation failed: {e}")))?;

    let receipt = service
        .create_envelope(EnvelopeRequest {
            document_path: agreement,
            signers: Vec::new(),
            subject: "Please sign: demo agreement".to_string(),
            message: "Signature requested by the capability demo.".to_string(),
            metadata: None,
        })
        .await?;
    let status = service.envelope_status(&receipt.envelope_id).await?;
    let voided = service
        .void_envelope(&receipt.envelope_id, "demo complete")
        .await?;

    Ok(format!(
        "envelope {} went {:?} -> {:?}",
        receipt.envelope_id, status.status, voided.status
    ))
}

/// One text query against the configured provider.
async fn search_step(service: &dyn SearchService) -> Result<String> {
    let options = SearchOptions {
        num_results: 5,
        ..SearchOptions::default()
    };
    let hits = service.search("rust programming language", options).await?;
    let first = hits
        .first()
        .map(|hit| hit.title.clone())
        .unwrap_or_else(|| "(no results)".to_string());
    Ok(format!("{} result(s), first: {first}", hits.len()))
}
