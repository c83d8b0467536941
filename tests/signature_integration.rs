use std::path::Path;

use switchboard::config::RawConfig;
use switchboard::contract::{EnvelopeRequest, EnvelopeState, SignatureService, Signer};
use switchboard::error::ServiceError;
use switchboard::factory::create_signature_service;
use switchboard::logger::CallLogger;

fn signature_service(
    output_dir: &Path,
    auto_complete_after_minutes: i64,
) -> Box<dyn SignatureService> {
    let yaml = format!(
        r#"
signature_service:
  provider: MockDocuSign
  mock_docusign:
    output_dir: {}
    auto_complete_after_minutes: {auto_complete_after_minutes}
"#,
        output_dir.display()
    );
    let config: RawConfig = serde_yaml::from_str(&yaml).expect("test config");
    let (logger, _sink) = CallLogger::in_memory();
    create_signature_service(&config, &logger).expect("service")
}

fn request(document: &Path) -> EnvelopeRequest {
    EnvelopeRequest {
        document_path: document.to_path_buf(),
        signers: vec![Signer {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }],
        subject: "Please sign".to_string(),
        message: "One document awaits your signature.".to_string(),
        metadata: None,
    }
}

#[tokio::test]
async fn envelope_lifecycle_sent_then_voided() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Negative threshold: no auto-completion.
    let service = signature_service(&dir.path().join("envelopes"), -1);

    let document = dir.path().join("contract.pdf");
    std::fs::write(&document, b"%PDF-1.4 fake contract").unwrap();

    let receipt = service.create_envelope(request(&document)).await.expect("create");
    assert!(receipt.envelope_id.starts_with("mock-env-"));
    assert_eq!(receipt.status, EnvelopeState::Sent);
    assert_eq!(receipt.signers.len(), 1);

    let status = service
        .envelope_status(&receipt.envelope_id)
        .await
        .expect("status");
    assert_eq!(status.status, EnvelopeState::Sent);
    assert!(status.sent_at.is_some());
    assert!(status.completed_at.is_none());

    let voided = service
        .void_envelope(&receipt.envelope_id, "changed our minds")
        .await
        .expect("void");
    assert_eq!(voided.status, EnvelopeState::Voided);
    assert_eq!(voided.void_reason.as_deref(), Some("changed our minds"));

    // Voiding twice is rejected.
    let err = service
        .void_envelope(&receipt.envelope_id, "again")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already voided"), "got {err}");
}

#[tokio::test]
async fn envelope_persists_document_and_metadata_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let envelopes = dir.path().join("envelopes");
    let service = signature_service(&envelopes, -1);

    let document = dir.path().join("contract.pdf");
    std::fs::write(&document, b"%PDF-1.4 fake contract").unwrap();
    let receipt = service.create_envelope(request(&document)).await.expect("create");

    let envelope_dir = envelopes.join(&receipt.envelope_id);
    assert!(envelope_dir.join("envelope_metadata.json").exists());
    assert!(envelope_dir.join("original_contract.pdf").exists());
}

#[tokio::test]
async fn download_requires_completion() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = signature_service(&dir.path().join("envelopes"), -1);

    let document = dir.path().join("contract.pdf");
    std::fs::write(&document, b"%PDF-1.4 fake contract").unwrap();
    let receipt = service.create_envelope(request(&document)).await.expect("create");

    let err = service
        .download_signed_document(&receipt.envelope_id, &dir.path().join("signed.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Remote(_)), "got {err:?}");
    assert!(err.to_string().contains("not completed"), "got {err}");
}

#[tokio::test]
async fn completed_envelope_downloads_with_signature_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Zero threshold: completes on the next status query.
    let service = signature_service(&dir.path().join("envelopes"), 0);

    let document = dir.path().join("contract.pdf");
    std::fs::write(&document, b"%PDF-1.4 fake contract").unwrap();
    let receipt = service.create_envelope(request(&document)).await.expect("create");

    let status = service
        .envelope_status(&receipt.envelope_id)
        .await
        .expect("status");
    assert_eq!(status.status, EnvelopeState::Completed);
    assert!(status.completed_at.is_some());

    let output = dir.path().join("out/signed.pdf");
    let signed = service
        .download_signed_document(&receipt.envelope_id, &output)
        .await
        .expect("download");
    assert_eq!(signed.document_path, output);
    assert_eq!(
        std::fs::read(&output).unwrap(),
        b"%PDF-1.4 fake contract",
        "signed copy mirrors the original document"
    );

    let log: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&signed.signature_log_path).unwrap())
            .expect("signature log json");
    assert_eq!(log["envelope_id"], receipt.envelope_id.as_str());
    assert_eq!(log["signers"][0]["email"], "ada@example.com");

    // A completed envelope can no longer be voided.
    let err = service
        .void_envelope(&receipt.envelope_id, "too late")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("completed"), "got {err}");
}

#[tokio::test]
async fn unknown_envelope_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = signature_service(&dir.path().join("envelopes"), -1);

    let err = service.envelope_status("mock-env-missing").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = signature_service(&dir.path().join("envelopes"), -1);

    let err = service
        .create_envelope(request(&dir.path().join("absent.pdf")))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}
