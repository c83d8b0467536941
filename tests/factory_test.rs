use std::env;

use serial_test::serial;

use switchboard::config::RawConfig;
use switchboard::error::ServiceError;
use switchboard::factory::{
    create_email_service, create_search_service, create_signature_service, create_storage_service,
};
use switchboard::logger::CallLogger;

fn config(yaml: &str) -> RawConfig {
    serde_yaml::from_str(yaml).expect("test config")
}

/// Every registered provider constructs a working handle from a plain mock
/// configuration.
#[tokio::test]
#[serial]
async fn registered_mock_providers_construct() {
    let dir = tempfile::tempdir().expect("tempdir");
    let yaml = format!(
        r#"
storage_service:
  provider: MockS3
  mock_s3:
    base_path: {base}/mock_s3
email_service:
  provider: MockOutbox
  mock_outbox:
    outbox_dir: {base}/outbox
signature_service:
  provider: MockDocuSign
  mock_docusign:
    output_dir: {base}/signatures
search_service:
  provider: MockGoogle
"#,
        base = dir.path().display()
    );
    let config = config(&yaml);
    let (logger, _sink) = CallLogger::in_memory();

    let storage = create_storage_service(&config, &logger).expect("storage");
    let email = create_email_service(&config, &logger).expect("email");
    let signature = create_signature_service(&config, &logger).expect("signature");
    let search = create_search_service(&config, &logger).expect("search");

    // Each handle satisfies its capability interface on a trivial input.
    let sample = dir.path().join("sample.txt");
    std::fs::write(&sample, b"factory smoke").unwrap();
    storage
        .upload_file(&sample, "demo-bucket", "sample.txt", None)
        .await
        .expect("upload works");
    assert!(email.validate_address("someone@example.com"));
    let receipt = signature
        .create_envelope(switchboard::contract::EnvelopeRequest {
            document_path: sample.clone(),
            signers: Vec::new(),
            subject: "s".into(),
            message: "m".into(),
            metadata: None,
        })
        .await
        .expect("envelope works");
    assert!(receipt.envelope_id.starts_with("mock-env-"));
    let hits = search
        .search("factory", switchboard::contract::SearchOptions::default())
        .await
        .expect("search works");
    assert!(!hits.is_empty());
}

/// Real REST providers construct once their credentials resolve.
#[tokio::test]
#[serial]
async fn real_providers_construct_with_credentials() {
    env::set_var("FACTORY_TEST_SENDGRID_KEY", "sg-test-key");
    env::set_var("FACTORY_TEST_SEARCH_KEY", "search-test-key");
    env::set_var("FACTORY_TEST_ENGINE_ID", "engine-123");

    let yaml = r#"
email_service:
  provider: SendGrid
  sendgrid:
    api_key: ${ENV:FACTORY_TEST_SENDGRID_KEY}
    default_sender: robot@example.com
search_service:
  provider: GoogleCustomSearch
  google_custom_search:
    api_key: ${ENV:FACTORY_TEST_SEARCH_KEY}
    engine_id: ${ENV:FACTORY_TEST_ENGINE_ID}
"#;
    let config = config(yaml);
    let (logger, _sink) = CallLogger::in_memory();

    create_email_service(&config, &logger).expect("sendgrid constructs");
    create_search_service(&config, &logger).expect("google search constructs");

    env::remove_var("FACTORY_TEST_SENDGRID_KEY");
    env::remove_var("FACTORY_TEST_SEARCH_KEY");
    env::remove_var("FACTORY_TEST_ENGINE_ID");
}

/// Unregistered provider names are a hard failure with no partial
/// construction.
#[tokio::test]
#[serial]
async fn unknown_provider_is_a_hard_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("mock_s3");
    let yaml = format!(
        r#"
storage_service:
  provider: AWSS3
  mock_s3:
    base_path: {}
"#,
        base.display()
    );
    let config = config(&yaml);
    let (logger, sink) = CallLogger::in_memory();

    let err = create_storage_service(&config, &logger).err().unwrap();
    match err {
        ServiceError::UnknownProvider {
            capability,
            provider,
        } => {
            assert_eq!(capability, "storage_service");
            assert_eq!(provider, "AWSS3");
        }
        other => panic!("expected UnknownProvider, got {other:?}"),
    }

    // No partial construction: no directories created, nothing logged.
    assert!(!base.exists());
    assert!(sink.lines().is_empty());
}

/// A capability section that is absent entirely is a configuration error,
/// not a silent default.
#[tokio::test]
#[serial]
async fn missing_capability_section_is_an_error() {
    let config = config("search_service:\n  provider: MockGoogle\n");
    let (logger, _sink) = CallLogger::in_memory();

    let err = create_email_service(&config, &logger).err().unwrap();
    assert!(matches!(err, ServiceError::Config(_)), "got {err:?}");
    assert!(err.to_string().contains("email_service"));
}

/// A config referencing `${ENV:API_KEY}` with `API_KEY` unset fails
/// construction with a `MissingCredential` naming `API_KEY`.
#[tokio::test]
#[serial]
async fn unset_credential_fails_construction() {
    env::remove_var("API_KEY");
    let yaml = r#"
search_service:
  provider: GoogleCustomSearch
  google_custom_search:
    api_key: ${ENV:API_KEY}
    engine_id: literal-engine
"#;
    let config = config(yaml);
    let (logger, _sink) = CallLogger::in_memory();

    let err = create_search_service(&config, &logger).err().unwrap();
    match err {
        ServiceError::MissingCredential { path, var } => {
            assert_eq!(var, "API_KEY");
            assert_eq!(path, "search_service.google_custom_search.api_key");
        }
        other => panic!("expected MissingCredential, got {other:?}"),
    }
}

/// An empty environment value is treated the same as an unset one.
#[tokio::test]
#[serial]
async fn empty_credential_counts_as_missing() {
    env::set_var("FACTORY_TEST_EMPTY_KEY", "");
    let yaml = r#"
email_service:
  provider: SendGrid
  sendgrid:
    api_key: ${ENV:FACTORY_TEST_EMPTY_KEY}
    default_sender: robot@example.com
"#;
    let config = config(yaml);
    let (logger, _sink) = CallLogger::in_memory();

    let err = create_email_service(&config, &logger).err().unwrap();
    assert!(
        matches!(err, ServiceError::MissingCredential { ref var, .. } if var == "FACTORY_TEST_EMPTY_KEY"),
        "got {err:?}"
    );
    env::remove_var("FACTORY_TEST_EMPTY_KEY");
}

/// The unselected provider's placeholders are irrelevant: a mock provider
/// constructs even while the real provider's credentials are unset.
#[tokio::test]
#[serial]
async fn unselected_provider_credentials_are_not_required() {
    env::remove_var("FACTORY_TEST_NEVER_SET");
    let yaml = r#"
search_service:
  provider: MockGoogle
  google_custom_search:
    api_key: ${ENV:FACTORY_TEST_NEVER_SET}
    engine_id: ${ENV:FACTORY_TEST_NEVER_SET}
"#;
    let config = config(yaml);
    let (logger, _sink) = CallLogger::in_memory();

    create_search_service(&config, &logger).expect("mock constructs regardless");
}
