use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{Result, ServiceError};

/// Parsed configuration document. Placeholders inside provider sub-mappings
/// stay unresolved until a factory selects a provider; only the selected
/// provider's settings are resolved against the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub email_service: Option<CapabilitySection>,
    pub storage_service: Option<CapabilitySection>,
    pub signature_service: Option<CapabilitySection>,
    pub search_service: Option<CapabilitySection>,
}

impl RawConfig {
    pub fn trace_loaded(&self) {
        tracing::info!(
            log_file = %self.logging.log_file.display(),
            email = self.email_service.as_ref().map(|s| s.provider.as_str()),
            storage = self.storage_service.as_ref().map(|s| s.provider.as_str()),
            signature = self.signature_service.as_ref().map(|s| s.provider.as_str()),
            search = self.search_service.as_ref().map(|s| s.provider.as_str()),
            "Loaded configuration"
        );
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_file: default_log_file(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/api_call_log.jsonl")
}

/// One capability category: the `provider` selector, shared tuning knobs and
/// the per-provider settings sub-mappings (keyed by provider settings key,
/// e.g. `mock_s3`).
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilitySection {
    pub provider: String,
    #[serde(default)]
    pub settings: SharedSettings,
    #[serde(flatten)]
    pub providers: BTreeMap<String, Value>,
}

impl CapabilitySection {
    /// The raw (unresolved) settings sub-mapping for one provider. A missing
    /// sub-mapping yields an empty mapping so providers whose settings are
    /// all defaulted need no configuration stanza.
    pub fn provider_settings(&self, key: &str) -> Value {
        self.providers
            .get(key)
            .cloned()
            .unwrap_or(Value::Mapping(serde_yaml::Mapping::new()))
    }
}

/// Tuning knobs shared across providers of one capability. Fields not
/// meaningful for a capability are ignored by its implementations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SharedSettings {
    pub retry_attempts: u32,
    pub timeout_seconds: u64,
    pub max_file_size_mb: u64,
    pub max_recipients: usize,
}

impl Default for SharedSettings {
    fn default() -> Self {
        SharedSettings {
            retry_attempts: 3,
            timeout_seconds: 30,
            max_file_size_mb: 100,
            max_recipients: 50,
        }
    }
}

/// Recursively substitute every `${ENV:NAME}` string leaf in `value` with the
/// value of environment variable `NAME`.
///
/// Fails with [`ServiceError::MissingCredential`] if `NAME` is unset or
/// empty; a credential field is never silently replaced with an empty string,
/// and no partially-resolved value is ever returned. Leaves that do not match
/// the placeholder form pass through unchanged, as do non-string leaves.
/// `path` names the capability path for diagnostics.
pub fn resolve_placeholders(value: &Value, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => match placeholder_var(s) {
            Some(var) => match std::env::var(var) {
                Ok(resolved) if !resolved.is_empty() => Ok(Value::String(resolved)),
                _ => Err(ServiceError::MissingCredential {
                    path: path.to_string(),
                    var: var.to_string(),
                }),
            },
            None => Ok(value.clone()),
        },
        Value::Mapping(map) => {
            let mut resolved = serde_yaml::Mapping::new();
            for (key, child) in map {
                let segment = key.as_str().map(str::to_string).unwrap_or_default();
                let child_path = format!("{path}.{segment}");
                resolved.insert(key.clone(), resolve_placeholders(child, &child_path)?);
            }
            Ok(Value::Mapping(resolved))
        }
        Value::Sequence(seq) => {
            let mut resolved = Vec::with_capacity(seq.len());
            for (index, child) in seq.iter().enumerate() {
                resolved.push(resolve_placeholders(child, &format!("{path}[{index}]"))?);
            }
            Ok(Value::Sequence(resolved))
        }
        other => Ok(other.clone()),
    }
}

/// The variable name if `s` has the exact form `${ENV:NAME}`.
fn placeholder_var(s: &str) -> Option<&str> {
    s.strip_prefix("${ENV:")?.strip_suffix('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).expect("test yaml")
    }

    #[test]
    fn literal_leaves_pass_through() {
        let value = yaml("endpoint: localhost:9000\nport: 9000\ntls: false");
        let resolved = resolve_placeholders(&value, "storage_service").expect("resolves");
        assert_eq!(resolved, value);
    }

    #[test]
    fn placeholders_substitute_from_environment() {
        std::env::set_var("SWITCHBOARD_TEST_TOKEN", "s3cr3t");
        let value = yaml("api_key: ${ENV:SWITCHBOARD_TEST_TOKEN}");
        let resolved = resolve_placeholders(&value, "search_service").expect("resolves");
        assert_eq!(resolved["api_key"].as_str(), Some("s3cr3t"));
        std::env::remove_var("SWITCHBOARD_TEST_TOKEN");
    }

    #[test]
    fn unset_variable_fails_with_path_and_name() {
        std::env::remove_var("SWITCHBOARD_TEST_ABSENT");
        let value = yaml("nested:\n  api_key: ${ENV:SWITCHBOARD_TEST_ABSENT}");
        let err = resolve_placeholders(&value, "email_service.sendgrid").unwrap_err();
        match err {
            ServiceError::MissingCredential { path, var } => {
                assert_eq!(path, "email_service.sendgrid.nested.api_key");
                assert_eq!(var, "SWITCHBOARD_TEST_ABSENT");
            }
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }

    #[test]
    fn empty_variable_counts_as_missing() {
        std::env::set_var("SWITCHBOARD_TEST_EMPTY", "");
        let value = yaml("password: ${ENV:SWITCHBOARD_TEST_EMPTY}");
        let err = resolve_placeholders(&value, "email_service").unwrap_err();
        assert!(matches!(err, ServiceError::MissingCredential { .. }));
        std::env::remove_var("SWITCHBOARD_TEST_EMPTY");
    }

    #[test]
    fn non_placeholder_dollar_strings_pass_through() {
        let value = yaml("note: \"costs $5\"\nalmost: \"${ENV:UNTERMINATED\"");
        let resolved = resolve_placeholders(&value, "x").expect("resolves");
        assert_eq!(resolved, value);
    }

    #[test]
    fn missing_provider_stanza_defaults_to_empty_mapping() {
        let section: CapabilitySection =
            serde_yaml::from_str("provider: MockS3").expect("section");
        assert_eq!(
            section.provider_settings("mock_s3"),
            Value::Mapping(serde_yaml::Mapping::new())
        );
    }
}
