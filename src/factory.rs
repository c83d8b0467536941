//! Provider selection.
//!
//! Each capability has a closed enumeration of registered providers. The
//! `provider` string in configuration selects a variant; anything else is a
//! hard [`ServiceError::UnknownProvider`] failure. There is deliberately no
//! fallback to a default provider: silently defaulting would mask
//! misconfiguration.
//!
//! A factory call resolves only the selected provider's settings
//! sub-mapping against the environment, constructs a fresh handle and hands
//! it the shared call logger. Handles are not cached; callers wanting reuse
//! hold on to the returned handle themselves.

use serde::de::DeserializeOwned;

use crate::config::{resolve_placeholders, CapabilitySection, RawConfig};
use crate::contract::{EmailService, SearchService, SignatureService, StorageService};
use crate::email::{MockOutboxService, MockOutboxSettings, SendGridService, SendGridSettings};
use crate::error::{Result, ServiceError};
use crate::logger::CallLogger;
use crate::search::{
    GoogleCustomSearchService, GoogleCustomSearchSettings, MockGoogleService, MockGoogleSettings,
};
use crate::signature::{MockDocuSignService, MockDocuSignSettings};
use crate::storage::{MockS3Service, MockS3Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    MockS3,
}

impl StorageProvider {
    fn from_name(name: &str) -> Result<Self> {
        match name {
            "MockS3" => Ok(StorageProvider::MockS3),
            other => Err(unknown("storage_service", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProvider {
    MockOutbox,
    SendGrid,
}

impl EmailProvider {
    fn from_name(name: &str) -> Result<Self> {
        match name {
            "MockOutbox" => Ok(EmailProvider::MockOutbox),
            "SendGrid" => Ok(EmailProvider::SendGrid),
            other => Err(unknown("email_service", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureProvider {
    MockDocuSign,
}

impl SignatureProvider {
    fn from_name(name: &str) -> Result<Self> {
        match name {
            "MockDocuSign" => Ok(SignatureProvider::MockDocuSign),
            other => Err(unknown("signature_service", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    MockGoogle,
    GoogleCustomSearch,
}

impl SearchProvider {
    fn from_name(name: &str) -> Result<Self> {
        match name {
            "MockGoogle" => Ok(SearchProvider::MockGoogle),
            "GoogleCustomSearch" => Ok(SearchProvider::GoogleCustomSearch),
            other => Err(unknown("search_service", other)),
        }
    }
}

fn unknown(capability: &'static str, provider: &str) -> ServiceError {
    ServiceError::UnknownProvider {
        capability,
        provider: provider.to_string(),
    }
}

fn capability_section<'a>(
    section: &'a Option<CapabilitySection>,
    capability: &'static str,
) -> Result<&'a CapabilitySection> {
    section
        .as_ref()
        .ok_or_else(|| ServiceError::Config(format!("{capability} section missing from configuration")))
}

/// Resolve and deserialize the selected provider's settings sub-mapping.
/// Placeholder resolution happens here, so an unset credential fails the
/// construction of exactly the service that needs it.
fn resolved_settings<T: DeserializeOwned>(
    section: &CapabilitySection,
    capability: &str,
    settings_key: &str,
) -> Result<T> {
    let raw = section.provider_settings(settings_key);
    let resolved = resolve_placeholders(&raw, &format!("{capability}.{settings_key}"))?;
    Ok(serde_yaml::from_value(resolved)?)
}

pub fn create_storage_service(
    config: &RawConfig,
    logger: &CallLogger,
) -> Result<Box<dyn StorageService>> {
    let section = capability_section(&config.storage_service, "storage_service")?;
    match StorageProvider::from_name(&section.provider)? {
        StorageProvider::MockS3 => {
            let settings: MockS3Settings =
                resolved_settings(section, "storage_service", "mock_s3")?;
            Ok(Box::new(MockS3Service::new(
                settings,
                section.settings.clone(),
                logger.clone(),
            )?))
        }
    }
}

pub fn create_email_service(
    config: &RawConfig,
    logger: &CallLogger,
) -> Result<Box<dyn EmailService>> {
    let section = capability_section(&config.email_service, "email_service")?;
    match EmailProvider::from_name(&section.provider)? {
        EmailProvider::MockOutbox => {
            let settings: MockOutboxSettings =
                resolved_settings(section, "email_service", "mock_outbox")?;
            Ok(Box::new(MockOutboxService::new(
                settings,
                section.settings.clone(),
                logger.clone(),
            )?))
        }
        EmailProvider::SendGrid => {
            let settings: SendGridSettings =
                resolved_settings(section, "email_service", "sendgrid")?;
            Ok(Box::new(SendGridService::new(
                settings,
                section.settings.clone(),
                logger.clone(),
            )?))
        }
    }
}

pub fn create_signature_service(
    config: &RawConfig,
    logger: &CallLogger,
) -> Result<Box<dyn SignatureService>> {
    let section = capability_section(&config.signature_service, "signature_service")?;
    match SignatureProvider::from_name(&section.provider)? {
        SignatureProvider::MockDocuSign => {
            let settings: MockDocuSignSettings =
                resolved_settings(section, "signature_service", "mock_docusign")?;
            Ok(Box::new(MockDocuSignService::new(settings, logger.clone())?))
        }
    }
}

pub fn create_search_service(
    config: &RawConfig,
    logger: &CallLogger,
) -> Result<Box<dyn SearchService>> {
    let section = capability_section(&config.search_service, "search_service")?;
    match SearchProvider::from_name(&section.provider)? {
        SearchProvider::MockGoogle => {
            let settings: MockGoogleSettings =
                resolved_settings(section, "search_service", "mock_google")?;
            Ok(Box::new(MockGoogleService::new(settings, logger.clone())))
        }
        SearchProvider::GoogleCustomSearch => {
            let settings: GoogleCustomSearchSettings =
                resolved_settings(section, "search_service", "google_custom_search")?;
            Ok(Box::new(GoogleCustomSearchService::new(
                settings,
                section.settings.clone(),
                logger.clone(),
            )?))
        }
    }
}
