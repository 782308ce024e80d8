//! Environment-backed configuration for the OptiCore services.
//!
//! All endpoints and keys are read once at startup into explicit config
//! structs with fail-fast validation; a missing required variable is a
//! `Config` error at construction time, never a panic at first use. Variable
//! names match the deployment environment of the hosted services.

use crate::error::{OptiCoreError, Result};
use std::env;

/// Default Gemini model when `MODEL_ID` is not set.
pub const DEFAULT_CLASSIFIER_MODEL: &str = "gemini-1.5-flash";

/// Supabase table holding classified complaints.
pub const COMPLAINT_TABLE: &str = "reclamos";

/// Configuration for the banner-generation webhook.
#[derive(Debug, Clone)]
pub struct BannerConfig {
    /// Primary n8n webhook URL (`N8N_WEBHOOK_URL`). Required.
    pub webhook_url: String,
    /// Optional status endpoint (`N8N_STATUS_URL`). Empty string counts as unset;
    /// without it the polling phase is a graceful no-op.
    pub status_url: Option<String>,
}

impl BannerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            webhook_url: required("N8N_WEBHOOK_URL")?,
            status_url: optional("N8N_STATUS_URL"),
        })
    }
}

/// Configuration for the product-vision endpoint.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Cloud Run describe endpoint (`CF_DESCRIBE_URL`). Required.
    pub describe_url: String,
}

impl VisionConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            describe_url: required("CF_DESCRIBE_URL")?,
        })
    }
}

/// Configuration for the Gemini complaint classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Gemini API key (`GEMINI_API_KEY`). Required.
    pub api_key: String,
    /// Model id (`MODEL_ID`), defaulting to [`DEFAULT_CLASSIFIER_MODEL`].
    pub model: String,
}

impl ClassifierConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: required("GEMINI_API_KEY")?,
            model: optional("MODEL_ID").unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.to_string()),
        })
    }
}

/// Configuration for the Supabase row store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project base URL (`SUPABASE_URL`). Required.
    pub base_url: String,
    /// Service role key (`SUPABASE_SERVICE_KEY`). Required.
    pub service_key: String,
    /// Target table, [`COMPLAINT_TABLE`] unless overridden programmatically.
    pub table: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: required("SUPABASE_URL")?,
            service_key: required("SUPABASE_SERVICE_KEY")?,
            table: COMPLAINT_TABLE.to_string(),
        })
    }
}

/// Full application configuration, validated eagerly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub banner: BannerConfig,
    pub vision: VisionConfig,
    pub classifier: ClassifierConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Loads every sub-config at once. Tools that only need one collaborator
    /// should call the individual `from_env` constructors instead so they can
    /// run with a partial environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            banner: BannerConfig::from_env()?,
            vision: VisionConfig::from_env()?,
            classifier: ClassifierConfig::from_env()?,
            store: StoreConfig::from_env()?,
        })
    }
}

fn required(name: &str) -> Result<String> {
    non_empty(env::var(name).ok())
        .ok_or_else(|| OptiCoreError::config(format!("{name} is not set")))
}

fn optional(name: &str) -> Option<String> {
    non_empty(env::var(name).ok())
}

/// Trims the value and treats whitespace-only strings as absent, matching how
/// the deployment treats `N8N_STATUS_URL=""`.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
