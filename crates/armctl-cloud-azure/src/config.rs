//! Connection settings for Azure Resource Manager

use crate::error::{ArmError, Result};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_POLLS: u32 = 120;

/// Configuration for [`ArmClient`](crate::ArmClient)
#[derive(Clone)]
pub struct ArmConfig {
    pub endpoint: String,
    pub subscription_id: String,
    pub access_token: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Delay between long-running operation polls when the service sends no `Retry-After`
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl ArmConfig {
    pub fn new(subscription_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            subscription_id: subscription_id.into(),
            access_token: access_token.into(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Create ArmConfig from environment variables
    ///
    /// `AZURE_SUBSCRIPTION_ID` and `AZURE_ACCESS_TOKEN` are required,
    /// `ARM_ENDPOINT` is optional.
    pub fn from_env() -> Result<Self> {
        let subscription_id = std::env::var("AZURE_SUBSCRIPTION_ID")
            .map_err(|_| ArmError::MissingEnvVar("AZURE_SUBSCRIPTION_ID".to_string()))?;
        let access_token = std::env::var("AZURE_ACCESS_TOKEN")
            .map_err(|_| ArmError::MissingEnvVar("AZURE_ACCESS_TOKEN".to_string()))?;

        let mut config = Self::new(subscription_id, access_token);
        if let Ok(endpoint) = std::env::var("ARM_ENDPOINT") {
            config.endpoint = endpoint;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.subscription_id.trim().is_empty() {
            return Err(ArmError::InvalidConfig(
                "subscription id must not be empty".to_string(),
            ));
        }
        if self.access_token.trim().is_empty() {
            return Err(ArmError::InvalidConfig(
                "access token must not be empty".to_string(),
            ));
        }
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(ArmError::InvalidConfig(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if self.max_polls == 0 {
            return Err(ArmError::InvalidConfig(
                "max_polls must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ArmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmConfig")
            .field("endpoint", &self.endpoint)
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}
