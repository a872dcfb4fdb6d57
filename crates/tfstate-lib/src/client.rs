//! S3 client configuration and creation.
//!
//! Credentials are resolved once, at client construction, from an explicit
//! [`StoreConfig`] value; nothing in this crate reads credential material
//! mid-request. A process-wide [`ClientFactory`] caches one client per
//! credential profile and never replaces a client once inserted.

use std::collections::HashMap;

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::ProvideCredentials;
use aws_sdk_s3::Client;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

/// Configuration for S3 access.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// AWS credential profile name (optional).
    pub profile: Option<String>,

    /// AWS region override (optional; the SDK default chain applies otherwise).
    pub region: Option<String>,

    /// Custom endpoint URL for S3-compatible stores (optional).
    pub endpoint_url: Option<String>,
}

impl StoreConfig {
    /// Set the AWS profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint URL.
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }
}

/// Create an S3 client from configuration.
///
/// When a profile is set it selects the SDK profile provider; otherwise the
/// SDK default chain applies, which covers `AWS_PROFILE`, the
/// `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` environment variables and the
/// default profile. Credential resolution happens here, eagerly: a config
/// that yields no credentials fails with [`Error::CredentialsMissing`]
/// before any request is sent.
pub async fn build_client(config: &StoreConfig) -> Result<Client> {
    use aws_config::Region;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint_url) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    let sdk_config = loader.load().await;

    let provider = sdk_config
        .credentials_provider()
        .ok_or(Error::CredentialsMissing)?;
    provider
        .provide_credentials()
        .await
        .map_err(|_| Error::CredentialsMissing)?;

    let builder = aws_sdk_s3::config::Builder::from(&sdk_config);

    // Path-style addressing is required by most S3-compatible endpoints.
    let s3_config = if config.endpoint_url.is_some() {
        builder.force_path_style(true).build()
    } else {
        builder.build()
    };

    Ok(Client::from_conf(s3_config))
}

/// Process-wide client factory, keyed by credential profile name.
///
/// The base [`StoreConfig`] supplies the default profile plus any
/// region/endpoint overrides; a per-call profile replaces only the profile.
/// Clients are inserted once and then shared (S3 clients are cheap to clone).
pub struct ClientFactory {
    base: StoreConfig,
    clients: RwLock<HashMap<Option<String>, Client>>,
}

impl ClientFactory {
    /// Create a factory around a base store configuration.
    pub fn new(base: StoreConfig) -> Self {
        Self {
            base,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Effective profile for a call: explicit override, else the base profile.
    fn effective_profile(&self, profile: Option<&str>) -> Option<String> {
        profile
            .map(str::to_string)
            .or_else(|| self.base.profile.clone())
    }

    /// Return the cached client for `profile`, building it on first use.
    pub async fn client(&self, profile: Option<&str>) -> Result<Client> {
        let key = self.effective_profile(profile);

        if let Some(client) = self.clients.read().await.get(&key) {
            return Ok(client.clone());
        }

        debug!(profile = key.as_deref().unwrap_or("<default>"), "building S3 client");
        let config = StoreConfig {
            profile: key.clone(),
            ..self.base.clone()
        };
        let client = build_client(&config).await?;

        let mut clients = self.clients.write().await;
        Ok(clients.entry(key).or_insert(client).clone())
    }
}
