use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::RegistrationError;
use crate::settings::Protocol;

pub const ENV_URL: &str = "UNIFIEDPUSH_URL";
pub const ENV_VARIANT_ID: &str = "UNIFIEDPUSH_VARIANT_ID";
pub const ENV_VARIANT_SECRET: &str = "UNIFIEDPUSH_VARIANT_SECRET";

/// Connection settings supplied by the caller
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub url: String,
    pub variant_id: String,
    pub variant_secret: String,
}

impl ClientSettings {
    /// Create new client settings
    ///
    /// # Arguments
    /// * `url` - Base URL of the push server, e.g. `http://localhost:8080/ag-push`
    /// * `variant_id` - Variant ID issued by the push server
    /// * `variant_secret` - Variant secret issued by the push server
    pub fn new(
        url: impl Into<String>,
        variant_id: impl Into<String>,
        variant_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            variant_id: variant_id.into(),
            variant_secret: variant_secret.into(),
        }
    }

    /// Load settings from `UNIFIEDPUSH_URL`, `UNIFIEDPUSH_VARIANT_ID`
    /// and `UNIFIEDPUSH_VARIANT_SECRET`
    pub fn from_env() -> Result<Self, RegistrationError> {
        Ok(Self {
            url: std::env::var(ENV_URL)
                .map_err(|_| RegistrationError::MissingConfiguration("url"))?,
            variant_id: std::env::var(ENV_VARIANT_ID)
                .map_err(|_| RegistrationError::MissingConfiguration("variantId"))?,
            variant_secret: std::env::var(ENV_VARIANT_SECRET)
                .map_err(|_| RegistrationError::MissingConfiguration("variantSecret"))?,
        })
    }

    /// Validate the settings and freeze them into a [`ClientIdentity`]
    pub fn into_identity(self) -> Result<ClientIdentity, RegistrationError> {
        if self.url.is_empty() {
            return Err(RegistrationError::MissingConfiguration("url"));
        }
        if self.variant_id.is_empty() {
            return Err(RegistrationError::MissingConfiguration("variantId"));
        }
        if self.variant_secret.is_empty() {
            return Err(RegistrationError::MissingConfiguration("variantSecret"));
        }

        let base_url = if self.url.ends_with('/') {
            self.url
        } else {
            format!("{}/", self.url)
        };

        let parsed = Url::parse(&base_url)
            .map_err(|e| RegistrationError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if Protocol::from_scheme_token(&format!("{}:", parsed.scheme())).is_none() {
            return Err(RegistrationError::InvalidUrl(format!(
                "unsupported protocol in {}",
                base_url
            )));
        }

        Ok(ClientIdentity {
            base_url,
            variant_id: self.variant_id,
            variant_secret: self.variant_secret,
        })
    }
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("url", &self.url)
            .field("variant_id", &self.variant_id)
            .field("variant_secret", &"<redacted>")
            .finish()
    }
}

/// Immutable connection identity held by the client
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    base_url: String,
    variant_id: String,
    variant_secret: String,
}

impl ClientIdentity {
    /// Base URL, always terminated by `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    pub fn variant_secret(&self) -> &str {
        &self.variant_secret
    }

    /// Resolve an endpoint relative to the base URL
    pub fn endpoint(&self, relative: &str) -> Result<Url, RegistrationError> {
        let target = format!("{}{}", self.base_url, relative);
        Url::parse(&target).map_err(|e| RegistrationError::InvalidUrl(format!("{}: {}", target, e)))
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("base_url", &self.base_url)
            .field("variant_id", &self.variant_id)
            .field("variant_secret", &"<redacted>")
            .finish()
    }
}
