use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::RegistrationError;

const KNOWN_FIELDS: [&str; 6] = [
    "deviceToken",
    "alias",
    "categories",
    "operatingSystem",
    "osVersion",
    "deviceType",
];

/// Categories as supplied by the caller: a single value or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryInput {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for CategoryInput {
    fn from(value: &str) -> Self {
        CategoryInput::One(value.to_string())
    }
}

impl From<String> for CategoryInput {
    fn from(value: String) -> Self {
        CategoryInput::One(value)
    }
}

impl From<Vec<String>> for CategoryInput {
    fn from(values: Vec<String>) -> Self {
        CategoryInput::Many(values)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn deserialize_categories<'de, D>(deserializer: D) -> Result<Option<CategoryInput>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if is_falsy(&value) {
        return Ok(None);
    }

    CategoryInput::deserialize(value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Device metadata as handed over by the caller, before validation.
///
/// Keys not modelled here are kept in `extra` and forwarded to the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    /// Identifies the client within its push network: the APNs device
    /// token, the FCM registration ID or a SimplePush endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
    /// Application specific alias, usually a username or email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Falsy JSON values (`null`, `false`, `0`, `""`) count as absent
    #[serde(
        default,
        deserialize_with = "deserialize_categories",
        skip_serializing_if = "Option::is_none"
    )]
    pub categories: Option<CategoryInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    /// e.g. `iPad` or `AndroidPhone`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawMetadata {
    pub fn new(device_token: impl Into<String>) -> Self {
        Self {
            device_token: Some(device_token.into()),
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set a single category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories = Some(CategoryInput::One(category.into()));
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(CategoryInput::Many(
            categories.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn with_operating_system(mut self, operating_system: impl Into<String>) -> Self {
        self.operating_system = Some(operating_system.into());
        self
    }

    pub fn with_os_version(mut self, os_version: impl Into<String>) -> Self {
        self.os_version = Some(os_version.into());
        self
    }

    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Attach an additional key forwarded verbatim in the request body
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Validated metadata, serialized as the registration request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub device_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Validate the device token and bring categories into list form.
///
/// A list of categories is kept as is, a single non-empty value becomes a
/// one-element list, anything else becomes an empty list.
pub fn normalize_metadata(raw: RawMetadata) -> Result<DeviceMetadata, RegistrationError> {
    let device_token = match raw.device_token {
        Some(token) if !token.is_empty() => token,
        _ => return Err(RegistrationError::MissingDeviceToken),
    };

    let categories = match raw.categories {
        Some(CategoryInput::Many(categories)) => categories,
        Some(CategoryInput::One(category)) if !category.is_empty() => vec![category],
        _ => Vec::new(),
    };

    let mut extra = raw.extra;
    extra.retain(|key, _| !KNOWN_FIELDS.contains(&key.as_str()));

    Ok(DeviceMetadata {
        device_token,
        alias: raw.alias,
        categories,
        operating_system: raw.operating_system,
        os_version: raw.os_version,
        device_type: raw.device_type,
        extra,
    })
}
