//! Nova Push Registry Library
//!
//! This library provides a client for registering and unregistering devices
//! with a UnifiedPush server on behalf of one push variant.
//!
//! It handles:
//! - Variant credentials and base URL normalization
//! - Device metadata validation and category normalization
//! - Authenticated JSON requests against `rest/registry/device`
//! - Outcome delivery through a callback or broadcast events
//!
//! # Example
//!
//! ```rust,no_run
//! use nova_push_registry::{ClientSettings, RawMetadata, UnifiedPushClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = UnifiedPushClient::new(ClientSettings::new(
//!         "http://localhost:8080/ag-push",
//!         "12345",
//!         "12345",
//!     ))?;
//!
//!     let body = client
//!         .register_device(RawMetadata::new("8D220016DBA072CB").with_category("news"))
//!         .await?;
//!     println!("registered: {}", body);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod metadata;
pub mod reporter;
pub mod settings;
pub mod transport;

pub use client::{UnifiedPushClient, REGISTRY_PATH};
pub use config::{ClientIdentity, ClientSettings};
pub use errors::{RegistrationError, TransportError};
pub use metadata::{normalize_metadata, CategoryInput, DeviceMetadata, RawMetadata};
pub use reporter::{report_outcome, EventChannel, Outcome, OutcomeCallback, PushEvent};
pub use settings::{resolve_request, HttpMethod, Protocol, RequestDescriptor};
pub use transport::{dispatch, DynHttpTransport, HttpTransport, ReqwestTransport, ResponseStream};
