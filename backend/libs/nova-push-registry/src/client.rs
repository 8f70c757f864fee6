use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::{ClientIdentity, ClientSettings};
use crate::errors::RegistrationError;
use crate::metadata::{normalize_metadata, DeviceMetadata, RawMetadata};
use crate::reporter::{report_outcome, EventChannel, OutcomeCallback, PushEvent};
use crate::settings::{resolve_request, HttpMethod, RequestDescriptor};
use crate::transport::{dispatch, DynHttpTransport, ReqwestTransport};

/// Registry endpoint, relative to the push server base URL
pub const REGISTRY_PATH: &str = "rest/registry/device";

/// UnifiedPush registration client
///
/// Registers and unregisters devices of one variant with a push server.
/// Outcomes of the fire-and-forget calls are delivered to the callback
/// passed with the call, or broadcast to [`subscribe`](Self::subscribe) receivers
/// when no callback was given.
#[derive(Clone)]
pub struct UnifiedPushClient {
    identity: Arc<ClientIdentity>,
    transport: DynHttpTransport,
    events: EventChannel,
}

impl UnifiedPushClient {
    /// Create new client talking HTTP(S) through reqwest
    ///
    /// # Arguments
    /// * `settings` - Push server URL, variant ID and variant secret
    ///
    /// # Returns
    /// `Err(RegistrationError::MissingConfiguration)` if any setting is empty
    pub fn new(settings: ClientSettings) -> Result<Self, RegistrationError> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(settings, Arc::new(transport))
    }

    /// Create new client with a custom transport
    pub fn with_transport(
        settings: ClientSettings,
        transport: DynHttpTransport,
    ) -> Result<Self, RegistrationError> {
        let identity = settings.into_identity()?;

        info!(
            "Initialized push registry client for url={}, variant_id={}",
            identity.base_url(),
            identity.variant_id()
        );

        Ok(Self {
            identity: Arc::new(identity),
            transport,
            events: EventChannel::default(),
        })
    }

    /// Push server base URL, always ending with `/`
    pub fn url(&self) -> &str {
        self.identity.base_url()
    }

    pub fn variant_id(&self) -> &str {
        self.identity.variant_id()
    }

    pub fn variant_secret(&self) -> &str {
        self.identity.variant_secret()
    }

    /// Subscribe to `success` / `error` events of calls made without a callback
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }

    /// Register a device with the push server.
    ///
    /// Returns as soon as the request is dispatched on the current Tokio
    /// runtime. A missing device token fails here, before any I/O.
    pub fn register_with_push_server(
        &self,
        metadata: RawMetadata,
        callback: Option<OutcomeCallback>,
    ) -> Result<&Self, RegistrationError> {
        let (request, payload) = self.prepare_registration(metadata)?;
        self.spawn_dispatch(request, Some(payload), callback)?;
        Ok(self)
    }

    /// Unregister a device token from the push server.
    ///
    /// Sends a `DELETE` without body; returns once the request is dispatched.
    pub fn unregister_with_push_server(
        &self,
        device_token: &str,
        callback: Option<OutcomeCallback>,
    ) -> Result<&Self, RegistrationError> {
        let request = self.prepare_unregistration(device_token)?;
        self.spawn_dispatch(request, None, callback)?;
        Ok(self)
    }

    /// Register a device and wait for the server response body
    pub async fn register_device(
        &self,
        metadata: RawMetadata,
    ) -> Result<String, RegistrationError> {
        let (request, payload) = self.prepare_registration(metadata)?;
        dispatch(self.transport.as_ref(), &request, Some(&payload))
            .await
            .into_result()
    }

    /// Unregister a device token and wait for the server response body
    pub async fn unregister_device(
        &self,
        device_token: &str,
    ) -> Result<String, RegistrationError> {
        let request = self.prepare_unregistration(device_token)?;
        dispatch(self.transport.as_ref(), &request, None)
            .await
            .into_result()
    }

    fn prepare_registration(
        &self,
        metadata: RawMetadata,
    ) -> Result<(RequestDescriptor, DeviceMetadata), RegistrationError> {
        let metadata = normalize_metadata(metadata)?;
        let request = self.resolve(REGISTRY_PATH, HttpMethod::Post)?;

        info!(
            "Registering device token {} with {} categories",
            token_prefix(&metadata.device_token),
            metadata.categories.len()
        );

        Ok((request, metadata))
    }

    fn prepare_unregistration(
        &self,
        device_token: &str,
    ) -> Result<RequestDescriptor, RegistrationError> {
        if device_token.is_empty() {
            return Err(RegistrationError::MissingDeviceToken);
        }

        let relative = format!("{}/{}", REGISTRY_PATH, urlencoding::encode(device_token));
        let request = self.resolve(&relative, HttpMethod::Delete)?;

        info!("Unregistering device token {}", token_prefix(device_token));

        Ok(request)
    }

    fn resolve(
        &self,
        relative: &str,
        method: HttpMethod,
    ) -> Result<RequestDescriptor, RegistrationError> {
        let url = self.identity.endpoint(relative)?;
        resolve_request(
            &url,
            self.identity.variant_id(),
            self.identity.variant_secret(),
            method,
        )
        .ok_or_else(|| RegistrationError::InvalidUrl(format!("unsupported protocol in {}", url)))
    }

    fn spawn_dispatch(
        &self,
        request: RequestDescriptor,
        payload: Option<DeviceMetadata>,
        callback: Option<OutcomeCallback>,
    ) -> Result<(), RegistrationError> {
        let handle = Handle::try_current().map_err(|_| RegistrationError::RuntimeUnavailable)?;
        let transport = self.transport.clone();
        let events = self.events.clone();

        handle.spawn(async move {
            let outcome = dispatch(transport.as_ref(), &request, payload.as_ref()).await;
            debug!(success = outcome.is_success(), "Reporting push registry outcome");
            report_outcome(outcome, callback, &events);
        });

        Ok(())
    }
}

fn token_prefix(device_token: &str) -> String {
    device_token.chars().take(8).collect()
}
