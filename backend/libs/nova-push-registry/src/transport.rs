use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::{debug, error, warn};

use crate::errors::{RegistrationError, TransportError};
use crate::metadata::DeviceMetadata;
use crate::reporter::Outcome;
use crate::settings::{HttpMethod, RequestDescriptor};

/// Streaming view on a received HTTP response
#[async_trait]
pub trait ResponseStream: Send {
    fn status(&self) -> u16;

    /// Next body chunk, `None` once the body is complete
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Network seam used by the dispatcher
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request described by `request`
    ///
    /// # Arguments
    /// * `request` - Target, headers, credentials and method
    /// * `body` - Full request body, `None` to send no body at all
    ///
    /// # Returns
    /// The response as soon as its status line is known, or the transport failure
    async fn send(
        &self,
        request: &RequestDescriptor,
        body: Option<String>,
    ) -> Result<Box<dyn ResponseStream>, TransportError>;
}

/// Shared type for services holding a transport trait object
pub type DynHttpTransport = std::sync::Arc<dyn HttpTransport>;

/// HTTP(S) transport backed by reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport that does not follow redirects, so 3xx answers
    /// are classified like any other status below 400
    pub fn new() -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;

        Ok(Self { http_client })
    }

    /// Wrap an existing reqwest client
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

struct ReqwestResponseStream {
    response: reqwest::Response,
}

#[async_trait]
impl ResponseStream for ReqwestResponseStream {
    fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let chunk = self.response.chunk().await?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: &RequestDescriptor,
        body: Option<String>,
    ) -> Result<Box<dyn ResponseStream>, TransportError> {
        let method = match request.method {
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let (user, password) = request.basic_credentials();

        let mut builder = self
            .http_client
            .request(method, request.url())
            .basic_auth(user, Some(password));

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        Ok(Box::new(ReqwestResponseStream { response }))
    }
}

/// Perform one request and classify its result.
///
/// Statuses of 400 and above fail with the status code and the body is
/// never read. Below 400 every chunk is collected and reported once.
pub async fn dispatch(
    transport: &dyn HttpTransport,
    request: &RequestDescriptor,
    payload: Option<&DeviceMetadata>,
) -> Outcome {
    let body = match payload.map(serde_json::to_string).transpose() {
        Ok(body) => body,
        Err(e) => return Outcome::Failure(RegistrationError::Serialization(e.to_string())),
    };

    debug!(
        method = %request.method,
        url = %request.url(),
        has_body = body.is_some(),
        "Dispatching push registry request"
    );

    let mut response = match transport.send(request, body).await {
        Ok(response) => response,
        Err(e) => {
            error!(method = %request.method, "Push registry request failed: {}", e);
            return Outcome::Failure(e.into());
        }
    };

    let status = response.status();
    if status >= 400 {
        warn!(method = %request.method, status, "Push server rejected request");
        return Outcome::Failure(RegistrationError::Server(status));
    }

    let mut collected = Vec::new();
    loop {
        match response.next_chunk().await {
            Ok(Some(chunk)) => collected.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                error!(
                    method = %request.method,
                    status,
                    "Push registry response interrupted: {}",
                    e
                );
                return Outcome::Failure(e.into());
            }
        }
    }

    debug!(
        method = %request.method,
        status,
        bytes = collected.len(),
        "Push registry request completed"
    );

    Outcome::Success(String::from_utf8_lossy(&collected).into_owned())
}
