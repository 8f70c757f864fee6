//! Facade tests driven through a recording transport spy
//!
//! These tests verify:
//! 1. Request construction for register and unregister
//! 2. Callback delivery of success, server and transport failures
//! 3. Event emission when no callback is supplied
//! 4. Precondition failures never reach the network

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nova_push_registry::{
    ClientSettings, HttpMethod, HttpTransport, OutcomeCallback, PushEvent, RawMetadata,
    RegistrationError, RequestDescriptor, ResponseStream, TransportError, UnifiedPushClient,
};
use serde_json::json;
use tokio::sync::{broadcast, oneshot};
use tokio::time::timeout;

#[derive(Clone)]
enum Reply {
    Status(u16, Vec<&'static str>),
    Fail(&'static str),
}

struct SpyStream {
    status: u16,
    chunks: VecDeque<&'static str>,
}

#[async_trait]
impl ResponseStream for SpyStream {
    fn status(&self) -> u16 {
        self.status
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.chunks.pop_front().map(|chunk| chunk.as_bytes().to_vec()))
    }
}

/// Records every request and answers with a fixed reply
struct SpyTransport {
    reply: Reply,
    requests: Mutex<Vec<(RequestDescriptor, Option<String>)>>,
}

impl SpyTransport {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<(RequestDescriptor, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for SpyTransport {
    async fn send(
        &self,
        request: &RequestDescriptor,
        body: Option<String>,
    ) -> Result<Box<dyn ResponseStream>, TransportError> {
        self.requests.lock().unwrap().push((request.clone(), body));
        match &self.reply {
            Reply::Status(status, chunks) => Ok(Box::new(SpyStream {
                status: *status,
                chunks: chunks.clone().into(),
            })),
            Reply::Fail(message) => Err(TransportError::new(*message)),
        }
    }
}

fn client_with(spy: Arc<SpyTransport>) -> UnifiedPushClient {
    UnifiedPushClient::with_transport(
        ClientSettings::new("http://localhost:8080/ag-push", "12345", "12345"),
        spy,
    )
    .unwrap()
}

fn callback_channel() -> (
    OutcomeCallback,
    oneshot::Receiver<Result<String, RegistrationError>>,
) {
    let (tx, rx) = oneshot::channel();
    let callback: OutcomeCallback = Box::new(move |result| {
        let _ = tx.send(result);
    });
    (callback, rx)
}

async fn wait_for(
    rx: oneshot::Receiver<Result<String, RegistrationError>>,
) -> Result<String, RegistrationError> {
    timeout(Duration::from_secs(5), rx)
        .await
        .expect("callback not invoked in time")
        .expect("callback dropped")
}

#[tokio::test]
async fn test_register_builds_authenticated_post() {
    let spy = SpyTransport::new(Reply::Status(200, vec!["ok"]));
    let client = client_with(spy.clone());
    let (callback, rx) = callback_channel();

    client
        .register_with_push_server(RawMetadata::new("ABC"), Some(callback))
        .unwrap();
    wait_for(rx).await.unwrap();

    let requests = spy.requests();
    assert_eq!(requests.len(), 1);
    let (request, body) = &requests[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(
        request.url(),
        "http://localhost:8080/ag-push/rest/registry/device"
    );
    assert_eq!(request.basic_credentials(), ("12345", "12345"));
    assert_eq!(request.headers["Accept"], "application/json");
    assert_eq!(request.headers["Content-type"], "application/json");

    let body: serde_json::Value = serde_json::from_str(body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"deviceToken": "ABC", "categories": []}));
}

#[tokio::test]
async fn test_created_response_reaches_callback() {
    let spy = SpyTransport::new(Reply::Status(201, vec!["{\"id\":1}"]));
    let client = client_with(spy);
    let (callback, rx) = callback_channel();

    client
        .register_with_push_server(RawMetadata::new("ABC"), Some(callback))
        .unwrap();

    assert_eq!(wait_for(rx).await, Ok("{\"id\":1}".to_string()));
}

#[tokio::test]
async fn test_unauthorized_reaches_callback_as_status() {
    let spy = SpyTransport::new(Reply::Status(401, vec!["denied"]));
    let client = client_with(spy);
    let (callback, rx) = callback_channel();

    client
        .register_with_push_server(RawMetadata::new("ABC"), Some(callback))
        .unwrap();

    let err = wait_for(rx).await.unwrap_err();
    assert_eq!(err, RegistrationError::Server(401));
    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn test_connection_error_reaches_callback() {
    let spy = SpyTransport::new(Reply::Fail("ECONNREFUSED"));
    let client = client_with(spy);
    let (callback, rx) = callback_channel();

    client
        .register_with_push_server(RawMetadata::new("ABC"), Some(callback))
        .unwrap();

    let err = wait_for(rx).await.unwrap_err();
    assert_eq!(err.to_string(), "problem with request: ECONNREFUSED");
}

#[tokio::test]
async fn test_success_event_without_callback() {
    let spy = SpyTransport::new(Reply::Status(200, vec!["{\"id\":", "7}"]));
    let client = client_with(spy);
    let mut events = client.subscribe();

    client
        .register_with_push_server(RawMetadata::new("ABC"), None)
        .unwrap();

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event emitted")
        .unwrap();
    assert_eq!(event.name(), "success");
    assert_eq!(event, PushEvent::Success("{\"id\":7}".to_string()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_error_event_without_callback() {
    let spy = SpyTransport::new(Reply::Status(500, vec![]));
    let client = client_with(spy);
    let mut events = client.subscribe();

    client.unregister_with_push_server("TOKEN123", None).unwrap();

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event emitted")
        .unwrap();
    assert_eq!(event.name(), "error");
    assert_eq!(event, PushEvent::Error(RegistrationError::Server(500)));
}

#[tokio::test]
async fn test_callback_suppresses_events() {
    let spy = SpyTransport::new(Reply::Status(200, vec!["ok"]));
    let client = client_with(spy);
    let mut events = client.subscribe();
    let (callback, rx) = callback_channel();

    client
        .register_with_push_server(RawMetadata::new("ABC"), Some(callback))
        .unwrap();
    wait_for(rx).await.unwrap();

    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_unregister_sends_delete_without_body() {
    let spy = SpyTransport::new(Reply::Status(204, vec![]));
    let client = client_with(spy.clone());
    let (callback, rx) = callback_channel();

    client
        .unregister_with_push_server("TOKEN123", Some(callback))
        .unwrap();
    assert_eq!(wait_for(rx).await, Ok(String::new()));

    let requests = spy.requests();
    assert_eq!(requests.len(), 1);
    let (request, body) = &requests[0];
    assert_eq!(request.method, HttpMethod::Delete);
    assert_eq!(
        request.url(),
        "http://localhost:8080/ag-push/rest/registry/device/TOKEN123"
    );
    assert_eq!(request.basic_credentials(), ("12345", "12345"));
    assert_eq!(request.headers.len(), 2);
    assert!(body.is_none());
}

#[tokio::test]
async fn test_missing_device_token_issues_no_request() {
    let spy = SpyTransport::new(Reply::Status(200, vec!["ok"]));
    let client = client_with(spy.clone());

    let result = client.register_with_push_server(RawMetadata::default().with_alias("john"), None);
    assert!(matches!(result, Err(RegistrationError::MissingDeviceToken)));

    let awaited = client.register_device(RawMetadata::new("")).await;
    assert_eq!(awaited, Err(RegistrationError::MissingDeviceToken));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(spy.requests().is_empty());
}

#[tokio::test]
async fn test_categories_are_normalized_in_body() {
    let cases = vec![
        (RawMetadata::new("ABC").with_category("sports"), json!(["sports"])),
        (
            RawMetadata::new("ABC").with_categories(["sports", "news"]),
            json!(["sports", "news"]),
        ),
        (RawMetadata::new("ABC"), json!([])),
    ];

    for (metadata, expected) in cases {
        let spy = SpyTransport::new(Reply::Status(200, vec![]));
        let client = client_with(spy.clone());

        client.register_device(metadata).await.unwrap();

        let requests = spy.requests();
        let body: serde_json::Value =
            serde_json::from_str(requests[0].1.as_deref().unwrap()).unwrap();
        assert_eq!(body["categories"], expected);
    }
}

#[tokio::test]
async fn test_calls_chain_and_run_independently() {
    let spy = SpyTransport::new(Reply::Status(200, vec!["ok"]));
    let client = client_with(spy.clone());
    let (first, first_rx) = callback_channel();
    let (second, second_rx) = callback_channel();

    client
        .register_with_push_server(RawMetadata::new("ABC"), Some(first))
        .unwrap()
        .unregister_with_push_server("ABC", Some(second))
        .unwrap();

    assert!(wait_for(first_rx).await.is_ok());
    assert!(wait_for(second_rx).await.is_ok());

    let mut methods: Vec<HttpMethod> = spy.requests().into_iter().map(|(r, _)| r.method).collect();
    methods.sort_by_key(|m| m.as_str());
    assert_eq!(methods, vec![HttpMethod::Delete, HttpMethod::Post]);
}

#[tokio::test]
async fn test_awaitable_forms_return_outcome() {
    let spy = SpyTransport::new(Reply::Status(201, vec!["{\"id\":1}"]));
    let client = client_with(spy);

    assert_eq!(
        client.register_device(RawMetadata::new("ABC")).await,
        Ok("{\"id\":1}".to_string())
    );
    assert_eq!(
        client.unregister_device("ABC").await,
        Ok("{\"id\":1}".to_string())
    );
}

#[test]
fn test_url_always_ends_with_separator() {
    for url in ["http://localhost:8080/ag-push", "http://localhost:8080/ag-push/"] {
        let client = UnifiedPushClient::new(ClientSettings::new(url, "id", "secret")).unwrap();
        assert_eq!(client.url(), "http://localhost:8080/ag-push/");
    }
}

#[test]
fn test_construction_requires_all_settings() {
    let cases = [
        ClientSettings::new("", "id", "secret"),
        ClientSettings::new("http://localhost", "", "secret"),
        ClientSettings::new("http://localhost", "id", ""),
    ];

    for settings in cases {
        assert!(matches!(
            UnifiedPushClient::new(settings),
            Err(RegistrationError::MissingConfiguration(_))
        ));
    }
}
