//! Register a device token with a UnifiedPush server
//!
//! ```bash
//! export UNIFIEDPUSH_URL="http://localhost:8080/ag-push"
//! export UNIFIEDPUSH_VARIANT_ID="12345"
//! export UNIFIEDPUSH_VARIANT_SECRET="12345"
//! cargo run -p nova-push-registry --example register_device -- <device-token>
//! ```

use nova_push_registry::{ClientSettings, RawMetadata, UnifiedPushClient};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

const DEFAULT_DEVICE_TOKEN: &str =
    "8D220016DBA072CBEEC3EE72707EB82A4008BA62E0CC75A224065BB479C8292E";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let device_token = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DEVICE_TOKEN.to_string());

    let client = UnifiedPushClient::new(ClientSettings::from_env()?)?;

    let (tx, rx) = oneshot::channel();
    client.register_with_push_server(
        RawMetadata::new(device_token),
        Some(Box::new(move |result| {
            match &result {
                Ok(response) => println!("success {}", response),
                Err(err) => println!("error {}", err),
            }
            let _ = tx.send(());
        })),
    )?;

    rx.await?;
    Ok(())
}
