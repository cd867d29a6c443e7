//! Discover a bridge, pair with it if needed, and list its lights.
//!
//! ```sh
//! cargo run --example pair_and_list
//! ```
//!
//! Pairing requires pressing the bridge's link button when prompted.

use core_client::{ApiError, ClientBuilder};
use core_store::BridgeStore;
use hub_reqwest::ReqwestHttpClient;
use hub_traits::RequestContext;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = Arc::new(BridgeStore::load_default().await?);
    let http = Arc::new(ReqwestHttpClient::new());
    let browser = Arc::new(core_discovery::MdnsBrowser::new());
    let builder = ClientBuilder::new(Arc::clone(&store), http, browser);

    let ctx = RequestContext::with_timeout(Duration::from_secs(30));
    let bridges = builder.discovery().discover(&ctx).await?;
    for bridge in &bridges {
        println!("Found bridge: {} at {}", bridge.id, bridge.internal_address);
    }

    let client = loop {
        let ctx = RequestContext::with_timeout(Duration::from_secs(30));
        match builder.client_for_new_bridge(&ctx).await {
            Ok((bridge_id, client)) => {
                println!("Paired with bridge {}", bridge_id);
                break client;
            }
            Err(ApiError::LinkButtonNotPressed) => {
                println!("Press the link button on the bridge, retrying in 5s...");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Err(ApiError::NoUnpairedBridge) => {
                // Every known bridge already has a key; use the first one.
                let bridge = bridges.first().ok_or("no bridges found")?;
                break builder.client_for_bridge(&bridge.id).await?;
            }
            Err(e) => return Err(e.into()),
        }
    };

    let ctx = RequestContext::with_timeout(Duration::from_secs(10));
    let lights = client.lights().get_all_lights(&ctx).await?;

    println!("Connection successful! Found {} lights", lights.data.len());
    for light in &lights.data {
        println!("- Light: {} (ID: {})", light.metadata.name, light.id);
    }

    Ok(())
}
