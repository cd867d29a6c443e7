//! Device Registration (Pairing)
//!
//! One-time handshake exchanging a physical link-button press for a
//! long-lived application key. The protocol is a single POST; there is no
//! polling loop and no backoff here — when the button has not been pressed
//! the caller gets [`ApiError::LinkButtonNotPressed`], prompts the user, and
//! decides for itself whether and when to retry.

use crate::credentials::CredentialResolver;
use crate::error::{ApiError, Result};
use crate::transport::Transport;
use core_store::StoredCredential;
use hub_traits::{HttpMethod, RequestContext};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Registration endpoint on the bridge.
pub const PAIRING_ENDPOINT: &str = "/api";

/// Error description the bridge uses for an unpressed link button. This
/// exact string is the only way the protocol distinguishes the retryable
/// case from every other rejection.
const LINK_BUTTON_DESCRIPTION: &str = "link button not pressed";

/// Registration request payload.
#[derive(Debug, Serialize)]
pub struct RegistrationRequest {
    pub devicetype: String,
    pub generateclientkey: bool,
}

/// Success half of a registration reply.
///
/// `username` becomes the working credential; `clientkey` is the generated
/// secondary key, kept in the stored record but never sent as a header.
#[derive(Debug, Deserialize)]
pub struct RegistrationSuccess {
    pub username: String,
    #[serde(default)]
    pub clientkey: Option<String>,
}

/// Error half of a registration reply.
#[derive(Debug, Deserialize)]
pub struct RegistrationError {
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default)]
    pub address: String,
    pub description: String,
}

/// One element of the singleton-array registration response.
#[derive(Debug, Deserialize)]
pub struct RegistrationReply {
    pub success: Option<RegistrationSuccess>,
    pub error: Option<RegistrationError>,
}

/// Run the registration protocol without persisting anything.
///
/// Used directly by cache-backed construction, which owns where the key
/// goes; everyone else wants [`register_device`].
#[instrument(skip(transport, ctx))]
pub async fn request_registration(
    transport: &Transport,
    ctx: &RequestContext,
    app_name: &str,
    instance_name: &str,
) -> Result<StoredCredential> {
    let request = RegistrationRequest {
        devicetype: format!("{}#{}", app_name, instance_name),
        generateclientkey: true,
    };

    let response = transport
        .send_json(ctx, HttpMethod::Post, PAIRING_ENDPOINT, &request)
        .await?;

    let replies: Vec<RegistrationReply> = serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::BadResponse(e.to_string()))?;

    let reply = replies
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadResponse("empty registration response".to_string()))?;

    if let Some(error) = reply.error {
        if error.description == LINK_BUTTON_DESCRIPTION {
            info!("Bridge is waiting for its link button");
            return Err(ApiError::LinkButtonNotPressed);
        }
        warn!(
            kind = error.kind,
            description = %error.description,
            "Bridge rejected registration"
        );
        return Err(ApiError::RegistrationFailed(error.description));
    }

    let success = reply.success.ok_or_else(|| {
        ApiError::BadResponse("registration reply carries neither success nor error".to_string())
    })?;

    info!("Bridge issued an application key");
    Ok(StoredCredential {
        application_key: success.username,
        client_key: success.clientkey,
    })
}

/// Register this device with the bridge and persist the issued key.
///
/// The key is handed to the credential store before the result is returned;
/// a store failure fails the registration, so a success here always means
/// the credential survives a restart.
pub async fn register_device(
    transport: &Transport,
    resolver: &CredentialResolver,
    ctx: &RequestContext,
    app_name: &str,
    instance_name: &str,
) -> Result<StoredCredential> {
    let credential = request_registration(transport, ctx, app_name, instance_name).await?;
    resolver.store(&credential).await?;
    transport.credential_refreshed();
    Ok(credential)
}
