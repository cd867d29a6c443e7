//! Generic Resource Operations
//!
//! Type-parameterized CRUD helpers every resource manager is built from.
//! Two bridge API quirks are enforced uniformly here so no manager has to
//! remember them:
//!
//! - the bridge reports business-logic failures inside 200 responses, so a
//!   non-empty `errors` array fails the operation regardless of status
//! - some firmware ignores path parameters, so a singular lookup verifies
//!   the returned entity actually is the one that was asked for

use crate::error::{ApiError, Result};
use crate::transport::Transport;
use hub_traits::{HttpMethod, HttpResponse, RequestContext};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

/// A resource payload that knows its own id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Reference to a resource, as returned by write operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub rid: String,
    pub rtype: String,
}

/// Error entry the bridge embeds in response envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceError {
    pub description: String,
}

/// List envelope: `{"data": [...], "errors": [...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResourceList<T> {
    #[serde(default)]
    pub data: Vec<T>,
    #[serde(default)]
    pub errors: Vec<ResourceError>,
}

/// Write envelope: references to what was created or updated.
#[derive(Debug, Deserialize)]
struct WriteResponse {
    #[serde(default)]
    data: Vec<Reference>,
    #[serde(default)]
    errors: Vec<ResourceError>,
}

fn decode<T: DeserializeOwned>(response: &HttpResponse, path: &str) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| {
        warn!(path = path, error = %e, "Failed to decode bridge response");
        ApiError::BadResponse(e.to_string())
    })
}

/// GET the collection at `path`.
pub async fn get_list<T: DeserializeOwned>(
    transport: &Transport,
    ctx: &RequestContext,
    path: &str,
) -> Result<ResourceList<T>> {
    let response = transport.get(ctx, path).await?;
    decode(&response, path)
}

/// GET the single resource `id` at `path`.
///
/// A mismatched id in the reply is treated as not-found even when the
/// bridge answered 200 with data: a wrong entity is worse than none.
pub async fn get_singular<T: DeserializeOwned + Identified>(
    transport: &Transport,
    ctx: &RequestContext,
    id: &str,
    path: &str,
    resource_name: &str,
) -> Result<T> {
    let list: ResourceList<T> = get_list(transport, ctx, path).await?;

    let entity = match list.data.into_iter().next() {
        Some(entity) => entity,
        None => {
            return Err(match list.errors.into_iter().next() {
                Some(error) => ApiError::ResourceFailed(error.description),
                None => ApiError::NotFound(format!("{} {}", resource_name, id)),
            });
        }
    };

    if entity.id() != id {
        warn!(
            requested = id,
            returned = entity.id(),
            resource = resource_name,
            "Bridge answered with a different entity than requested"
        );
        return Err(ApiError::NotFound(format!("{} {}", resource_name, id)));
    }

    Ok(entity)
}

/// POST `payload` to the collection at `path`.
pub async fn create_resource<T: Serialize + Sync>(
    transport: &Transport,
    ctx: &RequestContext,
    path: &str,
    payload: &T,
    resource_name: &str,
) -> Result<Reference> {
    let response = transport
        .send_json(ctx, HttpMethod::Post, path, payload)
        .await?;
    first_reference(decode(&response, path)?, resource_name)
}

/// PUT `payload` to the resource at `path`.
pub async fn update_resource<T: Serialize + Sync>(
    transport: &Transport,
    ctx: &RequestContext,
    path: &str,
    payload: &T,
    resource_name: &str,
) -> Result<Reference> {
    let response = transport
        .send_json(ctx, HttpMethod::Put, path, payload)
        .await?;
    first_reference(decode(&response, path)?, resource_name)
}

/// DELETE the resource at `path`.
pub async fn delete_resource(
    transport: &Transport,
    ctx: &RequestContext,
    path: &str,
) -> Result<()> {
    let response = transport.delete(ctx, path).await?;
    if !response.is_success() {
        return Err(ApiError::ResourceFailed(format!(
            "delete {} failed with status {}",
            path, response.status
        )));
    }
    Ok(())
}

/// A write succeeded only when the bridge reported no errors and named what
/// it touched; exactly the first reference is the result.
fn first_reference(reply: WriteResponse, resource_name: &str) -> Result<Reference> {
    if let Some(error) = reply.errors.first() {
        warn!(
            resource = resource_name,
            description = %error.description,
            "Bridge reported a write failure"
        );
        return Err(ApiError::ResourceFailed(format!(
            "{}: {}",
            resource_name, error.description
        )));
    }

    reply.data.into_iter().next().ok_or_else(|| {
        ApiError::BadResponse(format!(
            "write response for {} carries no reference",
            resource_name
        ))
    })
}
