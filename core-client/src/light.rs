//! Light resources

use crate::error::Result;
use crate::resources::{
    get_list, get_singular, update_resource, Identified, Reference, ResourceList,
};
use crate::transport::Transport;
use hub_traits::RequestContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LIGHT_PATH: &str = "/clip/v2/resource/light";

/// CIE xy chromaticity coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XyCoord {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightOn {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimming {
    pub brightness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightColor {
    pub xy: XyCoord,
}

/// Mirek-valued color temperature. `mirek` is absent while the light is in
/// color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTemperature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirek: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightMetadata {
    pub name: String,
    #[serde(default)]
    pub archetype: String,
}

/// Light resource payload, the subset of CLIP v2 this client drives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Light {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub metadata: LightMetadata,
    pub on: LightOn,
    #[serde(default)]
    pub dimming: Option<Dimming>,
    #[serde(default)]
    pub color: Option<LightColor>,
    #[serde(default)]
    pub color_temperature: Option<ColorTemperature>,
    #[serde(default)]
    pub owner: Option<Reference>,
}

impl Identified for Light {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial update; absent fields stay untouched on the bridge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LightUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<LightOn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimming: Option<Dimming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<LightColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<ColorTemperature>,
}

/// Light-related API operations.
pub struct LightService {
    transport: Arc<Transport>,
}

impl LightService {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn get_all_lights(&self, ctx: &RequestContext) -> Result<ResourceList<Light>> {
        get_list(&self.transport, ctx, LIGHT_PATH).await
    }

    pub async fn get_light(&self, ctx: &RequestContext, id: &str) -> Result<Light> {
        let path = format!("{}/{}", LIGHT_PATH, id);
        get_singular(&self.transport, ctx, id, &path, "light").await
    }

    pub async fn update_light(
        &self,
        ctx: &RequestContext,
        id: &str,
        update: &LightUpdate,
    ) -> Result<Reference> {
        let path = format!("{}/{}", LIGHT_PATH, id);
        update_resource(&self.transport, ctx, &path, update, "light").await
    }
}
