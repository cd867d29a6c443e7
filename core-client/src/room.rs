//! Room resources

use crate::error::Result;
use crate::resources::{
    create_resource, delete_resource, get_list, get_singular, update_resource, Identified,
    Reference, ResourceList,
};
use crate::transport::Transport;
use hub_traits::RequestContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ROOM_PATH: &str = "/clip/v2/resource/room";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMetadata {
    pub name: String,
    #[serde(default)]
    pub archetype: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Room {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub children: Vec<Reference>,
    #[serde(default)]
    pub services: Vec<Reference>,
    pub metadata: RoomMetadata,
}

impl Identified for Room {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomCreate {
    pub children: Vec<Reference>,
    pub metadata: RoomMetadata,
}

/// Partial update; absent fields stay untouched on the bridge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoomUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RoomMetadata>,
}

/// Room-related API operations.
pub struct RoomService {
    transport: Arc<Transport>,
}

impl RoomService {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn get_all_rooms(&self, ctx: &RequestContext) -> Result<ResourceList<Room>> {
        get_list(&self.transport, ctx, ROOM_PATH).await
    }

    pub async fn get_room(&self, ctx: &RequestContext, id: &str) -> Result<Room> {
        let path = format!("{}/{}", ROOM_PATH, id);
        get_singular(&self.transport, ctx, id, &path, "room").await
    }

    pub async fn create_room(&self, ctx: &RequestContext, create: &RoomCreate) -> Result<Reference> {
        create_resource(&self.transport, ctx, ROOM_PATH, create, "room").await
    }

    pub async fn update_room(
        &self,
        ctx: &RequestContext,
        id: &str,
        update: &RoomUpdate,
    ) -> Result<Reference> {
        let path = format!("{}/{}", ROOM_PATH, id);
        update_resource(&self.transport, ctx, &path, update, "room").await
    }

    pub async fn delete_room(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        let path = format!("{}/{}", ROOM_PATH, id);
        delete_resource(&self.transport, ctx, &path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_decodes_clip_payload() {
        let json = r#"{
            "id": "123",
            "type": "room",
            "children": [{"rid": "1234", "rtype": "light"}],
            "services": [{"rid": "grp1", "rtype": "grouped_light"}],
            "metadata": {"name": "Kitchen", "archetype": "kitchen"}
        }"#;

        let room: Room = serde_json::from_str(json).unwrap();
        assert_eq!(room.id, "123");
        assert_eq!(room.children.len(), 1);
        assert_eq!(room.children[0].rid, "1234");
        assert_eq!(room.metadata.name, "Kitchen");
    }

    #[test]
    fn test_create_serializes_expected_shape() {
        let create = RoomCreate {
            children: vec![Reference {
                rid: "1234".to_string(),
                rtype: "light".to_string(),
            }],
            metadata: RoomMetadata {
                name: "TEST ROOM".to_string(),
                archetype: "bedroom".to_string(),
            },
        };

        let json = serde_json::to_string(&create).unwrap();
        assert_eq!(
            json,
            r#"{"children":[{"rid":"1234","rtype":"light"}],"metadata":{"name":"TEST ROOM","archetype":"bedroom"}}"#
        );
    }
}
