use chrono::{DateTime, Local};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{position::Position, ExampleData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Loading,
    Found,
    NotFound,
}

/// A live tracked entity. The position is only ever written by the initial
/// read and by pushed change events.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    pub id: Id<TrackingSession>,
    pub position: Option<Position>,
    pub last_updated: Option<DateTime<Local>>,
    pub status: SessionStatus,
}

impl HasId for TrackingSession {
    type IdType = String;
}

pub type SessionId = Id<TrackingSession>;

impl TrackingSession {
    pub fn loading(id: SessionId) -> Self {
        Self {
            id,
            position: None,
            last_updated: None,
            status: SessionStatus::Loading,
        }
    }
}

impl ExampleData for TrackingSession {
    fn example_data() -> Self {
        Self {
            id: Id::from("c0ffee-42"),
            position: Some(Position::new(10.0, 76.0)),
            last_updated: Some(Local::now()),
            status: SessionStatus::Found,
        }
    }
}
