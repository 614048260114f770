use live_map::store::{ChangeKind, PositionChange};
use model::{position::Position, session::SessionId};
use serde::Deserialize;
use sqlx::prelude::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl SessionRow {
    pub fn position(self) -> Option<Position> {
        Position::checked(self.lat?, self.lng?).ok()
    }
}

/// Payload of a `sos_sessions_update` notification.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionNotification {
    pub op: String,
    pub id: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl SessionNotification {
    pub fn parse(payload: &str) -> Option<Self> {
        serde_json::from_str(payload)
            .map_err(|why| log::warn!("malformed session notification: {}", why))
            .ok()
    }

    /// Notifications without coordinates carry nothing to show.
    pub fn into_change(self) -> Option<PositionChange> {
        let kind = match self.op.as_str() {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            _ => return None,
        };
        let position = Position::checked(self.lat?, self.lng?).ok()?;
        Some(PositionChange {
            session: SessionId::new(self.id),
            kind,
            position,
        })
    }
}
