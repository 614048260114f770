use chrono::{DateTime, Local, Utc};
use model::{
    hazard::{HazardReport, Severity},
    ModelError,
};
use sqlx::prelude::FromRow;
use utility::id::Id;

#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub rating: i32,
    pub location: String,
    pub coordinates: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl ReviewRow {
    pub fn to_model(self) -> Result<HazardReport, ModelError> {
        Ok(HazardReport {
            id: Id::new(self.id),
            user_id: self.user_id,
            title: self.title,
            description: non_empty(self.description),
            category: self.category,
            rating: Severity::new(self.rating.into())?,
            location: self.location,
            coordinates: non_empty(self.coordinates),
            image_url: non_empty(self.image_url),
            created_at: self.created_at.with_timezone(&Local),
        })
    }
}
