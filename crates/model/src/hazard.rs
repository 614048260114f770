use chrono::{DateTime, Local, TimeZone};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{
    id::{HasId, Id},
    serde::{date_time, string},
};

use crate::{position::Position, ExampleData, ModelError};

/// A 1 to 5 severity rating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    const CRITICAL_FROM: u8 = 4;

    pub fn new(rating: i64) -> Result<Self, ModelError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&rating) {
            Ok(Self(rating as u8))
        } else {
            Err(ModelError::SeverityOutOfRange(rating))
        }
    }

    pub fn rating(&self) -> u8 {
        self.0
    }

    pub fn is_critical(&self) -> bool {
        self.0 >= Self::CRITICAL_FROM
    }
}

impl TryFrom<i64> for Severity {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(value: Severity) -> Self {
        value.0
    }
}

/// A user submitted report of a hazard along a road ("review").
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HazardReport {
    pub id: Id<HazardReport>,
    pub user_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "string::empty_as_none")]
    pub description: Option<String>,
    pub category: String,
    pub rating: Severity,
    /// Free text, e.g. a street name. Not parsed.
    pub location: String,
    /// `"lat,lng"`, see [`parse_coordinates`].
    #[serde(default, deserialize_with = "string::empty_as_none")]
    pub coordinates: Option<String>,
    #[serde(default, deserialize_with = "string::empty_as_none")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "date_time::deserialize_flexible")]
    pub created_at: DateTime<Local>,
}

impl HasId for HazardReport {
    type IdType = String;
}

impl HazardReport {
    pub fn position(&self) -> Coordinate {
        parse_coordinates(self.coordinates.as_deref())
    }
}

impl ExampleData for HazardReport {
    fn example_data() -> Self {
        Self {
            id: Id::from("3f1c7d2e"),
            user_id: "u-1024".to_owned(),
            title: "Broken street light".to_owned(),
            description: Some("The whole block is dark after 8 pm.".to_owned()),
            category: "Lighting".to_owned(),
            rating: Severity(4),
            location: "MG Road, Bengaluru".to_owned(),
            coordinates: Some("12.9756,77.6066".to_owned()),
            image_url: None,
            created_at: Local
                .with_ymd_and_hms(2024, 11, 2, 21, 15, 0)
                .single()
                .unwrap_or_else(Local::now),
        }
    }
}

/// Result of parsing a `"lat,lng"` coordinate string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    Valid(Position),
    Invalid,
}

impl Coordinate {
    pub fn valid(self) -> Option<Position> {
        match self {
            Coordinate::Valid(position) => Some(position),
            Coordinate::Invalid => None,
        }
    }
}

/// Splits on the first comma and parses both halves. Anything that does not
/// yield two finite numbers is `Invalid`, including an absent string.
pub fn parse_coordinates(value: Option<&str>) -> Coordinate {
    let Some((latitude, longitude)) = value.and_then(|value| value.split_once(',')) else {
        return Coordinate::Invalid;
    };
    let parsed = latitude
        .trim()
        .parse::<f64>()
        .ok()
        .zip(longitude.trim().parse::<f64>().ok());
    match parsed {
        Some((latitude, longitude)) => Position::checked(latitude, longitude)
            .map(Coordinate::Valid)
            .unwrap_or(Coordinate::Invalid),
        None => Coordinate::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_coordinates() {
        assert_eq!(
            parse_coordinates(Some("12.9,77.6")),
            Coordinate::Valid(Position::new(12.9, 77.6))
        );
        assert_eq!(
            parse_coordinates(Some(" -33.86 , 151.2 ")),
            Coordinate::Valid(Position::new(-33.86, 151.2))
        );
    }

    #[test]
    fn rejects_malformed_coordinates() {
        for value in [
            None,
            Some(""),
            Some("abc,77.6"),
            Some("12.9"),
            Some("12.9,"),
            Some("12.9,77.6,3"),
            Some("NaN,77.6"),
            Some("12.9,inf"),
        ] {
            assert_eq!(parse_coordinates(value), Coordinate::Invalid, "{:?}", value);
        }
    }

    #[test]
    fn severity_bounds_and_classification() {
        assert!(Severity::new(0).is_err());
        assert!(Severity::new(6).is_err());
        assert!(!Severity::new(3).unwrap().is_critical());
        assert!(Severity::new(4).unwrap().is_critical());
        assert!(Severity::new(5).unwrap().is_critical());
    }

    #[test]
    fn deserializes_database_rows() {
        let json = r#"{
            "id": "r1",
            "userId": "u1",
            "title": "Pothole",
            "description": "",
            "category": "Road",
            "rating": 2,
            "location": "Ring road",
            "coordinates": "12.9,77.6",
            "imageUrl": null,
            "createdAt": "2024-03-01 12:30:00.000+00"
        }"#;
        let report: HazardReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.description, None);
        assert_eq!(report.image_url, None);
        assert_eq!(report.rating.rating(), 2);
        assert_eq!(report.position().valid(), Some(Position::new(12.9, 77.6)));
    }

    #[test]
    fn out_of_range_rating_fails_to_deserialize() {
        let json = r#"{
            "id": "r1", "userId": "u1", "title": "t", "category": "c",
            "rating": 9, "location": "l", "createdAt": "2024-03-01T12:30:00Z"
        }"#;
        assert!(serde_json::from_str::<HazardReport>(json).is_err());
    }
}
