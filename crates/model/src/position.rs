use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo;

use crate::ModelError;

/// A WGS84 coordinate. Replaced wholesale on every fix, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, ModelError> {
        if latitude.is_finite() && longitude.is_finite() {
            Ok(Self::new(latitude, longitude))
        } else {
            Err(ModelError::NonFinitePosition(latitude, longitude))
        }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Great circle distance in kilometers.
    pub fn distance_km(&self, other: &Position) -> f64 {
        geo::haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl From<(f64, f64)> for Position {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub south_west: Position,
    pub north_east: Position,
}

impl Bounds {
    /// The smallest bounds containing every position, `None` when there are
    /// no positions.
    pub fn containing<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        geo::bounding_box(positions.into_iter().map(Position::as_tuple)).map(
            |(south_west, north_east)| Self {
                south_west: south_west.into(),
                north_east: north_east.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_coordinates() {
        assert!(Position::checked(f64::NAN, 1.0).is_err());
        assert!(Position::checked(1.0, f64::INFINITY).is_err());
        assert_eq!(Position::checked(12.9, 77.6), Ok(Position::new(12.9, 77.6)));
    }

    #[test]
    fn bounds_span_all_positions() {
        let positions = [
            Position::new(10.0, 76.0),
            Position::new(10.5, 75.0),
            Position::new(9.5, 76.5),
        ];
        let bounds = Bounds::containing(&positions).unwrap();
        assert_eq!(bounds.south_west, Position::new(9.5, 75.0));
        assert_eq!(bounds.north_east, Position::new(10.5, 76.5));
    }

    #[test]
    fn no_bounds_without_positions() {
        assert_eq!(Bounds::containing(&Vec::<Position>::new()), None);
    }
}
