use thiserror::Error;

pub use serde_with;

pub mod hazard;
pub mod position;
pub mod route;
pub mod session;

pub trait ExampleData {
    fn example_data() -> Self;
}

/// Violations of the read model invariants, raised when constructing or
/// deserializing a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("a route option needs at least one point of geometry")]
    EmptyGeometry,
    #[error("severity rating {0} is outside of 1..=5")]
    SeverityOutOfRange(i64),
    #[error("step waypoint {index} is out of the geometry range (len {len})")]
    WaypointOutOfRange { index: usize, len: usize },
    #[error("position ({0}, {1}) is not finite")]
    NonFinitePosition(f64, f64),
}
