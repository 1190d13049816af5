use thiserror::Error;

/// Failures raised by the map core.
///
/// None of these are meant to reach an end user directly. Callers degrade
/// (show markers unclustered, skip the route, keep the camera where it is)
/// and log the cause.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// Latitude outside `[-90, 90]`, longitude outside `[-180, 180]`, or a non-finite value.
    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Nearest-shelter lookup over an empty (or fully invalid) shelter list.
    #[error("no shelters available")]
    NoSheltersAvailable,

    /// A structurally invalid argument, e.g. an empty centroid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A snapshot payload that could not be decoded into entities.
    #[error("malformed payload: {0}")]
    Payload(String),
}

pub type Result<T, E = MapError> = std::result::Result<T, E>;
