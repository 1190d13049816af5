use serde::Serialize;
use tracing::debug;

use floodwatch_shared::{Coordinate, EntityId, GeoEntity, MapError};

use crate::config::RouteConfig;
use crate::geo::distance;

/// A straight-line proxy path from an incident to a shelter.
///
/// This is approximate: the intermediate points are linear interpolations in
/// degree space, not a road-aware path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub shelter_id: EntityId,
    pub points: Vec<Coordinate>,
    /// Great-circle distance between the two endpoints.
    pub distance_km: f64,
}

/// The shelter closest to `point` by haversine distance. The first of several
/// equally close shelters wins. Shelters with invalid coordinates are skipped.
pub fn nearest(point: Coordinate, shelters: &[GeoEntity]) -> Result<&GeoEntity, MapError> {
    nearest_matching(point, shelters, |_| true)
}

/// Like [`nearest`], restricted to shelters that can still take people in.
pub fn nearest_available(
    point: Coordinate,
    shelters: &[GeoEntity],
) -> Result<&GeoEntity, MapError> {
    nearest_matching(point, shelters, GeoEntity::is_available_shelter)
}

fn nearest_matching(
    point: Coordinate,
    shelters: &[GeoEntity],
    keep: impl Fn(&GeoEntity) -> bool,
) -> Result<&GeoEntity, MapError> {
    point.validate()?;
    let mut best: Option<(&GeoEntity, f64)> = None;
    for shelter in shelters {
        if !shelter.coordinate.is_valid() || !keep(shelter) {
            continue;
        }
        let d = distance(point, shelter.coordinate);
        if best.map(|(_, bd)| d < bd).unwrap_or(true) {
            best = Some((shelter, d));
        }
    }
    best.map(|(shelter, _)| shelter)
        .ok_or(MapError::NoSheltersAvailable)
}

/// `steps + 1` points from `start` to `end`, linearly interpolated. The first
/// and last points are the endpoints themselves, bit for bit.
pub fn build_route(
    start: Coordinate,
    end: Coordinate,
    steps: usize,
) -> Result<Vec<Coordinate>, MapError> {
    start.validate()?;
    end.validate()?;
    if steps < 2 {
        return Err(MapError::InvalidInput(format!(
            "route needs at least 2 steps, got {steps}"
        )));
    }

    let dlat = end.lat - start.lat;
    let dlng = end.lng - start.lng;
    let mut points = Vec::with_capacity(steps + 1);
    points.push(start);
    for i in 1..steps {
        let t = i as f64 / steps as f64;
        points.push(Coordinate {
            lat: start.lat + dlat * t,
            lng: start.lng + dlng * t,
        });
    }
    points.push(end);
    Ok(points)
}

#[derive(Debug, Clone, Default)]
pub struct NearestShelterRouter {
    config: RouteConfig,
}

impl NearestShelterRouter {
    pub fn new(config: RouteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Pick a shelter for `incident` and build the proxy route to it.
    ///
    /// With `prefer_available`, full or closed shelters are only used when
    /// no open shelter exists at all.
    pub fn route(&self, incident: Coordinate, shelters: &[GeoEntity]) -> Result<Route, MapError> {
        let shelter = if self.config.prefer_available {
            match nearest_available(incident, shelters) {
                Ok(shelter) => shelter,
                Err(MapError::NoSheltersAvailable) => {
                    debug!("no open shelter, falling back to nearest of any status");
                    nearest(incident, shelters)?
                }
                Err(e) => return Err(e),
            }
        } else {
            nearest(incident, shelters)?
        };

        let points = build_route(incident, shelter.coordinate, self.config.steps)?;
        Ok(Route {
            shelter_id: shelter.id.clone(),
            points,
            distance_km: distance(incident, shelter.coordinate),
        })
    }
}
