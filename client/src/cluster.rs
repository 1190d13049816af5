use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use floodwatch_shared::{Coordinate, EntityId, GeoEntity, MapError, Severity, group_key};

use crate::config::ClusterConfig;
use crate::geo::{centroid, planar_delta};
use crate::spatial::BucketGrid;

/// Two or more entities merged into one representative marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// CRC32 over the member ids; stable across refreshes with the same members.
    pub id: u32,
    pub representative: Coordinate,
    pub member_ids: BTreeSet<EntityId>,
    pub size: usize,
    /// Highest severity among members, if any member carries one.
    pub severity: Option<Severity>,
}

/// What the rendering layer draws: either an entity on its own or a cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Marker {
    Single { entity: GeoEntity },
    Cluster(Cluster),
}

impl Marker {
    pub fn coordinate(&self) -> Coordinate {
        match self {
            Marker::Single { entity } => entity.coordinate,
            Marker::Cluster(cluster) => cluster.representative,
        }
    }

    /// Number of entities this marker stands for.
    pub fn weight(&self) -> usize {
        match self {
            Marker::Single { .. } => 1,
            Marker::Cluster(cluster) => cluster.size,
        }
    }
}

/// Greedy single-link clustering whose merge radius depends on zoom.
#[derive(Debug, Clone, Default)]
pub struct MarkerClusterer {
    config: ClusterConfig,
}

impl MarkerClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn radius_for_zoom(&self, zoom: u8) -> f64 {
        self.config.radius_for_zoom(zoom)
    }

    /// Reduce `entities` to markers for `zoom`.
    ///
    /// Entities with invalid coordinates or an id already seen are skipped
    /// first. Seeds are taken in input order and absorb every later
    /// unprocessed entity whose planar delta to the seed is below the radius,
    /// so the partition is deterministic for a fixed input order.
    pub fn cluster(&self, entities: &[GeoEntity], zoom: u8) -> Result<Vec<Marker>, MapError> {
        let usable = usable_entities(entities);
        if usable.is_empty() {
            return Ok(Vec::new());
        }

        if zoom >= self.config.native_zoom {
            return Ok(usable
                .into_iter()
                .map(|entity| Marker::Single {
                    entity: entity.clone(),
                })
                .collect());
        }

        let radius = self.radius_for_zoom(zoom);
        let groups = if usable.len() > self.config.grid_threshold {
            group_with_grid(&usable, radius)
        } else {
            group_by_scan(&usable, radius)
        };

        let mut markers = Vec::with_capacity(groups.len());
        for group in groups {
            markers.push(build_marker(&usable, &group)?);
        }
        debug!(
            zoom,
            radius,
            entities = usable.len(),
            markers = markers.len(),
            "clustered markers"
        );
        Ok(markers)
    }
}

fn usable_entities(entities: &[GeoEntity]) -> Vec<&GeoEntity> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(entities.len());
    let mut usable = Vec::with_capacity(entities.len());
    for entity in entities {
        if !entity.coordinate.is_valid() {
            warn!(id = %entity.id, lat = entity.coordinate.lat, lng = entity.coordinate.lng,
                "skipping entity with invalid coordinate");
            continue;
        }
        if !seen.insert(entity.id.as_str()) {
            warn!(id = %entity.id, "skipping duplicate entity id");
            continue;
        }
        usable.push(entity);
    }
    usable
}

/// Plain O(n²) pass.
fn group_by_scan(entities: &[&GeoEntity], radius: f64) -> Vec<Vec<usize>> {
    let mut processed = vec![false; entities.len()];
    let mut groups = Vec::new();
    for seed in 0..entities.len() {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;
        let origin = entities[seed].coordinate;
        let mut group = vec![seed];
        for other in (seed + 1)..entities.len() {
            if !processed[other] && planar_delta(origin, entities[other].coordinate) < radius {
                processed[other] = true;
                group.push(other);
            }
        }
        groups.push(group);
    }
    groups
}

/// Same partition as [`group_by_scan`], with candidates drawn from a bucket grid.
fn group_with_grid(entities: &[&GeoEntity], radius: f64) -> Vec<Vec<usize>> {
    let points: Vec<Coordinate> = entities.iter().map(|e| e.coordinate).collect();
    let grid = BucketGrid::build(&points, radius);
    let mut processed = vec![false; entities.len()];
    let mut groups = Vec::new();
    for seed in 0..entities.len() {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;
        let origin = points[seed];
        let mut group = vec![seed];
        for other in grid.neighbours(origin) {
            if other > seed && !processed[other] && planar_delta(origin, points[other]) < radius {
                processed[other] = true;
                group.push(other);
            }
        }
        groups.push(group);
    }
    groups
}

fn build_marker(entities: &[&GeoEntity], group: &[usize]) -> Result<Marker, MapError> {
    if let [only] = group {
        return Ok(Marker::Single {
            entity: entities[*only].clone(),
        });
    }

    let points: Vec<Coordinate> = group.iter().map(|&i| entities[i].coordinate).collect();
    let representative = centroid(&points)?;
    let member_ids: BTreeSet<EntityId> = group.iter().map(|&i| entities[i].id.clone()).collect();
    let severity = group.iter().filter_map(|&i| entities[i].severity).max();
    Ok(Marker::Cluster(Cluster {
        id: group_key(member_ids.iter().map(String::as_str)),
        representative,
        size: member_ids.len(),
        member_ids,
        severity,
    }))
}
