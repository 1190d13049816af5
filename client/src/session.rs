use serde::Serialize;
use tracing::{debug, warn};

use floodwatch_shared::{Category, Coordinate, EntityId, GeoEntity, MapError, MapEvent, MapView};

use crate::cluster::{Marker, MarkerClusterer};
use crate::gestures::GestureSource;
use crate::profile::ViewProfile;
use crate::routing::{NearestShelterRouter, Route};
use crate::viewport::{CameraUpdate, InteractionState, MoveOptions, MoveOutcome, ViewportController};

/// Everything the rendering layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub view: MapView,
    pub state: InteractionState,
    pub markers: Vec<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
}

#[derive(Debug, Clone)]
struct Selection {
    id: EntityId,
    route: Option<Route>,
}

/// One map view: the entities it shows, its camera and the current selection.
pub struct MapSession {
    profile: ViewProfile,
    viewport: ViewportController,
    clusterer: MarkerClusterer,
    router: NearestShelterRouter,
    entities: Vec<GeoEntity>,
    selection: Option<Selection>,
}

impl MapSession {
    pub fn new(profile: ViewProfile, initial: MapView) -> Result<Self, MapError> {
        let viewport = ViewportController::new(profile.viewport.clone(), initial)?;
        Ok(Self {
            clusterer: MarkerClusterer::new(profile.cluster.clone()),
            router: NearestShelterRouter::new(profile.route.clone()),
            viewport,
            profile,
            entities: Vec::new(),
            selection: None,
        })
    }

    pub fn profile(&self) -> &ViewProfile {
        &self.profile
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn entities(&self) -> &[GeoEntity] {
        &self.entities
    }

    pub fn selected(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.id.as_str())
    }

    /// Swap in a fresh data snapshot.
    ///
    /// Returns the outcome of the routine recenter on the focus alert, when
    /// the profile follows alerts and there is one.
    pub fn replace_entities(&mut self, entities: Vec<GeoEntity>, now: f64) -> Option<MoveOutcome> {
        self.entities = self.profile.filter(entities);
        self.refresh_selection();

        if !self.profile.follow_alerts {
            return None;
        }
        let focus = focus_alert(&self.entities)?.coordinate;
        match self.viewport.request_move(focus, MoveOptions::routine(), now) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "focus alert has an unusable position");
                None
            }
        }
    }

    pub fn handle_event(&mut self, event: MapEvent, now: f64) -> Result<Option<Coordinate>, MapError> {
        self.viewport.handle_event(event, now)
    }

    /// Explicit navigation: always moves the camera.
    pub fn navigate_to(
        &mut self,
        target: Coordinate,
        zoom: Option<u8>,
        now: f64,
    ) -> Result<MoveOutcome, MapError> {
        let opts = match zoom {
            Some(zoom) => MoveOptions::forced_at(zoom),
            None => MoveOptions::forced(),
        };
        self.viewport.request_move(target, opts, now)
    }

    /// Routine recenter; dropped while the user owns the camera.
    pub fn recenter(&mut self, target: Coordinate, now: f64) -> Result<MoveOutcome, MapError> {
        self.viewport
            .request_move(target, MoveOptions::routine(), now)
    }

    /// Focus an entity. Alerts and SOS requests also get a route to the
    /// nearest shelter when one can be found.
    pub fn select(&mut self, id: &str, now: f64) -> Result<MoveOutcome, MapError> {
        let entity = self
            .entities
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| MapError::InvalidInput(format!("unknown entity {id}")))?;
        let target = entity.coordinate;
        let route = self.route_for(entity);

        let outcome = self
            .viewport
            .request_move(target, MoveOptions::forced(), now)?;
        self.selection = Some(Selection {
            id: id.to_string(),
            route,
        });
        Ok(outcome)
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn tick(&mut self, now: f64) -> usize {
        self.viewport.tick(now)
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.viewport.next_deadline()
    }

    pub fn drain_updates(&mut self) -> Vec<CameraUpdate> {
        self.viewport.drain_updates()
    }

    pub fn attach<S: GestureSource + ?Sized>(&mut self, source: &mut S) -> usize {
        self.viewport.attach(source)
    }

    pub fn dispose<S: GestureSource + ?Sized>(&mut self, source: &mut S) {
        self.viewport.dispose(source);
        self.selection = None;
    }

    pub fn frame(&self, now: f64) -> RenderFrame {
        let view = self.viewport.camera_at(now);
        let markers = match self.clusterer.cluster(&self.entities, view.zoom) {
            Ok(markers) => markers,
            Err(e) => {
                warn!(error = %e, zoom = view.zoom, "clustering failed, drawing entities unclustered");
                self.entities
                    .iter()
                    .filter(|e| e.coordinate.is_valid())
                    .map(|e| Marker::Single { entity: e.clone() })
                    .collect()
            }
        };
        RenderFrame {
            view,
            state: self.viewport.state(),
            markers,
            selected: self.selection.as_ref().map(|s| s.id.clone()),
            route: self.selection.as_ref().and_then(|s| s.route.clone()),
        }
    }

    fn route_for(&self, entity: &GeoEntity) -> Option<Route> {
        if !entity.category.is_incident() {
            return None;
        }
        let shelters: Vec<GeoEntity> = self
            .entities
            .iter()
            .filter(|e| e.category == Category::Shelter)
            .cloned()
            .collect();
        match self.router.route(entity.coordinate, &shelters) {
            Ok(route) => Some(route),
            Err(e) => {
                warn!(id = %entity.id, error = %e, "no route to safety");
                None
            }
        }
    }

    fn refresh_selection(&mut self) {
        let Some(id) = self.selection.as_ref().map(|s| s.id.clone()) else {
            return;
        };
        match self.entities.iter().find(|e| e.id == id) {
            Some(entity) => {
                let route = self.route_for(entity);
                self.selection = Some(Selection { id, route });
            }
            None => {
                debug!(%id, "selected entity left the snapshot");
                self.selection = None;
            }
        }
    }
}

/// The alert to keep in view: highest severity, then most recently reported,
/// then the last one in input order.
fn focus_alert(entities: &[GeoEntity]) -> Option<&GeoEntity> {
    entities
        .iter()
        .filter(|e| e.category == Category::Alert && e.coordinate.is_valid())
        .max_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then_with(|| a.reported_at.cmp(&b.reported_at))
        })
}
