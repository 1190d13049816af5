use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use floodwatch_map::gestures::RecordingSource;
use floodwatch_map::ingest::parse_snapshot;
use floodwatch_map::profile::{Role, ViewProfile};
use floodwatch_map::session::{MapSession, RenderFrame};
use floodwatch_map::viewport::CameraUpdate;
use floodwatch_shared::{Category, Coordinate, MapError, MapEvent, MapView};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown profile: {0}")]
    Profile(String),
    #[error(transparent)]
    Map(#[from] MapError),
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_profile")]
    pub profile: String,
    pub view: MapView,
    pub steps: Vec<Step>,
}

fn default_profile() -> String {
    "generic".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Step {
    pub at_ms: f64,
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// A backend list response, bare or wrapped.
    Snapshot { category: String, payload: Value },
    Gesture { event: MapEvent },
    Navigate { to: Coordinate, zoom: Option<u8> },
    Recenter { to: Coordinate },
    Select { id: String },
    ClearSelection,
}

/// One line of replay output.
#[derive(Debug, Serialize)]
struct FrameLine<'a> {
    step: usize,
    at_ms: f64,
    frame: &'a RenderFrame,
    updates: &'a [CameraUpdate],
}

pub fn load(path: &Path) -> Result<Scenario, ReplayError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

impl Scenario {
    /// Run every step in order, writing one JSON frame per step to `out`.
    /// Steps that fail are logged and skipped. Returns the number of steps
    /// that applied cleanly.
    pub fn replay(self, out: &mut impl Write) -> Result<usize, ReplayError> {
        let role: Role = self.profile.parse().map_err(ReplayError::Profile)?;
        let mut session = MapSession::new(ViewProfile::from_env(role), self.view)?;
        let mut source = RecordingSource::new();
        session.attach(&mut source);

        let mut applied = 0;
        for (index, step) in self.steps.into_iter().enumerate() {
            let now = step.at_ms;
            session.tick(now);
            match apply(&mut session, step.action, now) {
                Ok(()) => applied += 1,
                Err(e) => warn!(step = index, error = %e, "step skipped"),
            }

            let frame = session.frame(now);
            let updates = session.drain_updates();
            serde_json::to_writer(
                &mut *out,
                &FrameLine {
                    step: index,
                    at_ms: now,
                    frame: &frame,
                    updates: &updates,
                },
            )?;
            writeln!(out)?;
        }

        session.dispose(&mut source);
        info!(applied, "replay finished");
        Ok(applied)
    }
}

fn apply(session: &mut MapSession, action: Action, now: f64) -> Result<(), ReplayError> {
    match action {
        Action::Snapshot { category, payload } => {
            let category: Category = category.parse().map_err(MapError::InvalidInput)?;
            let report = parse_snapshot(&payload.to_string(), category)?;
            if !report.rejected.is_empty() {
                warn!(rejected = report.rejected.len(), "snapshot had unusable records");
            }
            session.replace_entities(report.entities, now);
        }
        Action::Gesture { event } => {
            session.handle_event(event, now)?;
        }
        Action::Navigate { to, zoom } => {
            session.navigate_to(to, zoom, now)?;
        }
        Action::Recenter { to } => {
            session.recenter(to, now)?;
        }
        Action::Select { id } => {
            session.select(&id, now)?;
        }
        Action::ClearSelection => session.clear_selection(),
    }
    Ok(())
}
