use serde::Serialize;
use tracing::{debug, warn};

use floodwatch_shared::{Coordinate, MapError, MapEvent, MapView};

use crate::animation::CameraTransition;
use crate::config::ViewportConfig;
use crate::gestures::{GestureSource, Subscriptions};
use crate::timers::{Fired, TimerKind, TimerQueue};

/// Centers closer than this (degrees) count as the same point.
const CENTER_EPSILON_DEG: f64 = 1e-7;

/// Who currently owns the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    /// Nobody; routine recentring may move the camera.
    Idle,
    /// The user is dragging, zooming or clicking.
    UserActive,
    /// Just after a zoom gesture; the user's zoom is authoritative.
    SettlingAfterZoom,
    /// A camera move issued by the core is in flight.
    ProgrammaticMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOptions {
    /// Explicit navigation: overrides any interaction state.
    pub force: bool,
    /// Zoom for forced moves; ignored for routine ones.
    pub zoom: Option<u8>,
}

impl MoveOptions {
    /// A "new data arrived, recenter if appropriate" request.
    pub fn routine() -> Self {
        Self::default()
    }

    /// Jump to a point at the close-up zoom.
    pub fn forced() -> Self {
        Self {
            force: true,
            zoom: None,
        }
    }

    pub fn forced_at(zoom: u8) -> Self {
        Self {
            force: true,
            zoom: Some(zoom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// The camera was commanded to this view.
    Applied(MapView),
    /// A forced move inside the navigation debounce window; it is applied when
    /// the window closes unless a later forced move replaces it.
    Deferred,
    /// A routine move refused because the camera is not idle.
    Dropped(InteractionState),
    /// A routine move to where the camera already is.
    Unchanged,
    /// The controller has been disposed.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveCause {
    Navigation,
    Recenter,
}

/// A camera command for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraUpdate {
    pub view: MapView,
    pub cause: MoveCause,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<CameraTransition>,
}

/// Arbitrates between user gestures and programmatic camera moves.
///
/// Time is supplied by the caller in milliseconds. Every entry point first
/// fires the timers that fell due before `now`, so transitions are applied in
/// deadline order regardless of how often the caller ticks.
pub struct ViewportController {
    config: ViewportConfig,
    view: MapView,
    state: InteractionState,
    zooming: bool,
    /// A drag, press or zoom has started and its end event has not arrived.
    gesture_open: bool,
    preferred_zoom: Option<u8>,
    last_applied_center: Option<Coordinate>,
    held_navigation: Option<MapView>,
    transition: Option<CameraTransition>,
    timers: TimerQueue,
    updates: Vec<CameraUpdate>,
    subscriptions: Subscriptions,
    disposed: bool,
}

impl ViewportController {
    pub fn new(config: ViewportConfig, initial: MapView) -> Result<Self, MapError> {
        initial.center.validate()?;
        let view = MapView::new(initial.center, config.clamp_zoom(initial.zoom));
        Ok(Self {
            config,
            view,
            state: InteractionState::Idle,
            zooming: false,
            gesture_open: false,
            preferred_zoom: None,
            last_applied_center: None,
            held_navigation: None,
            transition: None,
            timers: TimerQueue::new(),
            updates: Vec::new(),
            subscriptions: Subscriptions::default(),
            disposed: false,
        })
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// The view the camera is at or heading to.
    pub fn view(&self) -> MapView {
        self.view
    }

    /// Where the camera is at `now`, mid-animation included.
    pub fn camera_at(&self, now: f64) -> MapView {
        self.transition
            .and_then(|tr| tr.current_view(now))
            .unwrap_or(self.view)
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn preferred_zoom(&self) -> Option<u8> {
        self.preferred_zoom
    }

    pub fn last_applied_center(&self) -> Option<Coordinate> {
        self.last_applied_center
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    /// Camera commands emitted since the last drain, oldest first.
    pub fn drain_updates(&mut self) -> Vec<CameraUpdate> {
        std::mem::take(&mut self.updates)
    }

    /// Subscribe to every gesture the controller reacts to.
    pub fn attach<S: GestureSource + ?Sized>(&mut self, source: &mut S) -> usize {
        if self.disposed {
            return 0;
        }
        self.subscriptions.attach(source)
    }

    /// Release every gesture handler, cancel all pending timers and stop
    /// reacting to input. Idempotent.
    pub fn dispose<S: GestureSource + ?Sized>(&mut self, source: &mut S) {
        let released = self.subscriptions.detach(source);
        let cancelled = self.timers.cancel_all();
        self.held_navigation = None;
        self.transition = None;
        self.zooming = false;
        self.gesture_open = false;
        self.state = InteractionState::Idle;
        if !self.disposed {
            debug!(released, cancelled, "viewport controller disposed");
        }
        self.disposed = true;
    }

    /// Fire every timer due at or before `now`. Returns how many fired.
    pub fn tick(&mut self, now: f64) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(now) {
            fired += 1;
            self.on_timer(timer);
        }
        fired
    }

    /// Feed one gesture event. Returns the selected point for clicks.
    ///
    /// Events carrying a malformed coordinate are rejected before anything
    /// changes.
    pub fn handle_event(
        &mut self,
        event: MapEvent,
        now: f64,
    ) -> Result<Option<Coordinate>, MapError> {
        if let Some(c) = event.coordinate() {
            c.validate()?;
        }
        if self.disposed {
            return Ok(None);
        }
        self.tick(now);
        debug!(event = event.kind().event_name(), state = ?self.state, "gesture");

        if event.starts_gesture() {
            self.begin_gesture(event);
        }
        match event {
            MapEvent::ZoomStart | MapEvent::DragStart | MapEvent::MouseDown => {}
            MapEvent::Click { at } | MapEvent::DblClick { at } => {
                // No end event follows a click, so the quiet period starts now.
                self.timers
                    .schedule(TimerKind::GestureQuiet, now, self.config.quiet_delay_ms);
                return Ok(Some(at));
            }
            MapEvent::ZoomEnd { zoom } => {
                let zoom = self.config.clamp_zoom(zoom);
                self.zooming = false;
                self.gesture_open = false;
                self.view.zoom = zoom;
                self.preferred_zoom = Some(zoom);
                self.timers.cancel(TimerKind::GestureQuiet);
                self.timers.cancel(TimerKind::MoveSettle);
                self.transition = None;
                self.set_state(InteractionState::SettlingAfterZoom);
                self.timers
                    .schedule(TimerKind::ZoomSettle, now, self.config.zoom_settle_ms);
            }
            MapEvent::DragEnd | MapEvent::MouseUp => {
                self.gesture_open = false;
                self.end_gesture(now);
            }
            MapEvent::MoveEnd { center, zoom } => {
                let zoom = self.config.clamp_zoom(zoom);
                self.view = MapView::new(center, zoom);
                if self.state == InteractionState::ProgrammaticMove && !self.zooming {
                    // Landed before the animation timer fired.
                    self.timers.cancel(TimerKind::MoveSettle);
                    self.transition = None;
                    if self.held_navigation.is_none() {
                        self.settle();
                    }
                } else {
                    if self.preferred_zoom.is_some() {
                        self.preferred_zoom = Some(zoom);
                    }
                    self.end_gesture(now);
                }
            }
        }
        Ok(None)
    }

    /// Ask for the camera to move to `target`.
    ///
    /// Forced moves always win and reset gesture bookkeeping. Routine moves
    /// only apply while idle and never change zoom.
    pub fn request_move(
        &mut self,
        target: Coordinate,
        opts: MoveOptions,
        now: f64,
    ) -> Result<MoveOutcome, MapError> {
        target.validate()?;
        if self.disposed {
            return Ok(MoveOutcome::Ignored);
        }
        self.tick(now);

        if opts.force {
            Ok(self.navigate(target, opts.zoom, now))
        } else {
            Ok(self.recenter(target, now))
        }
    }

    fn navigate(&mut self, target: Coordinate, zoom: Option<u8>, now: f64) -> MoveOutcome {
        let zoom = self
            .config
            .clamp_zoom(zoom.unwrap_or(self.config.close_up_zoom));
        let view = MapView::new(target, zoom);

        self.timers.cancel(TimerKind::GestureQuiet);
        self.timers.cancel(TimerKind::ZoomSettle);
        self.zooming = false;
        self.gesture_open = false;
        self.preferred_zoom = None;

        if self.timers.is_pending(TimerKind::NavigationWindow) {
            if let Some(superseded) = self.held_navigation.replace(view) {
                debug!(?superseded, "forced move superseded before it was applied");
            }
            self.set_state(InteractionState::ProgrammaticMove);
            return MoveOutcome::Deferred;
        }

        self.apply(view, MoveCause::Navigation, now);
        if self.config.navigation_debounce_ms > 0.0 {
            self.timers.schedule(
                TimerKind::NavigationWindow,
                now,
                self.config.navigation_debounce_ms,
            );
        }
        MoveOutcome::Applied(view)
    }

    fn recenter(&mut self, target: Coordinate, now: f64) -> MoveOutcome {
        if self.state != InteractionState::Idle || self.held_navigation.is_some() {
            debug!(state = ?self.state, "routine recenter dropped");
            return MoveOutcome::Dropped(self.state);
        }
        if self.view.center.approx_eq(&target, CENTER_EPSILON_DEG) {
            return MoveOutcome::Unchanged;
        }
        let zoom = self.preferred_zoom.unwrap_or(self.view.zoom);
        let view = MapView::new(target, zoom);
        self.apply(view, MoveCause::Recenter, now);
        MoveOutcome::Applied(view)
    }

    fn apply(&mut self, view: MapView, cause: MoveCause, now: f64) {
        let from = self.camera_at(now);
        let transition = (self.config.move_animation_ms > 0.0)
            .then(|| CameraTransition::new(from, view, now, self.config.move_animation_ms));

        self.view = view;
        self.last_applied_center = Some(view.center);
        self.transition = transition;
        self.updates.push(CameraUpdate {
            view,
            cause,
            transition,
        });

        if transition.is_some() {
            self.set_state(InteractionState::ProgrammaticMove);
            self.timers
                .schedule(TimerKind::MoveSettle, now, self.config.move_animation_ms);
        } else {
            self.timers.cancel(TimerKind::MoveSettle);
            self.settle();
        }
        debug!(?cause, lat = view.center.lat, lng = view.center.lng, zoom = view.zoom, "camera moved");
    }

    fn begin_gesture(&mut self, event: MapEvent) {
        match event {
            MapEvent::ZoomStart => {
                self.zooming = true;
                self.gesture_open = true;
            }
            MapEvent::DragStart | MapEvent::MouseDown => {
                // A lost zoomend must not keep the quiet timer from ever starting.
                self.zooming = false;
                self.gesture_open = true;
            }
            _ => self.zooming = false,
        }
        self.timers.cancel(TimerKind::GestureQuiet);
        self.timers.cancel(TimerKind::ZoomSettle);
        self.timers.cancel(TimerKind::MoveSettle);
        if self.transition.take().is_some() {
            debug!("camera animation interrupted by user");
        }
        self.set_state(InteractionState::UserActive);
    }

    fn end_gesture(&mut self, now: f64) {
        if self.zooming || self.gesture_open || self.state != InteractionState::UserActive {
            return;
        }
        self.timers
            .schedule(TimerKind::GestureQuiet, now, self.config.quiet_delay_ms);
    }

    fn on_timer(&mut self, timer: Fired) {
        match timer.kind {
            TimerKind::GestureQuiet => {
                if self.state == InteractionState::UserActive && !self.gesture_open {
                    self.set_state(InteractionState::Idle);
                }
            }
            TimerKind::ZoomSettle => {
                if self.state == InteractionState::SettlingAfterZoom {
                    self.set_state(InteractionState::Idle);
                }
            }
            TimerKind::MoveSettle => {
                self.transition = None;
                if self.state == InteractionState::ProgrammaticMove {
                    self.settle();
                }
            }
            TimerKind::NavigationWindow => {
                if let Some(view) = self.held_navigation.take() {
                    self.apply(view, MoveCause::Navigation, timer.due_ms);
                    self.timers.schedule(
                        TimerKind::NavigationWindow,
                        timer.due_ms,
                        self.config.navigation_debounce_ms,
                    );
                }
            }
        }
    }

    /// A programmatic move is over. The camera goes back to the user if they
    /// are still mid-gesture; their end event then starts the quiet timer.
    fn settle(&mut self) {
        if self.gesture_open {
            self.set_state(InteractionState::UserActive);
        } else {
            self.set_state(InteractionState::Idle);
        }
    }

    fn set_state(&mut self, next: InteractionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "interaction state");
            self.state = next;
        }
    }
}

impl Drop for ViewportController {
    fn drop(&mut self) {
        if self.subscriptions.is_attached() {
            warn!(
                listeners = self.subscriptions.len(),
                "viewport controller dropped without dispose; gesture listeners leaked"
            );
        }
    }
}
