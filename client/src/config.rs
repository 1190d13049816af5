use std::str::FromStr;

pub const DEFAULT_QUIET_DELAY_MS: f64 = 1000.0;
pub const DEFAULT_ZOOM_SETTLE_MS: f64 = 3000.0;
pub const DEFAULT_NAVIGATION_DEBOUNCE_MS: f64 = 150.0;
pub const DEFAULT_MOVE_ANIMATION_MS: f64 = 600.0;
pub const DEFAULT_CLOSE_UP_ZOOM: u8 = 15;
pub const MIN_ZOOM: u8 = 3;
pub const MAX_ZOOM: u8 = 18;

pub const DEFAULT_NATIVE_ZOOM: u8 = 12;
pub const COARSE_RADIUS_DEG: f64 = 0.5; // zoom < 8
pub const MEDIUM_RADIUS_DEG: f64 = 0.1; // zoom < 10
pub const FINE_RADIUS_DEG: f64 = 0.03;
pub const DEFAULT_GRID_THRESHOLD: usize = 256;

pub const DEFAULT_ROUTE_STEPS: usize = 20;

/// Read a positive number from the environment, falling back when unset or unparsable.
fn env_positive<T>(key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .filter(|value| *value > T::default())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        let normalized = value.trim().to_ascii_lowercase();
        matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
    })
}

/// Timing and zoom limits for the camera state machine. All durations in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    /// Quiet period after a pan/click before routine recentring is allowed again.
    pub quiet_delay_ms: f64,
    /// Grace period after a zoom gesture during which the user's zoom is authoritative.
    pub zoom_settle_ms: f64,
    /// Window in which rapid forced navigations coalesce; only the last one is applied.
    pub navigation_debounce_ms: f64,
    /// Duration of programmatic camera moves. 0 jumps without animating.
    pub move_animation_ms: f64,
    pub close_up_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            quiet_delay_ms: DEFAULT_QUIET_DELAY_MS,
            zoom_settle_ms: DEFAULT_ZOOM_SETTLE_MS,
            navigation_debounce_ms: DEFAULT_NAVIGATION_DEBOUNCE_MS,
            move_animation_ms: DEFAULT_MOVE_ANIMATION_MS,
            close_up_zoom: DEFAULT_CLOSE_UP_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl ViewportConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay any `FLOODWATCH_*` timing set in the environment onto `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_positive("FLOODWATCH_QUIET_DELAY_MS") {
            self.quiet_delay_ms = v;
        }
        if let Some(v) = env_positive("FLOODWATCH_ZOOM_SETTLE_MS") {
            self.zoom_settle_ms = v;
        }
        if let Some(v) = env_positive("FLOODWATCH_NAVIGATION_DEBOUNCE_MS") {
            self.navigation_debounce_ms = v;
        }
        if let Some(v) = env_positive("FLOODWATCH_MOVE_ANIMATION_MS") {
            self.move_animation_ms = v;
        }
        if let Some(v) = env_positive("FLOODWATCH_CLOSE_UP_ZOOM") {
            self.close_up_zoom = v;
        }
        self.close_up_zoom = self.clamp_zoom(self.close_up_zoom);
        self
    }

    pub fn clamp_zoom(&self, zoom: u8) -> u8 {
        zoom.clamp(self.min_zoom, self.max_zoom.max(self.min_zoom))
    }
}

/// One row of the merge-radius table: below `below_zoom`, merge within `radius_deg`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusBand {
    pub below_zoom: u8,
    pub radius_deg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// At or above this zoom every entity is shown on its own.
    pub native_zoom: u8,
    /// Ordered by ascending `below_zoom`; the first matching band wins.
    pub bands: Vec<RadiusBand>,
    /// Radius for zooms not covered by any band (but still below `native_zoom`).
    pub fine_radius_deg: f64,
    /// Inputs larger than this use the bucket grid for neighbour candidates.
    pub grid_threshold: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            native_zoom: DEFAULT_NATIVE_ZOOM,
            bands: vec![
                RadiusBand {
                    below_zoom: 8,
                    radius_deg: COARSE_RADIUS_DEG,
                },
                RadiusBand {
                    below_zoom: 10,
                    radius_deg: MEDIUM_RADIUS_DEG,
                },
            ],
            fine_radius_deg: FINE_RADIUS_DEG,
            grid_threshold: DEFAULT_GRID_THRESHOLD,
        }
    }
}

impl ClusterConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_positive("FLOODWATCH_NATIVE_ZOOM") {
            config.native_zoom = v;
        }
        if let Some(v) = env_positive("FLOODWATCH_CLUSTER_GRID_THRESHOLD") {
            config.grid_threshold = v;
        }
        config
    }

    pub fn radius_for_zoom(&self, zoom: u8) -> f64 {
        self.bands
            .iter()
            .find(|band| zoom < band.below_zoom)
            .map(|band| band.radius_deg)
            .unwrap_or(self.fine_radius_deg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    /// Interpolation steps; a route has `steps + 1` points.
    pub steps: usize,
    /// Route to the nearest shelter that can still take people in, when there is one.
    pub prefer_available: bool,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_ROUTE_STEPS,
            prefer_available: true,
        }
    }
}

impl RouteConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_positive::<usize>("FLOODWATCH_ROUTE_STEPS") {
            config.steps = v.max(2);
        }
        if let Some(v) = env_flag("FLOODWATCH_ROUTE_PREFER_AVAILABLE") {
            config.prefer_available = v;
        }
        config
    }
}
