use serde::Serialize;

use floodwatch_shared::{Coordinate, MapView};

/// A programmatic camera move from one view to another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraTransition {
    pub from: MapView,
    pub to: MapView,
    pub start_time: f64,
    pub duration: f64, // milliseconds
}

impl CameraTransition {
    pub fn new(from: MapView, to: MapView, start_time: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            start_time,
            duration,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Returns the interpolated view at `now`, or None if the transition is complete.
    /// The center eases out; zoom switches at the halfway point.
    pub fn current_view(&self, now: f64) -> Option<MapView> {
        let elapsed = now - self.start_time;
        if elapsed >= self.duration {
            return None;
        }
        if elapsed <= 0.0 {
            return Some(self.from);
        }

        let t = cubic_ease_out(elapsed / self.duration);
        let center = Coordinate {
            lat: self.from.center.lat + (self.to.center.lat - self.from.center.lat) * t,
            lng: self.from.center.lng + (self.to.center.lng - self.from.center.lng) * t,
        };
        let zoom = if t < 0.5 { self.from.zoom } else { self.to.zoom };
        Some(MapView { center, zoom })
    }
}

/// Cubic ease-out: decelerating to zero velocity.
fn cubic_ease_out(t: f64) -> f64 {
    let t = t - 1.0;
    t * t * t + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(lat: f64, lng: f64, zoom: u8) -> MapView {
        MapView::new(Coordinate { lat, lng }, zoom)
    }

    #[test]
    fn starts_at_origin_and_finishes() {
        let tr = CameraTransition::new(view(0.0, 0.0, 10), view(10.0, 20.0, 15), 100.0, 500.0);
        assert_eq!(tr.current_view(100.0), Some(view(0.0, 0.0, 10)));
        assert_eq!(tr.current_view(600.0), None);
        assert_eq!(tr.end_time(), 600.0);
    }

    #[test]
    fn eases_out_past_linear_midpoint() {
        let tr = CameraTransition::new(view(0.0, 0.0, 10), view(10.0, 20.0, 15), 0.0, 1000.0);
        let mid = tr.current_view(500.0).unwrap();
        // ease-out(0.5) = 0.875
        assert!((mid.center.lat - 8.75).abs() < 1e-9);
        assert!((mid.center.lng - 17.5).abs() < 1e-9);
        assert_eq!(mid.zoom, 15);

        let early = tr.current_view(50.0).unwrap();
        assert_eq!(early.zoom, 10);
    }

    #[test]
    fn zero_duration_is_complete_immediately() {
        let tr = CameraTransition::new(view(0.0, 0.0, 10), view(1.0, 1.0, 12), 0.0, 0.0);
        assert_eq!(tr.current_view(0.0), None);
    }
}
