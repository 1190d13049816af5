use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Gesture events reported by the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    ZoomStart,
    ZoomEnd { zoom: u8 },
    DragStart,
    DragEnd,
    /// The widget finished moving and settled on this view.
    MoveEnd { center: Coordinate, zoom: u8 },
    Click { at: Coordinate },
    DblClick { at: Coordinate },
    MouseDown,
    MouseUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    ZoomStart,
    ZoomEnd,
    DragStart,
    DragEnd,
    MoveEnd,
    Click,
    DblClick,
    MouseDown,
    MouseUp,
}

impl GestureKind {
    pub const ALL: [GestureKind; 9] = [
        GestureKind::ZoomStart,
        GestureKind::ZoomEnd,
        GestureKind::DragStart,
        GestureKind::DragEnd,
        GestureKind::MoveEnd,
        GestureKind::Click,
        GestureKind::DblClick,
        GestureKind::MouseDown,
        GestureKind::MouseUp,
    ];

    /// The DOM/widget event name.
    pub fn event_name(self) -> &'static str {
        match self {
            GestureKind::ZoomStart => "zoomstart",
            GestureKind::ZoomEnd => "zoomend",
            GestureKind::DragStart => "dragstart",
            GestureKind::DragEnd => "dragend",
            GestureKind::MoveEnd => "moveend",
            GestureKind::Click => "click",
            GestureKind::DblClick => "dblclick",
            GestureKind::MouseDown => "mousedown",
            GestureKind::MouseUp => "mouseup",
        }
    }
}

impl MapEvent {
    pub fn kind(&self) -> GestureKind {
        match self {
            MapEvent::ZoomStart => GestureKind::ZoomStart,
            MapEvent::ZoomEnd { .. } => GestureKind::ZoomEnd,
            MapEvent::DragStart => GestureKind::DragStart,
            MapEvent::DragEnd => GestureKind::DragEnd,
            MapEvent::MoveEnd { .. } => GestureKind::MoveEnd,
            MapEvent::Click { .. } => GestureKind::Click,
            MapEvent::DblClick { .. } => GestureKind::DblClick,
            MapEvent::MouseDown => GestureKind::MouseDown,
            MapEvent::MouseUp => GestureKind::MouseUp,
        }
    }

    /// Events that put the user in control of the camera.
    pub fn starts_gesture(&self) -> bool {
        matches!(
            self,
            MapEvent::ZoomStart
                | MapEvent::DragStart
                | MapEvent::MouseDown
                | MapEvent::Click { .. }
                | MapEvent::DblClick { .. }
        )
    }

    /// Coordinates carried by the event, if any.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            MapEvent::MoveEnd { center, .. } => Some(*center),
            MapEvent::Click { at } | MapEvent::DblClick { at } => Some(*at),
            _ => None,
        }
    }
}
