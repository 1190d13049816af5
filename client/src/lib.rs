pub mod animation;
pub mod cluster;
pub mod config;
pub mod geo;
pub mod gestures;
pub mod ingest;
pub mod profile;
pub mod routing;
pub mod session;
pub mod spatial;
pub mod timers;
pub mod viewport;

pub use cluster::{Cluster, Marker, MarkerClusterer};
pub use config::{ClusterConfig, RouteConfig, ViewportConfig};
pub use gestures::{GestureSource, ListenerId, RecordingSource};
pub use ingest::{IngestReport, RawEntity, parse_snapshot};
pub use profile::{Role, ViewProfile};
pub use routing::{NearestShelterRouter, Route};
pub use session::{MapSession, RenderFrame};
pub use viewport::{CameraUpdate, InteractionState, MoveOptions, MoveOutcome, ViewportController};
