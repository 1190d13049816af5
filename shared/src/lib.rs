pub mod entity;
pub mod error;
pub mod events;
pub mod geo;

pub use entity::*;
pub use error::{MapError, Result};
pub use events::*;
pub use geo::*;
