//! Value types shared between the loyalty points engine and server.
mod points;

pub mod helpers;
pub mod op;
mod secret;

pub use points::{Points, PointsConversionError, POINTS_SCALE};
pub use secret::Secret;
