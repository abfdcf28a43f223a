//! Core data models.

mod activity;
mod challenge;
mod checkin;
mod ids;
mod score;
mod window;

pub use activity::*;
pub use challenge::*;
pub use checkin::*;
pub use ids::*;
pub use score::*;
pub use window::*;
