//! Domain models for the care office back end.

mod activity;
mod compliance;
mod contacts;
mod documents;
mod entity;
mod funding;
mod ids;
mod plans;
mod record;
mod roster;

pub use activity::*;
pub use compliance::*;
pub use contacts::*;
pub use documents::*;
pub use entity::*;
pub use funding::*;
pub use ids::*;
pub use plans::*;
pub use record::*;
pub use roster::*;
