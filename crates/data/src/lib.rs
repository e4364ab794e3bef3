//! Loading session configuration and preset pools from JSON assets.

pub mod load;
pub mod schema;

pub use load::*;
pub use schema::*;
