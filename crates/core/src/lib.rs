//! Weighted selection engine. Keep this crate free of IO and platform concerns.

pub mod config;
pub mod draft;
pub mod error;
pub mod events;
pub mod lottery;
pub mod pool;
pub mod rng;
pub mod session;

pub use config::*;
pub use draft::*;
pub use error::*;
pub use events::*;
pub use lottery::*;
pub use pool::*;
pub use rng::*;
pub use session::*;
