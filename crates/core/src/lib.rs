//! Core simulation logic. Keep this crate free of IO and platform concerns.

pub mod cards;
pub mod config;
pub mod content;
pub mod damage;
pub mod entity;
pub mod environment;
pub mod events;
pub mod items;
pub mod penalty;
pub mod rng;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod state;
pub mod store;

pub use cards::*;
pub use config::*;
pub use content::*;
pub use damage::*;
pub use entity::*;
pub use environment::*;
pub use events::*;
pub use items::*;
pub use penalty::*;
pub use rng::*;
pub use scheduler::*;
pub use score::*;
pub use session::*;
pub use state::*;
pub use store::*;
