//! # Domain Module
//!
//! Core domain types for the Domain Verification subsystem.

pub mod entities;
pub mod errors;
pub mod persistence;
pub mod state_map;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use persistence::{PersistedPackage, PersistedSettings, PersistedUserState};
pub use state_map::StateMap;
pub use value_objects::*;
