//! # Adapters Layer (Hexagonal Architecture)
//!
//! Default implementations of the outbound port traits.

mod collector;
mod connection;
mod enforcer;
mod proxy;

pub use collector::ManifestDomainCollector;
pub use connection::InMemoryConnection;
pub use enforcer::{AllowAllEnforcer, PolicyEnforcer};
pub use proxy::{RecordingProxy, UnavailableProxy};
