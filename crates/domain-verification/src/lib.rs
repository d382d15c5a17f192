//! # Domain Verification
//!
//! App-links trust registry.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Tracks, per installed package and per device user, which web domains the
//! package may open directly without a disambiguation prompt:
//! - Verification state per (package, domain), written by an external agent
//! - Per-user link selection overrides
//! - Migration of state across package upgrades
//! - Persistence and backup restore of all state
//!
//! ## Verification States
//!
//! | State | Code | Verifier may overwrite | Survives upgrade |
//! |-------|------|------------------------|------------------|
//! | NO_RESPONSE | 0 | yes | no |
//! | SUCCESS | 1 | no | yes |
//! | APPROVED | 2 | no | no (re-applied by policy) |
//! | MIGRATED | 4 | no | yes |
//! | RESTORED | 5 | no | yes |
//! | verifier-defined | >= 1024 | yes | no |
//!
//! ## Module Structure
//!
//! ```text
//! domain-verification/
//! ├── domain/          # VerificationState, DomainSetId, PackageState, StateMap, errors
//! ├── algorithms/      # Upgrade carry rules, backup merge rules
//! ├── ports/           # API traits + collaborator traits
//! ├── adapters/        # Default collector, enforcers, proxies, in-memory connection
//! ├── service/         # DomainVerificationService
//! ├── settings.rs      # Pending and restored state
//! ├── config.rs        # DomainVerificationConfig
//! └── telemetry.rs     # tracing subscriber bootstrap
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod settings;
pub mod telemetry;

// Re-exports
pub use adapters::{
    AllowAllEnforcer, InMemoryConnection, ManifestDomainCollector, PolicyEnforcer,
    RecordingProxy, UnavailableProxy,
};
pub use config::DomainVerificationConfig;
pub use domain::{
    CallerRole, DomainSetId, DomainVerificationError, InvalidDomainSetReason, LegacyLinkStatus,
    LegacyUserState, LegacyVerificationInfo, LinkFilter, PackageManifest, PackageSetting,
    PackageState, PersistenceError, StateMap, Uid, UserId, UserSelectionState,
    VerificationState, FIRST_VERIFIER_DEFINED,
};
pub use ports::{
    Connection, DomainCollector, DomainSet, DomainVerificationApi, DomainVerificationInternal,
    DomainVerificationProxy, Enforcer, UserSelection,
};
pub use service::{DomainVerificationDependencies, DomainVerificationService};
pub use settings::{AttachSource, DomainVerificationSettings};
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
