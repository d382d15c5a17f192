//! Ports module for Domain Verification
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::{DomainSet, DomainVerificationApi, DomainVerificationInternal, UserSelection};
pub use outbound::{Connection, DomainCollector, DomainVerificationProxy, Enforcer};
