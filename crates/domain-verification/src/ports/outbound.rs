//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the Domain Verification service requires the host to
//! implement. Default implementations live in `crate::adapters`.

use crate::domain::{DomainVerificationError, PackageManifest, PackageSetting, Uid, UserId};
use std::collections::BTreeSet;

/// Link to the owning package-management subsystem.
///
/// ## Lock ordering
///
/// The `*_locked` lookups are only invoked while the service lock is held.
/// The host must never call into the service while holding the lock that
/// guards its own package table, otherwise the two can deadlock.
pub trait Connection: Send + Sync {
    /// Signal that settings changed and `write_state` should eventually run.
    ///
    /// Fire-and-forget; repeated calls may be coalesced.
    fn schedule_write_settings(&self);

    /// Uid of the current caller.
    fn calling_uid(&self) -> Uid;

    /// User of the current caller.
    fn calling_user_id(&self) -> UserId;

    /// Live setting for `package_name`, if installed.
    fn package_setting_locked(&self, package_name: &str) -> Option<PackageSetting>;

    /// Live manifest for `package_name`, if it currently resolves.
    fn package_locked(&self, package_name: &str) -> Option<PackageManifest>;
}

/// Derives the domains a manifest declares.
pub trait DomainCollector: Send + Sync {
    /// Domains the package asked to have verified automatically.
    fn collect_auto_verify_domains(&self, pkg: &PackageManifest) -> BTreeSet<String>;

    /// Every web domain the package can handle, verified or not.
    fn collect_all_web_domains(&self, pkg: &PackageManifest) -> BTreeSet<String>;
}

/// Authorizes callers for the three external roles.
pub trait Enforcer: Send + Sync {
    /// Caller must be the verification agent.
    fn assert_approved_verifier(
        &self,
        calling_uid: Uid,
        proxy: &dyn DomainVerificationProxy,
    ) -> Result<(), DomainVerificationError>;

    /// Caller may read verification sets.
    fn assert_approved_querent(
        &self,
        calling_uid: Uid,
        proxy: &dyn DomainVerificationProxy,
    ) -> Result<(), DomainVerificationError>;

    /// Caller may change selections of `target_user_id`.
    fn assert_approved_user_selector(
        &self,
        calling_uid: Uid,
        calling_user_id: UserId,
        target_user_id: UserId,
    ) -> Result<(), DomainVerificationError>;
}

/// Channel to the external verification agent.
pub trait DomainVerificationProxy: Send + Sync {
    /// Ask the agent to (re-)verify the given packages.
    fn send_broadcast_for_packages(&self, package_names: &BTreeSet<String>);

    /// Forward a deferred message. Returns whether it was handled.
    fn run_message(&self, message_code: u32) -> bool;

    /// Whether `calling_uid` is the agent behind this proxy.
    fn is_caller_verifier(&self, calling_uid: Uid) -> bool;

    /// Whether a real agent is connected.
    fn is_available(&self) -> bool {
        true
    }
}
