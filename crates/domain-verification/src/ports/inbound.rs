//! # Inbound Ports (Driving Ports / API)
//!
//! `DomainVerificationApi` is the role-checked surface exposed to external
//! callers. `DomainVerificationInternal` is called by the owning
//! package-management subsystem and is trusted.

use crate::domain::{
    DomainSetId, DomainVerificationError, PackageSetting, UserId, VerificationState,
};
use crate::ports::outbound::DomainVerificationProxy;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::sync::Arc;

/// Immutable snapshot of a package's auto-verify domains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainSet {
    pub id: DomainSetId,
    pub package_name: String,
    pub host_to_state: BTreeMap<String, VerificationState>,
}

/// Immutable snapshot of one user's link selection for a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSelection {
    pub id: DomainSetId,
    pub package_name: String,
    pub user_id: UserId,
    /// Verified links open in the app for this user.
    pub open_verified_links: bool,
    /// Every declared web domain → whether the user enabled it.
    pub host_to_enabled: BTreeMap<String, bool>,
}

/// External, role-checked operations.
pub trait DomainVerificationApi: Send + Sync {
    /// Packages that declare auto-verify domains. Verifier only.
    fn list_verified_package_names(&self) -> Result<Vec<String>, DomainVerificationError>;

    /// Current verification set of `package_name`. Querent only.
    ///
    /// `Ok(None)` when the package has no state or no auto-verify domains.
    fn get_domain_set(&self, package_name: &str)
        -> Result<Option<DomainSet>, DomainVerificationError>;

    /// Records the verifier's answer for `domains`. Verifier only.
    ///
    /// Domains already in a final state are skipped. Returns the number of
    /// domains actually modified.
    fn set_verification_state(
        &self,
        id: DomainSetId,
        domains: &BTreeSet<String>,
        state: VerificationState,
    ) -> Result<usize, DomainVerificationError>;

    /// Allows or disallows in-app link handling for `user_id`.
    fn set_link_handling_allowed(
        &self,
        package_name: &str,
        allowed: bool,
        user_id: UserId,
    ) -> Result<(), DomainVerificationError>;

    /// Enables or disables individual hosts for `user_id`.
    fn set_user_selection(
        &self,
        id: DomainSetId,
        domains: &BTreeSet<String>,
        enabled: bool,
        user_id: UserId,
    ) -> Result<(), DomainVerificationError>;

    /// Selection of `user_id` for `package_name`.
    fn get_user_selection(
        &self,
        package_name: &str,
        user_id: UserId,
    ) -> Result<Option<UserSelection>, DomainVerificationError>;
}

/// Trusted lifecycle, persistence and configuration operations.
pub trait DomainVerificationInternal: Send + Sync {
    /// A token no live, pending or restored state uses.
    fn generate_new_id(&self) -> DomainSetId;

    /// Attaches state for a package that became known to the system.
    fn add_package(&self, setting: &PackageSetting);

    /// Moves state from the old install of a package to its update.
    fn migrate_package(&self, old_setting: &PackageSetting, new_setting: &PackageSetting);

    /// Drops all state of an uninstalled package.
    fn remove_package(&self, package_name: &str);

    /// Drops one user's selections from every package.
    fn remove_user(&self, user_id: UserId);

    /// Serializes all state to `sink`.
    fn write_state(&self, sink: &mut dyn Write) -> Result<(), DomainVerificationError>;

    /// Loads state persisted by `write_state`, typically at boot.
    fn read_state(&self, source: &mut dyn Read) -> Result<(), DomainVerificationError>;

    /// Merges state from a backup.
    fn restore_state(&self, source: &mut dyn Read) -> Result<(), DomainVerificationError>;

    /// Replaces the verification agent channel.
    fn set_proxy(&self, proxy: Arc<dyn DomainVerificationProxy>);
}
