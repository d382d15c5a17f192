//! In-Memory Connection
//!
//! Implements `Connection` over an in-memory package table.
//!
//! In production, this would be backed by the package manager's settings.

use crate::domain::{PackageManifest, PackageSetting, Uid, UserId};
use crate::ports::outbound::Connection;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct InMemoryConnection {
    packages: RwLock<BTreeMap<String, PackageSetting>>,
    calling_uid: AtomicU32,
    calling_user_id: AtomicU32,
    write_requests: AtomicUsize,
}

impl InMemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or replaces a package.
    pub fn install(&self, setting: PackageSetting) {
        self.packages.write().insert(setting.name.clone(), setting);
    }

    pub fn uninstall(&self, package_name: &str) -> Option<PackageSetting> {
        self.packages.write().remove(package_name)
    }

    /// Keeps the setting but makes its manifest unresolvable.
    pub fn make_unavailable(&self, package_name: &str) {
        if let Some(setting) = self.packages.write().get_mut(package_name) {
            setting.pkg = None;
        }
    }

    /// Sets the identity reported for the next calls.
    pub fn set_caller(&self, uid: Uid, user_id: UserId) {
        self.calling_uid.store(uid, Ordering::SeqCst);
        self.calling_user_id.store(user_id, Ordering::SeqCst);
    }

    /// Number of `schedule_write_settings` calls so far.
    pub fn write_requests(&self) -> usize {
        self.write_requests.load(Ordering::SeqCst)
    }
}

impl Connection for InMemoryConnection {
    fn schedule_write_settings(&self) {
        self.write_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn calling_uid(&self) -> Uid {
        self.calling_uid.load(Ordering::SeqCst)
    }

    fn calling_user_id(&self) -> UserId {
        self.calling_user_id.load(Ordering::SeqCst)
    }

    fn package_setting_locked(&self, package_name: &str) -> Option<PackageSetting> {
        self.packages.read().get(package_name).cloned()
    }

    fn package_locked(&self, package_name: &str) -> Option<PackageManifest> {
        self.packages
            .read()
            .get(package_name)
            .and_then(|setting| setting.pkg.clone())
    }
}
