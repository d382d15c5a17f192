//! Manifest Domain Collector
//!
//! Implements `DomainCollector` over `PackageManifest` link filters.

use crate::domain::{LinkFilter, PackageManifest};
use crate::ports::outbound::DomainCollector;
use std::collections::BTreeSet;

/// Collects domains from browsable http/https filters.
///
/// A host is an auto-verify domain when its filter sets `auto_verify`; every
/// web filter host is a web domain. Hosts are lower-cased.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManifestDomainCollector;

impl ManifestDomainCollector {
    pub fn new() -> Self {
        Self
    }

    fn collect<F>(pkg: &PackageManifest, include: F) -> BTreeSet<String>
    where
        F: Fn(&LinkFilter) -> bool,
    {
        pkg.filters
            .iter()
            .filter(|filter| filter.handles_web() && include(filter))
            .flat_map(|filter| filter.hosts.iter())
            .map(|host| host.trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect()
    }
}

impl DomainCollector for ManifestDomainCollector {
    fn collect_auto_verify_domains(&self, pkg: &PackageManifest) -> BTreeSet<String> {
        Self::collect(pkg, |filter| filter.auto_verify)
    }

    fn collect_all_web_domains(&self, pkg: &PackageManifest) -> BTreeSet<String> {
        Self::collect(pkg, |_| true)
    }
}
