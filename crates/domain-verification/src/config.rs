//! Configuration for the Domain Verification Subsystem

use crate::domain::Uid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;

/// Uid of the root user.
pub const ROOT_UID: Uid = 0;

/// Uid of the system server.
pub const SYSTEM_UID: Uid = 1000;

/// Domain verification configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainVerificationConfig {
    /// Packages whose auto-verify domains are approved by platform policy.
    pub linked_apps: BTreeSet<String>,
    /// Uids trusted for every caller role.
    pub system_uids: BTreeSet<Uid>,
}

impl Default for DomainVerificationConfig {
    fn default() -> Self {
        Self {
            linked_apps: BTreeSet::new(),
            system_uids: [ROOT_UID, SYSTEM_UID].into_iter().collect(),
        }
    }
}

impl DomainVerificationConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DV_LINKED_APPS`: comma-separated package names (default: none)
    /// - `DV_SYSTEM_UIDS`: comma-separated uids (default: 0,1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            linked_apps: env::var("DV_LINKED_APPS")
                .map(|v| parse_list(&v).map(str::to_string).collect())
                .unwrap_or(defaults.linked_apps),

            system_uids: env::var("DV_SYSTEM_UIDS")
                .ok()
                .map(|v| parse_list(&v).filter_map(|uid| uid.parse().ok()).collect())
                .filter(|uids: &BTreeSet<Uid>| !uids.is_empty())
                .unwrap_or(defaults.system_uids),
        }
    }

    /// Adds a platform-linked package.
    pub fn with_linked_app(mut self, package_name: impl Into<String>) -> Self {
        self.linked_apps.insert(package_name.into());
        self
    }

    pub fn is_linked_app(&self, package_name: &str) -> bool {
        self.linked_apps.contains(package_name)
    }
}

fn parse_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DomainVerificationConfig::default();
        assert!(config.linked_apps.is_empty());
        assert!(config.system_uids.contains(&ROOT_UID));
        assert!(config.system_uids.contains(&SYSTEM_UID));
        assert!(!config.system_uids.contains(&10_001));
    }

    #[test]
    fn test_with_linked_app() {
        let config = DomainVerificationConfig::default().with_linked_app("com.platform.maps");
        assert!(config.is_linked_app("com.platform.maps"));
        assert!(!config.is_linked_app("com.other"));
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        let items: Vec<_> = parse_list(" a.b , ,c.d,").collect();
        assert_eq!(items, vec!["a.b", "c.d"]);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = DomainVerificationConfig::default().with_linked_app("com.platform.maps");
        let json = serde_json::to_string(&config).unwrap();
        let back: DomainVerificationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
