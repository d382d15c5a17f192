//! Verification Agent Proxies
//!
//! `UnavailableProxy` is installed until the host connects a real agent.
//! `RecordingProxy` keeps every request in memory.

use crate::domain::Uid;
use crate::ports::outbound::DomainVerificationProxy;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use tracing::debug;

/// No agent connected. Requests are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableProxy;

impl DomainVerificationProxy for UnavailableProxy {
    fn send_broadcast_for_packages(&self, package_names: &BTreeSet<String>) {
        debug!(
            packages = package_names.len(),
            "No verification agent connected, dropping request"
        );
    }

    fn run_message(&self, _message_code: u32) -> bool {
        false
    }

    fn is_caller_verifier(&self, _calling_uid: Uid) -> bool {
        false
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// In-memory proxy that records requests.
///
/// In production, this would forward to the agent's message queue.
#[derive(Debug, Default)]
pub struct RecordingProxy {
    verifier_uid: Option<Uid>,
    broadcasts: Mutex<Vec<BTreeSet<String>>>,
    messages: Mutex<Vec<u32>>,
}

impl RecordingProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proxy whose agent runs as `uid`.
    pub fn with_verifier(uid: Uid) -> Self {
        Self {
            verifier_uid: Some(uid),
            ..Self::default()
        }
    }

    /// Every batch sent so far, oldest first.
    pub fn broadcasts(&self) -> Vec<BTreeSet<String>> {
        self.broadcasts.lock().clone()
    }

    /// Every package named in any batch, in send order.
    pub fn notified_packages(&self) -> Vec<String> {
        self.broadcasts
            .lock()
            .iter()
            .flat_map(|batch| batch.iter().cloned())
            .collect()
    }

    pub fn messages(&self) -> Vec<u32> {
        self.messages.lock().clone()
    }

    pub fn clear(&self) {
        self.broadcasts.lock().clear();
        self.messages.lock().clear();
    }
}

impl DomainVerificationProxy for RecordingProxy {
    fn send_broadcast_for_packages(&self, package_names: &BTreeSet<String>) {
        self.broadcasts.lock().push(package_names.clone());
    }

    fn run_message(&self, message_code: u32) -> bool {
        self.messages.lock().push(message_code);
        true
    }

    fn is_caller_verifier(&self, calling_uid: Uid) -> bool {
        self.verifier_uid == Some(calling_uid)
    }
}
