//! Value objects for the Domain Verification subsystem.
//!
//! `VerificationState` is the lifecycle tag attached to a (package, domain)
//! pair. `DomainSetId` is the opaque identity token bound to one package's
//! live state.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

/// Device user identifier.
pub type UserId = u32;

/// Calling process uid, as reported by the host.
pub type Uid = u32;

/// First code available to verifier-defined states.
pub const FIRST_VERIFIER_DEFINED: i32 = 0b100_0000_0000;

/// Verification state of a single (package, domain) pair.
///
/// ```text
/// NO_RESPONSE ──verifier──→ SUCCESS | verifier-defined
///      │                         │
///      └──legacy──→ MIGRATED     └──upgrade──→ carried (SUCCESS) / cleared (other)
///
/// linked app ──→ APPROVED (final)      backup restore ──→ RESTORED (final)
/// ```
///
/// Equality, ordering and every predicate go through the wire code, so a
/// tuple variant carrying a named code behaves as the named state.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum VerificationState {
    /// No response recorded yet.
    #[default]
    NoResponse,
    /// The verification agent confirmed the domain.
    Success,
    /// Approved by platform policy. Never externally modifiable.
    Approved,
    /// Carried over from a legacy "always open" preference, pending re-verification.
    Migrated,
    /// Restored from a backup.
    Restored,
    /// Platform-reserved code that has no named meaning here.
    Reserved(i32),
    /// Code chosen by the verification agent, `>= FIRST_VERIFIER_DEFINED`.
    VerifierDefined(i32),
}

impl VerificationState {
    /// Wire code of this state.
    pub fn code(self) -> i32 {
        match self {
            VerificationState::NoResponse => 0,
            VerificationState::Success => 1,
            VerificationState::Approved => 2,
            VerificationState::Migrated => 4,
            VerificationState::Restored => 5,
            VerificationState::Reserved(code) | VerificationState::VerifierDefined(code) => code,
        }
    }

    /// Canonical variant for this state's code.
    pub fn normalized(self) -> Self {
        Self::from(self.code())
    }

    /// Whether an external verifier is allowed to write this state.
    pub fn is_settable_by_verifier(self) -> bool {
        let code = self.code();
        code == VerificationState::Success.code() || code >= FIRST_VERIFIER_DEFINED
    }

    /// Whether a verifier write may overwrite this state.
    ///
    /// SUCCESS, RESTORED, MIGRATED and APPROVED are final until the package
    /// is reinstalled or migrated.
    pub fn is_modifiable(self) -> bool {
        !matches!(
            self.normalized(),
            VerificationState::Success
                | VerificationState::Restored
                | VerificationState::Migrated
                | VerificationState::Approved
        )
    }

    /// Whether this state survives a package upgrade.
    pub fn survives_migration(self) -> bool {
        matches!(
            self.normalized(),
            VerificationState::Success | VerificationState::Restored | VerificationState::Migrated
        )
    }

    /// Whether this state is trusted enough to be restored from a backup.
    pub fn is_restorable(self) -> bool {
        matches!(
            self.normalized(),
            VerificationState::Success | VerificationState::Restored
        )
    }
}

impl PartialEq for VerificationState {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for VerificationState {}

impl Hash for VerificationState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl PartialOrd for VerificationState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VerificationState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(&other.code())
    }
}

impl From<i32> for VerificationState {
    fn from(code: i32) -> Self {
        match code {
            0 => VerificationState::NoResponse,
            1 => VerificationState::Success,
            2 => VerificationState::Approved,
            4 => VerificationState::Migrated,
            5 => VerificationState::Restored,
            c if c >= FIRST_VERIFIER_DEFINED => VerificationState::VerifierDefined(c),
            c => VerificationState::Reserved(c),
        }
    }
}

impl From<VerificationState> for i32 {
    fn from(state: VerificationState) -> Self {
        state.code()
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.normalized() {
            VerificationState::NoResponse => write!(f, "no_response"),
            VerificationState::Success => write!(f, "success"),
            VerificationState::Approved => write!(f, "approved"),
            VerificationState::Migrated => write!(f, "migrated"),
            VerificationState::Restored => write!(f, "restored"),
            VerificationState::Reserved(code) => write!(f, "reserved({})", code),
            VerificationState::VerifierDefined(code) => write!(f, "verifier_defined({})", code),
        }
    }
}

/// Identity token bound to one package's live state.
///
/// Regenerated on every install, stable across benign updates, replaced on
/// migration. The nil UUID stands for "no token supplied".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSetId(Uuid);

impl DomainSetId {
    /// Creates a random token.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The absent token.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the absent token.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DomainSetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for DomainSetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for DomainSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role a caller must hold for an external operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallerRole {
    /// The domain verification agent.
    Verifier,
    /// A reader of verification sets.
    Querent,
    /// A caller changing per-user link selections.
    UserSelector,
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerRole::Verifier => write!(f, "verifier"),
            CallerRole::Querent => write!(f, "querent"),
            CallerRole::UserSelector => write!(f, "user selector"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip_for_named_states() {
        for state in [
            VerificationState::NoResponse,
            VerificationState::Success,
            VerificationState::Approved,
            VerificationState::Migrated,
            VerificationState::Restored,
        ] {
            assert_eq!(VerificationState::from(state.code()), state);
        }
    }

    #[test]
    fn test_verifier_defined_threshold() {
        assert_eq!(
            VerificationState::from(FIRST_VERIFIER_DEFINED),
            VerificationState::VerifierDefined(FIRST_VERIFIER_DEFINED)
        );
        assert_eq!(
            VerificationState::from(FIRST_VERIFIER_DEFINED - 1),
            VerificationState::Reserved(FIRST_VERIFIER_DEFINED - 1)
        );
    }

    #[test]
    fn test_final_states_are_not_modifiable() {
        assert!(!VerificationState::Success.is_modifiable());
        assert!(!VerificationState::Restored.is_modifiable());
        assert!(!VerificationState::Migrated.is_modifiable());
        assert!(!VerificationState::Approved.is_modifiable());
        assert!(VerificationState::NoResponse.is_modifiable());
        assert!(VerificationState::VerifierDefined(2048).is_modifiable());
    }

    #[test]
    fn test_only_success_and_verifier_codes_are_settable() {
        assert!(VerificationState::Success.is_settable_by_verifier());
        assert!(VerificationState::from(FIRST_VERIFIER_DEFINED).is_settable_by_verifier());
        assert!(!VerificationState::NoResponse.is_settable_by_verifier());
        assert!(!VerificationState::Approved.is_settable_by_verifier());
        assert!(!VerificationState::Reserved(3).is_settable_by_verifier());
    }

    #[test]
    fn test_mislabelled_variants_follow_their_code() {
        let approved = VerificationState::VerifierDefined(2);
        assert!(!approved.is_settable_by_verifier());
        assert!(!approved.is_modifiable());
        assert_eq!(approved, VerificationState::Approved);
        assert_eq!(approved.normalized(), VerificationState::Approved);
        assert_eq!(approved.to_string(), "approved");

        assert!(!VerificationState::VerifierDefined(0).is_settable_by_verifier());
        assert!(VerificationState::VerifierDefined(1).survives_migration());
        assert!(VerificationState::Reserved(1).is_restorable());

        let high = VerificationState::Reserved(2000);
        assert!(high.is_settable_by_verifier());
        assert!(matches!(high.normalized(), VerificationState::VerifierDefined(2000)));
    }

    #[test]
    fn test_serde_uses_wire_code() {
        let json = serde_json::to_string(&VerificationState::Restored).unwrap();
        assert_eq!(json, "5");
        let back: VerificationState = serde_json::from_str("1025").unwrap();
        assert_eq!(back, VerificationState::VerifierDefined(1025));
    }

    #[test]
    fn test_domain_set_id_nil_and_parse() {
        assert!(DomainSetId::nil().is_nil());
        let id = DomainSetId::new_random();
        assert!(!id.is_nil());
        let parsed: DomainSetId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
