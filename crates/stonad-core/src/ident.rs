//! # Identifier Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the engine. Each
//! identifier is a distinct type — you cannot pass a [`RevurderingId`]
//! where a [`VedtakId`] is expected, and a [`Saksbehandler`] is not an
//! [`Attestant`] even when the underlying ident strings are equal. The
//! maker-checker guard compares the two actor types explicitly.
//!
//! UUID-based identifiers are always valid by construction. Actor idents
//! validate non-emptiness at construction and at deserialization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for a reassessment case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevurderingId(Uuid);

impl RevurderingId {
    /// Create a new random case identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a case identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RevurderingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RevurderingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "revurdering:{}", self.0)
    }
}

/// A unique identifier for a finalized benefit decision (vedtak).
///
/// A reassessment case always references the prior decision it reassesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VedtakId(Uuid);

impl VedtakId {
    /// Create a new random decision identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a decision identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VedtakId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VedtakId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vedtak:{}", self.0)
    }
}

/// A unique identifier for a clawback warning (avkortingsvarsel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvkortingsvarselId(Uuid);

impl AvkortingsvarselId {
    /// Create a new random warning identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a warning identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AvkortingsvarselId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AvkortingsvarselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "avkortingsvarsel:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Actor identifiers (validated strings)
// ---------------------------------------------------------------------------

/// The caseworker who prepares a reassessment case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Saksbehandler(String);

impl Saksbehandler {
    /// Create a caseworker ident.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdent`] for empty or
    /// whitespace-only input.
    pub fn new(ident: impl Into<String>) -> Result<Self, ValidationError> {
        let ident = ident.into();
        if ident.trim().is_empty() {
            return Err(ValidationError::EmptyIdent(ident));
        }
        Ok(Self(ident))
    }

    /// The underlying ident string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_validating_deserialize!(Saksbehandler);

impl std::fmt::Display for Saksbehandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The approver in the maker-checker step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Attestant(String);

impl Attestant {
    /// Create an approver ident.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdent`] for empty or
    /// whitespace-only input.
    pub fn new(ident: impl Into<String>) -> Result<Self, ValidationError> {
        let ident = ident.into();
        if ident.trim().is_empty() {
            return Err(ValidationError::EmptyIdent(ident));
        }
        Ok(Self(ident))
    }

    /// The underlying ident string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this approver is the same person as the given caseworker.
    ///
    /// The maker-checker rule compares ident strings: the same person may
    /// hold both roles, but never on the same case.
    pub fn er_samme_person(&self, saksbehandler: &Saksbehandler) -> bool {
        self.0 == saksbehandler.as_str()
    }
}

impl_validating_deserialize!(Attestant);

impl std::fmt::Display for Attestant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
