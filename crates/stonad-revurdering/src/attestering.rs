//! # Attestation Ledger
//!
//! Every decision leaving a caseworker's hands passes a second person. The
//! ledger is the append-only record of those reviews: approvals and
//! rejections in order, each naming the attestant and the instant. A
//! rejected case that is reworked and approved keeps the rejection in its
//! history.
//!
//! The maker-checker guard itself (attestant must differ from the
//! caseworker) is enforced by the aggregate's `attester` operation; the
//! ledger only records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stonad_core::Attestant;

/// Why an attestant sent the case back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Underkjennelsesgrunn {
    /// One or more entry criteria were assessed incorrectly.
    InngangsvilkaareneErFeilvurdert,
    /// The calculation is wrong.
    BeregningenErFeil,
    /// Supporting documentation is missing.
    DokumentasjonMangler,
    /// The decision letter is wrong.
    VedtaksbrevetErFeil,
    /// Some other ground, explained in the comment.
    AndreForhold,
}

/// One entry in the attestation ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attestering {
    /// The attestant approved the case for execution.
    Iverksatt {
        /// Who approved.
        attestant: Attestant,
        /// When the approval was recorded.
        tidspunkt: DateTime<Utc>,
    },
    /// The attestant sent the case back.
    Underkjent {
        /// Who rejected.
        attestant: Attestant,
        /// Structured ground for the rejection.
        grunn: Underkjennelsesgrunn,
        /// Free-text explanation for the caseworker.
        kommentar: String,
        /// When the rejection was recorded.
        tidspunkt: DateTime<Utc>,
    },
}

impl Attestering {
    /// The attestant behind the entry.
    pub fn attestant(&self) -> &Attestant {
        match self {
            Self::Iverksatt { attestant, .. } | Self::Underkjent { attestant, .. } => attestant,
        }
    }

    /// When the entry was recorded.
    pub fn tidspunkt(&self) -> DateTime<Utc> {
        match self {
            Self::Iverksatt { tidspunkt, .. } | Self::Underkjent { tidspunkt, .. } => *tidspunkt,
        }
    }

    /// Whether the entry is an approval.
    pub fn er_iverksatt(&self) -> bool {
        matches!(self, Self::Iverksatt { .. })
    }
}

/// The ordered, append-only attestation history of a case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attesteringshistorikk(Vec<Attestering>);

impl Attesteringshistorikk {
    /// An empty history.
    pub fn ny() -> Self {
        Self::default()
    }

    /// Append an entry, returning the extended history. The receiver is
    /// unchanged.
    #[must_use]
    pub fn med(&self, attestering: Attestering) -> Self {
        let mut entries = self.0.clone();
        entries.push(attestering);
        Self(entries)
    }

    /// The newest entry, which determines whether the case is currently
    /// approved or sent back.
    pub fn siste(&self) -> Option<&Attestering> {
        self.0.last()
    }

    /// All entries in append order.
    pub fn alle(&self) -> &[Attestering] {
        &self.0
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether anything has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
