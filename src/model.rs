//! # Data Model
//!
//! Core data structures for contact identity reconciliation: contact records,
//! link precedence, inbound observations, and the consolidated identity view.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Timestamps are UTC epoch milliseconds.
///
/// Using i64 keeps ordering cheap and avoids floating point issues; the
/// record id is the tie-break when two records share a millisecond.
pub type Timestamp = i64;

/// Current wall-clock time as a [`Timestamp`].
pub fn now_millis() -> Timestamp {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as Timestamp
}

/// Compact identifier for contact records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactId(pub u32);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Whether a contact is the canonical record of its cluster or linked to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
    /// The canonical, oldest record of a cluster. Never has a `linked_id`.
    Primary,
    /// A record merged into a cluster after the primary. Always points at
    /// the cluster's primary via `linked_id`.
    Secondary,
}

impl fmt::Display for LinkPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkPrecedence::Primary => write!(f, "primary"),
            LinkPrecedence::Secondary => write!(f, "secondary"),
        }
    }
}

/// A stored contact record.
///
/// `id`, `email`, `phone_number`, and `created_at` are immutable after
/// creation. `link_precedence`/`linked_id` change only when a primary is
/// demoted during a merge. `deleted_at` exists in the schema but is never
/// set by the reconciliation logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub linked_id: Option<ContactId>,
    pub link_precedence: LinkPrecedence,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Contact {
    pub fn is_primary(&self) -> bool {
        self.link_precedence == LinkPrecedence::Primary
    }

    /// Check whether this record carries the given email value.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.as_deref() == Some(email)
    }

    /// Check whether this record carries the given phone value.
    pub fn has_phone(&self, phone: &str) -> bool {
        self.phone_number.as_deref() == Some(phone)
    }

    /// Sort key for "oldest wins" ordering.
    pub fn age_key(&self) -> (Timestamp, u32) {
        (self.created_at, self.id.0)
    }
}

/// Field values for a contact about to be inserted. The store assigns the
/// id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub linked_id: Option<ContactId>,
    pub link_precedence: LinkPrecedence,
}

impl ContactDraft {
    /// Draft for a fresh primary: first sighting of a person.
    pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
        Self {
            email,
            phone_number,
            linked_id: None,
            link_precedence: LinkPrecedence::Primary,
        }
    }

    /// Draft for a secondary joining an existing cluster.
    pub fn secondary(
        email: Option<String>,
        phone_number: Option<String>,
        primary_id: ContactId,
    ) -> Self {
        Self {
            email,
            phone_number,
            linked_id: Some(primary_id),
            link_precedence: LinkPrecedence::Secondary,
        }
    }
}

/// An inbound (email, phone) pair submitted for resolution.
///
/// Construction normalizes empty and whitespace-only strings to `None`, so
/// downstream logic only ever sees real attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Observation {
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl Observation {
    pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
        Self {
            email: normalize(email),
            phone_number: normalize(phone_number),
        }
    }

    /// True when neither attribute survived normalization.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone_number.is_none()
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    match value {
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => None,
    }
}

/// The consolidated view of one identity cluster: the response payload of a
/// resolve call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedIdentity {
    pub primary_contact_id: ContactId,
    /// Deduplicated emails: primary's first, then secondaries in creation order.
    pub emails: Vec<String>,
    /// Deduplicated phone numbers, same ordering rule as `emails`.
    pub phone_numbers: Vec<String>,
    /// Ids of all non-primary cluster members, in creation order.
    pub secondary_contact_ids: Vec<ContactId>,
}
