//! # Identity Resolver
//!
//! Implements incremental identity reconciliation: given an (email, phone)
//! observation, find or create the matching contact cluster, materialize any
//! newly confirmed link as a secondary record, and collapse bridged clusters
//! down to a single surviving primary.

use crate::error::{ResolveError, StoreError};
use crate::model::{ConsolidatedIdentity, Contact, ContactDraft, LinkPrecedence, Observation};
use crate::store::{ContactStore, MemoryStore};
use tracing::{debug, error};

/// Main API for contact identity reconciliation.
///
/// The store is an injected handle rather than a process-wide singleton, so
/// the resolver can be exercised against any backend implementing the
/// [`ContactStore`] contract.
pub struct IdentityResolver {
    store: Box<dyn ContactStore>,
}

impl IdentityResolver {
    /// Create a resolver backed by a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Create a resolver with a custom store implementation.
    pub fn with_store<S>(store: S) -> Self
    where
        S: ContactStore + 'static,
    {
        Self {
            store: Box::new(store),
        }
    }

    pub fn store(&self) -> &dyn ContactStore {
        self.store.as_ref()
    }

    /// Number of contacts in the underlying store.
    pub fn contact_count(&self) -> usize {
        self.store.len()
    }

    /// Resolve one observation into the consolidated view of its cluster.
    ///
    /// Creates a fresh primary on first sighting, a secondary when the
    /// observation adds a previously unseen attribute to an existing
    /// cluster, and demotes bridged primaries so each cluster keeps exactly
    /// one. Repeated identical observations are idempotent.
    pub fn resolve(
        &mut self,
        observation: &Observation,
    ) -> Result<ConsolidatedIdentity, ResolveError> {
        if observation.is_empty() {
            return Err(ResolveError::InvalidInput);
        }
        let email = observation.email.as_deref();
        let phone = observation.phone_number.as_deref();

        // Base case: first sighting of a person.
        let anchor = match self.store.find_oldest_match(email, phone)? {
            Some(anchor) => anchor,
            None => {
                let contact = self.store.create(ContactDraft::primary(
                    observation.email.clone(),
                    observation.phone_number.clone(),
                ))?;
                debug!(id = %contact.id, "created primary contact");
                return Ok(consolidate(&contact, &[contact.clone()]));
            }
        };

        // Gather the full cluster in one pass: attribute matches, the
        // anchor's direct secondaries, and the anchor's own primary when the
        // anchor is secondary. Clusters have depth at most 2, so this is
        // complete.
        let fallback = anchor.linked_id.unwrap_or(anchor.id);
        let mut cluster = self.store.find_cluster(email, phone, anchor.id, fallback)?;

        let current_primary = cluster
            .iter()
            .find(|contact| contact.is_primary())
            .cloned()
            .ok_or_else(|| {
                error!(anchor = %anchor.id, "gathered cluster has no primary");
                ResolveError::InvariantViolation(format!(
                    "cluster around {} has no primary contact",
                    anchor.id
                ))
            })?;

        // New information: an attribute value no gathered record carries yet.
        let unseen_email =
            email.is_some_and(|value| !cluster.iter().any(|c| c.has_email(value)));
        let unseen_phone =
            phone.is_some_and(|value| !cluster.iter().any(|c| c.has_phone(value)));
        if unseen_email || unseen_phone {
            // Carry the missing field forward from the anchor so the new
            // record is never missing both attributes.
            let draft = ContactDraft::secondary(
                observation.email.clone().or_else(|| anchor.email.clone()),
                observation
                    .phone_number
                    .clone()
                    .or_else(|| anchor.phone_number.clone()),
                current_primary.id,
            );
            let created = self.store.create(draft)?;
            debug!(id = %created.id, primary = %current_primary.id, "created secondary contact");
            cluster.push(created);
        }

        // Merge conflict: the observation bridged previously independent
        // clusters. The oldest primary survives; every other primary is
        // demoted and its satellites re-pointed so depth stays at 2.
        let mut primaries: Vec<Contact> = cluster
            .iter()
            .filter(|contact| contact.is_primary())
            .cloned()
            .collect();
        primaries.sort_by_key(Contact::age_key);
        let survivor = primaries[0].clone();
        for demoted in &primaries[1..] {
            self.demote_primary(demoted, &survivor)?;
        }

        // Re-read to observe post-merge membership.
        let members = self
            .store
            .find_cluster(email, phone, survivor.id, survivor.id)?;

        let primary_count = members.iter().filter(|c| c.is_primary()).count();
        if primary_count != 1 {
            error!(
                primary = %survivor.id,
                primary_count,
                "cluster retained multiple primaries after merge"
            );
            return Err(ResolveError::InvariantViolation(format!(
                "cluster of {} has {} primaries after merge",
                survivor.id, primary_count
            )));
        }

        Ok(consolidate(&survivor, &members))
    }

    fn demote_primary(&mut self, demoted: &Contact, survivor: &Contact) -> Result<(), StoreError> {
        debug!(demoted = %demoted.id, survivor = %survivor.id, "demoting primary");
        self.store.update_linkage(
            demoted.id,
            LinkPrecedence::Secondary,
            Some(survivor.id),
        )?;

        // Satellites of the demoted primary must point at the survivor
        // directly, never chain through the demoted record.
        let satellites = self.store.find_cluster(None, None, demoted.id, demoted.id)?;
        for satellite in satellites {
            if satellite.id != demoted.id && satellite.linked_id == Some(demoted.id) {
                self.store.update_linkage(
                    satellite.id,
                    LinkPrecedence::Secondary,
                    Some(survivor.id),
                )?;
            }
        }
        Ok(())
    }

    /// Audit the whole store against the link invariants: primaries carry no
    /// link, secondaries point at an existing primary that is older than
    /// they are.
    pub fn verify_invariants(&self) -> Result<(), ResolveError> {
        for contact in self.store.all_contacts() {
            match contact.link_precedence {
                LinkPrecedence::Primary => {
                    if contact.linked_id.is_some() {
                        return Err(ResolveError::InvariantViolation(format!(
                            "primary {} has a linked id",
                            contact.id
                        )));
                    }
                }
                LinkPrecedence::Secondary => {
                    let target = contact.linked_id.ok_or_else(|| {
                        ResolveError::InvariantViolation(format!(
                            "secondary {} has no linked id",
                            contact.id
                        ))
                    })?;
                    let primary = self.store.get_contact(target).ok_or_else(|| {
                        ResolveError::InvariantViolation(format!(
                            "secondary {} links to missing contact {}",
                            contact.id, target
                        ))
                    })?;
                    if !primary.is_primary() {
                        return Err(ResolveError::InvariantViolation(format!(
                            "secondary {} links to non-primary {}",
                            contact.id, target
                        )));
                    }
                    if primary.age_key() >= contact.age_key() {
                        return Err(ResolveError::InvariantViolation(format!(
                            "secondary {} is older than its primary {}",
                            contact.id, target
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the consolidated view for a cluster: primary's attributes first,
/// then secondaries in creation order, deduplicated.
fn consolidate(primary: &Contact, members: &[Contact]) -> ConsolidatedIdentity {
    let mut ordered: Vec<&Contact> = members.iter().collect();
    ordered.sort_by_key(|contact| contact.age_key());

    let mut emails = Vec::new();
    let mut phone_numbers = Vec::new();
    let mut secondary_contact_ids = Vec::new();

    if let Some(email) = &primary.email {
        emails.push(email.clone());
    }
    if let Some(phone) = &primary.phone_number {
        phone_numbers.push(phone.clone());
    }

    for contact in ordered {
        if contact.id == primary.id {
            continue;
        }
        if let Some(email) = &contact.email {
            if !emails.iter().any(|known| known == email) {
                emails.push(email.clone());
            }
        }
        if let Some(phone) = &contact.phone_number {
            if !phone_numbers.iter().any(|known| known == phone) {
                phone_numbers.push(phone.clone());
            }
        }
        secondary_contact_ids.push(contact.id);
    }

    ConsolidatedIdentity {
        primary_contact_id: primary.id,
        emails,
        phone_numbers,
        secondary_contact_ids,
    }
}
