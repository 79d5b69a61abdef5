//! # Store Module
//!
//! The contact store contract consumed by the resolver, plus the in-memory
//! reference implementation used for tests and single-process deployments.

use crate::error::StoreError;
use crate::model::{now_millis, Contact, ContactDraft, ContactId};
use hashbrown::HashMap;

/// Persistence contract for contact records.
///
/// Implementations must provide read-your-writes consistency within the span
/// of one resolve call: a record created through [`ContactStore::create`]
/// must be observable by the following queries on the same handle. Query
/// results are ordered by `(created_at, id)` ascending.
pub trait ContactStore: Send + Sync {
    /// Oldest-created contact whose email or phone matches the given values.
    /// Either value may be absent from the query.
    fn find_oldest_match(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<Contact>, StoreError>;

    /// All contacts where the email matches OR the phone matches OR
    /// `linked_id == linked_id` OR `id == fallback_id`, oldest first.
    ///
    /// With both attribute values absent this returns a primary together
    /// with its direct secondaries, which is exactly one cluster under the
    /// maintained invariants.
    fn find_cluster(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        linked_id: ContactId,
        fallback_id: ContactId,
    ) -> Result<Vec<Contact>, StoreError>;

    /// Insert a new record, assigning its id and timestamps.
    fn create(&mut self, draft: ContactDraft) -> Result<Contact, StoreError>;

    /// Mutate an existing record's precedence and link target.
    fn update_linkage(
        &mut self,
        id: ContactId,
        precedence: crate::model::LinkPrecedence,
        linked_id: Option<ContactId>,
    ) -> Result<(), StoreError>;

    /// Get a contact by id.
    fn get_contact(&self, id: ContactId) -> Option<Contact>;

    /// All contacts, oldest first. Used by audits and diagnostics.
    fn all_contacts(&self) -> Vec<Contact>;

    /// Number of stored contacts.
    fn len(&self) -> usize;

    /// Check if the store holds no contacts.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory contact store.
///
/// Ids are assigned monotonically, so creation order and id order agree;
/// timestamps come from the wall clock with the id as tie-break.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    contacts: HashMap<ContactId, Contact>,
    next_id: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            contacts: HashMap::new(),
            next_id: 1,
        }
    }

    fn ordered(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.contacts.values().cloned().collect();
        contacts.sort_by_key(Contact::age_key);
        contacts
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactStore for MemoryStore {
    fn find_oldest_match(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<Contact>, StoreError> {
        Ok(self
            .ordered()
            .into_iter()
            .find(|contact| matches_attributes(contact, email, phone)))
    }

    fn find_cluster(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        linked_id: ContactId,
        fallback_id: ContactId,
    ) -> Result<Vec<Contact>, StoreError> {
        Ok(self
            .ordered()
            .into_iter()
            .filter(|contact| {
                matches_attributes(contact, email, phone)
                    || contact.linked_id == Some(linked_id)
                    || contact.id == fallback_id
            })
            .collect())
    }

    fn create(&mut self, draft: ContactDraft) -> Result<Contact, StoreError> {
        let id = ContactId(self.next_id);
        self.next_id += 1;

        let now = now_millis();
        let contact = Contact {
            id,
            email: draft.email,
            phone_number: draft.phone_number,
            linked_id: draft.linked_id,
            link_precedence: draft.link_precedence,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.contacts.insert(id, contact.clone());
        Ok(contact)
    }

    fn update_linkage(
        &mut self,
        id: ContactId,
        precedence: crate::model::LinkPrecedence,
        linked_id: Option<ContactId>,
    ) -> Result<(), StoreError> {
        let contact = self
            .contacts
            .get_mut(&id)
            .ok_or(StoreError::MissingContact(id))?;
        contact.link_precedence = precedence;
        contact.linked_id = linked_id;
        contact.updated_at = now_millis();
        Ok(())
    }

    fn get_contact(&self, id: ContactId) -> Option<Contact> {
        self.contacts.get(&id).cloned()
    }

    fn all_contacts(&self) -> Vec<Contact> {
        self.ordered()
    }

    fn len(&self) -> usize {
        self.contacts.len()
    }
}

fn matches_attributes(contact: &Contact, email: Option<&str>, phone: Option<&str>) -> bool {
    let email_hit = email.is_some_and(|value| contact.has_email(value));
    let phone_hit = phone.is_some_and(|value| contact.has_phone(value));
    email_hit || phone_hit
}
