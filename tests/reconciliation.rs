use idmesh::{
    ContactStore, IdentityResolver, LinkPrecedence, MemoryStore, Observation, ResolveError,
};

fn observe(email: Option<&str>, phone: Option<&str>) -> Observation {
    Observation::new(email.map(str::to_string), phone.map(str::to_string))
}

#[test]
fn first_sighting_creates_one_primary() -> anyhow::Result<()> {
    let mut resolver = IdentityResolver::new();
    let identity = resolver.resolve(&observe(Some("a@x.com"), Some("111")))?;

    assert_eq!(resolver.contact_count(), 1);
    assert_eq!(identity.emails, vec!["a@x.com"]);
    assert_eq!(identity.phone_numbers, vec!["111"]);
    assert!(identity.secondary_contact_ids.is_empty());

    let primary = resolver
        .store()
        .get_contact(identity.primary_contact_id)
        .expect("primary stored");
    assert_eq!(primary.link_precedence, LinkPrecedence::Primary);
    assert!(primary.linked_id.is_none());
    Ok(())
}

#[test]
fn new_information_adds_exactly_one_secondary() -> anyhow::Result<()> {
    let mut resolver = IdentityResolver::new();
    let first = resolver.resolve(&observe(Some("a@x.com"), Some("111")))?;
    let second = resolver.resolve(&observe(Some("a@x.com"), Some("222")))?;

    assert_eq!(resolver.contact_count(), 2);
    assert_eq!(second.primary_contact_id, first.primary_contact_id);
    assert_eq!(second.phone_numbers, vec!["111", "222"]);
    assert_eq!(second.secondary_contact_ids.len(), 1);

    let secondary = resolver
        .store()
        .get_contact(second.secondary_contact_ids[0])
        .expect("secondary stored");
    assert_eq!(secondary.email.as_deref(), Some("a@x.com"));
    assert_eq!(secondary.phone_number.as_deref(), Some("222"));
    assert_eq!(secondary.linked_id, Some(first.primary_contact_id));
    Ok(())
}

#[test]
fn repeated_observations_are_idempotent() -> anyhow::Result<()> {
    let mut resolver = IdentityResolver::new();
    let first = resolver.resolve(&observe(Some("a@x.com"), Some("111")))?;

    for _ in 0..5 {
        let repeat = resolver.resolve(&observe(Some("a@x.com"), Some("111")))?;
        assert_eq!(repeat, first);
    }
    assert_eq!(resolver.contact_count(), 1);
    Ok(())
}

#[test]
fn single_field_queries_never_duplicate() -> anyhow::Result<()> {
    let mut resolver = IdentityResolver::new();
    let seeded = resolver.resolve(&observe(Some("a@x.com"), Some("111")))?;

    let by_email = resolver.resolve(&observe(Some("a@x.com"), None))?;
    let by_phone = resolver.resolve(&observe(None, Some("111")))?;

    assert_eq!(resolver.contact_count(), 1);
    assert_eq!(by_email, seeded);
    assert_eq!(by_phone, seeded);
    Ok(())
}

#[test]
fn bridging_observation_merges_clusters_oldest_wins() -> anyhow::Result<()> {
    let mut resolver = IdentityResolver::new();
    let p1 = resolver.resolve(&observe(Some("a@x.com"), Some("111")))?;
    let p2 = resolver.resolve(&observe(Some("b@y.com"), Some("222")))?;
    assert_ne!(p1.primary_contact_id, p2.primary_contact_id);

    let merged = resolver.resolve(&observe(Some("a@x.com"), Some("222")))?;

    assert_eq!(merged.primary_contact_id, p1.primary_contact_id);
    assert_eq!(merged.emails, vec!["a@x.com", "b@y.com"]);
    assert_eq!(merged.phone_numbers, vec!["111", "222"]);
    assert!(merged
        .secondary_contact_ids
        .contains(&p2.primary_contact_id));

    let demoted = resolver
        .store()
        .get_contact(p2.primary_contact_id)
        .expect("demoted stored");
    assert_eq!(demoted.link_precedence, LinkPrecedence::Secondary);
    assert_eq!(demoted.linked_id, Some(p1.primary_contact_id));

    // The merged view is stable across re-submission.
    let again = resolver.resolve(&observe(Some("a@x.com"), Some("222")))?;
    assert_eq!(again, merged);
    Ok(())
}

#[test]
fn invalid_input_causes_no_mutation() {
    let mut resolver = IdentityResolver::new();
    let err = resolver.resolve(&observe(None, None)).unwrap_err();
    assert!(matches!(err, ResolveError::InvalidInput));
    assert_eq!(resolver.contact_count(), 0);
}

#[test]
fn repeated_pairs_store_at_most_one_exact_record() -> anyhow::Result<()> {
    let mut resolver = IdentityResolver::new();
    resolver.resolve(&observe(Some("a@x.com"), Some("111")))?;
    for _ in 0..4 {
        resolver.resolve(&observe(Some("a@x.com"), Some("222")))?;
    }

    let exact = resolver
        .store()
        .all_contacts()
        .into_iter()
        .filter(|c| c.email.as_deref() == Some("a@x.com") && c.phone_number.as_deref() == Some("222"))
        .count();
    assert!(exact <= 1);
    Ok(())
}

#[test]
fn invariants_hold_across_mixed_workload() -> anyhow::Result<()> {
    let mut resolver = IdentityResolver::with_store(MemoryStore::new());
    let stream = [
        (Some("a@x.com"), Some("111")),
        (Some("b@y.com"), Some("222")),
        (Some("c@z.com"), Some("333")),
        (Some("a@x.com"), Some("444")),
        (Some("b@y.com"), None),
        (None, Some("333")),
        // Bridges cluster one and cluster two.
        (Some("a@x.com"), Some("222")),
        // Bridges the survivor with cluster three.
        (Some("c@z.com"), Some("111")),
        (Some("a@x.com"), Some("111")),
    ];

    for (email, phone) in stream {
        resolver.resolve(&observe(email, phone))?;
        resolver.verify_invariants()?;
    }

    // Everything collapsed into one cluster: a single primary, every other
    // record linked straight to it.
    let contacts = resolver.store().all_contacts();
    let primaries: Vec<_> = contacts.iter().filter(|c| c.is_primary()).collect();
    assert_eq!(primaries.len(), 1);
    let primary_id = primaries[0].id;
    for contact in &contacts {
        if contact.id != primary_id {
            assert_eq!(contact.linked_id, Some(primary_id));
        }
    }
    Ok(())
}
