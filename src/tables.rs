//! Derivation of the normalized `titles`, `owners` and `titles_owners`
//! relations from raw extract rows.
//!
//! Surrogate identifiers are 1-based and assigned in first-seen order. Input
//! order is all domestic rows in file order followed by all overseas rows in
//! file order; owner identity follows the slot-major order produced by
//! [`reshape`].

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::canonical::{canonicalize_owner, canonicalize_text};
use crate::models::{Owner, OwnerSlot, RawRecord, Tables, Title, TitleOwnerLink};
use crate::reshape::reshape;

/// Build all three relations from the concatenated raw records.
pub fn build_tables(records: &[RawRecord]) -> Tables {
    let titles = build_titles(records);
    let slots = reshape(records);
    let owners = build_owners(&slots);
    let links = build_links(&slots, &titles, &owners);

    info!(
        titles = titles.len(),
        owners = owners.len(),
        links = links.len(),
        "built tables"
    );

    Tables {
        titles,
        owners,
        links,
    }
}

/// One row per distinct title number, first occurrence kept.
pub fn build_titles(records: &[RawRecord]) -> Vec<Title> {
    let mut titles: Vec<Title> = Vec::with_capacity(records.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut repeated = 0u64;

    for record in records.iter().filter(|r| !r.is_footer()) {
        let title_number = title_key(&record.title_number);
        if !seen.insert(title_number.clone()) {
            repeated += 1;
            continue;
        }
        titles.push(Title {
            title_id: titles.len() as i64 + 1,
            title_number,
            address: canonicalize_text(record.address.as_deref()),
            price: record.price,
        });
    }

    if repeated > 0 {
        debug!(repeated, "title numbers listed more than once; first row kept");
    }
    titles
}

/// One row per distinct canonical owner name. The first occurrence supplies
/// the retained country and source, even when a later one is more complete.
pub fn build_owners(slots: &[OwnerSlot]) -> Vec<Owner> {
    let mut owners: Vec<Owner> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for slot in slots {
        if !seen.insert(slot.owner.as_str()) {
            continue;
        }
        owners.push(Owner {
            owner_id: owners.len() as i64 + 1,
            owner: slot.owner.clone(),
            country: slot.country.clone(),
            source: slot.source,
        });
    }

    owners
}

/// One link per owner slot whose title and owner both resolve. Slots that do
/// not resolve are dropped (inner-join semantics). Repeated (title, owner)
/// pairs are kept as-is.
pub fn build_links(slots: &[OwnerSlot], titles: &[Title], owners: &[Owner]) -> Vec<TitleOwnerLink> {
    let title_ids: HashMap<&str, i64> = titles
        .iter()
        .map(|t| (t.title_number.as_str(), t.title_id))
        .collect();
    let owner_ids: HashMap<&str, i64> = owners
        .iter()
        .map(|o| (o.owner.as_str(), o.owner_id))
        .collect();

    let mut links = Vec::with_capacity(slots.len());
    let mut unresolved = 0u64;

    for slot in slots {
        let title_number = title_key(&slot.title_number);
        match (
            title_ids.get(title_number.as_str()),
            owner_ids.get(slot.owner.as_str()),
        ) {
            (Some(&title_id), Some(&owner_id)) => links.push(TitleOwnerLink { title_id, owner_id }),
            _ => unresolved += 1,
        }
    }

    if unresolved > 0 {
        debug!(unresolved, "dropped owner slots with no matching title or owner");
    }
    links
}

/// Canonical natural key for a title number.
pub fn title_key(raw: &str) -> String {
    canonicalize_text(Some(raw)).unwrap_or_default()
}

/// Canonical natural key for an owner name typed by a user.
pub fn owner_key(raw: &str) -> String {
    canonicalize_owner(Some(raw)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProprietorSlot, SourceTag, PROPRIETOR_SLOTS};

    fn record(
        title: &str,
        source: SourceTag,
        address: Option<&str>,
        price: Option<f64>,
        names: &[(&str, Option<&str>)],
    ) -> RawRecord {
        let mut proprietors: [ProprietorSlot; PROPRIETOR_SLOTS] = Default::default();
        for (i, (name, country)) in names.iter().enumerate() {
            proprietors[i] = ProprietorSlot {
                name: Some(name.to_string()),
                country: country.map(str::to_string),
            };
        }
        RawRecord {
            title_number: title.to_string(),
            address: address.map(str::to_string),
            price,
            proprietors,
            source,
        }
    }

    #[test]
    fn test_single_domestic_record() {
        let records = vec![record(
            "AB123",
            SourceTag::Domestic,
            Some("  1  Main   St "),
            Some(250000.0),
            &[("Smith Ltd", None)],
        )];
        let tables = build_tables(&records);

        assert_eq!(
            tables.titles,
            vec![Title {
                title_id: 1,
                title_number: "AB123".to_string(),
                address: Some("1 MAIN ST".to_string()),
                price: Some(250000.0),
            }]
        );
        assert_eq!(
            tables.owners,
            vec![Owner {
                owner_id: 1,
                owner: "SMITH LIMITED".to_string(),
                country: None,
                source: SourceTag::Domestic,
            }]
        );
        assert_eq!(
            tables.links,
            vec![TitleOwnerLink {
                title_id: 1,
                owner_id: 1
            }]
        );
    }

    #[test]
    fn test_shared_owner_across_extracts() {
        let records = vec![
            record("D1", SourceTag::Domestic, None, None, &[("Jones Ltd", None)]),
            record("O1", SourceTag::Overseas, None, None, &[("JONES LIMITED", Some("SPAIN"))]),
        ];
        let tables = build_tables(&records);

        assert_eq!(tables.owners.len(), 1);
        let jones = &tables.owners[0];
        assert_eq!(jones.owner, "JONES LIMITED");
        assert_eq!(jones.source, SourceTag::Domestic);
        assert_eq!(jones.country, None);

        assert_eq!(tables.links.len(), 2);
        assert!(tables.links.iter().all(|l| l.owner_id == jones.owner_id));
        assert_eq!(tables.links[0].title_id, 1);
        assert_eq!(tables.links[1].title_id, 2);
    }

    #[test]
    fn test_first_occurrence_is_slot_major() {
        // "ACME" appears in slot 2 of the first record and slot 1 of the
        // second; slot 1 is visited first across all records.
        let records = vec![
            record("T1", SourceTag::Domestic, None, None, &[("X", None), ("Acme Ltd", None)]),
            record("T2", SourceTag::Overseas, None, None, &[("ACME LIMITED", Some("FRANCE"))]),
        ];
        let owners = build_owners(&reshape(&records));
        let acme = owners.iter().find(|o| o.owner == "ACME LIMITED").unwrap();
        assert_eq!(acme.source, SourceTag::Overseas);
        assert_eq!(acme.country.as_deref(), Some("FRANCE"));
        assert_eq!(
            owners.iter().map(|o| o.owner.as_str()).collect::<Vec<_>>(),
            vec!["X", "ACME LIMITED"]
        );
    }

    #[test]
    fn test_orphan_title_has_no_links() {
        let records = vec![record("T1", SourceTag::Domestic, None, None, &[])];
        let tables = build_tables(&records);
        assert_eq!(tables.titles.len(), 1);
        assert!(tables.owners.is_empty());
        assert!(tables.links.is_empty());
    }

    #[test]
    fn test_row_count_never_titled() {
        let records = vec![
            record("T1", SourceTag::Domestic, None, None, &[("A", None)]),
            record("Row Count", SourceTag::Domestic, None, None, &[("B", None)]),
        ];
        let tables = build_tables(&records);
        assert!(tables.titles.iter().all(|t| t.title_number != "Row Count"));
        assert_eq!(tables.titles.len(), 1);
        assert_eq!(tables.owners.len(), 1);
    }

    #[test]
    fn test_ids_sequential_from_one() {
        let records: Vec<_> = (0..5)
            .map(|i| record(&format!("T{}", i), SourceTag::Domestic, None, None, &[]))
            .collect();
        let ids: Vec<i64> = build_titles(&records).iter().map(|t| t.title_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_repeated_title_number_keeps_first() {
        let records = vec![
            record("T1", SourceTag::Domestic, Some("first"), None, &[("A", None)]),
            record("T1", SourceTag::Overseas, Some("second"), None, &[("B", None)]),
        ];
        let tables = build_tables(&records);
        assert_eq!(tables.titles.len(), 1);
        assert_eq!(tables.titles[0].address.as_deref(), Some("FIRST"));
        assert_eq!(tables.links.len(), 2);
        assert!(tables.links.iter().all(|l| l.title_id == 1));
    }

    #[test]
    fn test_same_owner_twice_on_one_title_yields_two_links() {
        let records = vec![record(
            "T1",
            SourceTag::Domestic,
            None,
            None,
            &[("Acme Ltd", None), ("ACME LIMITED", None)],
        )];
        let tables = build_tables(&records);
        assert_eq!(tables.owners.len(), 1);
        assert_eq!(tables.links.len(), 2);
    }

    #[test]
    fn test_empty_canonical_owner_is_ordinary() {
        let records = vec![record("T1", SourceTag::Domestic, None, None, &[("!!!", None)])];
        let tables = build_tables(&records);
        assert_eq!(tables.owners.len(), 1);
        assert_eq!(tables.owners[0].owner, "");
        assert_eq!(tables.links.len(), 1);
    }

    #[test]
    fn test_unresolvable_slot_dropped() {
        let titles = vec![Title {
            title_id: 1,
            title_number: "T1".to_string(),
            address: None,
            price: None,
        }];
        let slots = vec![
            OwnerSlot {
                title_number: "T1".to_string(),
                owner: "KNOWN".to_string(),
                country: None,
                source: SourceTag::Domestic,
            },
            OwnerSlot {
                title_number: "T1".to_string(),
                owner: "UNKNOWN".to_string(),
                country: None,
                source: SourceTag::Domestic,
            },
        ];
        let owners = vec![Owner {
            owner_id: 7,
            owner: "KNOWN".to_string(),
            country: None,
            source: SourceTag::Domestic,
        }];
        let links = build_links(&slots, &titles, &owners);
        assert_eq!(links, vec![TitleOwnerLink { title_id: 1, owner_id: 7 }]);
    }

    #[test]
    fn test_referential_integrity() {
        let records = vec![
            record("A1", SourceTag::Domestic, None, None, &[("p", None), ("q", None)]),
            record("A2", SourceTag::Domestic, None, None, &[]),
            record("B1", SourceTag::Overseas, None, None, &[("q", Some("X")), ("r", None), ("s", None), ("t", None)]),
        ];
        let tables = build_tables(&records);
        let title_ids: HashSet<i64> = tables.titles.iter().map(|t| t.title_id).collect();
        let owner_ids: HashSet<i64> = tables.owners.iter().map(|o| o.owner_id).collect();
        for link in &tables.links {
            assert!(title_ids.contains(&link.title_id));
            assert!(owner_ids.contains(&link.owner_id));
        }
        let names: HashSet<&str> = tables.owners.iter().map(|o| o.owner.as_str()).collect();
        assert_eq!(names.len(), tables.owners.len());
    }
}
