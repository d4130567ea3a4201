//! Unpivoting of the repeated proprietor columns into long format.
//!
//! Each extract row carries up to four `Proprietor Name (n)` columns (and,
//! for the overseas extract, matching `Country Incorporated (n)` columns).
//! The reshaper turns them into one [`OwnerSlot`] per populated slot, in
//! slot-major order: slot 1 of every record, then slot 2 of every record, and
//! so on. That order decides which occurrence of a duplicated owner wins
//! during deduplication, so it must not change.

use crate::canonical::canonicalize_owner;
use crate::models::{OwnerSlot, RawRecord, SourceTag, PROPRIETOR_SLOTS};

/// Reshape raw records into canonicalized owner slots.
///
/// Footer rows are excluded and absent names skipped. Country is dropped for
/// the domestic extract even if the row somehow carries one. Title numbers
/// are passed through untouched; the table builder canonicalizes them.
pub fn reshape(records: &[RawRecord]) -> Vec<OwnerSlot> {
    let mut slots = Vec::new();

    for slot in 0..PROPRIETOR_SLOTS {
        for record in records.iter().filter(|r| !r.is_footer()) {
            let proprietor = &record.proprietors[slot];
            let Some(owner) = canonicalize_owner(proprietor.name.as_deref()) else {
                continue;
            };
            let country = match record.source {
                SourceTag::Domestic => None,
                SourceTag::Overseas => proprietor.country.clone(),
            };
            slots.push(OwnerSlot {
                title_number: record.title_number.clone(),
                owner,
                country,
                source: record.source,
            });
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProprietorSlot;

    fn record(title: &str, source: SourceTag, names: &[(&str, Option<&str>)]) -> RawRecord {
        let mut proprietors: [ProprietorSlot; PROPRIETOR_SLOTS] = Default::default();
        for (i, (name, country)) in names.iter().enumerate() {
            proprietors[i] = ProprietorSlot {
                name: Some(name.to_string()),
                country: country.map(str::to_string),
            };
        }
        RawRecord {
            title_number: title.to_string(),
            address: None,
            price: None,
            proprietors,
            source,
        }
    }

    #[test]
    fn test_one_slot_per_populated_proprietor() {
        let records = vec![
            record("T1", SourceTag::Domestic, &[("a ltd", None), ("b", None)]),
            record("T2", SourceTag::Domestic, &[]),
        ];
        let slots = reshape(&records);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].owner, "A LIMITED");
        assert_eq!(slots[1].owner, "B");
        assert!(slots.iter().all(|s| s.title_number == "T1"));
    }

    #[test]
    fn test_slot_major_order() {
        let records = vec![
            record("T1", SourceTag::Domestic, &[("A1", None), ("A2", None)]),
            record("T2", SourceTag::Overseas, &[("B1", Some("FRANCE")), ("B2", None)]),
        ];
        let owners: Vec<_> = reshape(&records).into_iter().map(|s| s.owner).collect();
        assert_eq!(owners, vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_country_only_for_overseas() {
        let records = vec![
            record("T1", SourceTag::Domestic, &[("A", Some("JERSEY"))]),
            record("T2", SourceTag::Overseas, &[("B", Some("JERSEY"))]),
        ];
        let slots = reshape(&records);
        assert_eq!(slots[0].country, None);
        assert_eq!(slots[1].country.as_deref(), Some("JERSEY"));
        assert_eq!(slots[1].source, SourceTag::Overseas);
    }

    #[test]
    fn test_footer_excluded() {
        let records = vec![record("Row Count", SourceTag::Domestic, &[("A", None)])];
        assert!(reshape(&records).is_empty());
    }

    #[test]
    fn test_gap_in_slots_skipped() {
        let mut r = record("T1", SourceTag::Domestic, &[]);
        r.proprietors[2].name = Some("Third".to_string());
        let slots = reshape(&[r]);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].owner, "THIRD");
    }
}
