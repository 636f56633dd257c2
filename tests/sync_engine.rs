mod common;

use std::collections::BTreeSet;

use common::{ids, mapping, record};
use tabsync::{
    Record,
    config::ColumnMapping,
    sync_engine::{find_unmapped_sot_columns, sync, sync_records},
};

fn sample() -> (Vec<Record>, Vec<Record>, ColumnMapping) {
    let sot = vec![
        record(&[
            ("REC ID", "REC-001"),
            ("Description", "Updated desc"),
            ("Owner", "Alice"),
            ("Unused", "X"),
        ]),
        record(&[
            ("REC ID", "REC-002"),
            ("Description", "New record"),
            ("Owner", "Bob"),
            ("Unused", "Y"),
        ]),
    ];
    let tgt = vec![
        record(&[
            ("REC ID", "REC-001"),
            ("Description", "Old desc"),
            ("Owner", "Alice"),
            ("SomeOtherField", "Value"),
        ]),
        record(&[
            ("REC ID", "REC-999"),
            ("Description", "Existing record"),
            ("Owner", "Charlie"),
            ("SomeOtherField", "Value"),
        ]),
    ];
    let map = mapping(&[("Description", "Description"), ("Owner", "Owner")]);
    (sot, tgt, map)
}

fn find<'a>(rows: &'a [Record], id: &str) -> &'a Record {
    rows.iter()
        .find(|r| r.id("REC ID") == Some(id))
        .expect("record present")
}

#[test]
fn updates_matches_and_appends_new_records() {
    let (sot, mut tgt, map) = sample();
    let summary = sync_records(&sot, &mut tgt, "REC ID", "REC ID", &map);

    assert_eq!(ids(&tgt, "REC ID"), ["REC-001", "REC-999", "REC-002"]);

    let rec1 = find(&tgt, "REC-001");
    assert_eq!(rec1.value("Description"), "Updated desc");
    assert_eq!(rec1.value("SomeOtherField"), "Value");

    let rec2 = find(&tgt, "REC-002");
    assert_eq!(rec2.value("Owner"), "Bob");
    assert!(!rec2.contains_column("SomeOtherField"));
    assert!(!rec2.contains_column("Unused"));

    let rec999 = find(&tgt, "REC-999");
    assert_eq!(rec999.value("Owner"), "Charlie");
    assert_eq!(rec999.value("Description"), "Existing record");

    let changed: BTreeSet<String> = ["Description".to_string()].into_iter().collect();
    assert_eq!(summary.updated, vec![("REC-001".to_string(), changed)]);
    assert_eq!(summary.added, vec!["REC-002".to_string()]);
    assert_eq!(summary.unmapped_sot_columns, vec!["Unused".to_string()]);
    assert!(summary.skipped.is_empty());
}

#[test]
fn differing_identifier_column_names_are_joined() {
    let sot = vec![record(&[("REC ID", "REC-001"), ("REC Name", "Renamed")])];
    let mut tgt = vec![record(&[("Record ID", "REC-001"), ("Record Name", "Original")])];
    let map = mapping(&[("REC Name", "Record Name")]);

    sync_records(&sot, &mut tgt, "REC ID", "Record ID", &map);

    assert_eq!(tgt.len(), 1);
    assert_eq!(tgt[0].value("Record Name"), "Renamed");
}

#[test]
fn new_records_use_tgt_identifier_column() {
    let sot = vec![record(&[("REC ID", "REC-010"), ("REC Name", "Fresh")])];
    let mut tgt = vec![record(&[("Record ID", "REC-001"), ("Record Name", "x")])];
    let map = mapping(&[("REC Name", "Record Name")]);

    sync_records(&sot, &mut tgt, "REC ID", "Record ID", &map);

    let added = &tgt[1];
    assert_eq!(added.id("Record ID"), Some("REC-010"));
    assert_eq!(added.value("Record Name"), "Fresh");
    assert!(!added.contains_column("REC ID"));
}

#[test]
fn records_without_identifier_are_skipped_not_fatal() {
    let sot = vec![
        record(&[("REC ID", ""), ("Description", "No ID")]),
        record(&[("REC ID", "REC-005"), ("Description", "Kept")]),
    ];
    let mut tgt = Vec::new();
    let map = mapping(&[("Description", "Description")]);

    let summary = sync_records(&sot, &mut tgt, "REC ID", "REC ID", &map);

    assert_eq!(ids(&tgt, "REC ID"), ["REC-005"]);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].position, 1);
    assert!(summary.skipped[0].to_string().contains("missing unique ID"));
}

#[test]
fn whitespace_and_absent_values_compare_equal() {
    let sot = vec![record(&[("REC ID", "A"), ("Description", "  same  "), ("Owner", "")])];
    let mut tgt = vec![record(&[("REC ID", "A"), ("Description", "same")])];
    let map = mapping(&[("Description", "Description"), ("Owner", "Owner")]);

    let summary = sync_records(&sot, &mut tgt, "REC ID", "REC ID", &map);

    assert!(summary.updated.is_empty());
    assert_eq!(summary.change_count(), 0);
}

#[test]
fn pure_variant_leaves_input_untouched() {
    let (sot, tgt, map) = sample();
    let before = tgt.clone();
    let (after, summary) = sync(&sot, &tgt, "REC ID", "REC ID", &map);

    assert_eq!(tgt, before);
    assert_eq!(after.len(), 3);
    assert_eq!(summary.change_count(), 2);
}

#[test]
fn second_pass_changes_nothing() {
    let (sot, tgt, map) = sample();
    let (once, _) = sync(&sot, &tgt, "REC ID", "REC ID", &map);
    let (twice, summary) = sync(&sot, &once, "REC ID", "REC ID", &map);

    assert_eq!(once, twice);
    assert_eq!(summary.change_count(), 0);
}

#[test]
fn unmapped_columns_exclude_mapping_and_identifier() {
    let sot = vec![record(&[
        ("REC ID", "REC-001"),
        ("Description", "abc"),
        ("Owner", "x"),
        ("Extra2", ""),
        ("Extra1", "ignored"),
    ])];
    let map = mapping(&[("Description", "Description"), ("Owner", "Owner")]);
    assert_eq!(
        find_unmapped_sot_columns(&sot, &map, "REC ID"),
        ["Extra1", "Extra2"]
    );
    assert!(find_unmapped_sot_columns(&sot[..0], &map, "REC ID").is_empty());
}
