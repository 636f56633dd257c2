mod common;

use std::{collections::HashSet, fs};

use common::{TestWorkspace, mapping, record};
use tabsync::{
    orphans::{ORPHAN_SECTION_HEADER, OrphanRules, append_orphan_report, find_orphans},
    report::ReportArtifact,
};

fn id_set<'a>(ids: &[&'a str]) -> HashSet<&'a str> {
    ids.iter().copied().collect()
}

#[test]
fn reports_tgt_ids_missing_from_sot() {
    let tgt = vec![
        record(&[("REC ID", "REC-001"), ("Description", "desc A")]),
        record(&[("REC ID", "REC-002"), ("Description", "desc B")]),
        record(&[("REC ID", "REC-999"), ("Description", "orphan")]),
    ];
    let orphans = find_orphans(
        &tgt,
        &id_set(&["REC-001", "REC-002"]),
        "REC ID",
        &OrphanRules::default(),
    );
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].value("REC ID"), "REC-999");
}

#[test]
fn empty_tgt_has_no_orphans() {
    let orphans = find_orphans(&[], &id_set(&["REC-001"]), "REC ID", &OrphanRules::default());
    assert!(orphans.is_empty());
}

#[test]
fn blank_and_absent_ids_are_never_orphans() {
    let tgt = vec![
        record(&[("REC ID", "A")]),
        record(&[("REC ID", "")]),
        record(&[("No ID", "REC-XXX")]),
        record(&[("REC ID", "B")]),
    ];
    let orphans = find_orphans(&tgt, &HashSet::new(), "REC ID", &OrphanRules::default());
    let found: Vec<&str> = orphans.iter().map(|r| r.value("REC ID")).collect();
    assert_eq!(found, ["A", "B"]);
}

#[test]
fn prefix_mismatch_hides_record_from_detection() {
    let tgt = vec![
        record(&[("REC ID", "REC-100")]),
        record(&[("REC ID", "LEGACY-100")]),
    ];
    let rules = OrphanRules {
        id_prefix: Some("REC-"),
        ..OrphanRules::default()
    };
    let orphans = find_orphans(&tgt, &HashSet::new(), "REC ID", &rules);
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].value("REC ID"), "REC-100");
}

#[test]
fn ignored_statuses_suppress_orphans() {
    let tgt = vec![
        record(&[("REC ID", "REC-100"), ("State", " Retired ")]),
        record(&[("REC ID", "REC-200"), ("State", "Active")]),
    ];
    let ignore = vec!["Retired".to_string()];
    let rules = OrphanRules {
        id_prefix: None,
        status_column: "State",
        ignore_statuses: &ignore,
    };
    let orphans = find_orphans(&tgt, &HashSet::new(), "REC ID", &rules);
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].value("REC ID"), "REC-200");
}

#[test]
fn orphan_section_is_appended_after_existing_report() {
    let workspace = TestWorkspace::new();
    workspace.write("sync_diff_TEST.log", "[UPDATED] REC-001\n");
    let artifact = ReportArtifact::new(workspace.path(), "sync_diff_{timestamp}.log", "TEST");

    let sot = vec![record(&[("SOT ID", "REC-001")])];
    let tgt = vec![
        record(&[("Record ID", "REC-001"), ("Description", "kept")]),
        record(&[("Record ID", "REC-999"), ("Description", "legacy")]),
    ];

    let orphan_ids = append_orphan_report(
        &artifact,
        &sot,
        &tgt,
        "SOT ID",
        "Record ID",
        &mapping(&[("Description", "Description")]),
        &OrphanRules::default(),
    )
    .expect("append orphans");

    assert_eq!(orphan_ids, ["REC-999"]);
    let content = fs::read_to_string(artifact.path()).expect("read report");
    assert!(content.starts_with("[UPDATED] REC-001\n"));
    assert!(content.contains(ORPHAN_SECTION_HEADER));
    assert!(content.contains("[ORPHANED] REC-999"));
    assert!(!content.contains("legacy"), "orphan lines carry the id only");
}

#[test]
fn no_orphans_leaves_the_artifact_untouched() {
    let workspace = TestWorkspace::new();
    workspace.write("sync_diff_TEST.log", "PREVIOUS\n");
    let artifact = ReportArtifact::new(workspace.path(), "sync_diff_{timestamp}.log", "TEST");

    let rows = vec![record(&[("ID", "A")])];
    let orphan_ids = append_orphan_report(
        &artifact,
        &rows,
        &rows,
        "ID",
        "ID",
        &mapping(&[]),
        &OrphanRules::default(),
    )
    .expect("no-op");

    assert!(orphan_ids.is_empty());
    assert_eq!(
        fs::read_to_string(artifact.path()).expect("read report"),
        "PREVIOUS\n"
    );
}

#[test]
fn orphan_report_respects_the_timestamp_token() {
    let workspace = TestWorkspace::new();
    let artifact = ReportArtifact::new(workspace.path(), "sync_diff_{timestamp}.log", "ABC123");

    append_orphan_report(
        &artifact,
        &[record(&[("ID", "A")])],
        &[record(&[("ID", "B")])],
        "ID",
        "ID",
        &mapping(&[]),
        &OrphanRules::default(),
    )
    .expect("append orphans");

    assert!(workspace.path().join("sync_diff_ABC123.log").exists());
}
