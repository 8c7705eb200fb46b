//! End-to-end lock: the sample suite collects, runs, and persists as a
//! report directory that reads back to the same digest.

use checkpoint_harness::config::HarnessConfig;
use checkpoint_harness::report::CaseOutcome;
use checkpoint_harness::report_dir::{
    read_report_dir, verify_report_dir, write_report_dir, ReportDirReadError,
};
use checkpoint_harness::runner::run_suite;
use checkpoint_harness::suites::sample;
use lock_tests::init_tracing;

#[test]
fn sample_suite_outcomes() {
    init_tracing();
    let report = run_suite(&sample::suite(), &HarnessConfig::default());
    assert!(report.is_success(), "{report:?}");

    let ids: Vec<&str> = report.cases.iter().map(|c| c.node_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "kv_lookups[alpha]",
            "kv_lookups[beta]",
            "kv_lookups[gamma]",
            "kv_tags[smoke]",
            "kv_tags[delta]",
            "kv_tags[full_scan]",
            "kv_plain",
            "seed_size[0]",
        ]
    );
    assert_eq!(
        report.case("kv_tags[delta]").unwrap().outcome,
        CaseOutcome::XFailed {
            reason: "delta is never seeded".into()
        }
    );
    assert_eq!(report.case("kv_plain").unwrap().call_index, None);
    assert_eq!(
        report.plan_digests.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["kv_lookups", "kv_nothing", "kv_tags", "seed_size"]
    );
}

#[test]
fn label_selection_runs_only_matching_cases() {
    let config = HarnessConfig {
        select_labels: Some(vec!["smoke".into()]),
        ..HarnessConfig::default()
    };
    let report = run_suite(&sample::suite(), &config);
    let ids: Vec<&str> = report.cases.iter().map(|c| c.node_id.as_str()).collect();
    assert_eq!(ids, vec!["kv_tags[smoke]"]);
    assert_eq!(report.deselected, 7);
}

#[test]
fn report_dir_roundtrip() {
    init_tracing();
    let report = run_suite(&sample::suite(), &HarnessConfig::default());
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("run");

    let written = write_report_dir(&report, &out).unwrap();
    assert_eq!(written, report.digest().unwrap());

    let stored = read_report_dir(&out).unwrap();
    assert_eq!(stored.digest, written);
    assert_eq!(stored.canonical_bytes, report.to_canonical_json().unwrap());
    assert_eq!(stored.report["schema_version"], serde_json::json!("suite_report.v1"));
    assert_eq!(stored.report["summary"]["passed"], 6);
    assert_eq!(verify_report_dir(&out).unwrap(), written);
}

#[test]
fn report_dir_fails_closed() {
    let report = run_suite(&sample::suite(), &HarnessConfig::default());
    let dir = tempfile::tempdir().unwrap();
    write_report_dir(&report, dir.path()).unwrap();

    std::fs::write(dir.path().join("report_digest.txt"), "sha256:00").unwrap();
    assert!(matches!(
        verify_report_dir(dir.path()).unwrap_err(),
        ReportDirReadError::DigestMismatch { .. }
    ));

    std::fs::remove_file(dir.path().join("report.json")).unwrap();
    assert!(matches!(
        verify_report_dir(dir.path()).unwrap_err(),
        ReportDirReadError::MissingFile { .. }
    ));
}
