use std::fs;
use std::path::Path;

use attackgraph::{AttackgraphOptions, run_main};
use attackgraph_error::ErrorKind;
use serde_json::json;
use tempfile::tempdir;

fn fixture_bundle() -> String {
    json!({
        "type": "bundle",
        "id": "bundle--fixture",
        "objects": [
            {
                "type": "x-mitre-tactic",
                "id": "x-mitre-tactic--exec",
                "name": "Execution",
                "description": "Running adversary code.",
                "x_mitre_shortname": "execution",
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "TA0002"}
                ]
            },
            {
                "type": "attack-pattern",
                "id": "attack-pattern--t1059",
                "name": "Command and Scripting Interpreter",
                "description": "Abuses interpreters. (Citation: Interp 2020)",
                "kill_chain_phases": [
                    {"kill_chain_name": "mitre-attack", "phase_name": "execution"}
                ],
                "x_mitre_platforms": ["Windows", "Linux"],
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "T1059"}
                ]
            },
            {
                "type": "attack-pattern",
                "id": "attack-pattern--t1059-001",
                "name": "PowerShell",
                "description": "PowerShell abuse.",
                "x_mitre_is_subtechnique": true,
                "kill_chain_phases": [
                    {"kill_chain_name": "mitre-attack", "phase_name": "execution"}
                ],
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "T1059.001"}
                ]
            },
            {
                "type": "attack-pattern",
                "id": "attack-pattern--t1086",
                "name": "PowerShell Legacy",
                "description": "Superseded technique.",
                "revoked": true,
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "T1086"}
                ]
            },
            {
                "type": "course-of-action",
                "id": "course-of-action--m1038",
                "name": "Execution Prevention",
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "M1038"}
                ]
            },
            {
                "type": "malware",
                "id": "malware--s0154",
                "name": "Cobalt Strike",
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "S0154"}
                ]
            },
            {
                "type": "relationship",
                "id": "relationship--sub",
                "relationship_type": "subtechnique-of",
                "source_ref": "attack-pattern--t1059-001",
                "target_ref": "attack-pattern--t1059"
            },
            {
                "type": "relationship",
                "id": "relationship--mit",
                "relationship_type": "mitigates",
                "source_ref": "course-of-action--m1038",
                "target_ref": "attack-pattern--t1059"
            },
            {
                "type": "relationship",
                "id": "relationship--use",
                "relationship_type": "uses",
                "source_ref": "malware--s0154",
                "target_ref": "attack-pattern--t1059"
            },
            {
                "type": "relationship",
                "id": "relationship--rev",
                "relationship_type": "revoked-by",
                "source_ref": "attack-pattern--t1086",
                "target_ref": "attack-pattern--t1059-001"
            }
        ]
    })
    .to_string()
}

fn write_fixture() -> (tempfile::TempDir, String) {
    let dir = tempdir().expect("tempdir");
    let bundle_path = dir.path().join("enterprise.json");
    fs::write(&bundle_path, fixture_bundle()).expect("write fixture");
    (dir, bundle_path.display().to_string())
}

fn base_options(bundles: Vec<String>, out: String) -> AttackgraphOptions {
    AttackgraphOptions {
        bundles,
        dirs: Vec::new(),
        out,
        nested_file: "attack_nested.json".to_string(),
        skip_records: false,
        skip_nested: false,
        keep_revoked: false,
        sequential: false,
    }
}

#[test]
fn extracts_records_and_nested_kb() {
    let (dir, bundle) = write_fixture();
    let out = dir.path().join("out").display().to_string();

    let summary = run_main(&base_options(vec![bundle], out.clone())).expect("run");

    assert_eq!(summary.bundles_loaded, 1);
    assert_eq!(summary.bundles_failed, 0);
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.records_failed, 0);
    assert!(summary.nested_written);

    let out = Path::new(&out);
    let parent = fs::read_to_string(
        out.join("T1059_Command_and_Scripting_Interpreter.txt"),
    )
    .expect("parent record");
    assert!(parent.contains("\"technique_id\": \"T1059\""));
    // Records keep citation markers verbatim.
    assert!(parent.contains("(Citation: Interp 2020)"));

    assert!(out.join("T1059_001_PowerShell.txt").exists());
    // Revoked techniques get no record file.
    assert!(!out.join("T1086_PowerShell_Legacy.txt").exists());

    let kb: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("attack_nested.json")).expect("kb"))
            .expect("kb parses");
    assert_eq!(
        kb["T1059"]["description"],
        "Abuses interpreters.",
        "nested descriptions are citation-scrubbed"
    );
    assert_eq!(kb["T1059"]["sub_techniques"][0]["id"], "T1059.001");
    assert_eq!(kb["T1059"]["software"][0], "S0154 (Cobalt Strike)");
    assert_eq!(kb["T1059"]["mitigations"][0], "M1038 (Execution Prevention)");
    assert_eq!(kb["T1086"]["revoked"], true);
    assert_eq!(kb["T1086"]["revoked_by"], "T1059.001");
}

#[test]
fn scans_directories_for_bundles() {
    let (dir, _bundle) = write_fixture();
    let out = dir.path().join("out").display().to_string();

    let mut opts = base_options(Vec::new(), out.clone());
    opts.dirs = vec![dir.path().display().to_string()];

    let summary = run_main(&opts).expect("run");
    assert_eq!(summary.bundles_loaded, 1);
    assert!(Path::new(&out).join("attack_nested.json").exists());
}

#[test]
fn skips_unparseable_bundles() {
    let (dir, bundle) = write_fixture();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "not json at all").expect("write broken");
    let out = dir.path().join("out").display().to_string();

    let summary = run_main(&base_options(
        vec![bundle, broken.display().to_string()],
        out,
    ))
    .expect("run");

    assert_eq!(summary.bundles_loaded, 1);
    assert_eq!(summary.bundles_failed, 1);
    assert_eq!(summary.records_written, 2);
}

#[test]
fn fails_when_no_bundle_loads() {
    let dir = tempdir().expect("tempdir");
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "]").expect("write broken");
    let out = dir.path().join("out").display().to_string();

    let err = run_main(&base_options(vec![broken.display().to_string()], out))
        .expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::GraphBuildFailed);
}

#[test]
fn fails_when_nothing_discovered() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("out").display().to_string();

    let mut opts = base_options(Vec::new(), out);
    opts.dirs = vec![dir.path().display().to_string()];

    let err = run_main(&opts).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[test]
fn honors_skip_switches() {
    let (dir, bundle) = write_fixture();

    let records_out = dir.path().join("records_only").display().to_string();
    let mut opts = base_options(vec![bundle.clone()], records_out.clone());
    opts.skip_nested = true;
    let summary = run_main(&opts).expect("records-only run");
    assert!(!summary.nested_written);
    assert!(!Path::new(&records_out).join("attack_nested.json").exists());
    assert_eq!(summary.records_written, 2);

    let nested_out = dir.path().join("nested_only").display().to_string();
    let mut opts = base_options(vec![bundle], nested_out.clone());
    opts.skip_records = true;
    let summary = run_main(&opts).expect("nested-only run");
    assert_eq!(summary.records_written, 0);
    assert!(Path::new(&nested_out).join("attack_nested.json").exists());
    let entries = fs::read_dir(&nested_out).expect("read out dir").count();
    assert_eq!(entries, 1, "only the nested KB is written");
}

#[test]
fn keeps_revoked_when_requested() {
    let (dir, bundle) = write_fixture();
    let out = dir.path().join("out").display().to_string();

    let mut opts = base_options(vec![bundle], out.clone());
    opts.keep_revoked = true;

    let summary = run_main(&opts).expect("run");
    assert_eq!(summary.records_written, 3);
    assert!(Path::new(&out).join("T1086_PowerShell_Legacy.txt").exists());
}

#[test]
fn sequential_writes_identical_files() {
    let (dir, bundle) = write_fixture();

    let par_out = dir.path().join("par").display().to_string();
    run_main(&base_options(vec![bundle.clone()], par_out.clone())).expect("parallel run");

    let seq_out = dir.path().join("seq").display().to_string();
    let mut opts = base_options(vec![bundle], seq_out.clone());
    opts.sequential = true;
    run_main(&opts).expect("sequential run");

    let mut par_files: Vec<String> = fs::read_dir(&par_out)
        .expect("read parallel out")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    par_files.sort();
    assert_eq!(par_files.len(), 3, "two records plus the nested KB");

    for name in &par_files {
        let par_body = fs::read_to_string(Path::new(&par_out).join(name)).expect("parallel file");
        let seq_body = fs::read_to_string(Path::new(&seq_out).join(name)).expect("sequential file");
        assert_eq!(par_body, seq_body, "{name} differs between modes");
    }
}
