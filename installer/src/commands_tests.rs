//! Tests for the subcommand handlers.

use super::*;
use crate::api::FileManifest;
use crate::installed::record_path;
use crate::pipeline::PipelineContext;
use crate::test_utils::{
    RecordingObserver, ScriptedArchiveEngine, ScriptedDownloader, StaticManifestFetcher, release,
};
use rstest::rstest;
use std::sync::Arc;
use tempfile::TempDir;

const STABLE_URL: &str = "https://downloads.example.test/keeperfx_1_3_0_complete.7z";

/// A Write implementation that always fails, for testing error paths.
struct FailingWriter;

impl std::io::Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("simulated write failure"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Err(std::io::Error::other("simulated flush failure"))
    }
}

fn fetcher() -> StaticManifestFetcher {
    StaticManifestFetcher::new().with_release(release(ReleaseChannel::Stable, "1.3.0", STABLE_URL))
}

fn pipeline(root: &TempDir, fetcher: StaticManifestFetcher) -> UpdatePipeline {
    UpdatePipeline::new(
        PipelineContext::new(root.path()),
        Box::new(fetcher),
        Arc::new(ScriptedDownloader::succeeding(b"archive bytes")),
        Arc::new(ScriptedArchiveEngine::with_files(&[("keeperfx.exe", b"binary".as_slice())])),
    )
}

fn output_of(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout).into_owned()
}

// -------------------------------------------------------------------------
// installed version and channel
// -------------------------------------------------------------------------

#[test]
fn current_argument_overrides_record() {
    let root = tempfile::tempdir().expect("temp dir");
    record_installed(root.path(), &VersionInfo::parse("1.0.0")).expect("record");

    let installed = installed_version(root.path(), Some("1.2.0.4100 Alpha")).expect("version");

    assert_eq!(installed.channel(), ReleaseChannel::Alpha);
    assert_eq!(installed.version(), "1.2.0.4100");
}

#[test]
fn record_is_used_without_current_argument() {
    let root = tempfile::tempdir().expect("temp dir");
    record_installed(root.path(), &VersionInfo::parse("1.0.0")).expect("record");

    let installed = installed_version(root.path(), None).expect("version");

    assert_eq!(installed.version(), "1.0.0");
}

#[rstest]
#[case::explicit_wins(Some(ChannelArg::Stable), "1.2.0.4100 Alpha", ReleaseChannel::Stable)]
#[case::keeps_alpha(None, "1.2.0.4100 Alpha", ReleaseChannel::Alpha)]
#[case::keeps_stable(None, "1.2.0", ReleaseChannel::Stable)]
#[case::prototype_falls_back(None, "1.2.0.4100 Prototype", ReleaseChannel::Stable)]
fn selects_target_channel(
    #[case] requested: Option<ChannelArg>,
    #[case] installed: &str,
    #[case] expected: ReleaseChannel,
) {
    let installed = VersionInfo::parse(installed);
    assert_eq!(target_channel(requested, &installed), expected);
}

// -------------------------------------------------------------------------
// check
// -------------------------------------------------------------------------

#[rstest]
#[case::older("1.2.0", "Update available: 1.2.0 -> 1.3.0")]
#[case::current("1.3.0", "KeeperFX 1.3.0 is up to date")]
fn check_reports_availability(#[case] current: &str, #[case] expected: &str) {
    let root = tempfile::tempdir().expect("temp dir");
    let args = CheckArgs {
        current: Some(current.to_owned()),
        ..CheckArgs::default()
    };
    let mut stdout = Vec::new();

    run_check(&fetcher(), root.path(), &args, &mut stdout).expect("check");

    assert_eq!(output_of(&stdout).trim_end(), expected);
}

#[test]
fn check_json_includes_latest_release() {
    let root = tempfile::tempdir().expect("temp dir");
    let args = CheckArgs {
        current: Some("1.2.0".to_owned()),
        json: true,
        ..CheckArgs::default()
    };
    let mut stdout = Vec::new();

    run_check(&fetcher(), root.path(), &args, &mut stdout).expect("check");

    let report: serde_json::Value = serde_json::from_slice(&stdout).expect("json output");
    assert_eq!(report["installed"], "1.2.0");
    assert_eq!(report["channel"], "stable");
    assert_eq!(report["latest"], "1.3.0");
    assert_eq!(report["update_available"], true);
}

#[test]
fn check_propagates_fetch_failure() {
    let root = tempfile::tempdir().expect("temp dir");
    let mut stdout = Vec::new();

    let result = run_check(
        &fetcher().failing("offline"),
        root.path(),
        &CheckArgs::default(),
        &mut stdout,
    );

    assert!(matches!(result, Err(CommandError::Update(_))));
    assert!(stdout.is_empty());
}

// -------------------------------------------------------------------------
// install and update
// -------------------------------------------------------------------------

#[test]
fn install_records_installed_release() {
    let root = tempfile::tempdir().expect("temp dir");
    let mut pipeline = pipeline(&root, fetcher());

    let installed = run_install(
        &mut pipeline,
        &InstallArgs::default(),
        &mut RecordingObserver::default(),
    )
    .expect("install");

    assert_eq!(installed.version(), "1.3.0");
    let recorded = read_installed(root.path()).expect("record");
    assert_eq!(recorded.version(), "1.3.0");
    assert_eq!(recorded.channel(), ReleaseChannel::Stable);
}

#[test]
fn failed_install_leaves_record_untouched() {
    let root = tempfile::tempdir().expect("temp dir");
    let mut pipeline = pipeline(&root, StaticManifestFetcher::new());

    let result = run_install(
        &mut pipeline,
        &InstallArgs::default(),
        &mut RecordingObserver::default(),
    );

    assert!(matches!(result, Err(CommandError::Update(_))));
    assert!(!record_path(root.path()).exists());
}

#[test]
fn update_skips_pipeline_when_current() {
    let root = tempfile::tempdir().expect("temp dir");
    record_installed(root.path(), &VersionInfo::parse("1.3.0")).expect("record");
    let mut pipeline = pipeline(&root, fetcher());
    let mut observer = RecordingObserver::default();

    let updated = run_update(&fetcher(), &mut pipeline, &UpdateArgs::default(), &mut observer)
        .expect("update");

    assert!(updated.is_none());
    assert!(observer.states.is_empty());
    assert_eq!(observer.messages, vec!["KeeperFX 1.3.0 is up to date".to_owned()]);
}

#[test]
fn update_installs_newer_release_and_records_it() {
    let root = tempfile::tempdir().expect("temp dir");
    record_installed(root.path(), &VersionInfo::parse("1.2.0")).expect("record");
    let mut pipeline = pipeline(&root, fetcher());

    let updated = run_update(
        &fetcher(),
        &mut pipeline,
        &UpdateArgs::default(),
        &mut RecordingObserver::default(),
    )
    .expect("update");

    assert_eq!(updated.map(|v| v.version().to_owned()), Some("1.3.0".to_owned()));
    assert_eq!(read_installed(root.path()).expect("record").version(), "1.3.0");
    assert!(root.path().join("keeperfx.exe").exists());
}

// -------------------------------------------------------------------------
// files-to-remove
// -------------------------------------------------------------------------

fn removal_root() -> TempDir {
    let root = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        root.path().join(removal::REMOVAL_MANIFEST_FILE),
        "[1.0.0]\nold.dat\ngone.dat\n[2.0.0]\nfuture.dat\n",
    )
    .expect("write manifest");
    std::fs::write(root.path().join("old.dat"), "x").expect("write old");
    std::fs::write(root.path().join("future.dat"), "x").expect("write future");
    root
}

#[test]
fn files_to_remove_lists_active_existing_files() {
    let root = removal_root();
    let args = ReportArgs {
        current: Some("1.5.0".to_owned()),
        json: false,
    };
    let mut stdout = Vec::new();

    run_files_to_remove(&LauncherConfig::default(), root.path(), &args, &mut stdout)
        .expect("list");

    let output = output_of(&stdout);
    assert!(output.contains("  - old.dat"), "{output}");
    assert!(!output.contains("future.dat"), "{output}");
    assert!(!output.contains("gone.dat"), "{output}");
    assert!(root.path().join("old.dat").exists());
}

#[test]
fn files_to_remove_json_lists_paths() {
    let root = removal_root();
    let args = ReportArgs {
        current: Some("2.0.0".to_owned()),
        json: true,
    };
    let mut stdout = Vec::new();

    run_files_to_remove(&LauncherConfig::default(), root.path(), &args, &mut stdout)
        .expect("list");

    let report: serde_json::Value = serde_json::from_slice(&stdout).expect("json output");
    assert_eq!(report["files"], serde_json::json!(["old.dat", "future.dat"]));
}

#[test]
fn files_to_remove_needs_installed_version() {
    let root = removal_root();
    let mut stdout = Vec::new();

    let result = run_files_to_remove(
        &LauncherConfig::default(),
        root.path(),
        &ReportArgs::default(),
        &mut stdout,
    );

    assert!(matches!(result, Err(CommandError::UnknownInstalledVersion)));
}

#[test]
fn files_to_remove_reports_write_failure() {
    let root = removal_root();
    let args = ReportArgs {
        current: Some("1.5.0".to_owned()),
        json: false,
    };

    let result = run_files_to_remove(
        &LauncherConfig::default(),
        root.path(),
        &args,
        &mut FailingWriter,
    );

    assert!(matches!(result, Err(CommandError::WriteFailed { .. })));
}

// -------------------------------------------------------------------------
// verify
// -------------------------------------------------------------------------

fn verify_fixture() -> (TempDir, StaticManifestFetcher) {
    let root = tempfile::tempdir().expect("temp dir");
    std::fs::write(root.path().join("a.txt"), "a").expect("write a");
    std::fs::write(root.path().join("b.txt"), "changed").expect("write b");
    let mut files = FileManifest::new();
    files.insert("/a.txt".to_owned(), "e8b7be43".to_owned());
    files.insert("/b.txt".to_owned(), "e8b7be43".to_owned());
    files.insert("/c.txt".to_owned(), "1".to_owned());
    (root, fetcher().with_files(files))
}

#[test]
fn verify_lists_stale_files() {
    let (root, fetcher) = verify_fixture();
    let args = ReportArgs {
        current: Some("1.3.0".to_owned()),
        json: false,
    };
    let mut stdout = Vec::new();

    run_verify(&fetcher, root.path(), &args, &mut stdout).expect("verify");

    let output = output_of(&stdout);
    assert!(output.starts_with("2 of 3 files differ"), "{output}");
    assert!(output.contains("  - b.txt"));
    assert!(output.contains("  - c.txt"));
    assert!(!output.contains("a.txt"));
}

#[test]
fn verify_json_counts_checked_files() {
    let (root, fetcher) = verify_fixture();
    let args = ReportArgs {
        current: Some("1.3.0".to_owned()),
        json: true,
    };
    let mut stdout = Vec::new();

    run_verify(&fetcher, root.path(), &args, &mut stdout).expect("verify");

    let report: serde_json::Value = serde_json::from_slice(&stdout).expect("json output");
    assert_eq!(report["checked"], 3);
    assert_eq!(report["stale"], serde_json::json!(["b.txt", "c.txt"]));
}

#[test]
fn verify_rejects_prototype_builds() {
    let (root, fetcher) = verify_fixture();
    let args = ReportArgs {
        current: Some("1.3.0.4100 Prototype".to_owned()),
        json: false,
    };
    let mut stdout = Vec::new();

    let result = run_verify(&fetcher, root.path(), &args, &mut stdout);

    assert!(matches!(result, Err(CommandError::Update(_))));
}
