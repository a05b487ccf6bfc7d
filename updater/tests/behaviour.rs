//! Behaviour-driven tests for the update pipeline.
//!
//! These scenarios drive the orchestrator end to end against a stubbed
//! release server and a temporary installation directory.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use simple64_updater::config::UpdaterConfig;
use simple64_updater::pipeline::{PipelineOutcome, UpdateOrchestrator, spawn_update};
use simple64_updater::status::{display_statuses, status_channel};
use simple64_updater::test_utils::{
    RecordingSink, StubResponse, StubTransport, TreeSnapshot, ZipBuilder, release_json,
    snapshot_tree,
};
use std::cell::RefCell;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const RELEASE_URL: &str = "http://releases.test/repos/simple64/releases/latest";
const LINUX_URL: &str = "http://releases.test/download/simple64-linux.zip";
const WIN64_URL: &str = "http://releases.test/download/simple64-win64-1.2.0.zip";

// ---------------------------------------------------------------------------
// Update world
// ---------------------------------------------------------------------------

struct UpdateWorld {
    _temp: TempDir,
    target: Utf8PathBuf,
    transport: RefCell<StubTransport>,
    requests: RefCell<Vec<String>>,
    outcome: RefCell<Option<PipelineOutcome>>,
    final_status: RefCell<Option<String>>,
    first_run_tree: RefCell<Option<TreeSnapshot>>,
}

impl UpdateWorld {
    fn stub(&self, url: &str, response: StubResponse) {
        let transport = self.transport.take();
        self.transport.replace(transport.with(url, response));
    }

    fn config(&self) -> UpdaterConfig {
        UpdaterConfig::new(self.target.clone())
            .with_release_url(RELEASE_URL)
            .with_asset_marker("simple64-win64")
            .without_delays()
    }

    fn run_in_place(&self) {
        let transport = self.transport.borrow();
        let sink = RecordingSink::new();
        let report = UpdateOrchestrator::new(&self.config(), &*transport, &sink).run();
        self.requests.replace(transport.requests());
        self.final_status.replace(sink.statuses().last().cloned());
        self.outcome.replace(Some(report.outcome));
    }

    fn outcome(&self) -> PipelineOutcome {
        self.outcome
            .borrow()
            .clone()
            .expect("the update has not run")
    }
}

#[fixture]
fn update_world() -> UpdateWorld {
    let temp = TempDir::new().expect("failed to create temp dir");
    let target = Utf8PathBuf::try_from(temp.path().join("simple64")).expect("temp path not UTF-8");
    UpdateWorld {
        _temp: temp,
        target,
        transport: RefCell::new(StubTransport::new()),
        requests: RefCell::new(Vec::new()),
        outcome: RefCell::new(None),
        final_status: RefCell::new(None),
        first_run_tree: RefCell::new(None),
    }
}

#[given("a release listing simple64-linux.zip and simple64-win64-1.2.0.zip")]
fn given_release_listing(update_world: &UpdateWorld) {
    update_world.stub(
        RELEASE_URL,
        StubResponse::Body(release_json(&[
            ("simple64-linux.zip", LINUX_URL),
            ("simple64-win64-1.2.0.zip", WIN64_URL),
        ])),
    );
}

#[given("the release endpoint answers with status 500")]
fn given_release_server_error(update_world: &UpdateWorld) {
    update_world.stub(RELEASE_URL, StubResponse::Status(500));
}

#[given("the release archive holds the simple64 gui and readme")]
fn given_release_archive(update_world: &UpdateWorld) {
    let archive = ZipBuilder::new()
        .directory("simple64/")
        .file("simple64/simple64-gui.exe", b"new gui")
        .file("simple64/readme.txt", b"notes")
        .file("simple64/plugins/video.dll", b"new video")
        .finish();
    update_world.stub(WIN64_URL, StubResponse::Body(archive));
}

#[given("the release archive holds an entry outside the simple64 directory")]
fn given_escaping_archive(update_world: &UpdateWorld) {
    let archive = ZipBuilder::new()
        .file("simple64/readme.txt", b"notes")
        .file("escaped.txt", b"should not land")
        .finish();
    update_world.stub(WIN64_URL, StubResponse::Body(archive));
}

#[given("an installation with stale binaries and user data")]
fn given_existing_installation(update_world: &UpdateWorld) {
    let target = &update_world.target;
    fs::create_dir_all(target.join("plugins")).expect("failed to create plugins dir");
    fs::write(target.join("simple64-gui.exe"), b"old gui").expect("failed to write gui");
    fs::write(target.join("plugins/old-video.dll"), b"old plugin").expect("failed to write dll");
    fs::write(target.join("keep.dat"), b"save data").expect("failed to write user data");
}

#[given("no installation directory exists")]
fn given_no_installation(update_world: &UpdateWorld) {
    assert!(!update_world.target.exists());
}

#[when("the update runs")]
fn when_update_runs(update_world: &UpdateWorld) {
    update_world.run_in_place();
}

#[when("the update runs twice")]
fn when_update_runs_twice(update_world: &UpdateWorld) {
    update_world.run_in_place();
    assert!(update_world.outcome().is_success(), "first run failed");
    let first = snapshot_tree(update_world.target.as_std_path());
    update_world.first_run_tree.replace(Some(first));
    update_world.run_in_place();
}

#[when("the update runs in the background")]
fn when_update_runs_in_background(update_world: &UpdateWorld) {
    let (handle, mut receiver) = status_channel();
    let transport = Arc::new(update_world.transport.take());
    let completion = spawn_update(update_world.config(), Arc::clone(&transport), handle)
        .expect("failed to spawn update");

    let mut display = Vec::new();
    let last = display_statuses(&mut receiver, &mut display);
    update_world.outcome.replace(Some(completion.wait()));
    update_world.final_status.replace(last);
    update_world.requests.replace(transport.requests());
}

#[then("the update succeeds")]
fn then_update_succeeds(update_world: &UpdateWorld) {
    assert_eq!(update_world.outcome(), PipelineOutcome::Success);
}

#[then("the update fails")]
fn then_update_fails(update_world: &UpdateWorld) {
    assert!(!update_world.outcome().is_success());
}

#[then("simple64-win64-1.2.0.zip was downloaded")]
fn then_win64_downloaded(update_world: &UpdateWorld) {
    let requests = update_world.requests.borrow();
    assert!(requests.iter().any(|url| url == WIN64_URL));
    assert!(!requests.iter().any(|url| url == LINUX_URL));
}

#[then("nothing was downloaded")]
fn then_nothing_downloaded(update_world: &UpdateWorld) {
    assert_eq!(*update_world.requests.borrow(), vec![RELEASE_URL.to_owned()]);
}

#[then("the file {path} contains {expected}")]
fn then_file_contains(update_world: &UpdateWorld, path: String, expected: String) {
    let contents = fs::read_to_string(update_world.target.join(&path))
        .unwrap_or_else(|e| panic!("failed to read {path}: {e}"));
    assert_eq!(contents, expected);
}

#[then("the file {path} is gone")]
fn then_file_is_gone(update_world: &UpdateWorld, path: String) {
    assert!(!update_world.target.join(&path).exists());
    let parent = update_world.target.parent().expect("target has a parent");
    assert!(!parent.join(&path).exists());
}

#[then("the final status is {expected}")]
fn then_final_status_is(update_world: &UpdateWorld, expected: String) {
    assert_eq!(update_world.final_status.borrow().as_deref(), Some(expected.as_str()));
}

#[then("the final status mentions {fragment}")]
fn then_final_status_mentions(update_world: &UpdateWorld, fragment: String) {
    let status = update_world.final_status.borrow();
    let status = status.as_deref().expect("no status was reported");
    assert!(status.contains(&fragment), "{status:?} lacks {fragment:?}");
}

#[then("the installation lists {names}")]
fn then_installation_lists(update_world: &UpdateWorld, names: String) {
    let mut actual: Vec<String> = fs::read_dir(&update_world.target)
        .expect("failed to read installation")
        .map(|entry| {
            entry
                .expect("failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    actual.sort();
    let expected: Vec<String> = names.split(", ").map(str::to_owned).collect();
    assert_eq!(actual, expected);
}

#[then("the installation matches the tree left by the first run")]
fn then_installation_matches_first_run(update_world: &UpdateWorld) {
    let first = update_world.first_run_tree.borrow();
    let first = first.as_ref().expect("the update has not run twice");
    assert_eq!(&snapshot_tree(update_world.target.as_std_path()), first);
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/update_pipeline.feature", index = 0)]
fn scenario_update_from_latest_release(update_world: UpdateWorld) {
    let _ = update_world;
}

#[scenario(path = "tests/features/update_pipeline.feature", index = 1)]
fn scenario_release_lookup_server_error(update_world: UpdateWorld) {
    let _ = update_world;
}

#[scenario(path = "tests/features/update_pipeline.feature", index = 2)]
fn scenario_install_into_missing_directory(update_world: UpdateWorld) {
    let _ = update_world;
}

#[scenario(path = "tests/features/update_pipeline.feature", index = 3)]
fn scenario_update_is_idempotent(update_world: UpdateWorld) {
    let _ = update_world;
}

#[scenario(path = "tests/features/update_pipeline.feature", index = 4)]
fn scenario_reject_entry_outside_root(update_world: UpdateWorld) {
    let _ = update_world;
}
