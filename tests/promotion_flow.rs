//! End-to-end promotion against a real git repository.
//!
//! These tests drive the actual `git` binary: a seed repository is cloned
//! into a bare "remote", a working clone is made from it, and a change is
//! promoted through the full workflow. They are skipped when git is not
//! installed.

use scmpromote::infrastructure::process::CommandExecutor;
use scmpromote::{
    FileState, GitScm, LogOptions, PromoteChangeConfig, PromoteChangeUseCase, RepositoryHandle,
    ScmOperations,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn git_available() -> bool {
    CommandExecutor::find_tool_path("git").is_some()
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Give the repository a commit identity so commits work on a bare CI host.
fn set_identity(scm: &GitScm) {
    scm.raw_command(&argv(&["config", "user.email", "ci@example.com"]), None, None)
        .unwrap();
    scm.raw_command(&argv(&["config", "user.name", "ci-bot"]), None, None)
        .unwrap();
}

/// Seed repository with one committed file, a bare clone of it acting as
/// the remote, and a working clone attached to that remote.
struct Fixture {
    _temp: TempDir,
    work: GitScm,
    remote_path: std::path::PathBuf,
    branch: String,
}

fn setup() -> Fixture {
    let temp = TempDir::new().unwrap();

    let seed_path = temp.path().join("seed");
    std::fs::create_dir(&seed_path).unwrap();
    let seed = GitScm::new(RepositoryHandle::new(&seed_path)).unwrap();
    seed.initialize().unwrap();
    set_identity(&seed);
    std::fs::write(seed_path.join("model.txt"), "revision 1\n").unwrap();
    seed.add_files(&[]).unwrap();
    seed.commit("initial import").unwrap();
    let branch = seed.current_branch().unwrap();

    let remote_path = temp.path().join("remote.git");
    seed.raw_command(
        &argv(&[
            "clone",
            "--bare",
            seed_path.to_str().unwrap(),
            remote_path.to_str().unwrap(),
        ]),
        Some(temp.path()),
        None,
    )
    .unwrap();

    let work_path = temp.path().join("work");
    let work = GitScm::new(
        RepositoryHandle::new(&work_path).with_remote_url(remote_path.to_str().unwrap()),
    )
    .unwrap();
    work.clone_repository().unwrap();
    set_identity(&work);

    Fixture {
        _temp: temp,
        work,
        remote_path,
        branch,
    }
}

fn remote_tip(scm: &GitScm, remote_path: &Path, branch: &str) -> String {
    scm.raw_command(&argv(&["rev-parse", branch]), Some(remote_path), None)
        .unwrap()
        .trim()
        .to_string()
}

#[test]
fn promotes_a_change_and_advances_the_remote() {
    if !git_available() {
        return;
    }
    let fixture = setup();

    let config = PromoteChangeConfig::new(&fixture.branch, "promote model updates");
    let work = Arc::new(fixture.work);
    let use_case = PromoteChangeUseCase::new(work.clone(), config);

    let hash = use_case
        .execute(|repo_path| {
            std::fs::write(repo_path.join("model.txt"), "revision 2\n")?;
            Ok(())
        })
        .unwrap();

    // Fast-forward merge: the target tip is the promoted commit itself.
    assert_eq!(work.current_branch().unwrap(), fixture.branch);
    assert_eq!(work.current_revision(false, None).unwrap(), hash);

    // The remote accepted the push.
    assert_eq!(
        remote_tip(&work, &fixture.remote_path, &fixture.branch),
        hash
    );

    // The promoted commit carries the configured message.
    let entries = work
        .log(&LogOptions::new().with_revision(&hash))
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "promote model updates");
}

#[test]
fn promotion_with_untouched_files_fails_without_pushing() {
    if !git_available() {
        return;
    }
    let fixture = setup();

    let before = remote_tip(&fixture.work, &fixture.remote_path, &fixture.branch);

    let config = PromoteChangeConfig::new(&fixture.branch, "no-op change");
    let work = Arc::new(fixture.work);
    let use_case = PromoteChangeUseCase::new(work.clone(), config);

    let err = use_case.execute(|_repo_path| Ok(())).unwrap_err();
    assert!(matches!(err, scmpromote::ScmError::NoChanges));

    assert_eq!(
        remote_tip(&work, &fixture.remote_path, &fixture.branch),
        before
    );
}

#[test]
fn status_reports_normalized_states() {
    if !git_available() {
        return;
    }
    let fixture = setup();
    let work = fixture.work;

    std::fs::write(work.local_path().join("model.txt"), "dirty\n").unwrap();
    std::fs::write(work.local_path().join("scratch.txt"), "new\n").unwrap();

    let entries = work.status(None, &[], &[]).unwrap();
    let state_of = |path: &str| {
        entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.state)
            .unwrap()
    };
    assert_eq!(state_of("model.txt"), FileState::Modified);
    assert_eq!(state_of("scratch.txt"), FileState::Unknown);

    // Filtered query only reports the requested kind.
    let modified = work.status(Some(FileState::Modified), &[], &[]).unwrap();
    assert!(modified.iter().all(|e| e.state == FileState::Modified));
    assert!(modified.iter().any(|e| e.path == "model.txt"));
}

#[test]
fn log_parses_commit_metadata() {
    if !git_available() {
        return;
    }
    let fixture = setup();
    let work = fixture.work;

    let entries = work.log(&LogOptions::new()).unwrap();
    assert_eq!(entries.len(), 1);
    let head = &entries[0];
    assert_eq!(head.author, "ci-bot");
    assert_eq!(head.message, "initial import");
    assert!(head.parents.is_empty());
    assert!(head.timestamp.is_some());
    assert!(head.week_start.is_some());
    assert_eq!(head.hash, work.current_revision(false, None).unwrap());
}

#[test]
fn current_revision_marks_local_modifications() {
    if !git_available() {
        return;
    }
    let fixture = setup();
    let work = fixture.work;

    let clean = work.current_revision(true, None).unwrap();
    assert!(!clean.ends_with('+'));

    std::fs::write(work.local_path().join("model.txt"), "dirty\n").unwrap();
    let dirty = work.current_revision(true, Some(12)).unwrap();
    assert!(dirty.ends_with('+'));
    assert_eq!(dirty.trim_end_matches('+').len(), 12);
}
