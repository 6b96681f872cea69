//! Git repository management and setup utilities
//!
//! Provides functions for creating and managing test repositories with various states
//! and configurations for comprehensive testing scenarios.

#![allow(dead_code)]

use git_line_blame::core::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Test repository setup result containing both the temporary directory
/// and the repository path. The TempDir must be kept alive for the duration
/// of the test to prevent cleanup.
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestRepo {
    /// Get the repository path as a reference
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path of a file in the repository
    pub fn file(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }
}

fn git(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Sets up a fresh git repository for testing
///
/// Creates a temporary directory, initializes it as a git repository,
/// and sets up basic git configuration to avoid user prompts.
pub fn setup_test_repo() -> Result<TestRepo> {
    let temp_dir = TempDir::new()?;
    let repo_path = temp_dir.path().canonicalize()?;

    git(&repo_path, &["init"])?;

    // Set git config to avoid prompts during tests
    git(&repo_path, &["config", "user.name", "Test User"])?;
    git(&repo_path, &["config", "user.email", "test@example.com"])?;
    git(&repo_path, &["config", "commit.gpgsign", "false"])?;

    Ok(TestRepo {
        temp_dir,
        path: repo_path,
    })
}

/// Sets up a git repository with an initial commit
///
/// # Returns
///
/// A `TestRepo` with an initial commit containing "initial.txt"
pub fn setup_test_repo_with_initial_commit() -> Result<TestRepo> {
    let repo = setup_test_repo()?;

    create_file(&repo.path, "initial.txt", "initial content\n")?;
    git_add(&repo.path, "initial.txt")?;
    git_commit(&repo.path, "Initial commit")?;

    Ok(repo)
}

/// Creates a file with specified content in the repository
pub fn create_file(repo_path: &Path, filename: &str, content: &str) -> Result<()> {
    fs::write(repo_path.join(filename), content)?;
    Ok(())
}

/// Adds a file to the git index
pub fn git_add(repo_path: &Path, filename: &str) -> Result<()> {
    git(repo_path, &["add", filename])?;
    Ok(())
}

/// Creates a git commit with the specified message
pub fn git_commit(repo_path: &Path, message: &str) -> Result<()> {
    git(repo_path, &["commit", "-m", message])?;
    Ok(())
}

/// Creates a git commit with a subject and a body paragraph
pub fn git_commit_with_body(repo_path: &Path, subject: &str, body: &str) -> Result<()> {
    git(repo_path, &["commit", "-m", subject, "-m", body])?;
    Ok(())
}

/// Creates a git commit authored and committed at `date` (e.g. "2016-04-04T09:05:39+0000")
pub fn git_commit_at(repo_path: &Path, message: &str, date: &str) -> Result<()> {
    Command::new("git")
        .args(["commit", "-m", message])
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .current_dir(repo_path)
        .output()?;
    Ok(())
}

/// Full hash of `HEAD`
pub fn git_head(repo_path: &Path) -> Result<String> {
    git(repo_path, &["rev-parse", "HEAD"])
}

/// Adds a remote named `origin`
pub fn git_add_origin(repo_path: &Path, url: &str) -> Result<()> {
    git(repo_path, &["remote", "add", "origin", url])?;
    Ok(())
}
