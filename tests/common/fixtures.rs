//! Test data generation utilities and predefined scenarios
//!
//! Provides functions for creating repositories with specific histories to
//! test annotation scenarios consistently.

#![allow(dead_code)]

use super::repository::*;
use git_line_blame::core::error::Result;

/// Scenario: a file whose lines come from two commits
pub struct HistoryRepo {
    pub repo: TestRepo,
    /// Commit that added "notes.txt" (lines 1 and 3)
    pub first: String,
    /// Commit that rewrote line 2
    pub second: String,
}

/// Creates a repository with "notes.txt" committed twice
pub fn create_history_repo() -> Result<HistoryRepo> {
    let repo = setup_test_repo()?;

    create_file(&repo.path, "notes.txt", "alpha\nbeta\ngamma\n")?;
    git_add(&repo.path, "notes.txt")?;
    git_commit(&repo.path, "Add notes")?;
    let first = git_head(&repo.path)?;

    create_file(&repo.path, "notes.txt", "alpha\nBETA\ngamma\n")?;
    git_add(&repo.path, "notes.txt")?;
    git_commit_with_body(&repo.path, "Shout beta", "Beta deserves it.")?;
    let second = git_head(&repo.path)?;

    Ok(HistoryRepo {
        repo,
        first,
        second,
    })
}
