//! Common assertion helpers for test output validation
//!
//! Provides predicates for validating git-line-blame command output and
//! error messages.

#![allow(dead_code)]

use predicates::prelude::*;

/// Creates a predicate that checks for git repository error messages
pub fn not_in_git_repo() -> impl Predicate<str> {
    predicates::str::contains("Not in a git repository")
        .or(predicates::str::contains("NotInGitRepo"))
}

/// Creates a predicate that checks for the uncommitted-line text
pub fn not_committed_yet() -> impl Predicate<str> {
    predicates::str::contains("Not Committed Yet")
}

/// Creates a predicate that checks for the abbreviated form of `hash`
pub fn has_short_hash(hash: &str) -> impl Predicate<str> {
    predicates::str::contains(hash[..8].to_string())
}

/// Creates a predicate that checks for an out-of-range line error
pub fn line_out_of_range() -> impl Predicate<str> {
    predicates::str::contains("out of range")
}
