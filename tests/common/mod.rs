//! Consolidated test utilities for git-line-blame
//!
//! This module provides unified testing utilities for integration tests:
//! real git repositories for the CLI and backend, and in-memory fakes for
//! driving an annotation session deterministically.

pub mod assertions;
pub mod fakes;
pub mod fixtures;
pub mod repository;
