//! Integration test suite for kiln.
//!
//! These tests exercise the full pipeline: a manifest is turned into a
//! dependency-ordered task set, executed across two worker pools, and
//! summarized. Container engines are replaced with small fake executables
//! so the suite runs anywhere with a POSIX shell.
//!
//! # Test Categories
//!
//! - `pipeline_e2e`: Full manifest-to-summary pipeline runs
//! - `interruption`: Cooperative cancellation behavior

mod fixtures;

mod interruption;
