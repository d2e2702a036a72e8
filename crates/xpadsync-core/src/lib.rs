//! # xpadsync-core
//!
//! Core library for the xpad note mirror.
//!
//! This library watches a local note directory, decides when a burst of
//! edits has settled, and materializes each note atomically into an output
//! directory that an external cloud-drive client keeps in sync. Every
//! decision is recorded in a durable journal and an append-only activity log.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Core error types for the xpadsync library
pub mod error;

/// Content fingerprinting using SHA-256
pub mod fingerprint;

/// Destination filename derivation
pub mod naming;

/// Durable per-note sync state
pub mod journal;

/// Append-only activity log of sync decisions
pub mod activity;

/// Atomic temp-file-then-rename writes
pub mod atomic;

/// Configuration file parsing, merging, and filename filtering
pub mod config;

/// Per-file sync decisions and their execution
pub mod sync;

/// Debouncing of raw filesystem events
pub mod coalescer;

/// Filesystem notification subscription and directory enumeration
pub mod watcher;

/// One-shot, forced, monitor, and status runs
pub mod orchestrator;
