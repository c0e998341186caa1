//! Refresh engine for a Canvas LMS desktop grade widget.
//!
//! Fetches courses, grades and the user profile on a background task,
//! coordinates overlapping refresh requests, reconciles externally changed
//! theme configuration, and pushes immutable snapshots into a UI sink.
//! The widget tree itself lives in the embedding application.

pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod scheduler;
pub mod sink;
pub mod theme;
