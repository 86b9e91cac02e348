//! Orchestration layer for app repository runs
//!
//! Ties version resolution and job tracking into the publish and install
//! workflows.

pub mod app_publisher;

pub use app_publisher::{AppPublisher, Operation, PublishReport};
