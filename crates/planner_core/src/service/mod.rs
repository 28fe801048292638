//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into view-level APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod planner_service;
