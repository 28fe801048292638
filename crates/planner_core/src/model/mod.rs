//! Planner domain model.
//!
//! # Responsibility
//! - Define canonical task records used by repository and view logic.
//! - Own input normalization and validation for task fields.
//!
//! # Invariants
//! - Every task is identified by a store-assigned `TaskId`.
//! - Subtasks nest exactly one level below a top-level task.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
