//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for tasks.
//! - Isolate SQLite query details from view and presentation logic.
//!
//! # Invariants
//! - Write paths normalize and validate input before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `ParentNotFound`)
//!   in addition to DB transport errors.
//! - No state is cached between calls; every read re-queries the store.

pub mod task_repo;
