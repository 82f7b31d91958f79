//! Outbound adapters implementing the domain ports.
//!
//! Two interchangeable storage backends live here:
//!
//! - **persistence**: PostgreSQL-backed stores using Diesel ORM with
//!   `diesel-async` and `bb8` pooling.
//! - **memory**: process-local stores used when no database is configured
//!   and as the test double behind the domain service tests.
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
