//! Core business logic - framework-agnostic operations behind every page and form.

/// Admin console operations
pub mod admin;
/// Campaign create/read/update/delete and derived totals
pub mod campaign;
/// Transaction category management and seeding
pub mod category;
/// Client create/read/update/delete and search
pub mod client;
/// Transaction filter predicate
pub mod filter;
/// Derived financial metrics
pub mod metrics;
/// Dashboard report generation
pub mod report;
/// Transaction create/read/update/delete
pub mod transaction;
/// Form field validation
pub mod validation;
