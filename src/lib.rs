/// Database layer: open, migrate, CRUD with conflict detection.
pub mod db;
/// Tracing subscriber setup.
pub mod logging;
/// Data types: User, Language, Catalog, Word and request payloads.
pub mod models;
/// Axum-based web server and router.
pub mod web;
