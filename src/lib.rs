//! Private Health Journal Library
//!
//! Core data layer for local-first health journaling: meals with foods and
//! tags, symptoms, bowel movements, medications, blood glucose readings,
//! and free-form entries, with reactive query views and a versioned export.

pub mod db;
pub mod export;
pub mod models;
pub mod repository;
