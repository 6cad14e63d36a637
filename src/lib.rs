//! weblog - back office for a personal weblog
//!
//! This library provides entries, quotations, blogmarks and photos, grouped
//! by tags and series, behind an admin JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
