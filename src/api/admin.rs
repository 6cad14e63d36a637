//! Admin model registry
//!
//! Describes how each managed model is presented in the admin: its list
//! columns, the fields the changelist search looks at, where a blank slug is
//! prepopulated from and whether lists drill down by date.
//!
//! - GET /api/v1/admin/models

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::AppState;

/// Admin configuration of one model
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ModelAdmin {
    /// Route segment under /api/v1/admin
    pub name: &'static str,
    pub verbose_name_plural: &'static str,
    /// `__str__` is the record's display string
    pub list_display: &'static [&'static str],
    /// `tags__tag` matches any associated tag
    pub search_fields: &'static [&'static str],
    pub prepopulated_slug_from: Option<&'static str>,
    pub date_hierarchy: Option<&'static str>,
    /// Tag search ranks matches by length instead of the default ordering
    pub ranked_search: bool,
}

const CONTENT_LIST_DISPLAY: &[&str] = &["__str__", "slug", "created"];

pub static MODEL_ADMINS: &[ModelAdmin] = &[
    ModelAdmin {
        name: "entries",
        verbose_name_plural: "Entries",
        list_display: CONTENT_LIST_DISPLAY,
        search_fields: &["tags__tag", "title", "body"],
        prepopulated_slug_from: Some("title"),
        date_hierarchy: Some("created"),
        ranked_search: false,
    },
    ModelAdmin {
        name: "quotations",
        verbose_name_plural: "quotations",
        list_display: CONTENT_LIST_DISPLAY,
        search_fields: &["tags__tag", "quotation"],
        prepopulated_slug_from: Some("source"),
        date_hierarchy: Some("created"),
        ranked_search: false,
    },
    ModelAdmin {
        name: "blogmarks",
        verbose_name_plural: "blogmarks",
        list_display: CONTENT_LIST_DISPLAY,
        search_fields: &["tags__tag", "commentary"],
        prepopulated_slug_from: Some("link_title"),
        date_hierarchy: Some("created"),
        ranked_search: false,
    },
    ModelAdmin {
        name: "photos",
        verbose_name_plural: "photos",
        list_display: CONTENT_LIST_DISPLAY,
        search_fields: &["tags__tag", "title"],
        prepopulated_slug_from: None,
        date_hierarchy: Some("created"),
        ranked_search: false,
    },
    ModelAdmin {
        name: "tags",
        verbose_name_plural: "tags",
        list_display: &["__str__"],
        search_fields: &["tag"],
        prepopulated_slug_from: None,
        date_hierarchy: None,
        ranked_search: true,
    },
    ModelAdmin {
        name: "series",
        verbose_name_plural: "series",
        list_display: &["__str__"],
        search_fields: &[],
        prepopulated_slug_from: Some("title"),
        date_hierarchy: None,
        ranked_search: false,
    },
];

/// Look up a model's admin configuration by route name
pub fn model_admin(name: &str) -> Option<&'static ModelAdmin> {
    MODEL_ADMINS.iter().find(|admin| admin.name == name)
}

/// Response for the registry
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub version: &'static str,
    pub models: &'static [ModelAdmin],
}

/// App version constant
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the admin registry router
pub fn router() -> Router<AppState> {
    Router::new().route("/models", get(list_models))
}

/// GET /api/v1/admin/models - Describe every managed model
async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        version: APP_VERSION,
        models: MODEL_ADMINS,
    })
}
