//! Services layer - Business logic
//!
//! This module contains the business logic for the weblog back office.
//! Services are responsible for:
//! - Validating admin input before anything is written
//! - Resolving tag names to tag records
//! - Coordinating repositories and the media directory

pub mod blogmark;
pub mod content;
pub mod entry;
pub mod fields;
pub mod markup;
pub mod photo;
pub mod quotation;
pub mod series;
pub mod slug;
pub mod tag;

pub use blogmark::BlogmarkService;
pub use content::ContentServiceError;
pub use entry::EntryService;
pub use markup::validate_entry_body;
pub use photo::{PhotoService, PhotoUpload};
pub use quotation::QuotationService;
pub use series::{SeriesService, SeriesServiceError};
pub use slug::{is_valid_slug, slugify};
pub use tag::{normalize_tag, TagService, TagServiceError};
