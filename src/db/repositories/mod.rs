//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod blogmark;
pub mod entry;
pub mod listing;
pub mod photo;
pub mod quotation;
pub mod series;
pub mod tag;

pub use blogmark::{BlogmarkRepository, SqlxBlogmarkRepository};
pub use entry::{EntryRepository, SqlxEntryRepository};
pub use photo::{PhotoRepository, SqlxPhotoRepository};
pub use quotation::{QuotationRepository, SqlxQuotationRepository};
pub use series::{SeriesRepository, SqlxSeriesRepository};
pub use tag::{SqlxTagRepository, TagRepository};
