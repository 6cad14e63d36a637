//! Data models
//!
//! This module contains the record types managed by the weblog back office:
//! - Content records sharing [`ContentMeta`]: Entry, Quotation, Blogmark, Photo
//! - Series and Tag
//! - Create/update inputs, pagination and list filters

mod blogmark;
mod content;
mod entry;
mod photo;
mod quotation;
mod series;
mod tag;

pub use blogmark::{
    Blogmark, CreateBlogmarkInput, UpdateBlogmarkInput, LINK_TITLE_MAX_LENGTH,
    LINK_URL_MAX_LENGTH, VIA_TITLE_MAX_LENGTH, VIA_URL_MAX_LENGTH,
};
pub use content::{
    Content, ContentFilter, ContentMeta, DateBuckets, DateFilter, DateLevel, ListParams,
    PagedResult, CONTENT_SLUG_MAX_LENGTH,
};
pub use entry::{CreateEntryInput, Entry, UpdateEntryInput, ENTRY_TITLE_MAX_LENGTH};
pub use photo::{upload_dir, CreatePhotoInput, Photo, UpdatePhotoInput, PHOTO_UPLOAD_DIR};
pub use quotation::{
    CreateQuotationInput, Quotation, UpdateQuotationInput, QUOTATION_SOURCE_MAX_LENGTH,
};
pub use series::{CreateSeriesInput, Series, UpdateSeriesInput, SERIES_SLUG_MAX_LENGTH};
pub use tag::{Tag, TagInput, TAG_MAX_LENGTH};

use serde::{Deserialize, Deserializer};

/// Deserialize a present field (including `null`) as `Some(..)`.
///
/// Combined with `#[serde(default)]`, an absent field stays `None`, so update
/// inputs can tell "leave unchanged" from "clear".
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
