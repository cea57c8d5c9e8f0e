// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "shelf-api";

pub mod dto;
pub mod errors;
pub mod params;

pub use dto::{
    MaterialDto, SearchResponseDto, SessionDto, SuggestionDto, TaxonomyResponseDto,
    UploadResponseDto,
};
pub use errors::{ApiError, ApiErrorCode};
pub use params::{parse_search_params, SearchParams, MAX_CURSOR_BYTES};
