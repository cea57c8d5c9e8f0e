// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "shelf-query";

pub mod catalog;
mod cursor;
mod db;
mod executor;
mod filters;
mod limits;
mod planner;
mod query_error;
mod schema;

pub use cursor::{decode_cursor, encode_cursor, CursorError, CursorErrorCode, CursorPayload};
pub use db::{build_sql, escape_like_term};
pub use executor::execute_material_query;
pub use filters::{MaterialFilter, MaterialQueryRequest, MaterialQueryResponse, MaterialRow};
pub use limits::QueryLimits;
pub use planner::{request_hash, validate_request};
pub use query_error::{QueryError, QueryErrorCode};
pub use schema::{init_schema, seed_taxonomy_defaults, seed_taxonomy_from_file, SCHEMA_VERSION};
