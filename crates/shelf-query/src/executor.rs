// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params_from_iter, types::Value, Connection};

use crate::cursor::{decode_cursor, encode_cursor, CursorPayload};
use crate::db::{build_sql, parse_material_row};
use crate::filters::{MaterialQueryRequest, MaterialQueryResponse, MaterialRow};
use crate::limits::QueryLimits;
use crate::planner::{request_hash, validate_request};
use crate::query_error::{QueryError, QueryErrorCode};

pub fn execute_material_query(
    conn: &Connection,
    req: &MaterialQueryRequest,
    limits: &QueryLimits,
    cursor_secret: &[u8],
) -> Result<MaterialQueryResponse, QueryError> {
    validate_request(req, limits)
        .map_err(|msg| QueryError::new(QueryErrorCode::Validation, msg))?;
    let query_hash =
        request_hash(req).map_err(|msg| QueryError::new(QueryErrorCode::Validation, msg))?;

    let decoded_cursor = if let Some(token) = &req.cursor {
        Some(decode_cursor(token, cursor_secret, &query_hash)?)
    } else {
        None
    };

    let (sql, mut params) = build_sql(req, decoded_cursor.as_ref())
        .map_err(|msg| QueryError::new(QueryErrorCode::Sql, msg))?;
    params.push(Value::Integer((req.limit as i64) + 1));

    let mut stmt = conn.prepare_cached(&sql)?;
    let mapped = stmt.query_map(params_from_iter(params.iter()), parse_material_row)?;
    let mut rows: Vec<MaterialRow> = mapped.collect::<Result<Vec<_>, _>>()?;

    let has_more = rows.len() > req.limit;
    if has_more {
        rows.truncate(req.limit);
    }

    let next_cursor = if has_more {
        let next_depth = decoded_cursor
            .as_ref()
            .map_or(1_u32, |c| c.depth.saturating_add(1));
        let last = rows
            .last()
            .ok_or_else(|| QueryError::new(QueryErrorCode::Sql, "pagination invariant violated"))?;
        let payload = CursorPayload {
            cursor_version: "v1".to_string(),
            last_id: last.id,
            query_hash,
            depth: next_depth,
        };
        Some(encode_cursor(&payload, cursor_secret)?)
    } else {
        None
    };

    Ok(MaterialQueryResponse { rows, next_cursor })
}
