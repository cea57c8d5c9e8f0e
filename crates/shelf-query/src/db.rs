// SPDX-License-Identifier: Apache-2.0

use crate::cursor::CursorPayload;
use crate::filters::{MaterialQueryRequest, MaterialRow};
use rusqlite::types::Value;

pub const MATERIAL_COLUMNS: &str = "m.id, m.file_name, m.course, m.professors, m.year, \
     m.semester, m.kind, m.remote_id, m.web_link, m.uploaded_by, m.reported";

/// Escapes `!`, `%` and `_` so user terms behave as literals under
/// `LIKE ... ESCAPE '!'`.
#[must_use]
pub fn escape_like_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '!' | '%' | '_' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Builds the conjunctive search statement. Only present filters contribute
/// WHERE parts; every user value is bound, never spliced.
pub fn build_sql(
    req: &MaterialQueryRequest,
    cursor: Option<&CursorPayload>,
) -> Result<(String, Vec<Value>), String> {
    let mut sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials m");
    let mut where_parts: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(course) = &req.filter.course {
        where_parts.push("m.course = ?".to_string());
        params.push(Value::Text(course.clone()));
    }
    if !req.filter.professors.is_empty() {
        let ors = vec!["m.professors LIKE ? ESCAPE '!'"; req.filter.professors.len()];
        where_parts.push(format!("({})", ors.join(" OR ")));
        for term in &req.filter.professors {
            params.push(Value::Text(format!("%{}%", escape_like_term(term))));
        }
    }
    if let Some(year) = req.filter.year {
        where_parts.push("m.year = ?".to_string());
        params.push(Value::Integer(year));
    }
    if let Some(semester) = &req.filter.semester {
        where_parts.push("m.semester = ?".to_string());
        params.push(Value::Text(semester.clone()));
    }
    if let Some(kind) = &req.filter.kind {
        where_parts.push("m.kind = ?".to_string());
        params.push(Value::Text(kind.clone()));
    }
    if let Some(uploaded_by) = &req.filter.uploaded_by {
        where_parts.push("m.uploaded_by = ?".to_string());
        params.push(Value::Text(uploaded_by.clone()));
    }
    if req.filter.reported_only {
        where_parts.push("m.reported = 1".to_string());
    }

    if let Some(c) = cursor {
        if c.last_id <= 0 {
            return Err("cursor last_id must be positive".to_string());
        }
        where_parts.push("m.id < ?".to_string());
        params.push(Value::Integer(c.last_id));
    }

    if !where_parts.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_parts.join(" AND "));
    }

    // Newest uploads first; id is the keyset.
    sql.push_str(" ORDER BY m.id DESC LIMIT ?");
    Ok((sql, params))
}

pub fn parse_material_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MaterialRow> {
    Ok(MaterialRow {
        id: row.get(0)?,
        file_name: row.get(1)?,
        course: row.get(2)?,
        professors: row.get(3)?,
        year: row.get(4)?,
        semester: row.get(5)?,
        kind: row.get(6)?,
        remote_id: row.get(7)?,
        web_link: row.get(8)?,
        uploaded_by: row.get(9)?,
        reported: row.get::<_, i64>(10)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::MaterialFilter;

    fn req(filter: MaterialFilter) -> MaterialQueryRequest {
        MaterialQueryRequest {
            filter,
            limit: 25,
            cursor: None,
        }
    }

    #[test]
    fn no_filters_produce_no_where_clause() {
        let (sql, params) = build_sql(&req(MaterialFilter::default()), None).expect("sql");
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("ORDER BY m.id DESC LIMIT ?"));
        assert!(params.is_empty());
    }

    #[test]
    fn each_present_filter_adds_one_bound_clause() {
        let filter = MaterialFilter {
            course: Some("COE 221".to_string()),
            year: Some(2024),
            semester: Some("Fall".to_string()),
            kind: Some("Final".to_string()),
            ..MaterialFilter::default()
        };
        let (sql, params) = build_sql(&req(filter), None).expect("sql");
        assert!(sql.contains("m.course = ?"));
        assert!(sql.contains("m.year = ?"));
        assert!(sql.contains("m.semester = ?"));
        assert!(sql.contains("m.kind = ?"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn professor_terms_expand_to_or_of_likes() {
        let filter = MaterialFilter {
            professors: vec!["Hariri".to_string(), "Qar_aqe".to_string()],
            ..MaterialFilter::default()
        };
        let (sql, params) = build_sql(&req(filter), None).expect("sql");
        assert!(sql.contains(
            "(m.professors LIKE ? ESCAPE '!' OR m.professors LIKE ? ESCAPE '!')"
        ));
        assert_eq!(
            params,
            vec![
                rusqlite::types::Value::Text("%Hariri%".to_string()),
                rusqlite::types::Value::Text("%Qar!_aqe%".to_string()),
            ]
        );
    }

    #[test]
    fn cursor_adds_keyset_bound() {
        let cursor = CursorPayload {
            cursor_version: "v1".to_string(),
            last_id: 17,
            query_hash: "h".to_string(),
            depth: 1,
        };
        let (sql, params) = build_sql(&req(MaterialFilter::default()), Some(&cursor)).expect("sql");
        assert!(sql.contains("m.id < ?"));
        assert_eq!(params, vec![rusqlite::types::Value::Integer(17)]);
    }

    #[test]
    fn escape_like_term_escapes_metacharacters() {
        assert_eq!(escape_like_term("50%_done!"), "50!%!_done!!");
        assert_eq!(escape_like_term("plain"), "plain");
    }

    #[test]
    fn reported_only_is_a_literal_clause() {
        let filter = MaterialFilter {
            reported_only: true,
            ..MaterialFilter::default()
        };
        let (sql, params) = build_sql(&req(filter), None).expect("sql");
        assert!(sql.contains("m.reported = 1"));
        assert!(params.is_empty());
    }
}
