// SPDX-License-Identifier: Apache-2.0

//! Catalog write and listing operations. Everything here is a single
//! parameterized statement over a borrowed connection.

use crate::db::{parse_material_row, MATERIAL_COLUMNS};
use crate::filters::MaterialRow;
use rusqlite::{Connection, OptionalExtension};
use shelf_model::TaxonomyKind;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaterial {
    pub file_name: String,
    pub course: String,
    pub professors: String,
    pub year: i64,
    pub semester: String,
    pub kind: String,
    pub remote_id: String,
    pub web_link: String,
    pub uploaded_by: String,
}

pub fn insert_material(conn: &Connection, material: &NewMaterial) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO materials (file_name, course, professors, year, semester, kind, \
         remote_id, web_link, uploaded_by) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            material.file_name,
            material.course,
            material.professors,
            material.year,
            material.semester,
            material.kind,
            material.remote_id,
            material.web_link,
            material.uploaded_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_reported(conn: &Connection, id: i64, reported: bool) -> Result<bool, rusqlite::Error> {
    let changed = conn.execute(
        "UPDATE materials SET reported = ?1 WHERE id = ?2",
        rusqlite::params![i64::from(reported), id],
    )?;
    Ok(changed > 0)
}

/// Deletes a material row, returning its remote storage id when it existed.
pub fn delete_material(conn: &Connection, id: i64) -> Result<Option<String>, rusqlite::Error> {
    let remote_id: Option<String> = conn
        .query_row(
            "SELECT remote_id FROM materials WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;
    if remote_id.is_some() {
        conn.execute("DELETE FROM materials WHERE id = ?1", [id])?;
    }
    Ok(remote_id)
}

pub fn list_reported(conn: &Connection) -> Result<Vec<MaterialRow>, rusqlite::Error> {
    let sql = format!(
        "SELECT {MATERIAL_COLUMNS} FROM materials m WHERE m.reported = 1 ORDER BY m.id DESC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], parse_material_row)?;
    rows.collect()
}

pub fn materials_by_course(
    conn: &Connection,
) -> Result<BTreeMap<String, Vec<MaterialRow>>, rusqlite::Error> {
    let sql = format!(
        "SELECT {MATERIAL_COLUMNS} FROM materials m ORDER BY m.course ASC, m.id DESC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], parse_material_row)?;
    let mut grouped: BTreeMap<String, Vec<MaterialRow>> = BTreeMap::new();
    for row in rows {
        let row = row?;
        grouped.entry(row.course.clone()).or_default().push(row);
    }
    Ok(grouped)
}

pub fn list_taxonomy(conn: &Connection, kind: TaxonomyKind) -> Result<Vec<String>, rusqlite::Error> {
    // table_name is a closed enum, never user input.
    let sql = format!("SELECT name FROM {} ORDER BY name ASC", kind.table_name());
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Insert-or-ignore; returns whether a new row landed.
pub fn insert_taxonomy(
    conn: &Connection,
    kind: TaxonomyKind,
    name: &str,
) -> Result<bool, rusqlite::Error> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (name) VALUES (?1)",
        kind.table_name()
    );
    let changed = conn.execute(&sql, [name])?;
    Ok(changed > 0)
}

pub fn insert_suggestion(conn: &Connection, body: &str) -> Result<i64, rusqlite::Error> {
    conn.execute("INSERT INTO suggestions (body) VALUES (?1)", [body])?;
    Ok(conn.last_insert_rowid())
}

pub fn list_suggestions(conn: &Connection) -> Result<Vec<(i64, String)>, rusqlite::Error> {
    let mut stmt =
        conn.prepare_cached("SELECT id, body FROM suggestions ORDER BY id DESC")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

pub fn delete_suggestion(conn: &Connection, id: i64) -> Result<bool, rusqlite::Error> {
    let changed = conn.execute("DELETE FROM suggestions WHERE id = ?1", [id])?;
    Ok(changed > 0)
}
