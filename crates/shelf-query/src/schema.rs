// SPDX-License-Identifier: Apache-2.0

use rusqlite::Connection;
use shelf_model::{TaxonomyKind, DEFAULT_MATERIAL_KINDS, DEFAULT_SEMESTERS};
use std::path::Path;

pub const SCHEMA_VERSION: i64 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name TEXT NOT NULL,
            course TEXT NOT NULL,
            professors TEXT NOT NULL,
            year INTEGER NOT NULL,
            semester TEXT NOT NULL,
            kind TEXT NOT NULL,
            remote_id TEXT NOT NULL,
            web_link TEXT NOT NULL,
            uploaded_by TEXT NOT NULL,
            reported INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_materials_course ON materials(course);
        CREATE INDEX IF NOT EXISTS idx_materials_year ON materials(year);
        CREATE INDEX IF NOT EXISTS idx_materials_semester ON materials(semester);
        CREATE INDEX IF NOT EXISTS idx_materials_kind ON materials(kind);
        CREATE INDEX IF NOT EXISTS idx_materials_reported ON materials(reported);
        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS professors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS semesters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS material_kinds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS suggestions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            body TEXT NOT NULL
        );",
    )
}

/// Seeds semesters and material kinds when their tables are empty.
pub fn seed_taxonomy_defaults(conn: &Connection) -> Result<(), rusqlite::Error> {
    let semester_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM semesters", [], |row| row.get(0))?;
    if semester_count == 0 {
        for name in DEFAULT_SEMESTERS {
            conn.execute(
                "INSERT OR IGNORE INTO semesters (name) VALUES (?1)",
                [name],
            )?;
        }
    }

    let kind_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM material_kinds", [], |row| row.get(0))?;
    if kind_count == 0 {
        for name in DEFAULT_MATERIAL_KINDS {
            conn.execute(
                "INSERT OR IGNORE INTO material_kinds (name) VALUES (?1)",
                [name],
            )?;
        }
    }
    Ok(())
}

/// Loads newline-delimited names into a taxonomy table, skipping blanks and
/// duplicates. Returns how many rows were inserted.
pub fn seed_taxonomy_from_file(
    conn: &Connection,
    kind: TaxonomyKind,
    path: &Path,
) -> Result<usize, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read seed file {}: {e}", path.display()))?;
    // table_name is a closed enum, never user input.
    let sql = format!(
        "INSERT OR IGNORE INTO {} (name) VALUES (?1)",
        kind.table_name()
    );
    let mut inserted = 0usize;
    for line in raw.lines() {
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        let changed = conn
            .execute(&sql, [name])
            .map_err(|e| format!("seed insert failed: {e}"))?;
        inserted += changed;
    }
    Ok(inserted)
}
