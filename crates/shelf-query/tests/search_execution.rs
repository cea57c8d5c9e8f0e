// SPDX-License-Identifier: Apache-2.0

use rusqlite::Connection;
use shelf_query::catalog::{insert_material, NewMaterial};
use shelf_query::{
    execute_material_query, init_schema, seed_taxonomy_defaults, MaterialFilter,
    MaterialQueryRequest, QueryErrorCode, QueryLimits,
};

const SECRET: &[u8] = b"search-execution-secret";

fn seeded_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("open");
    init_schema(&conn).expect("schema");
    seed_taxonomy_defaults(&conn).expect("seed");
    for n in 0..12 {
        let course = if n % 2 == 0 { "COE 221" } else { "NGN 111" };
        let professor = if n % 3 == 0 { "A. Hariri" } else { "K. Assaleh" };
        let material = NewMaterial {
            file_name: format!("{course}-Notes-{professor}-Fall-2024-{n}.pdf"),
            course: course.to_string(),
            professors: professor.to_string(),
            year: 2020 + i64::from(n % 4),
            semester: if n % 2 == 0 { "Fall" } else { "Spring" }.to_string(),
            kind: if n < 6 { "Notes" } else { "Final" }.to_string(),
            remote_id: format!("remote-{n}"),
            web_link: format!("https://drive.example/file/{n}/view"),
            uploaded_by: "b00012345@aus.edu".to_string(),
        };
        insert_material(&conn, &material).expect("insert");
    }
    conn
}

fn request(filter: MaterialFilter, limit: usize, cursor: Option<String>) -> MaterialQueryRequest {
    MaterialQueryRequest {
        filter,
        limit,
        cursor,
    }
}

#[test]
fn unfiltered_search_pages_newest_first_without_overlap() {
    let conn = seeded_conn();
    let limits = QueryLimits::default();

    let first = execute_material_query(
        &conn,
        &request(MaterialFilter::default(), 5, None),
        &limits,
        SECRET,
    )
    .expect("first page");
    assert_eq!(first.rows.len(), 5);
    assert!(first.rows.windows(2).all(|w| w[0].id > w[1].id));
    let token = first.next_cursor.clone().expect("more pages");

    let second = execute_material_query(
        &conn,
        &request(MaterialFilter::default(), 5, Some(token)),
        &limits,
        SECRET,
    )
    .expect("second page");
    assert_eq!(second.rows.len(), 5);
    let first_ids: Vec<i64> = first.rows.iter().map(|r| r.id).collect();
    assert!(second.rows.iter().all(|r| !first_ids.contains(&r.id)));

    let third = execute_material_query(
        &conn,
        &request(
            MaterialFilter::default(),
            5,
            Some(second.next_cursor.expect("third page")),
        ),
        &limits,
        SECRET,
    )
    .expect("third page");
    assert_eq!(third.rows.len(), 2);
    assert!(third.next_cursor.is_none());
}

#[test]
fn filters_conjoin_and_professor_match_is_substring() {
    let conn = seeded_conn();
    let limits = QueryLimits::default();

    let filter = MaterialFilter {
        course: Some("COE 221".to_string()),
        professors: vec!["Hariri".to_string()],
        semester: Some("Fall".to_string()),
        ..MaterialFilter::default()
    };
    let resp =
        execute_material_query(&conn, &request(filter, 50, None), &limits, SECRET).expect("search");
    assert!(!resp.rows.is_empty());
    for row in &resp.rows {
        assert_eq!(row.course, "COE 221");
        assert_eq!(row.semester, "Fall");
        assert!(row.professors.contains("Hariri"));
    }
}

#[test]
fn like_metacharacters_in_terms_match_literally() {
    let conn = seeded_conn();
    let limits = QueryLimits::default();
    let filter = MaterialFilter {
        professors: vec!["%".to_string()],
        ..MaterialFilter::default()
    };
    let resp =
        execute_material_query(&conn, &request(filter, 50, None), &limits, SECRET).expect("search");
    assert!(resp.rows.is_empty());
}

#[test]
fn cursor_cannot_cross_filter_sets() {
    let conn = seeded_conn();
    let limits = QueryLimits::default();

    let first = execute_material_query(
        &conn,
        &request(MaterialFilter::default(), 5, None),
        &limits,
        SECRET,
    )
    .expect("first page");
    let token = first.next_cursor.expect("cursor");

    let other_filter = MaterialFilter {
        course: Some("COE 221".to_string()),
        ..MaterialFilter::default()
    };
    let err = execute_material_query(
        &conn,
        &request(other_filter, 5, Some(token)),
        &limits,
        SECRET,
    )
    .expect_err("cross-filter cursor");
    assert_eq!(err.code, QueryErrorCode::Cursor);
}

#[test]
fn limit_zero_is_a_validation_error() {
    let conn = seeded_conn();
    let err = execute_material_query(
        &conn,
        &request(MaterialFilter::default(), 0, None),
        &QueryLimits::default(),
        SECRET,
    )
    .expect_err("zero limit");
    assert_eq!(err.code, QueryErrorCode::Validation);
}

#[test]
fn exact_page_boundary_emits_no_cursor() {
    let conn = seeded_conn();
    let resp = execute_material_query(
        &conn,
        &request(MaterialFilter::default(), 12, None),
        &QueryLimits::default(),
        SECRET,
    )
    .expect("full page");
    assert_eq!(resp.rows.len(), 12);
    assert!(resp.next_cursor.is_none());
}
