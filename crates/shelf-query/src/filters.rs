use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MaterialFilter {
    pub course: Option<String>,
    pub professors: Vec<String>,
    pub year: Option<i64>,
    pub semester: Option<String>,
    pub kind: Option<String>,
    pub uploaded_by: Option<String>,
    pub reported_only: bool,
}

impl MaterialFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.course.is_none()
            && self.professors.is_empty()
            && self.year.is_none()
            && self.semester.is_none()
            && self.kind.is_none()
            && self.uploaded_by.is_none()
            && !self.reported_only
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterialQueryRequest {
    pub filter: MaterialFilter,
    pub limit: usize,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterialRow {
    pub id: i64,
    pub file_name: String,
    pub course: String,
    /// Comma-joined storage form; callers split for wire output.
    pub professors: String,
    pub year: i64,
    pub semester: String,
    pub kind: String,
    pub remote_id: String,
    pub web_link: String,
    pub uploaded_by: String,
    pub reported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterialQueryResponse {
    pub rows: Vec<MaterialRow>,
    pub next_cursor: Option<String>,
}
