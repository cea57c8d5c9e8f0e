// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use shelf_model::{split_professors, ProfessorName};
use shelf_query::MaterialRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MaterialDto {
    pub id: i64,
    pub file_name: String,
    pub course: String,
    pub professors: Vec<String>,
    pub year: i64,
    pub semester: String,
    pub kind: String,
    pub web_link: String,
    pub uploaded_by: String,
    pub reported: bool,
}

impl MaterialDto {
    #[must_use]
    pub fn from_row(row: &MaterialRow) -> Self {
        Self {
            id: row.id,
            file_name: row.file_name.clone(),
            course: row.course.clone(),
            professors: split_professors(&row.professors)
                .iter()
                .map(|p: &ProfessorName| p.as_str().to_string())
                .collect(),
            year: row.year,
            semester: row.semester.clone(),
            kind: row.kind.clone(),
            web_link: row.web_link.clone(),
            uploaded_by: row.uploaded_by.clone(),
            reported: row.reported,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SearchResponseDto {
    pub items: Vec<MaterialDto>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TaxonomyResponseDto {
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UploadResponseDto {
    pub id: i64,
    pub file_name: String,
    pub web_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SuggestionDto {
    pub id: i64,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionDto {
    pub email: Option<String>,
    pub name: Option<String>,
    pub admin: bool,
}
