// SPDX-License-Identifier: Apache-2.0

use crate::ids::{
    AcademicYear, CourseCode, EmailAddress, MaterialKindName, ParseError, ProfessorName,
    RemoteFileId, SemesterName, WebLink,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const SUGGESTION_MAX_LEN: usize = 2000;
pub const PROFESSOR_JOIN_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct UploadPolicy {
    pub allowed_extensions: BTreeSet<String>,
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: BTreeSet::from(
                ["pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "txt", "zip"]
                    .map(str::to_string),
            ),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn validate(&self, file_name: &str, len: usize) -> Result<(), ParseError> {
        let ext = extension_of(file_name);
        if ext.is_empty() || !self.allowed_extensions.contains(&ext) {
            return Err(ParseError::InvalidFormat("file extension not allowed"));
        }
        if len == 0 {
            return Err(ParseError::Empty("file"));
        }
        if len > self.max_bytes {
            return Err(ParseError::InvalidFormat("file exceeds max upload size"));
        }
        Ok(())
    }
}

/// Lowercased extension without the dot, empty when the name has none.
#[must_use]
pub fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map_or(String::new(), |(_, ext)| ext.to_ascii_lowercase())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct MaterialDraft {
    pub course: CourseCode,
    pub professors: Vec<ProfessorName>,
    pub kind: MaterialKindName,
    pub year: AcademicYear,
    pub semester: SemesterName,
    pub original_file_name: String,
}

impl MaterialDraft {
    pub fn new(
        course: CourseCode,
        professors: Vec<ProfessorName>,
        kind: MaterialKindName,
        year: AcademicYear,
        semester: SemesterName,
        original_file_name: String,
    ) -> Result<Self, ParseError> {
        if professors.is_empty() {
            return Err(ParseError::Empty("professors"));
        }
        if original_file_name.trim().is_empty() {
            return Err(ParseError::Empty("file_name"));
        }
        Ok(Self {
            course,
            professors,
            kind,
            year,
            semester,
            original_file_name,
        })
    }

    #[must_use]
    pub fn joined_professors(&self) -> String {
        self.professors
            .iter()
            .map(ProfessorName::as_str)
            .collect::<Vec<_>>()
            .join(PROFESSOR_JOIN_SEPARATOR)
    }

    /// Canonical archive file name: course prefix, kind, professors, semester
    /// and year, keeping the original extension.
    #[must_use]
    pub fn canonical_file_name(&self) -> String {
        let ext = extension_of(&self.original_file_name);
        let stem = format!(
            "{}-{}-{}-{}-{}",
            self.course.file_prefix(),
            self.kind.as_str(),
            self.joined_professors(),
            self.semester.as_str(),
            self.year.value()
        );
        if ext.is_empty() {
            stem
        } else {
            format!("{stem}.{ext}")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct MaterialRecord {
    pub id: i64,
    pub file_name: String,
    pub course: CourseCode,
    pub professors: Vec<ProfessorName>,
    pub year: AcademicYear,
    pub semester: SemesterName,
    pub kind: MaterialKindName,
    pub remote_id: RemoteFileId,
    pub web_link: WebLink,
    pub uploaded_by: EmailAddress,
    pub reported: bool,
}

impl MaterialRecord {
    /// Assembles the catalog row for a freshly stored upload and validates it
    /// before it is handed back to callers.
    pub fn from_draft(
        id: i64,
        draft: &MaterialDraft,
        remote_id: RemoteFileId,
        web_link: WebLink,
        uploaded_by: EmailAddress,
    ) -> Result<Self, ParseError> {
        let record = Self {
            id,
            file_name: draft.canonical_file_name(),
            course: draft.course.clone(),
            professors: draft.professors.clone(),
            year: draft.year,
            semester: draft.semester.clone(),
            kind: draft.kind.clone(),
            remote_id,
            web_link,
            uploaded_by,
            reported: false,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        if self.id <= 0 {
            return Err(ParseError::InvalidFormat("material id must be positive"));
        }
        if self.professors.is_empty() {
            return Err(ParseError::Empty("professors"));
        }
        if self.file_name.trim().is_empty() {
            return Err(ParseError::Empty("file_name"));
        }
        Ok(())
    }
}

/// Splits the comma-joined storage form back into names, dropping empties.
#[must_use]
pub fn split_professors(joined: &str) -> Vec<ProfessorName> {
    joined
        .split(',')
        .filter_map(|part| ProfessorName::parse(part.trim()).ok())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct Suggestion {
    pub id: i64,
    pub body: String,
}

impl Suggestion {
    pub fn parse_body(input: &str) -> Result<String, ParseError> {
        let body = crate::normalize_whitespace(input);
        if body.is_empty() {
            return Err(ParseError::Empty("suggestion"));
        }
        if body.len() > SUGGESTION_MAX_LEN {
            return Err(ParseError::TooLong("suggestion", SUGGESTION_MAX_LEN));
        }
        Ok(body)
    }
}
