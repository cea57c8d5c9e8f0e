// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "shelf-model";

mod ids;
mod material;
mod taxonomy;

pub use ids::{
    AcademicYear, CourseCode, EmailAddress, MaterialKindName, ParseError, ProfessorName,
    RemoteFileId, SemesterName, WebLink,
};
pub use material::{
    extension_of, split_professors, MaterialDraft, MaterialRecord, Suggestion, UploadPolicy,
    MAX_UPLOAD_BYTES, PROFESSOR_JOIN_SEPARATOR, SUGGESTION_MAX_LEN,
};
pub use taxonomy::{TaxonomyKind, DEFAULT_MATERIAL_KINDS, DEFAULT_SEMESTERS};

/// Collapses interior whitespace runs and trims the ends.
#[must_use]
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
