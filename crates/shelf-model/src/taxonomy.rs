// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Seeded when the semesters table is empty.
pub const DEFAULT_SEMESTERS: [&str; 4] = ["Fall", "Spring", "Summer", "Unknown"];

/// Seeded when the material_kinds table is empty.
pub const DEFAULT_MATERIAL_KINDS: [&str; 11] = [
    "Midterm 1",
    "Midterm 2",
    "Midterm 3",
    "Final",
    "Quiz",
    "Assignment",
    "Notes",
    "Syllabus",
    "Book",
    "Book Answer Key",
    "Others",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Courses,
    Professors,
    Semesters,
    MaterialKinds,
}

impl TaxonomyKind {
    pub fn parse(raw: &str) -> Result<Self, crate::ParseError> {
        match raw {
            "courses" => Ok(Self::Courses),
            "professors" => Ok(Self::Professors),
            "semesters" => Ok(Self::Semesters),
            "material-kinds" | "material_kinds" => Ok(Self::MaterialKinds),
            _ => Err(crate::ParseError::InvalidFormat(
                "taxonomy kind must be one of courses, professors, semesters, material-kinds",
            )),
        }
    }

    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Professors => "professors",
            Self::Semesters => "semesters",
            Self::MaterialKinds => "material_kinds",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::Courses,
            Self::Professors,
            Self::Semesters,
            Self::MaterialKinds,
        ]
    }
}
