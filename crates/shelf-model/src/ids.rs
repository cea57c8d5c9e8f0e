// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const COURSE_CODE_MAX_LEN: usize = 64;
pub const NAME_MAX_LEN: usize = 128;
pub const LINK_MAX_LEN: usize = 2048;
pub const COURSE_FILE_PREFIX_LEN: usize = 7;

pub const YEAR_MIN: i64 = 1990;
pub const YEAR_MAX: i64 = 2100;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    OutOfRange(&'static str, i64, i64),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(msg) => f.write_str(msg),
            Self::OutOfRange(name, min, max) => {
                write!(f, "{name} must be between {min} and {max}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

fn check_name(input: &str, field: &'static str, max: usize) -> Result<(), ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty(field));
    }
    if input.trim() != input {
        return Err(ParseError::Trimmed(field));
    }
    if input.len() > max {
        return Err(ParseError::TooLong(field, max));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct CourseCode(String);

impl CourseCode {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        check_name(input, "course", COURSE_CODE_MAX_LEN)?;
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First characters of the code, used when composing canonical file names.
    #[must_use]
    pub fn file_prefix(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(COURSE_FILE_PREFIX_LEN)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct ProfessorName(String);

impl ProfessorName {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        check_name(input, "professor", NAME_MAX_LEN)?;
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct SemesterName(String);

impl SemesterName {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        check_name(input, "semester", NAME_MAX_LEN)?;
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct MaterialKindName(String);

impl MaterialKindName {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        check_name(input, "kind", NAME_MAX_LEN)?;
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct AcademicYear(i64);

impl AcademicYear {
    pub fn new(value: i64) -> Result<Self, ParseError> {
        if !(YEAR_MIN..=YEAR_MAX).contains(&value) {
            return Err(ParseError::OutOfRange("year", YEAR_MIN, YEAR_MAX));
        }
        Ok(Self(value))
    }

    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let value = input
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidFormat("year must be an integer"))?;
        Self::new(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        check_name(input, "email", NAME_MAX_LEN * 2)?;
        let (local, domain) = input
            .split_once('@')
            .ok_or(ParseError::InvalidFormat("email must contain '@'"))?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(ParseError::InvalidFormat(
                "email must be a single local@domain pair",
            ));
        }
        if !domain.contains('.') {
            return Err(ParseError::InvalidFormat("email domain must be qualified"));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, d)| d)
    }

    #[must_use]
    pub fn has_domain(&self, domain: &str) -> bool {
        self.domain().eq_ignore_ascii_case(domain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct RemoteFileId(String);

impl RemoteFileId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        check_name(input, "remote_id", NAME_MAX_LEN * 2)?;
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct WebLink(String);

impl WebLink {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        check_name(input, "web_link", LINK_MAX_LEN)?;
        if !(input.starts_with("http://")
            || input.starts_with("https://")
            || input.starts_with("file://"))
        {
            return Err(ParseError::InvalidFormat(
                "web_link must be an http(s) or file URL",
            ));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
