use crate::errors::ApiError;
use shelf_query::MaterialFilter;

pub const MAX_CURSOR_BYTES: usize = 4096;

const SINGLE_VALUED: [&str; 7] = [
    "course", "year", "semester", "kind", "limit", "cursor", "pretty",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub course: Option<String>,
    pub professors: Vec<String>,
    pub year: Option<i64>,
    pub semester: Option<String>,
    pub kind: Option<String>,
    pub limit: usize,
    pub cursor: Option<String>,
    pub pretty: bool,
}

impl SearchParams {
    #[must_use]
    pub fn filter(&self) -> MaterialFilter {
        MaterialFilter {
            course: self.course.clone(),
            professors: self.professors.clone(),
            year: self.year,
            semester: self.semester.clone(),
            kind: self.kind.clone(),
            uploaded_by: None,
            reported_only: false,
        }
    }
}

/// Parses the search query string. `prof` repeats; everything else is
/// single-valued and duplicates are rejected.
pub fn parse_search_params(
    pairs: &[(String, String)],
    default_limit: usize,
    max_limit: usize,
) -> Result<SearchParams, ApiError> {
    let mut professors = Vec::new();
    let mut single: Vec<(&str, &str)> = Vec::new();

    for (key, value) in pairs {
        match key.as_str() {
            "prof" => {
                if value.trim().is_empty() {
                    return Err(ApiError::invalid_param("prof", value));
                }
                professors.push(value.clone());
            }
            k if SINGLE_VALUED.contains(&k) => {
                if single.iter().any(|(seen, _)| *seen == k) {
                    return Err(ApiError::invalid_param(k, value));
                }
                single.push((k, value.as_str()));
            }
            other => return Err(ApiError::invalid_param(other, value)),
        }
    }

    let get = |name: &str| {
        single
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| (*v).to_string())
    };

    let year = match get("year") {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ApiError::invalid_param("year", &raw))?,
        ),
        None => None,
    };

    let limit = match get("limit") {
        Some(raw) => {
            let value = raw
                .parse::<usize>()
                .map_err(|_| ApiError::invalid_param("limit", &raw))?;
            if value == 0 || value > max_limit {
                return Err(ApiError::invalid_param("limit", &raw));
            }
            value
        }
        None => default_limit,
    };

    let cursor = get("cursor");
    if let Some(value) = &cursor {
        if value.len() > MAX_CURSOR_BYTES {
            return Err(ApiError::invalid_cursor(value));
        }
    }

    let non_empty = |name: &'static str, value: Option<String>| -> Result<Option<String>, ApiError> {
        match value {
            Some(v) if v.trim().is_empty() => Err(ApiError::invalid_param(name, &v)),
            other => Ok(other),
        }
    };

    Ok(SearchParams {
        course: non_empty("course", get("course"))?,
        professors,
        year,
        semester: non_empty("semester", get("semester"))?,
        kind: non_empty("kind", get("kind"))?,
        limit,
        cursor,
        pretty: get("pretty").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_query_is_empty() {
        let params = parse_search_params(&[], 25, 100).expect("params");
        assert_eq!(params.limit, 25);
        assert!(params.filter().is_empty());
    }

    #[test]
    fn repeated_prof_values_accumulate() {
        let params = parse_search_params(
            &pairs(&[("prof", "Hariri"), ("prof", "Assaleh"), ("course", "COE 221")]),
            25,
            100,
        )
        .expect("params");
        assert_eq!(params.professors.len(), 2);
        assert_eq!(params.filter().course.as_deref(), Some("COE 221"));
    }

    #[test]
    fn duplicate_single_valued_keys_are_rejected() {
        let err = parse_search_params(
            &pairs(&[("course", "COE 221"), ("course", "NGN 111")]),
            25,
            100,
        )
        .expect_err("duplicate");
        assert_eq!(err.code, crate::ApiErrorCode::InvalidQueryParameter);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_search_params(&pairs(&[("order", "asc")]), 25, 100).is_err());
    }

    #[test]
    fn limit_bounds_are_enforced() {
        assert!(parse_search_params(&pairs(&[("limit", "0")]), 25, 100).is_err());
        assert!(parse_search_params(&pairs(&[("limit", "101")]), 25, 100).is_err());
        assert!(parse_search_params(&pairs(&[("limit", "abc")]), 25, 100).is_err());
        let params = parse_search_params(&pairs(&[("limit", "100")]), 25, 100).expect("params");
        assert_eq!(params.limit, 100);
    }

    #[test]
    fn year_must_be_integer_and_cursor_bounded() {
        assert!(parse_search_params(&pairs(&[("year", "20x4")]), 25, 100).is_err());
        let long_cursor = "c".repeat(MAX_CURSOR_BYTES + 1);
        let err = parse_search_params(&pairs(&[("cursor", &long_cursor)]), 25, 100)
            .expect_err("cursor too long");
        assert_eq!(err.code, crate::ApiErrorCode::InvalidCursor);
    }

    #[test]
    fn pretty_accepts_one_and_true() {
        assert!(parse_search_params(&pairs(&[("pretty", "1")]), 25, 100)
            .expect("params")
            .pretty);
        assert!(parse_search_params(&pairs(&[("pretty", "TRUE")]), 25, 100)
            .expect("params")
            .pretty);
        assert!(!parse_search_params(&pairs(&[("pretty", "0")]), 25, 100)
            .expect("params")
            .pretty);
    }
}
