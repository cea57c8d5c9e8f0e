use crate::filters::MaterialQueryRequest;
use crate::limits::QueryLimits;

pub fn validate_request(req: &MaterialQueryRequest, limits: &QueryLimits) -> Result<(), String> {
    if req.limit == 0 || req.limit > limits.max_limit {
        return Err(format!("limit must be between 1 and {}", limits.max_limit));
    }

    if req.filter.professors.len() > limits.max_professor_terms {
        return Err(format!(
            "at most {} professor filters are allowed",
            limits.max_professor_terms
        ));
    }
    for term in &req.filter.professors {
        if term.trim().is_empty() {
            return Err("professor filter must not be empty".to_string());
        }
        if term.len() > limits.max_term_len {
            return Err(format!(
                "professor filter length exceeds {}",
                limits.max_term_len
            ));
        }
    }

    for (name, value) in [
        ("course", &req.filter.course),
        ("semester", &req.filter.semester),
        ("kind", &req.filter.kind),
        ("uploaded_by", &req.filter.uploaded_by),
    ] {
        if let Some(v) = value {
            if v.trim().is_empty() {
                return Err(format!("{name} filter must not be empty"));
            }
            if v.len() > limits.max_term_len {
                return Err(format!("{name} filter length exceeds {}", limits.max_term_len));
            }
        }
    }

    Ok(())
}

/// Stable hash binding a cursor to the filter and page size that issued it.
pub fn request_hash(req: &MaterialQueryRequest) -> Result<String, String> {
    let canonical =
        serde_json::to_vec(&(&req.filter, req.limit)).map_err(|e| e.to_string())?;
    Ok(shelf_core::sha256_hex(&canonical))
}
