use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryLimits {
    pub max_limit: usize,
    pub max_professor_terms: usize,
    pub max_term_len: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_limit: 100,
            max_professor_terms: 8,
            max_term_len: 128,
        }
    }
}
