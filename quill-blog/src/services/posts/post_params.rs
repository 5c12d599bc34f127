use quill_core::{Filter, Sort};
use serde_json::Value;

use crate::services::BlogParams;

pub const SORTABLE: &[&str] = &["title", "createdAt", "updatedAt"];

/// Comma-separated tokens, trimmed, blanks dropped.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// List filters read from the query string.
#[derive(Debug, Clone, Default)]
pub struct PostParams {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub sort: Option<String>,
}

impl From<&BlogParams> for PostParams {
    fn from(params: &BlogParams) -> Self {
        Self {
            title: params.query_text("title").map(str::to_string),
            tags: params.query_value("tags").map(split_csv).unwrap_or_default(),
            sort: params.query_value("sort").map(str::to_string),
        }
    }
}

impl PostParams {
    /// `title` substring AND any of `tags`; absent clauses are left out.
    pub fn filter(&self) -> Filter {
        let mut clauses = vec![];
        if let Some(title) = &self.title {
            clauses.push(Filter::contains("title", title.as_str()));
        }
        if !self.tags.is_empty() {
            let ids = self.tags.iter().map(|t| Value::String(t.clone())).collect();
            clauses.push(Filter::any_of("tags", ids));
        }
        Filter::and(clauses)
    }

    pub fn sort(&self) -> Result<Sort, quill_core::QuillError> {
        Sort::parse(self.sort.as_deref(), SORTABLE, newest_first())
    }
}

pub fn newest_first() -> Sort {
    Sort::desc("createdAt")
}

/// Substring match on title OR description.
pub fn search_filter(q: &str) -> Filter {
    Filter::or(vec![Filter::contains("title", q), Filter::contains("desc", q)])
}

pub fn by_tag_filter(tag_id: &str) -> Filter {
    Filter::equals("tags", tag_id)
}
