//! # Queries
//!
//! Services describe what they want from a document store as an explicit
//! predicate tree (`Filter`) plus a `Sort` and a window. Stores either
//! evaluate the tree in-process (`Filter::matches`) or translate it into
//! their native query language.
//!
//! ```rust
//! use quill_core::query::{Filter, Sort};
//! use serde_json::json;
//!
//! let filter = Filter::and(vec![
//!     Filter::contains("title", "rust"),
//!     Filter::any_of("tags", vec![json!("tag:1"), json!("tag:2")]),
//! ]);
//!
//! let post = json!({"title": "Learning Rust", "tags": ["tag:2"]});
//! assert!(filter.matches(&post));
//!
//! let sort = Sort::parse(Some("-createdAt"), &["createdAt"], Sort::desc("createdAt")).unwrap();
//! assert_eq!(sort, Sort::desc("createdAt"));
//! ```

use std::cmp::Ordering;

use serde_json::Value;

use crate::errors::QuillError;
use crate::pagination::PageRequest;

/// A predicate over JSON documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Every clause must match.
    And(Vec<Filter>),
    /// At least one clause must match.
    Or(Vec<Filter>),
    /// Case-insensitive substring match on a string field.
    Contains { field: String, needle: String },
    /// Field equals value; for array fields, any element equals value.
    Eq { field: String, value: Value },
    /// Field is one of `values`; for array fields, the array intersects `values`.
    In { field: String, values: Vec<Value> },
}

impl Filter {
    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn any_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In {
            field: field.into(),
            values,
        }
    }

    /// AND-combines clauses. `All` clauses are dropped; no clauses left means
    /// `All`, a single clause is returned as-is.
    pub fn and(clauses: Vec<Filter>) -> Self {
        let mut clauses: Vec<Filter> = clauses
            .into_iter()
            .filter(|c| !matches!(c, Filter::All))
            .collect();

        match clauses.len() {
            0 => Filter::All,
            1 => clauses.remove(0),
            _ => Filter::And(clauses),
        }
    }

    /// OR-combines clauses. Any `All` clause makes the whole filter `All`.
    pub fn or(clauses: Vec<Filter>) -> Self {
        if clauses.iter().any(|c| matches!(c, Filter::All)) {
            return Filter::All;
        }
        let mut clauses = clauses;
        if clauses.len() == 1 {
            return clauses.remove(0);
        }
        Filter::Or(clauses)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// Evaluates the predicate against a document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Filter::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Filter::Contains { field, needle } => {
                let needle = needle.to_lowercase();
                doc.get(field)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            }
            Filter::Eq { field, value } => match doc.get(field) {
                Some(Value::Array(items)) => items.iter().any(|v| v == value),
                Some(v) => v == value,
                None => value.is_null(),
            },
            Filter::In { field, values } => match doc.get(field) {
                Some(Value::Array(items)) => items.iter().any(|v| values.contains(v)),
                Some(v) => values.contains(v),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Single-field sort descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    /// Parses `field` / `-field` (a leading `+` is accepted as ascending).
    /// Absent or blank input yields `default`; fields outside `allowed`
    /// fail with a validation error.
    pub fn parse(raw: Option<&str>, allowed: &[&str], default: Sort) -> Result<Sort, QuillError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(default);
        };

        let (order, field) = match raw.strip_prefix('-') {
            Some(rest) => (SortOrder::Desc, rest),
            None => (SortOrder::Asc, raw.strip_prefix('+').unwrap_or(raw)),
        };

        if !allowed.contains(&field) {
            return Err(QuillError::validation(format!("Invalid sort field: {field}"))
                .with_errors(serde_json::json!({ "sort": [format!("must be one of: {}", allowed.join(", "))] })));
        }

        Ok(Sort {
            field: field.to_string(),
            order,
        })
    }

    /// Orders two documents by this sort's field. Missing values sort first
    /// in ascending order.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Filter + sort + window handed to a document store.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: None,
            skip: 0,
            limit: None,
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, req: &PageRequest) -> Self {
        self.skip = req.skip();
        self.limit = Some(req.limit);
        self
    }
}
