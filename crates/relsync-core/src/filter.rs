use std::fmt;

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// A ticket filter over multi-valued label fields.
///
/// Fields are referenced by their JQL clause name. Rendering with `Display`
/// produces JQL; values are always quoted, so repository identifiers can
/// never change the shape of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Contains { field: String, value: String },
    /// JQL semantics: an empty field matches neither `in` nor `not in`.
    NotContains { field: String, value: String },
    IsEmpty { field: String },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::NotContains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_empty(field: impl Into<String>) -> Self {
        Filter::IsEmpty {
            field: field.into(),
        }
    }

    /// `value` is absent from `field`, including when the field is empty.
    pub fn lacks(field: impl Into<String>, value: impl Into<String>) -> Self {
        let field = field.into();
        Filter::is_empty(field.clone()).or(Filter::not_contains(field, value))
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut items) => {
                items.push(other);
                Filter::And(items)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut items) => {
                items.push(other);
                Filter::Or(items)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    /// Disjunction of `filters`; `None` when there is nothing to match.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Option<Self> {
        let mut items: Vec<Filter> = filters.into_iter().collect();
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Filter::Or(items)),
        }
    }

    fn is_compound(&self) -> bool {
        matches!(self, Filter::And(_) | Filter::Or(_))
    }

    fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Filter], op: &str) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, " {op} ")?;
            }
            if item.is_compound() {
                write!(f, "({item})")?;
            } else {
                write!(f, "{item}")?;
            }
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Contains { field, value } => {
                write!(f, "{} in ({})", quote(field), quote(value))
            }
            Filter::NotContains { field, value } => {
                write!(f, "{} not in ({})", quote(field), quote(value))
            }
            Filter::IsEmpty { field } => write!(f, "{} is EMPTY", quote(field)),
            Filter::And(items) => Filter::write_joined(f, items, "AND"),
            Filter::Or(items) => Filter::write_joined(f, items, "OR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
