//! Index definitions for tables.

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    /// Indexed columns, in order.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexDef {
    /// Create a unique index on a single column.
    pub fn unique(column: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
            unique: true,
        }
    }

    /// Create a composite index.
    pub fn composite(columns: impl IntoIterator<Item = impl Into<String>>, unique: bool) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            unique,
        }
    }

    /// Check if this is a unique index on exactly `column`.
    pub fn is_unique_on(&self, column: &str) -> bool {
        self.unique && self.columns.len() == 1 && self.columns[0] == column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_on() {
        assert!(IndexDef::unique("email").is_unique_on("email"));
        assert!(!IndexDef::unique("email").is_unique_on("name"));
        assert!(!IndexDef::composite(["email", "org"], true).is_unique_on("email"));
        assert!(!IndexDef::composite(["email"], false).is_unique_on("email"));
    }
}
