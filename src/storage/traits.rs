//! Storage trait definitions and filter types.

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Filter operations for querying records.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Field equals value
    Eq,
    /// Field does not equal value
    Ne,
}

/// A filter for querying records.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Field name to filter on
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
    /// Value to compare against
    pub value: serde_json::Value,
}

impl Filter {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Create a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Ne,
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Check if a record matches this filter.
    pub fn matches(&self, record: &serde_json::Value) -> bool {
        let field_value = record.get(&self.field);

        match &self.op {
            FilterOp::Eq => match field_value {
                Some(v) => *v == self.value,
                None => self.value.is_null(),
            },
            FilterOp::Ne => match field_value {
                Some(v) => *v != self.value,
                None => !self.value.is_null(),
            },
        }
    }
}

/// Trait for records that have an ID field.
pub trait HasId {
    /// Get the record's unique identifier.
    fn id(&self) -> &str;
}

/// Storage trait for collection operations on records.
///
/// Deletion is deliberately absent: themes and identities are never removed
/// by this core.
pub trait Storage: Send + Sync {
    /// Create a new record.
    fn create<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, record: &T) -> Result<()>;

    /// Get a record by ID.
    fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>>;

    /// Update an existing record.
    fn update<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, id: &str, record: &T) -> Result<()>;

    /// Query records with filters, in insertion order.
    fn query<T: DeserializeOwned>(&self, collection: &str, filters: &[Filter]) -> Result<Vec<T>>;

    /// List all records in a collection, in insertion order.
    fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_eq_matches() {
        let filter = Filter::eq("owner_id", "usr-1");
        let record = json!({"id": "thm-1", "owner_id": "usr-1"});
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_filter_eq_no_match() {
        let filter = Filter::eq("owner_id", "usr-1");
        let record = json!({"id": "thm-1", "owner_id": "usr-2"});
        assert!(!filter.matches(&record));
    }

    #[test]
    fn test_filter_eq_null() {
        let filter = Filter::eq("field", serde_json::Value::Null);
        let record = json!({"id": "thm-1"});
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_filter_ne_matches() {
        let filter = Filter::ne("owner_id", "usr-1");
        let record = json!({"id": "thm-1", "owner_id": "usr-2"});
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_filter_ne_no_match() {
        let filter = Filter::ne("owner_id", "usr-1");
        let record = json!({"id": "thm-1", "owner_id": "usr-1"});
        assert!(!filter.matches(&record));
    }

    #[test]
    fn test_filter_op_enum_equality() {
        assert_eq!(FilterOp::Eq, FilterOp::Eq);
        assert_ne!(FilterOp::Eq, FilterOp::Ne);
    }
}
