/// A single column value written by an insert or update
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Ordered set of column assignments.
///
/// Column names always come from code, never from request input, so they are
/// pushed into SQL verbatim while values are bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `column`, replacing any earlier assignment to it.
    pub fn set(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    /// Assign `column` only when a value is present. Partial updates are built from this.
    pub fn set_opt<V: Into<FieldValue>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(c, _)| *c)
    }

    pub fn into_fields(self) -> Vec<(&'static str, FieldValue)> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_opt_skips_missing_values() {
        let changes = Changes::new()
            .set_opt("name", Some("Drill".to_string()))
            .set_opt::<String>("category", None);

        assert_eq!(changes.columns().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(changes.get("name"), Some(&FieldValue::Text("Drill".to_string())));
        assert!(changes.get("category").is_none());
    }

    #[test]
    fn later_assignment_wins() {
        let changes = Changes::new().set("is_active", true).set("is_active", false);
        assert_eq!(changes.into_fields(), vec![("is_active", FieldValue::Bool(false))]);
    }

    #[test]
    fn empty_changes() {
        assert!(Changes::new().is_empty());
        assert!(Changes::new().set_opt::<bool>("is_active", None).is_empty());
    }
}
