//! Typed field values held by sub-records.

use chrono::NaiveDate;
use std::fmt;

/// One stored field value.
///
/// Boolean-coded fields are stored as `Integer(0)` / `Integer(1)`; any other value of such a
/// field reads back as "unknown".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text or a single code.
    Text(String),
    /// Whole number, also used for boolean-coded fields.
    Integer(i64),
    /// Calendar date.
    Date(NaiveDate),
    /// Ordered list of strings (multi-valued codes, identifiers).
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders any scalar value as a string; lists are joined with `|`.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::List(items) => items.join("|"),
        }
    }

    /// Returns the integer value, parsing text when it holds a number.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads a boolean-coded value: `1` is true, `0` is false, anything else is unknown.
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_integer() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        }
    }

    /// Returns the date if this is a `Date` value or ISO text.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    /// Returns the value as a list; non-blank text becomes a single-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items.clone(),
            FieldValue::Text(s) if !s.trim().is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// True for blank text and empty lists.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Integer(_) | FieldValue::Date(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_coding_reads_only_zero_and_one() {
        assert_eq!(FieldValue::from(true).as_bool(), Some(true));
        assert_eq!(FieldValue::from(false).as_bool(), Some(false));
        assert_eq!(FieldValue::Integer(2).as_bool(), None);
        assert_eq!(FieldValue::Integer(-1).as_bool(), None);
        assert_eq!(FieldValue::from("1").as_bool(), Some(true));
        assert_eq!(FieldValue::from("yes").as_bool(), None);
    }

    #[test]
    fn text_becomes_single_element_list() {
        assert_eq!(FieldValue::from("HP:0000118").to_list(), vec!["HP:0000118"]);
        assert!(FieldValue::from("  ").to_list().is_empty());
        assert!(FieldValue::Integer(3).to_list().is_empty());
    }

    #[test]
    fn dates_render_and_parse_as_iso() {
        let date = NaiveDate::from_ymd_opt(1990, 1, 21).unwrap();
        let value = FieldValue::from(date);
        assert_eq!(value.to_text(), "1990-01-21");
        assert_eq!(FieldValue::from("1990-01-21").as_date(), Some(date));
        assert_eq!(FieldValue::from("1990").as_date(), None);
    }

    #[test]
    fn emptiness_only_applies_to_text_and_lists() {
        assert!(FieldValue::from("").is_empty());
        assert!(FieldValue::List(vec![]).is_empty());
        assert!(!FieldValue::Integer(0).is_empty());
    }
}
