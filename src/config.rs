use serde::{Deserialize, Serialize};

use crate::mask::FieldKind;
use crate::types::DateTime;

/// Declarative description of one field widget, loadable from JSON or any
/// other serde format.
///
/// ```json
/// { "kind": "date", "type_over": true, "initial": { "year": 2024, "month": 1, "day": 31 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub kind:      FieldKind,
    /// Start in type-over mode instead of insert mode
    pub type_over: bool,
    /// Starting value of a date or time field; the current time when absent
    pub initial:   Option<DateTime>,
    /// Starting text of a phone, SSN, currency or percent field
    pub text:      Option<String>,
}

impl EditorConfig {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn type_over(mut self, type_over: bool) -> Self {
        self.type_over = type_over;
        self
    }

    #[must_use]
    pub const fn initial(mut self, value: DateTime) -> Self {
        self.initial = Some(value);
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_defaults() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.kind, FieldKind::Date);
        assert!(!config.type_over);
        assert_eq!(config.initial, None);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{ "kind": "date", "type_over": true, "initial": { "year": 2024, "month": 1, "day": 31 } }"#;
        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            EditorConfig::new(FieldKind::Date)
                .type_over(true)
                .initial(date(2024, 0, 31))
        );
    }

    #[test]
    fn test_parse_masked_config() {
        let json = r#"{ "kind": "phone", "text": "5551234567" }"#;
        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.kind, FieldKind::Phone);
        assert_eq!(config.text.as_deref(), Some("5551234567"));
    }

    #[test]
    fn test_rejects_unknown_kind_and_bad_date() {
        assert!(serde_json::from_str::<EditorConfig>(r#"{ "kind": "zip" }"#).is_err());
        assert!(
            serde_json::from_str::<EditorConfig>(r#"{ "initial": { "year": 2023, "month": 2, "day": 30 } }"#).is_err()
        );
    }

    #[test]
    fn test_round_trip() {
        let config = EditorConfig::new(FieldKind::Time).initial(date(2024, 5, 1));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EditorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
