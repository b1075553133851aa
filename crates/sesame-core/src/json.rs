use std::borrow::Cow;

use serde_json::Value;

/// A caller-supplied argument that only carries meaning when it is text.
///
/// Store operations accept keys through this trait so that callers holding
/// dynamic values (for example a `serde_json::Value` pulled out of a request)
/// get a silent no-op for non-string keys instead of an error.
pub trait TextArg {
    /// Returns the text, or `None` when the argument is not a string.
    fn as_text(&self) -> Option<&str>;
}

impl TextArg for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl TextArg for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl TextArg for Cow<'_, str> {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_ref())
    }
}

impl TextArg for Value {
    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }
}

impl<T: TextArg> TextArg for Option<T> {
    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(TextArg::as_text)
    }
}

impl<T: TextArg + ?Sized> TextArg for &T {
    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }
}

/// Classifies `candidate` as JSON text.
///
/// Returns `None` when the candidate is not a string at all, otherwise whether
/// it parses as a JSON document.
///
/// Parsing follows `serde_json`: numbers outside the `f64` range (`1e400`) and
/// documents nested deeper than 128 levels are rejected, where a JavaScript
/// `JSON.parse` would accept them.
pub fn is_valid_json<T: TextArg + ?Sized>(candidate: &T) -> Option<bool> {
    candidate
        .as_text()
        .map(|text| serde_json::from_str::<Value>(text).is_ok())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn classifies_json_text() {
        assert_eq!(is_valid_json(r#"{"a":1}"#), Some(true));
        assert_eq!(is_valid_json("[1, 2, 3]"), Some(true));
        assert_eq!(is_valid_json("  null "), Some(true));
        assert_eq!(is_valid_json("\"quoted\""), Some(true));
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(is_valid_json("not json"), Some(false));
        assert_eq!(is_valid_json(""), Some(false));
        assert_eq!(is_valid_json("{\"a\":"), Some(false));
        assert_eq!(is_valid_json("1e400"), Some(false));
    }

    #[test]
    fn non_string_is_indeterminate() {
        assert_eq!(is_valid_json(&json!(123)), None);
        assert_eq!(is_valid_json(&json!({"a": 1})), None);
        assert_eq!(is_valid_json(&Option::<String>::None), None);
    }

    #[test]
    fn string_values_are_text() {
        assert_eq!(json!("k").as_text(), Some("k"));
        assert_eq!(Some("k".to_string()).as_text(), Some("k"));
        assert_eq!(Cow::Borrowed("k").as_text(), Some("k"));
        assert_eq!(json!(42).as_text(), None);
    }
}
