use serde_json::Value;

/// Hidden input rendered on every public form. Humans leave it empty.
pub const FIELD: &str = "website";

/// True when the trap field carries anything at all.
pub fn is_spam(values: &serde_json::Map<String, Value>) -> bool {
    match values.get(FIELD) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(v: Value) -> serde_json::Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_trap_is_human() {
        assert!(!is_spam(&map(json!({ "name": "Ana" }))));
        assert!(!is_spam(&map(json!({ "website": "" }))));
        assert!(!is_spam(&map(json!({ "website": null }))));
    }

    #[test]
    fn filled_trap_is_spam() {
        assert!(is_spam(&map(json!({ "website": "http://cheap.example" }))));
        assert!(is_spam(&map(json!({ "website": 1 }))));
    }
}
