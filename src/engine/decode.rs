//! Strict decoding of provider responses.
//!
//! The only leniency is an absent `flashcards` field, which decodes to an
//! empty list. Everything else that deviates from the requested schema is a
//! response-shape failure.

use crate::error::GenerationError;
use crate::model::{CardCountRange, FlashCard};
use serde_json::{Map, Value};

pub(crate) fn parse_range(raw: &str) -> Result<CardCountRange, GenerationError> {
    let obj = parse_object(raw)?;
    Ok(CardCountRange {
        min: integer_field(&obj, "min")?,
        max: integer_field(&obj, "max")?,
    })
}

pub(crate) fn parse_cards(raw: &str) -> Result<Vec<FlashCard>, GenerationError> {
    let mut obj = parse_object(raw)?;
    match obj.remove("flashcards") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list @ Value::Array(_)) => serde_json::from_value(list)
            .map_err(|e| GenerationError::response_shape(format!("invalid flash card entry: {e}"))),
        Some(other) => Err(GenerationError::response_shape(format!(
            "'flashcards' should be an array, got {}",
            kind_of(&other)
        ))),
    }
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, GenerationError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| GenerationError::response_shape(format!("not valid JSON: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(GenerationError::response_shape(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn integer_field(obj: &Map<String, Value>, key: &str) -> Result<i64, GenerationError> {
    let value = obj
        .get(key)
        .ok_or_else(|| GenerationError::response_shape(format!("missing '{key}'")))?;

    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    // Whole-number floats such as 6.0 still count; fractions truncate toward zero.
    match value.as_f64() {
        Some(f) if f.is_finite() => Ok(f.trunc() as i64),
        _ => Err(GenerationError::response_shape(format!(
            "'{key}' should be a number, got {}",
            kind_of(value)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn range_accepts_integers_and_whole_floats() {
        assert_eq!(
            parse_range(r#"{"min": 4, "max": 8}"#).unwrap(),
            CardCountRange { min: 4, max: 8 }
        );
        assert_eq!(
            parse_range(r#"{"min": 5.0, "max": 9.7}"#).unwrap(),
            CardCountRange { min: 5, max: 9 }
        );
    }

    #[test]
    fn range_rejects_non_numeric_and_missing_fields() {
        assert!(matches!(
            parse_range(r#"{"min": "4", "max": 8}"#),
            Err(GenerationError::ResponseShape(_))
        ));
        assert!(matches!(
            parse_range(r#"{"min": 4}"#),
            Err(GenerationError::ResponseShape(_))
        ));
        assert!(matches!(
            parse_range("four to eight"),
            Err(GenerationError::ResponseShape(_))
        ));
        assert!(matches!(
            parse_range("[4, 8]"),
            Err(GenerationError::ResponseShape(_))
        ));
    }

    #[test]
    fn cards_decode_in_order() {
        let raw = r#"{"flashcards": [
            {"question": "What is ATP?", "answer": "The cell's energy currency."},
            {"question": "Where does glycolysis occur?", "answer": "In the cytoplasm."}
        ]}"#;
        let cards = parse_cards(raw).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].question, "What is ATP?");
        assert_eq!(cards[1].answer, "In the cytoplasm.");
    }

    #[test]
    fn missing_flashcards_field_is_empty_not_an_error() {
        assert_eq!(parse_cards("{}").unwrap(), Vec::new());
        assert_eq!(parse_cards(r#"{"flashcards": null}"#).unwrap(), Vec::new());
    }

    #[test]
    fn entries_missing_required_fields_are_rejected() {
        let err = parse_cards(r#"{"flashcards": [{"question": "Q only"}]}"#).unwrap_err();
        assert!(matches!(err, GenerationError::ResponseShape(_)));

        let err = parse_cards(r#"{"flashcards": {"question": "Q", "answer": "A"}}"#).unwrap_err();
        assert!(matches!(err, GenerationError::ResponseShape(_)));
    }
}
