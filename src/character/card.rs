use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical character record, whichever card schema it was read from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterMetadata {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,

    // Optional fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

pub const DEFAULT_NAME: &str = "Unknown";

/// The two card layouts seen in the wild.
///
/// `Flat` is the legacy shape with every field at the top level. `Nested` is the
/// current shape that wraps the same fields in a `data` object, usually next to
/// `spec` and `spec_version` markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardShape<'a> {
    Flat(&'a Map<String, Value>),
    Nested(&'a Map<String, Value>),
}

impl<'a> CardShape<'a> {
    /// Decide which layout a parsed JSON value follows, if any.
    ///
    /// A nested card needs `data.name` to be a string. A flat card needs a string
    /// `name` plus a string `description` or `personality`, which keeps arbitrary
    /// objects that merely carry a `name` from being taken for a card.
    ///
    /// A `data` field alone does not make a card nested: when `data` is not an
    /// object with a string `name`, a flat card is read from the top level, so
    /// `{"name":"X","description":"d","data":{"foo":1}}` yields `X` rather than
    /// an `Unknown` card built from `data`.
    pub fn classify(value: &'a Value) -> Option<Self> {
        let object = value.as_object()?;

        if let Some(data) = object.get("data").and_then(Value::as_object) {
            if data.get("name").is_some_and(Value::is_string) {
                return Some(CardShape::Nested(data));
            }
        }

        let has_name = object.get("name").is_some_and(Value::is_string);
        let has_body = ["description", "personality"]
            .iter()
            .any(|key| object.get(*key).is_some_and(Value::is_string));
        if has_name && has_body {
            return Some(CardShape::Flat(object));
        }

        None
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, CardShape::Nested(_))
    }

    fn fields(&self) -> &'a Map<String, Value> {
        match self {
            CardShape::Flat(fields) | CardShape::Nested(fields) => fields,
        }
    }

    /// Copy the known fields into a [`CharacterMetadata`], filling in defaults.
    pub fn normalize(&self) -> CharacterMetadata {
        let fields = self.fields();
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let optional_text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        let name = match fields.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => DEFAULT_NAME.to_string(),
        };

        let tags = fields.get("tags").and_then(Value::as_array).map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });

        CharacterMetadata {
            name,
            description: text("description"),
            personality: text("personality"),
            scenario: text("scenario"),
            first_mes: text("first_mes"),
            mes_example: text("mes_example"),
            creator_notes: optional_text("creator_notes"),
            system_prompt: optional_text("system_prompt"),
            tags,
        }
    }
}

impl CharacterMetadata {
    /// Classify and normalize a parsed JSON value in one step.
    pub fn from_card_value(value: &Value) -> Option<Self> {
        CardShape::classify(value).map(|shape| shape.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_nested_card() {
        let value = json!({
            "spec": "chara_card_v2",
            "spec_version": "2.0",
            "data": { "name": "Alice", "description": "A helpful AI assistant" }
        });
        let shape = CardShape::classify(&value).unwrap();
        assert!(shape.is_nested());
        assert_eq!(shape.normalize().name, "Alice");
    }

    #[test]
    fn test_unrelated_data_field_falls_back_to_top_level() {
        let value = json!({ "name": "X", "description": "d", "data": { "foo": 1 } });
        let shape = CardShape::classify(&value).unwrap();
        assert!(!shape.is_nested());
        let card = shape.normalize();
        assert_eq!(card.name, "X");
        assert_eq!(card.description, "d");

        let nameless = json!({ "data": { "foo": 1 } });
        assert_eq!(CardShape::classify(&nameless), None);
    }

    #[test]
    fn test_classify_flat_card_requires_body_field() {
        let with_body = json!({ "name": "Bob", "personality": "Grumpy" });
        assert!(matches!(
            CardShape::classify(&with_body),
            Some(CardShape::Flat(_))
        ));

        let name_only = json!({ "name": "Bob" });
        assert_eq!(CardShape::classify(&name_only), None);
    }

    #[test]
    fn test_classify_rejects_objects_without_names() {
        assert_eq!(CardShape::classify(&json!({ "description": "x" })), None);
        assert_eq!(
            CardShape::classify(&json!({ "data": { "description": "x" } })),
            None
        );
        assert_eq!(
            CardShape::classify(&json!({ "name": 42, "description": "x" })),
            None
        );
        assert_eq!(CardShape::classify(&json!(["name"])), None);
        assert_eq!(CardShape::classify(&json!("name")), None);
    }

    #[test]
    fn test_nested_without_data_name_falls_back_to_flat() {
        let value = json!({
            "name": "Top",
            "description": "Top level",
            "data": { "description": "no name here" }
        });
        let card = CharacterMetadata::from_card_value(&value).unwrap();
        assert_eq!(card.name, "Top");
        assert_eq!(card.description, "Top level");
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let value = json!({ "name": "Aria", "description": "A wandering bard" });
        let card = CharacterMetadata::from_card_value(&value).unwrap();

        assert_eq!(card.name, "Aria");
        assert_eq!(card.description, "A wandering bard");
        assert_eq!(card.personality, "");
        assert_eq!(card.scenario, "");
        assert_eq!(card.first_mes, "");
        assert_eq!(card.mes_example, "");
        assert_eq!(card.creator_notes, None);
        assert_eq!(card.system_prompt, None);
        assert_eq!(card.tags, None);
    }

    #[test]
    fn test_normalize_empty_name_becomes_unknown() {
        let value = json!({ "data": { "name": "" } });
        let card = CharacterMetadata::from_card_value(&value).unwrap();
        assert_eq!(card.name, DEFAULT_NAME);
    }

    #[test]
    fn test_normalize_passes_optional_fields_through() {
        let value = json!({
            "data": {
                "name": "Zed",
                "creator_notes": "Made for testing",
                "system_prompt": "You are Zed.",
                "tags": ["sci-fi", "robot"],
                "alternate_greetings": ["ignored"]
            }
        });
        let card = CharacterMetadata::from_card_value(&value).unwrap();
        assert_eq!(card.creator_notes.as_deref(), Some("Made for testing"));
        assert_eq!(card.system_prompt.as_deref(), Some("You are Zed."));
        assert_eq!(
            card.tags,
            Some(vec!["sci-fi".to_string(), "robot".to_string()])
        );
    }

    #[test]
    fn test_optional_fields_not_serialized_when_none() {
        let value = json!({ "name": "Aria", "personality": "Curious" });
        let card = CharacterMetadata::from_card_value(&value).unwrap();
        let json = serde_json::to_string(&card).unwrap();

        assert!(json.contains("\"scenario\":\"\""));
        assert!(!json.contains("creator_notes"));
        assert!(!json.contains("system_prompt"));
        assert!(!json.contains("tags"));
    }
}
