use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A geofence record, passed through from the API untouched.
///
/// Only `id` is relied on, for lookup. The default value is the empty
/// object `{}`, which is what lookups return for a missing id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geofence(Map<String, Value>);

impl Geofence {
    /// Wrap a JSON value; anything that is not an object has no fields.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    /// Strict JSON equality: `"1"` does not match `1`.
    pub fn has_id(&self, id: &Value) -> bool {
        self.id() == Some(id)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Id rendered for display: strings without quotes, other JSON as-is.
    pub fn display_id(&self) -> String {
        match self.id() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "-".to_string(),
        }
    }
}
