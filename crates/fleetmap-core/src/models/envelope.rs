use serde_json::Value;

/// Code shown when an error entry carries none.
pub const UNKNOWN_ERROR_CODE: &str = "unknown";

/// One entry of an envelope's `errors` value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeError {
    pub code: String,
    pub reason: String,
}

impl EnvelopeError {
    /// Read an entry leniently: any shape the gateway sends still yields an error.
    pub fn from_value(entry: &Value) -> Self {
        match entry {
            Value::Object(fields) => Self {
                code: fields
                    .get("code")
                    .filter(|c| !c.is_null())
                    .map(scalar_text)
                    .unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string()),
                reason: match fields.get("reason") {
                    Some(Value::String(reason)) => reason.clone(),
                    Some(other) if !other.is_null() => other.to_string(),
                    _ => entry.to_string(),
                },
            },
            other => Self {
                code: UNKNOWN_ERROR_CODE.to_string(),
                reason: scalar_text(other),
            },
        }
    }
}

/// Strings without quotes, everything else as JSON text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Gateway response wrapper: `{"result": [...], "errors": [...]}`.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    pub result: Option<Value>,
    pub errors: Vec<EnvelopeError>,
}

impl Envelope {
    /// Parse the envelope fields out of a response body.
    /// Returns None when the body is not a JSON object.
    pub fn from_body(body: &Value) -> Option<Self> {
        if !body.is_object() {
            return None;
        }
        let result = body.get("result").filter(|v| !v.is_null()).cloned();
        let errors = match body.get("errors") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries.iter().map(EnvelopeError::from_value).collect(),
            // A lone object or string is still an error report
            Some(single) => vec![EnvelopeError::from_value(single)],
        };
        Some(Self { result, errors })
    }

    /// The `result` sequence, when present and an array.
    pub fn into_result_array(self) -> Option<Vec<Value>> {
        match self.result {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }
    }
}

/// Short description of a JSON value's shape, for diagnostics.
pub fn describe_shape(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(fields) => {
            let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
    }
}
