//! Wire shapes exchanged with the extraction backend
//!
//! The backend is loose about types: `page_num` arrives as `"3"`, `3`, `null` or not at all,
//! and `value` may be a string, `null` or a list (insurance types). Everything is normalized
//! here so the rest of the crate only sees strings and page numbers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One extracted field as returned by `POST /upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub field: String,
    #[serde(default, deserialize_with = "deserialize_value")]
    pub value: String,
    /// Source page, 0 when unknown
    #[serde(
        default,
        deserialize_with = "deserialize_page_num",
        serialize_with = "serialize_page_num"
    )]
    pub page_num: u32,
}

impl ExtractedRecord {
    pub fn new(field: impl Into<String>, value: impl Into<String>, page_num: u32) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            page_num,
        }
    }
}

/// Successful body of `POST /upload`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(deserialize_with = "deserialize_extracted_data")]
    pub extracted_data: Vec<ExtractedRecord>,
}

/// Error body of a non-2xx response (`{"detail": ...}` or `{"message": ...}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Human readable error text, `detail` taking precedence over `message`
    pub fn text(&self) -> Option<String> {
        if let Some(detail) = &self.detail {
            let text = match detail {
                Value::String(s) => s.clone(),
                // FastAPI validation errors: [{"loc": [...], "msg": "...", "type": "..."}]
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item.get("msg").and_then(Value::as_str) {
                        Some(msg) => msg.to_string(),
                        None => item.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            if !text.trim().is_empty() {
                return Some(text);
            }
        }

        self.message
            .as_ref()
            .filter(|m| !m.trim().is_empty())
            .cloned()
    }
}

/// Backend placeholder for "nothing found" (`"null"`, `"NA"`, `"N/A"` or blank)
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("na")
        || value.eq_ignore_ascii_case("n/a")
}

/// Parse a page number typed by a user or sent as text, 0 when not a non-negative integer
pub fn parse_page_text(text: &str) -> u32 {
    text.trim().parse::<u32>().unwrap_or(0)
}

fn page_from_json(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        Value::String(s) => parse_page_text(s),
        _ => 0,
    }
}

fn text_from_json(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(text_from_json)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn deserialize_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.map(text_from_json).unwrap_or_default())
}

fn deserialize_page_num<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().map(page_from_json).unwrap_or(0))
}

fn serialize_page_num<S>(page: &u32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&page.to_string())
}

/// Older backends return `extracted_data` as a `{field: value}` object
#[derive(Deserialize)]
#[serde(untagged)]
enum ExtractedData {
    List(Vec<ExtractedRecord>),
    Map(serde_json::Map<String, Value>),
}

fn deserialize_extracted_data<'de, D>(deserializer: D) -> Result<Vec<ExtractedRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ExtractedData::deserialize(deserializer)? {
        ExtractedData::List(records) => records,
        ExtractedData::Map(map) => map
            .into_iter()
            .map(|(field, value)| ExtractedRecord {
                field,
                value: text_from_json(value),
                page_num: 0,
            })
            .collect(),
    })
}
