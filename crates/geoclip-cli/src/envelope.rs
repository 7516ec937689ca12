//! HTTP-style event and response envelopes around a job

use std::collections::BTreeMap;

use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::models::JobResult;
use serde::Serialize;
use serde_json::Value;

/// Pull the job out of an incoming event.
///
/// The job is `event.body` when that is a JSON string (parsed) or an object,
/// otherwise the event itself.
pub fn job_from_event(event: Value) -> Result<Value> {
    match event {
        Value::Object(mut map) => match map.remove("body") {
            Some(Value::String(text)) => serde_json::from_str(&text)
                .map_err(|e| GeoclipError::input(format!("event body is not valid JSON: {}", e))),
            Some(body @ Value::Object(_)) => Ok(body),
            Some(other) => {
                map.insert("body".to_string(), other);
                Ok(Value::Object(map))
            }
            None => Ok(Value::Object(map)),
        },
        other => Ok(other),
    }
}

/// Response returned for every job, successful or not
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    pub headers: BTreeMap<String, String>,

    /// JSON document serialized as a string
    pub body: String,
}

impl Response {
    pub fn ok(result: &JobResult) -> Result<Self> {
        Ok(Self { status_code: 200, headers: json_headers(), body: serde_json::to_string(result)? })
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        let body = serde_json::json!({ "error": message.to_string() });
        Self { status_code: 500, headers: json_headers(), body: body.to_string() }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

fn json_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
}
