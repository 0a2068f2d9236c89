//! Daemon protocol — request/response types and line framing.
//!
//! One JSON object per line in each direction, one exchange per connection.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClientError, Result, CLOSED_EMPTY, INCOMPLETE, INVALID_JSON};

/// Request from a caller to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum Query {
    /// Check if daemon is alive
    Ping,

    /// Pattern search across the project
    Search { pattern: String, max_results: usize },

    /// Callers of a function
    Impact { func: String },

    /// Structured extraction of one file
    Extract { file: String },

    /// Daemon status report
    Status,

    /// Unreachable code, relative to the given entry points
    Dead {
        entry_points: Vec<String>,
        language: String,
    },

    /// Architecture layers
    Arch { language: String },

    /// Control-flow graph of one function
    Cfg {
        file: String,
        function: String,
        language: String,
    },

    /// Data-flow graph of one function
    Dfg {
        file: String,
        function: String,
        language: String,
    },

    /// Program slice from a line
    Slice {
        file: String,
        function: String,
        line: u32,
        direction: SliceDirection,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable: Option<String>,
    },

    /// Project call graph
    Calls { language: String },

    /// Pre-build the call graph cache
    Warm { language: String },

    /// Semantic index operations, discriminated by `action`
    Semantic(SemanticAction),

    /// File tree
    Tree {
        extensions: Vec<String>,
        exclude_hidden: bool,
    },

    /// Code structure (functions, classes) per file
    Structure { language: String, max_results: usize },

    /// Call context around an entry point
    Context {
        entry: String,
        language: String,
        depth: usize,
    },

    /// Imports declared by one file
    Imports { file: String, language: String },

    /// Files importing a module
    Importers { module: String, language: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SemanticAction {
    Search { query: String, k: usize },
    Index { language: String },
}

impl Query {
    /// Command name as sent in the `cmd` field.
    pub fn name(&self) -> &'static str {
        match self {
            Query::Ping => "ping",
            Query::Search { .. } => "search",
            Query::Impact { .. } => "impact",
            Query::Extract { .. } => "extract",
            Query::Status => "status",
            Query::Dead { .. } => "dead",
            Query::Arch { .. } => "arch",
            Query::Cfg { .. } => "cfg",
            Query::Dfg { .. } => "dfg",
            Query::Slice { .. } => "slice",
            Query::Calls { .. } => "calls",
            Query::Warm { .. } => "warm",
            Query::Semantic(_) => "semantic",
            Query::Tree { .. } => "tree",
            Query::Structure { .. } => "structure",
            Query::Context { .. } => "context",
            Query::Imports { .. } => "imports",
            Query::Importers { .. } => "importers",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceDirection {
    #[default]
    Backward,
    Forward,
}

impl FromStr for SliceDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "backward" => Ok(SliceDirection::Backward),
            "forward" => Ok(SliceDirection::Forward),
            other => Err(format!("unknown slice direction '{}'", other)),
        }
    }
}

/// Response from the daemon, or the client's own verdict when no daemon
/// answer could be obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Successful response; the payload fields, minus `status`.
    Ok(Map<String, Value>),

    /// The daemon is still building its index.
    Indexing { message: String },

    /// No daemon to talk to.
    Unavailable { error: String },

    /// Timeout, protocol or transport failure, or a daemon-side error.
    Error { error: String },
}

impl Response {
    pub fn status(&self) -> &'static str {
        match self {
            Response::Ok(_) => "ok",
            Response::Indexing { .. } => "indexing",
            Response::Unavailable { .. } => "unavailable",
            Response::Error { .. } => "error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Unavailable { error } | Response::Error { error } => Some(error),
            Response::Indexing { message } => Some(message),
            Response::Ok(_) => None,
        }
    }

    /// A payload field of an `ok` response.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Response::Ok(map) => map.get(name),
            _ => None,
        }
    }

    /// The array stored under `name`, or an empty list when the response is
    /// not `ok`, the field is missing, or it is not an array.
    pub fn array_field(&self, name: &str) -> Vec<Value> {
        match self.field(name) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// The `result` envelope if present and non-null, else the whole response.
    pub fn result_or_whole(&self) -> Value {
        match self.field("result") {
            Some(value) if !value.is_null() => value.clone(),
            _ => self.to_value(),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self {
            Response::Ok(payload) => {
                if !payload.contains_key("status") {
                    map.insert("status".into(), Value::from("ok"));
                }
                map.extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Response::Indexing { message } => {
                map.insert("status".into(), Value::from("indexing"));
                map.insert("message".into(), Value::from(message.as_str()));
            }
            Response::Unavailable { error } | Response::Error { error } => {
                map.insert("status".into(), Value::from(self.status()));
                map.insert("error".into(), Value::from(error.as_str()));
            }
        }
        Value::Object(map)
    }

    /// Interpret one parsed JSON value from the daemon.
    ///
    /// Objects without a `status` (or with one outside the known set) are
    /// treated as `ok` payloads and kept verbatim.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ClientError::Protocol(format!(
                    "Unexpected response from daemon: {}",
                    other
                )))
            }
        };

        let text = |map: &Map<String, Value>, key: &str| {
            map.get(key).and_then(Value::as_str).map(str::to_string)
        };

        let status = map.get("status").and_then(Value::as_str).map(str::to_string);
        let response = match status.as_deref() {
            Some("ok") => {
                map.remove("status");
                Response::Ok(map)
            }
            Some("indexing") => Response::Indexing {
                message: text(&map, "message")
                    .or_else(|| text(&map, "error"))
                    .unwrap_or_else(|| crate::error::INDEXING.to_string()),
            },
            Some("unavailable") => Response::Unavailable {
                error: text(&map, "error").unwrap_or_else(|| "unavailable".to_string()),
            },
            Some("error") => Response::Error {
                error: text(&map, "error")
                    .or_else(|| text(&map, "message"))
                    .unwrap_or_else(|| "unknown daemon error".to_string()),
            },
            _ => Response::Ok(map),
        };
        Ok(response)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Response::from_value(value).map_err(de::Error::custom)
    }
}

// ─── Framing ───────────────────────────────────────────────────────

/// Serialize a query as one newline-terminated line.
pub fn encode_line(query: &Query) -> Result<Vec<u8>> {
    let mut bytes =
        serde_json::to_vec(query).map_err(|e| ClientError::Protocol(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode what was read from the transport.
///
/// `bytes` holds everything received, up to and including the first newline
/// if one arrived. Without a newline the connection closed early, and the
/// buffered data gets one lenient parse attempt.
pub fn decode_reply(bytes: &[u8]) -> Result<Response> {
    match bytes.iter().position(|b| *b == b'\n') {
        Some(end) => {
            let value: Value = serde_json::from_slice(&bytes[..end])
                .map_err(|_| ClientError::Protocol(INVALID_JSON.to_string()))?;
            Response::from_value(value)
        }
        None if bytes.is_empty() => {
            Err(ClientError::Protocol(CLOSED_EMPTY.to_string()))
        }
        None => {
            let value: Value = serde_json::from_slice(bytes)
                .map_err(|_| ClientError::Protocol(INCOMPLETE.to_string()))?;
            Response::from_value(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_shapes() {
        let q = Query::Search {
            pattern: "login".into(),
            max_results: 10,
        };
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"cmd": "search", "pattern": "login", "max_results": 10})
        );

        let q = Query::Semantic(SemanticAction::Search {
            query: "auth flow".into(),
            k: 5,
        });
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"cmd": "semantic", "action": "search", "query": "auth flow", "k": 5})
        );

        let q = Query::Ping;
        assert_eq!(serde_json::to_value(&q).unwrap(), json!({"cmd": "ping"}));
    }

    #[test]
    fn test_slice_omits_missing_variable() {
        let q = Query::Slice {
            file: "app.py".into(),
            function: "run".into(),
            line: 12,
            direction: SliceDirection::Forward,
            variable: None,
        };
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["direction"], "forward");
        assert!(value.get("variable").is_none());
    }

    #[test]
    fn test_semantic_round_trips_through_cmd_and_action() {
        let q = Query::Semantic(SemanticAction::Index {
            language: "python".into(),
        });
        let line = encode_line(&q).unwrap();
        assert_eq!(*line.last().unwrap(), b'\n');
        let back: Query = serde_json::from_slice(&line[..line.len() - 1]).unwrap();
        assert_eq!(back, q);
        assert_eq!(back.name(), "semantic");
    }

    #[test]
    fn test_response_variants_from_status() {
        let r = Response::from_value(json!({"status": "ok", "results": [1, 2]})).unwrap();
        assert_eq!(r.array_field("results"), vec![json!(1), json!(2)]);
        assert!(r.field("status").is_none());

        let r = Response::from_value(json!({"status": "error", "error": "boom"})).unwrap();
        assert_eq!(r, Response::Error { error: "boom".into() });

        let r = Response::from_value(json!({"status": "indexing"})).unwrap();
        assert_eq!(r.status(), "indexing");

        let r = Response::from_value(json!({"callers": []})).unwrap();
        assert!(r.is_ok());

        assert!(Response::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_array_field_defaults_to_empty() {
        let r = Response::from_value(json!({"status": "ok"})).unwrap();
        assert!(r.array_field("results").is_empty());

        let r = Response::from_value(json!({"status": "ok", "results": "nope"})).unwrap();
        assert!(r.array_field("results").is_empty());

        let r = Response::Unavailable { error: "gone".into() };
        assert!(r.array_field("results").is_empty());
    }

    #[test]
    fn test_result_or_whole() {
        let r = Response::from_value(json!({"status": "ok", "result": {"a": 1}})).unwrap();
        assert_eq!(r.result_or_whole(), json!({"a": 1}));

        let r = Response::from_value(json!({"status": "ok", "result": null})).unwrap();
        assert_eq!(r.result_or_whole(), json!({"status": "ok", "result": null}));

        let r = Response::Unavailable { error: "gone".into() };
        assert_eq!(
            r.result_or_whole(),
            json!({"status": "unavailable", "error": "gone"})
        );
    }

    #[test]
    fn test_response_serializes_in_wire_vocabulary() {
        let r = Response::Error { error: "timeout".into() };
        let line = serde_json::to_string(&r).unwrap();
        let back: Response = serde_json::from_str(&line).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_decode_reply_cases() {
        let r = decode_reply(b"{\"status\":\"ok\",\"message\":\"pong\"}\n").unwrap();
        assert_eq!(r.field("message"), Some(&json!("pong")));

        let err = decode_reply(b"not json\n").unwrap_err();
        assert_eq!(err.to_string(), INVALID_JSON);

        let err = decode_reply(b"").unwrap_err();
        assert_eq!(err.to_string(), CLOSED_EMPTY);

        // Buffered data that is only whitespace still counts as received.
        let err = decode_reply(b"  \r").unwrap_err();
        assert_eq!(err.to_string(), INCOMPLETE);

        let err = decode_reply(b"{\"status\":\"ok\",\"resu").unwrap_err();
        assert_eq!(err.to_string(), INCOMPLETE);

        // Closed before the newline, but the buffered bytes are a full object.
        let r = decode_reply(b"{\"status\":\"ok\"}").unwrap();
        assert!(r.is_ok());
    }
}
