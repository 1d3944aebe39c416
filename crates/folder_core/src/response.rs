//! Command responses

use crate::FolderError;
use serde_json::{json, Map, Value};

/// Payload produced by one request
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// JSON object; decorated with the current folder on the way out
    Json(Map<String, Value>),
    /// Raw file content, never decorated
    Binary(Vec<u8>),
}

impl Response {
    pub fn empty() -> Self {
        Response::Json(Map::new())
    }

    /// Wrap a JSON value; non-object values land under `data`
    pub fn json(value: Value) -> Self {
        match value {
            Value::Object(map) => Response::Json(map),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                Response::Json(map)
            }
        }
    }

    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            Response::Json(map) => Some(map),
            Response::Binary(_) => None,
        }
    }

    pub fn as_json_mut(&mut self) -> Option<&mut Map<String, Value>> {
        match self {
            Response::Json(map) => Some(map),
            Response::Binary(_) => None,
        }
    }
}

impl From<&FolderError> for Response {
    fn from(err: &FolderError) -> Self {
        err.to_response()
    }
}

impl FolderError {
    /// `{ "error": { "number": code, "message": text } }`
    pub fn to_response(&self) -> Response {
        Response::json(json!({
            "error": {
                "number": self.code(),
                "message": self.to_string(),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload() {
        let response = FolderError::FolderNotFound("/missing".into()).to_response();
        let map = response.as_json().unwrap();
        assert_eq!(map["error"]["number"], 116);
        assert_eq!(map["error"]["message"], "Folder not found: /missing");
    }

    #[test]
    fn test_json_wrapping() {
        assert_eq!(Response::json(json!([1, 2])).as_json().unwrap()["data"], json!([1, 2]));
        assert!(Response::Binary(vec![1]).as_json().is_none());
        assert!(Response::empty().as_json().unwrap().is_empty());
    }
}
