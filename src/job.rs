//! Job descriptor recovered from the decoded payload.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::codec::Base64;
use crate::error::LaunchError;
use crate::spec::Spec;

/// Launch descriptor recovered from the decoded payload.
///
/// Owned exclusively by the launcher for the duration of one launch.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Program to execute; a bare name is resolved against `PATH`.
    pub executable: String,
    /// Arguments passed to the program, in order.
    pub args: Vec<String>,
    /// Environment overrides; they win over inherited variables.
    pub env: HashMap<String, String>,
    /// Directory to launch from; `None` launches from the current one.
    pub work_dir: Option<PathBuf>,
}

impl Job {
    /// Decode the spec payload and map the resulting document into a job.
    ///
    /// Chunk texts are concatenated in declaration order and decoded as one
    /// stream, so a payload split at arbitrary points round-trips.
    pub fn from_spec(spec: &Spec, codec: &Base64) -> Result<Self, LaunchError> {
        let encoded = spec.chunks.concat();
        let payload = codec.decode(&encoded)?;
        tracing::debug!(bytes = payload.len(), "decoded job payload");
        let document: Value = serde_json::from_slice(&payload)?;
        Self::from_value(&document)
    }

    /// Map a decoded document tree into a job.
    ///
    /// `executable`, `args`, and `env` must be present with the expected
    /// shapes; `work_dir` is optional.
    pub fn from_value(document: &Value) -> Result<Self, LaunchError> {
        Ok(Self {
            executable: string_field(document, "executable")?,
            args: string_list_field(document, "args")?,
            env: string_map_field(document, "env")?,
            work_dir: path_field(document, "work_dir"),
        })
    }
}

fn string_field(document: &Value, field: &'static str) -> Result<String, LaunchError> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(LaunchError::Schema { field })
}

fn string_list_field(document: &Value, field: &'static str) -> Result<Vec<String>, LaunchError> {
    document
        .get(field)
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or(LaunchError::Schema { field })
}

fn string_map_field(
    document: &Value,
    field: &'static str,
) -> Result<HashMap<String, String>, LaunchError> {
    document
        .get(field)
        .and_then(Value::as_object)
        .and_then(|object| {
            object
                .iter()
                .map(|(key, value)| value.as_str().map(|value| (key.clone(), value.to_owned())))
                .collect::<Option<HashMap<_, _>>>()
        })
        .ok_or(LaunchError::Schema { field })
}

/// A present string becomes the path; a present non-string value or an
/// absent key both mean no working directory was requested.
fn path_field(document: &Value, field: &str) -> Option<PathBuf> {
    document.get(field).and_then(Value::as_str).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "executable": "/bin/echo",
            "args": ["-n", "hello"],
            "env": {"GREETING": "hello"},
            "work_dir": "/tmp",
        })
    }

    #[test]
    fn maps_all_fields() {
        let job = Job::from_value(&document()).unwrap();
        assert_eq!(job.executable, "/bin/echo");
        assert_eq!(job.args, ["-n", "hello"]);
        assert_eq!(job.env["GREETING"], "hello");
        assert_eq!(job.work_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn work_dir_is_optional() {
        let mut document = document();
        document.as_object_mut().unwrap().remove("work_dir");
        assert_eq!(Job::from_value(&document).unwrap().work_dir, None);
    }

    #[test]
    fn non_string_work_dir_is_ignored() {
        let mut document = document();
        document["work_dir"] = json!(42);
        assert_eq!(Job::from_value(&document).unwrap().work_dir, None);
    }

    #[test]
    fn missing_executable_fails() {
        let mut document = document();
        document.as_object_mut().unwrap().remove("executable");
        let err = Job::from_value(&document).unwrap_err();
        assert!(matches!(err, LaunchError::Schema { field: "executable" }));
    }

    #[test]
    fn non_string_argument_fails() {
        let mut document = document();
        document["args"] = json!(["ok", 3]);
        let err = Job::from_value(&document).unwrap_err();
        assert!(matches!(err, LaunchError::Schema { field: "args" }));
    }

    #[test]
    fn non_string_env_value_fails() {
        let mut document = document();
        document["env"] = json!({"PORT": 8080});
        let err = Job::from_value(&document).unwrap_err();
        assert!(matches!(err, LaunchError::Schema { field: "env" }));
    }

    #[test]
    fn assembles_from_chunked_spec() {
        let codec = Base64::new();
        let encoded = codec.encode(document().to_string().as_bytes());
        let (head, tail) = encoded.split_at(encoded.len() / 2);
        let spec = Spec {
            version: 1,
            num_chunks: 2,
            chunks: vec![head.to_owned(), tail.to_owned()],
            sha256sum: String::new(),
        };
        let job = Job::from_spec(&spec, &codec).unwrap();
        assert_eq!(job.executable, "/bin/echo");
        assert_eq!(job.work_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn garbage_payload_fails_with_codec_error() {
        let spec = Spec {
            version: 0,
            num_chunks: 1,
            chunks: vec!["?!".to_owned()],
            sha256sum: String::new(),
        };
        let err = Job::from_spec(&spec, &Base64::new()).unwrap_err();
        assert!(matches!(err, LaunchError::Codec(_)));
    }

    #[test]
    fn non_document_payload_fails() {
        let codec = Base64::new();
        let spec = Spec {
            version: 0,
            num_chunks: 1,
            chunks: vec![codec.encode(b"not a document")],
            sha256sum: String::new(),
        };
        let err = Job::from_spec(&spec, &codec).unwrap_err();
        assert!(matches!(err, LaunchError::Document(_)));
    }
}
