//! YAML loading for manifests and instrumentation configuration
//!
//! Documents are parsed with yaml-rust2 and converted to `serde_json::Value`,
//! so every typed document goes through the same serde path whether the
//! input was written as YAML or JSON.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use yaml_rust2::{Yaml, YamlLoader};

/// A document that cannot be turned into a `serde_json::Value`
#[derive(Debug, Clone, Error)]
pub enum YamlError {
    /// The text is not valid YAML
    #[error("{0}")]
    Scan(String),
    /// A float scalar that does not parse as `f64`
    #[error("invalid number '{value}': {reason}")]
    Number {
        /// The scalar as written
        value: String,
        /// Parser message
        reason: String,
    },
    /// A YAML construct with no JSON counterpart
    #[error("unsupported YAML: {0}")]
    Unsupported(&'static str),
}

/// Parse the first document of a YAML string into a `serde_json::Value`.
///
/// Returns `Value::Null` for empty input. JSON is valid YAML, so JSON
/// manifests are accepted as well.
pub fn parse_yaml(input: &str) -> Result<Value, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError::Scan(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Parse a YAML document and deserialize it into `T`.
///
/// `kind` names the document in error messages (e.g. "Pod").
pub fn from_yaml_str<T: DeserializeOwned>(input: &str, kind: &str) -> crate::Result<T> {
    let value = parse_yaml(input)?;
    if value.is_null() {
        return Err(crate::Error::serialization_for(kind, "document is empty"));
    }
    serde_json::from_value(value).map_err(|e| crate::Error::serialization_for(kind, e.to_string()))
}

fn yaml_to_json(yaml: Yaml) -> Result<Value, YamlError> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => match s.parse::<f64>() {
            Ok(f) => Ok(Number::from_f64(f).map_or(Value::Null, Value::Number)),
            Err(e) => Err(YamlError::Number {
                value: s,
                reason: e.to_string(),
            }),
        },
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(items) => items
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| Ok((yaml_key(k)?, yaml_to_json(v)?)))
            .collect::<Result<Map<String, Value>, YamlError>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(YamlError::Unsupported("aliases")),
        Yaml::BadValue => Err(YamlError::Unsupported("bad value")),
    }
}

// Kubernetes manifests only use string keys, but `1: x` style keys are
// accepted and stringified.
fn yaml_key(key: Yaml) -> Result<String, YamlError> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(r) => Ok(r),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(YamlError::Unsupported("non-scalar mapping key")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_parse_pod_manifest() {
        let yaml = r#"
apiVersion: v1
kind: Pod
metadata:
  name: checkout
spec:
  containers:
    - name: app
      image: checkout:1.2.0
      env:
        - name: DOTNET_STARTUP_HOOKS
          value: /app/hooks.dll
"#;
        let result = parse_yaml(yaml).unwrap();
        assert_eq!(result["kind"], "Pod");
        assert_eq!(result["spec"]["containers"][0]["name"], "app");
        assert_eq!(
            result["spec"]["containers"][0]["env"][0]["value"],
            "/app/hooks.dll"
        );
    }

    #[test]
    fn test_parse_json_input() {
        let result = parse_yaml(r#"{"runtimes": {"dotnet": {"image": "img:1"}}}"#).unwrap();
        assert_eq!(result["runtimes"]["dotnet"]["image"], "img:1");
    }

    #[test]
    fn test_parse_scalars() {
        let result = parse_yaml("enabled: true\nreplicas: 3\nratio: 0.5\nnothing: null").unwrap();
        assert_eq!(result["enabled"], true);
        assert_eq!(result["replicas"], 3);
        assert!((result["ratio"].as_f64().unwrap() - 0.5).abs() < f64::EPSILON);
        assert!(result["nothing"].is_null());
    }

    #[test]
    fn test_env_value_with_colons_stays_a_string() {
        let result = parse_yaml("value: \"/a:/b\"").unwrap();
        assert_eq!(result["value"], "/a:/b");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_yaml("").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_yaml("not: valid: yaml: {{"),
            Err(YamlError::Scan(_))
        ));
    }

    #[test]
    fn test_sequence_key_is_rejected() {
        let err = parse_yaml("? [a, b]\n: value").unwrap_err();
        assert!(matches!(err, YamlError::Unsupported(_)));
        assert!(err.to_string().contains("mapping key"));
    }

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Spec {
        image: String,
        payload_source_path: Option<String>,
    }

    #[test]
    fn test_from_yaml_str_typed() {
        let spec: Spec = from_yaml_str("image: img:1\npayloadSourcePath: /auto", "Spec").unwrap();
        assert_eq!(
            spec,
            Spec {
                image: "img:1".to_string(),
                payload_source_path: Some("/auto".to_string()),
            }
        );
    }

    #[test]
    fn test_from_yaml_str_empty_document() {
        let err = from_yaml_str::<Spec>("", "Spec").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_from_yaml_str_wrong_shape() {
        let err = from_yaml_str::<Spec>("payloadSourcePath: /auto", "Spec").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Serialization { kind: Some(ref k), .. } if k == "Spec"
        ));
    }
}
