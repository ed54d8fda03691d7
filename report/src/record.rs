use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};

/// An explicit `null` decodes like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One telemetry report. Built fresh each cycle, sent once, then dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Version of the binary (and therefore schema) that produced the record.
    #[serde(default, rename = "version", alias = "schemaVersion", deserialize_with = "null_as_default")]
    pub schema_version: String,

    /// UNIX seconds, as a string. The collector overwrites whatever the
    /// sender put here with its own receipt time.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,

    /// Stable for the lifetime of the cluster. Must not carry PII.
    #[serde(default, rename = "clusterID", deserialize_with = "null_as_default")]
    pub cluster_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_version: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: Vec<Extension>,
}

impl Record {
    /// Set `timestamp` to the current UNIX time, replacing any previous value.
    pub fn stamp_now(&mut self) {
        self.timestamp = chrono::Utc::now().timestamp().to_string();
    }
}

/// Non-identifying inventory of a single cluster member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Hash of the node's identifying fields, never the raw name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(default, rename = "osImage", skip_serializing_if = "Option::is_none")]
    pub os_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_runtime_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelet_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,
    /// Sorted by resource name.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub capacity: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub resource: String,
    /// The quantity exactly as the source reported it.
    pub value: String,
}

impl Resource {
    pub fn new(resource: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub value: String,
}

impl Extension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_record() -> Record {
        Record {
            schema_version: "v1.2.3".to_string(),
            timestamp: "1700000000".to_string(),
            cluster_id: "9b3c0c6e-cluster".to_string(),
            master_version: Some("v1.30.2".to_string()),
            nodes: vec![Node {
                id: "5ba93c9db0cff93f52b521d7420e43f6eda2784f".to_string(),
                operating_system: Some("linux".to_string()),
                architecture: Some("amd64".to_string()),
                capacity: vec![Resource::new("cpu", "4"), Resource::new("memory", "16Gi")],
                ..Default::default()
            }],
            extensions: vec![Extension::new("flavor", "vanilla")],
        }
    }

    #[test]
    fn minimal_body_decodes() {
        let record: Record = serde_json::from_str("{}").unwrap();
        assert_eq!(record, Record::default());
        assert!(record.extensions.is_empty());
    }

    #[test]
    fn uses_wire_field_names() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["version"], "v1.2.3");
        assert_eq!(json["clusterID"], "9b3c0c6e-cluster");
        assert_eq!(json["masterVersion"], "v1.30.2");
        assert_eq!(json["nodes"][0]["operatingSystem"], "linux");
        assert_eq!(json["nodes"][0]["capacity"][1]["resource"], "memory");
        assert_eq!(json["extensions"][0]["name"], "flavor");
    }

    #[test]
    fn absent_fields_are_omitted_not_empty() {
        let record = Record {
            nodes: vec![Node {
                id: "abc".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(record).unwrap();
        assert!(json.get("masterVersion").is_none());
        assert!(json["nodes"][0].get("kernelVersion").is_none());
        assert!(json["nodes"][0].get("capacity").is_none());
        assert_eq!(json["extensions"], serde_json::json!([]));
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let record = sample_record();
        let encoded = serde_json::to_vec(&record).unwrap();
        let decoded: Record = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let record: Record = serde_json::from_str(
            r#"{"version":null,"timestamp":null,"clusterID":null,"nodes":[{"id":null,"capacity":null}],"extensions":null}"#,
        )
        .unwrap();
        assert_eq!(
            record,
            Record {
                nodes: vec![Node::default()],
                ..Default::default()
            }
        );

        let record: Record = serde_json::from_str(r#"{"clusterID":"c","nodes":null}"#).unwrap();
        assert_eq!(record.cluster_id, "c");
        assert!(record.nodes.is_empty());
    }

    #[test]
    fn accepts_schema_version_alias() {
        let record: Record = serde_json::from_str(r#"{"schemaVersion":"v9"}"#).unwrap();
        assert_eq!(record.schema_version, "v9");
    }

    #[test]
    fn stamp_now_overwrites_client_value() {
        let mut record = sample_record();
        record.stamp_now();
        assert_ne!(record.timestamp, "1700000000");
        let secs: i64 = record.timestamp.parse().unwrap();
        assert!(secs > 1_700_000_000);
    }
}
