use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const RESULT_MODE_MERGE: &str = "merge";
pub const SOURCE_SCOPE_ALL: &str = "all";

/// Body of `POST /api/search`, forwarded unchanged to the search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub kw: String,
    #[serde(default = "default_res")]
    pub res: String,
    #[serde(default = "default_src")]
    pub src: String,
    /// `None` means "every provider" and is left out of the JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_types: Option<Vec<String>>,
}

fn default_res() -> String {
    RESULT_MODE_MERGE.to_string()
}

fn default_src() -> String {
    SOURCE_SCOPE_ALL.to_string()
}

impl SearchQuery {
    pub fn new(kw: impl Into<String>) -> Self {
        Self {
            kw: kw.into(),
            res: default_res(),
            src: default_src(),
            cloud_types: None,
        }
    }

    pub fn with_cloud_types(mut self, cloud_types: Option<Vec<String>>) -> Self {
        self.cloud_types = cloud_types;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub note: String,
    pub url: String,
    #[serde(
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,
    #[serde(default)]
    pub datetime: String,
}

fn non_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value: Option<String> = Option::deserialize(d)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// One provider's slice of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderGroup {
    pub provider: String,
    pub items: Vec<SearchResultItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    #[serde(default)]
    pub total: u64,
    /// Groups in the key order the engine sent them.
    #[serde(with = "ordered_groups")]
    pub merged_by_type: Vec<ProviderGroup>,
}

impl SearchResultSet {
    pub fn group(&self, provider: &str) -> Option<&ProviderGroup> {
        self.merged_by_type.iter().find(|g| g.provider == provider)
    }

    pub fn is_empty(&self) -> bool {
        self.merged_by_type.is_empty()
    }
}

mod ordered_groups {
    use super::*;

    pub fn serialize<S: Serializer>(groups: &[ProviderGroup], s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(groups.len()))?;
        for group in groups {
            map.serialize_entry(&group.provider, &group.items)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ProviderGroup>, D::Error> {
        d.deserialize_any(GroupsVisitor)
    }

    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
        type Value = Vec<ProviderGroup>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of provider id to result items")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((provider, items)) = access.next_entry::<String, Vec<SearchResultItem>>()? {
                groups.push(ProviderGroup { provider, items });
            }
            Ok(groups)
        }

        // `null` is treated as "no groups".
        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }
}

/// The engine answers either `{data: {...}}` or the bare result set.
/// The wrapped shape is tried first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SearchEnvelope {
    Wrapped { data: SearchResultSet },
    Bare(SearchResultSet),
}

impl SearchEnvelope {
    pub fn decode(body: serde_json::Value) -> Result<SearchResultSet, serde_json::Error> {
        let envelope: SearchEnvelope = serde_json::from_value(body)?;
        Ok(envelope.into_result_set())
    }

    pub fn into_result_set(self) -> SearchResultSet {
        match self {
            SearchEnvelope::Wrapped { data } => data,
            SearchEnvelope::Bare(set) => set,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Body of the engine's health endpoint. Only the fields the UI reads are typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub plugin_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_omits_cloud_types_when_unfiltered() {
        let body = serde_json::to_value(SearchQuery::new("inception")).unwrap();
        assert_eq!(body, json!({"kw": "inception", "res": "merge", "src": "all"}));

        let filtered = SearchQuery::new("x").with_cloud_types(Some(vec!["baidu".into()]));
        let body = serde_json::to_value(filtered).unwrap();
        assert_eq!(body["cloud_types"], json!(["baidu"]));
    }

    #[test]
    fn wrapped_shape_is_preferred() {
        let body = json!({
            "data": {
                "total": 1,
                "merged_by_type": {"baidu": [{"note": "A", "url": "http://x", "datetime": "2024-01-01"}]}
            },
            "total": 99,
            "merged_by_type": {}
        });
        let set = SearchEnvelope::decode(body).unwrap();
        assert_eq!(set.total, 1);
        assert_eq!(set.merged_by_type[0].provider, "baidu");
    }

    #[test]
    fn bare_shape_is_accepted() {
        let body = json!({"total": 0, "merged_by_type": {}});
        let set = SearchEnvelope::decode(body).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn null_data_falls_back_to_bare() {
        let body = json!({"data": null, "total": 3, "merged_by_type": null});
        let set = SearchEnvelope::decode(body).unwrap();
        assert_eq!(set.total, 3);
        assert!(set.is_empty());
    }

    #[test]
    fn unrelated_body_is_a_decode_error() {
        assert!(SearchEnvelope::decode(json!({"code": 0, "message": "ok"})).is_err());
        assert!(SearchEnvelope::decode(json!("text")).is_err());
    }

    #[test]
    fn group_order_follows_response() {
        let raw = r#"{"total":3,"merged_by_type":{"quark":[],"baidu":[],"weiyun":[]}}"#;
        let set: SearchResultSet = serde_json::from_str(raw).unwrap();
        let keys: Vec<_> = set.merged_by_type.iter().map(|g| g.provider.as_str()).collect();
        assert_eq!(keys, ["quark", "baidu", "weiyun"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), raw);
    }

    #[test]
    fn empty_password_is_none() {
        let item: SearchResultItem = serde_json::from_value(json!({
            "note": "n", "url": "u", "password": "", "datetime": "", "source": "tg"
        }))
        .unwrap();
        assert_eq!(item.password, None);
    }
}
