//! Knowledge-base payload types.
//!
//! Mirrors the JSON returned by the Wikibase `wbsearchentities` and
//! `wbgetentities` actions. Keyed sections (labels, claims, ...) keep their
//! payload order so that crawls are reproducible.

use serde::{Deserialize, Serialize};

use topic_types::{EntityId, RelationKey};

use crate::entity_id_from_uri;

/// One ranked result of a label search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Entity identifier
    #[serde(default)]
    pub id: Option<EntityId>,
    /// Concept URI of the entity
    #[serde(default)]
    pub concepturi: Option<String>,
    /// Matched label
    #[serde(default)]
    pub label: Option<String>,
    /// Entity description
    #[serde(default)]
    pub description: Option<String>,
}

impl SearchHit {
    /// Hit for a known identifier.
    pub fn for_id(id: impl Into<EntityId>) -> Self {
        let id = id.into();
        Self {
            concepturi: Some(crate::entity_uri(&id)),
            id: Some(id),
            label: None,
            description: None,
        }
    }

    /// Identifier of the hit, falling back to the tail of the concept URI.
    pub fn entity_id(&self) -> Option<EntityId> {
        self.id
            .clone()
            .or_else(|| self.concepturi.as_deref().and_then(entity_id_from_uri))
    }
}

/// Error object embedded in a 200 response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub search: Vec<SearchHit>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntitiesResponse {
    #[serde(default, with = "ordered_map")]
    pub entities: Vec<(String, EntityDetail)>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// A language-tagged string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangValue {
    pub language: String,
    pub value: String,
}

impl LangValue {
    pub fn new(language: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            value: value.into(),
        }
    }
}

/// Kind of a claim's main snak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnakType {
    /// Concrete value
    Value,
    /// Explicitly no value
    NoValue,
    /// Unknown value
    SomeValue,
    #[serde(other)]
    Other,
}

/// Typed value carried by a snak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: serde_json::Value,
}

/// Main assertion of a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snak {
    pub snaktype: SnakType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<RelationKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datavalue: Option<DataValue>,
}

/// One statement about an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub mainsnak: Snak,
}

impl Claim {
    /// Claim pointing at another entity.
    pub fn item(property: impl Into<RelationKey>, target: impl Into<EntityId>) -> Self {
        let target = target.into();
        Self {
            mainsnak: Snak {
                snaktype: SnakType::Value,
                property: Some(property.into()),
                datavalue: Some(DataValue {
                    kind: "wikibase-entityid".to_string(),
                    value: serde_json::json!({ "entity-type": "item", "id": target }),
                }),
            },
        }
    }

    /// Claim without a concrete value.
    pub fn without_value(property: impl Into<RelationKey>, snaktype: SnakType) -> Self {
        Self {
            mainsnak: Snak {
                snaktype,
                property: Some(property.into()),
                datavalue: None,
            },
        }
    }

    /// Entity targeted by this claim.
    ///
    /// `None` for `novalue`/`somevalue` snaks and for literal values
    /// (strings, quantities, dates).
    pub fn target_id(&self) -> Option<EntityId> {
        if self.mainsnak.snaktype != SnakType::Value {
            return None;
        }
        let value = &self.mainsnak.datavalue.as_ref()?.value;
        if let Some(id) = value.get("id").and_then(|v| v.as_str()) {
            return Some(id.to_string());
        }
        // Older payloads only carry the numeric id
        let numeric = value.get("numeric-id").and_then(|v| v.as_u64())?;
        match value.get("entity-type").and_then(|v| v.as_str()) {
            Some("property") => Some(format!("P{numeric}")),
            Some("item") | None => Some(format!("Q{numeric}")),
            Some(_) => None,
        }
    }
}

/// Detail payload of one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDetail {
    /// Entity identifier
    #[serde(default)]
    pub id: EntityId,
    /// Display labels by language
    #[serde(default, with = "ordered_map")]
    pub labels: Vec<(String, LangValue)>,
    /// Descriptions by language
    #[serde(default, with = "ordered_map")]
    pub descriptions: Vec<(String, LangValue)>,
    /// Aliases by language
    #[serde(default, with = "ordered_map")]
    pub aliases: Vec<(String, Vec<LangValue>)>,
    /// Claims keyed by relation predicate, in payload order
    #[serde(default, with = "ordered_map")]
    pub claims: Vec<(RelationKey, Vec<Claim>)>,
    /// Set when the knowledge base reports the id as missing
    #[serde(
        default,
        skip_serializing_if = "is_false",
        deserialize_with = "flag_present"
    )]
    pub missing: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn flag_present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::de::IgnoredAny::deserialize(deserializer)?;
    Ok(true)
}

fn lookup<'a, V>(entries: &'a [(String, V)], key: &str) -> Option<&'a V> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

impl EntityDetail {
    /// Empty detail for an identifier.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add a label.
    pub fn with_label(mut self, lang: &str, label: impl Into<String>) -> Self {
        self.labels
            .push((lang.to_string(), LangValue::new(lang, label)));
        self
    }

    /// Add a description.
    pub fn with_description(mut self, lang: &str, description: impl Into<String>) -> Self {
        self.descriptions
            .push((lang.to_string(), LangValue::new(lang, description)));
        self
    }

    /// Add an alias.
    pub fn with_alias(mut self, lang: &str, alias: impl Into<String>) -> Self {
        let value = LangValue::new(lang, alias);
        match self.aliases.iter_mut().find(|(k, _)| k == lang) {
            Some((_, values)) => values.push(value),
            None => self.aliases.push((lang.to_string(), vec![value])),
        }
        self
    }

    /// Append a claim under its predicate, keeping predicate order of first use.
    pub fn with_claim(mut self, property: &str, claim: Claim) -> Self {
        match self.claims.iter_mut().find(|(k, _)| k == property) {
            Some((_, claims)) => claims.push(claim),
            None => self.claims.push((property.to_string(), vec![claim])),
        }
        self
    }

    /// Append an entity-valued claim.
    pub fn with_relation(self, property: &str, target: impl Into<EntityId>) -> Self {
        self.with_claim(property, Claim::item(property, target))
    }

    /// Label in a language, empty if absent.
    pub fn label(&self, lang: &str) -> &str {
        lookup(&self.labels, lang)
            .map(|v| v.value.as_str())
            .unwrap_or("")
    }

    /// Description in a language, empty if absent.
    pub fn description(&self, lang: &str) -> &str {
        lookup(&self.descriptions, lang)
            .map(|v| v.value.as_str())
            .unwrap_or("")
    }

    /// Aliases in a language, empty if absent.
    pub fn aliases(&self, lang: &str) -> Vec<&str> {
        lookup(&self.aliases, lang)
            .map(|values| values.iter().map(|v| v.value.as_str()).collect())
            .unwrap_or_default()
    }

    /// Targets of the claims whose predicate is in `relations`.
    ///
    /// Order follows the payload: predicates in claim order, then values in
    /// list order. Value-less and literal claims are skipped.
    pub fn expansion_targets(&self, relations: &[RelationKey]) -> Vec<EntityId> {
        self.claims
            .iter()
            .filter(|(key, _)| relations.iter().any(|r| r == key))
            .flat_map(|(_, claims)| claims.iter().filter_map(Claim::target_id))
            .collect()
    }
}

/// Serde adapter for JSON objects decoded as ordered `(key, value)` lists.
///
/// Wikibase encodes empty keyed sections as `[]`, which is accepted as empty.
pub(crate) mod ordered_map {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, V>(entries: &Vec<(String, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }

    struct OrderedMapVisitor<V>(PhantomData<V>);

    impl<'de, V> Visitor<'de> for OrderedMapVisitor<V>
    where
        V: Deserialize<'de>,
    {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a JSON object or an empty list")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            if seq.next_element::<de::IgnoredAny>()?.is_some() {
                return Err(de::Error::invalid_length(1, &self));
            }
            Ok(Vec::new())
        }
    }
}
