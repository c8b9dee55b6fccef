//! Typed JSON:API compound document decoding and one-hop relationship resolution.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocumentError, MissingRelationshipError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

/// Linkage carried by a relationship's `data` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    ToMany(Vec<ResourceIdentifier>),
    ToOne(Option<ResourceIdentifier>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Relationship {
    /// `None` when the relationship has no `data` member at all (links only).
    #[serde(default, deserialize_with = "present_linkage")]
    pub data: Option<RelationshipData>,
}

fn present_linkage<'de, D>(deserializer: D) -> Result<Option<RelationshipData>, D::Error>
where
    D: Deserializer<'de>,
{
    RelationshipData::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceObject {
    pub resource_type: String,
    pub id: String,
    pub attributes: Map<String, Value>,
    pub relationships: BTreeMap<String, Relationship>,
}

impl ResourceObject {
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier {
            resource_type: self.resource_type.clone(),
            id: self.id.clone(),
        }
    }
}

/// A validated success document: one primary resource plus its `included` set.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundDocument {
    pub data: ResourceObject,
    pub included: Vec<ResourceObject>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    data: Option<RawResource>,
    #[serde(default)]
    included: Option<Vec<RawResource>>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(rename = "type", default)]
    resource_type: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attributes: Option<Map<String, Value>>,
    #[serde(default)]
    relationships: Option<BTreeMap<String, Relationship>>,
}

impl RawResource {
    fn validate(self) -> Result<ResourceObject, DocumentError> {
        let resource_type = required(self.resource_type, "type")?;
        let id = required(self.id, "id")?;
        Ok(ResourceObject {
            resource_type,
            id,
            attributes: self.attributes.unwrap_or_default(),
            relationships: self.relationships.unwrap_or_default(),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, DocumentError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(DocumentError::MissingField { field })
}

impl CompoundDocument {
    /// Decode and validate a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, DocumentError> {
        let value = serde_json::from_slice::<Value>(body).map_err(DocumentError::NotJson)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let raw = serde_json::from_value::<RawDocument>(value).map_err(DocumentError::Shape)?;
        let data = raw.data.ok_or(DocumentError::MissingData)?.validate()?;

        let included = raw
            .included
            .unwrap_or_default()
            .into_iter()
            .map(RawResource::validate)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::with_capacity(included.len());
        for resource in &included {
            if !seen.insert((resource.resource_type.as_str(), resource.id.as_str())) {
                return Err(DocumentError::DuplicateIncluded {
                    resource_type: resource.resource_type.clone(),
                    id: resource.id.clone(),
                });
            }
        }

        Ok(Self { data, included })
    }

    /// Fail unless the primary resource has the given type.
    pub fn expect_type(&self, expected: &'static str) -> Result<(), DocumentError> {
        if self.data.resource_type == expected {
            Ok(())
        } else {
            Err(DocumentError::UnexpectedType {
                expected,
                found: self.data.resource_type.clone(),
            })
        }
    }
}

/// Primary resource with its relationships replaced by resolved records.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub resource_type: String,
    pub id: String,
    /// Primary attributes plus one field per resolved relationship.
    pub fields: Map<String, Value>,
}

impl ResolvedEntity {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Deserialize a resolved relationship into a typed record.
    ///
    /// Returns `Ok(None)` when the relationship is absent or an empty to-one.
    pub fn relationship<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, DocumentError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(DocumentError::Record),
        }
    }

    /// Deserialize the whole entity (fields plus `id`) into a typed record.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, DocumentError> {
        let mut object = self.fields;
        object.insert("id".to_owned(), Value::String(self.id));
        serde_json::from_value(Value::Object(object)).map_err(DocumentError::Record)
    }
}

/// Resolve the primary resource of `document` against its `included` set.
///
/// Each relationship becomes a field named after it holding the referenced
/// resource's attributes and `id`: an object (or `null`) for to-one, an array
/// in reference order for to-many. Relationships of included resources are not
/// followed. A relationship field replaces an attribute of the same name.
pub fn resolve(document: &CompoundDocument) -> Result<ResolvedEntity, MissingRelationshipError> {
    let index = document
        .included
        .iter()
        .map(|resource| ((resource.resource_type.as_str(), resource.id.as_str()), resource))
        .collect::<HashMap<_, _>>();

    let lookup = |relationship: &str, identifier: &ResourceIdentifier| {
        index
            .get(&(identifier.resource_type.as_str(), identifier.id.as_str()))
            .map(|resource| flatten(resource))
            .ok_or_else(|| MissingRelationshipError {
                relationship: relationship.to_owned(),
                resource_type: identifier.resource_type.clone(),
                id: identifier.id.clone(),
            })
    };

    let mut fields = document.data.attributes.clone();
    for (name, relationship) in &document.data.relationships {
        let value = match &relationship.data {
            None => continue,
            Some(RelationshipData::ToOne(None)) => Value::Null,
            Some(RelationshipData::ToOne(Some(identifier))) => lookup(name.as_str(), identifier)?,
            Some(RelationshipData::ToMany(identifiers)) => Value::Array(
                identifiers
                    .iter()
                    .map(|identifier| lookup(name.as_str(), identifier))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        fields.insert(name.clone(), value);
    }

    Ok(ResolvedEntity {
        resource_type: document.data.resource_type.clone(),
        id: document.data.id.clone(),
        fields,
    })
}

fn flatten(resource: &ResourceObject) -> Value {
    let mut object = Map::with_capacity(resource.attributes.len() + 1);
    object.insert("id".to_owned(), Value::String(resource.id.clone()));
    object.extend(resource.attributes.clone());
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{resolve, CompoundDocument, RelationshipData};
    use crate::error::DocumentError;

    #[test]
    fn null_to_one_resolves_to_null() {
        let document = CompoundDocument::from_value(json!({
            "data": {
                "type": "session",
                "id": "TOKEN",
                "relationships": { "user": { "data": null } }
            }
        }))
        .expect("document");

        assert_eq!(
            document.data.relationships["user"].data,
            Some(RelationshipData::ToOne(None))
        );
        let resolved = resolve(&document).expect("resolve");
        assert_eq!(resolved.field("user"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn links_only_relationship_is_skipped() {
        let document = CompoundDocument::from_value(json!({
            "data": {
                "type": "session",
                "id": "TOKEN",
                "relationships": { "user": { "links": { "related": "/users/1" } } }
            }
        }))
        .expect("document");

        let resolved = resolve(&document).expect("resolve");
        assert!(resolved.field("user").is_none());
    }

    #[test]
    fn null_included_reads_as_empty() {
        let document = CompoundDocument::from_value(json!({
            "data": { "type": "session", "id": "TOKEN" },
            "included": null
        }))
        .expect("null included");

        assert!(document.included.is_empty());
    }

    #[test]
    fn blank_primary_id_is_rejected() {
        let error = CompoundDocument::from_value(json!({"data": {"type": "session", "id": " "}}))
            .expect_err("blank id");
        assert!(matches!(error, DocumentError::MissingField { field: "id" }));
    }

    #[test]
    fn error_shaped_body_is_not_a_compound_document() {
        let error = CompoundDocument::from_slice(br#"{"data":[{"id":"FOO_ERROR"}]}"#)
            .expect_err("array data");
        assert!(matches!(error, DocumentError::Shape(_)));
    }
}
