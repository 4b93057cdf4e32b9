#![forbid(unsafe_code)]

use std::sync::Arc;

use gx_geom::GeometryLike;
use gx_types::{FeatureLike, Value, ValueType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeatureError {
    #[error("attribute count ({attributes}) does not match field count ({fields})")]
    AttributeCountMismatch { attributes: usize, fields: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    value_type: ValueType,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

/// An ordered field schema. Name lookup is case-insensitive; the first
/// declaration wins on duplicate names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fields {
    fields: Vec<Field>,
}

impl Fields {
    #[must_use]
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A single record: identity, positional attributes, and an optional
/// geometry handle. Carries its own schema so by-name attribute access
/// works without external context.
#[derive(Debug, Clone)]
pub struct Feature {
    id: i64,
    fields: Fields,
    attributes: Vec<Value>,
    geometry: Option<Arc<dyn GeometryLike>>,
    valid: bool,
}

impl Feature {
    pub fn new(id: i64, fields: Fields, attributes: Vec<Value>) -> Result<Self, FeatureError> {
        if attributes.len() != fields.len() {
            return Err(FeatureError::AttributeCountMismatch {
                attributes: attributes.len(),
                fields: fields.len(),
            });
        }
        Ok(Self {
            id,
            fields,
            attributes,
            geometry: None,
            valid: true,
        })
    }

    /// A placeholder feature: no fields, no attributes, not valid.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: 0,
            fields: Fields::default(),
            attributes: Vec::new(),
            geometry: None,
            valid: false,
        }
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: Arc<dyn GeometryLike>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[must_use]
    pub fn attributes(&self) -> &[Value] {
        &self.attributes
    }
}

impl FeatureLike for Feature {
    fn id(&self) -> i64 {
        self.id
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn attribute(&self, index: usize) -> Option<Value> {
        self.attributes.get(index).cloned()
    }

    fn attribute_by_name(&self, name: &str) -> Option<Value> {
        let index = self.fields.index_of(name)?;
        self.attributes.get(index).cloned()
    }

    fn geometry(&self) -> Option<Arc<dyn GeometryLike>> {
        self.geometry.clone()
    }
}

#[cfg(test)]
mod tests {
    use gx_types::{FeatureLike, Value, ValueType};

    use super::{Feature, FeatureError, Field, Fields};

    fn schema() -> Fields {
        Fields::new(vec![
            Field::new("name", ValueType::String),
            Field::new("Population", ValueType::Int),
        ])
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        let fields = schema();
        assert_eq!(fields.index_of("population"), Some(1));
        assert_eq!(fields.index_of("NAME"), Some(0));
        assert_eq!(fields.index_of("missing"), None);
    }

    #[test]
    fn attribute_access_by_index_and_name_agree() {
        let feature = Feature::new(
            7,
            schema(),
            vec![Value::from("Oslo"), Value::Int(700_000)],
        )
        .expect("feature");

        assert_eq!(feature.attribute(1), Some(Value::Int(700_000)));
        assert_eq!(
            feature.attribute_by_name("population"),
            Some(Value::Int(700_000))
        );
        assert_eq!(feature.attribute(5), None);
        assert!(feature.is_valid());
        assert_eq!(feature.id(), 7);
    }

    #[test]
    fn mismatched_attribute_count_is_rejected() {
        let err = Feature::new(1, schema(), vec![Value::Int(1)]).expect_err("must fail");
        assert_eq!(
            err,
            FeatureError::AttributeCountMismatch {
                attributes: 1,
                fields: 2
            }
        );
    }

    #[test]
    fn empty_feature_is_invalid() {
        assert!(!Feature::empty().is_valid());
    }
}
