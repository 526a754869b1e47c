//! Entities: ordered field records bound to a model.

use crate::error::Error;
use crate::result::QueryResult;
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;
use tether_model::ModelDescriptor;

/// The value held by one entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A plain column value.
    Scalar(Value),
    /// A one-level relation result, set by populate.
    Populated(QueryResult),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            FieldValue::Populated(_) => None,
        }
    }

    pub fn as_populated(&self) -> Option<&QueryResult> {
        match self {
            FieldValue::Scalar(_) => None,
            FieldValue::Populated(r) => Some(r),
        }
    }
}

/// A record shaped like a model: the declared fields in declaration
/// order, plus the store-assigned `id`.
///
/// Entities come in two flavors: *bound* ([`Entity::of`]), carrying the
/// model descriptor that shaped them, and *detached*
/// ([`Entity::detached`]), free-form records with no model binding that
/// model-scoped operations refuse.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    model: Option<Arc<ModelDescriptor>>,
    id: Option<i64>,
    fields: IndexMap<String, FieldValue>,
}

impl Entity {
    /// A fresh entity shaped by `model`: every declared field present and
    /// Null, no id.
    pub fn of(model: &Arc<ModelDescriptor>) -> Self {
        let fields = model
            .field_names()
            .map(|name| (name.to_string(), FieldValue::Scalar(Value::Null)))
            .collect();

        Entity {
            model: Some(model.clone()),
            id: None,
            fields,
        }
    }

    /// A free-form record with no model binding.
    pub fn detached() -> Self {
        Entity {
            model: None,
            id: None,
            fields: IndexMap::new(),
        }
    }

    /// The model that shaped this entity, if any.
    pub fn model(&self) -> Option<&Arc<ModelDescriptor>> {
        self.model.as_ref()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    /// Set a field to a scalar value.
    ///
    /// On a bound entity the field must be declared; a detached entity
    /// accepts any name.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), Error> {
        match &self.model {
            Some(model) if !model.declares(field) => Err(Error::UnknownField {
                model: model.name().to_string(),
                field: field.to_string(),
            }),
            _ => {
                self.fields
                    .insert(field.to_string(), FieldValue::Scalar(value.into()));
                Ok(())
            }
        }
    }

    pub(crate) fn assign(&mut self, field: &str, value: FieldValue) {
        self.fields.insert(field.to_string(), value);
    }

    pub(crate) fn resolve(&mut self, field: &str, relation: QueryResult) {
        if let Some(slot) = self.fields.get_mut(field) {
            *slot = FieldValue::Populated(relation);
        }
    }

    /// The value of `field`, if present.
    pub fn field(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Scalar shortcut for [`Entity::field`].
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.field(field).and_then(FieldValue::as_scalar)
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_model::FieldDescriptor;

    fn model() -> Arc<ModelDescriptor> {
        Arc::new(
            ModelDescriptor::new("User", "user")
                .field(FieldDescriptor::new("name", "varchar").unwrap().length(50))
                .unwrap()
                .field(FieldDescriptor::new("age", "int").unwrap().nullable())
                .unwrap(),
        )
    }

    #[test]
    fn bound_entity_is_shaped_by_model() {
        let entity = Entity::of(&model());
        let names: Vec<&str> = entity.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "age"]);
        assert_eq!(entity.value("name"), Some(&Value::Null));
        assert_eq!(entity.id(), None);
    }

    #[test]
    fn bound_entity_rejects_unknown_fields() {
        let mut entity = Entity::of(&model());
        entity.set("name", "Anna").unwrap();
        let err = entity.set("email", "x@y.z").unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn detached_entity_accepts_anything() {
        let mut entity = Entity::detached();
        entity.set("whatever", 1i64).unwrap();
        assert_eq!(entity.value("whatever"), Some(&Value::I64(1)));
        assert!(entity.model().is_none());
    }
}
