//! Descriptor types for tether.
//!
//! This crate contains the pure-data description of a model: its table
//! binding and the SQL shape of each field. Descriptors are constructed
//! explicitly by the caller (there is no reflection involved) and are
//! validated at construction time — an unrecognized column type or a
//! malformed field set never makes it into a [`ModelDescriptor`].
//!
//! The engine crate (`tether`) consumes these as already-resolved data.

use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while building descriptors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The column type name is not part of the recognized vocabulary.
    #[error("the type `{0}` does not exist")]
    UnknownType(String),

    /// `id` is implicit (auto-increment primary key) and cannot be declared.
    #[error("field `id` is implicit and cannot be declared on model `{model}`")]
    ReservedField { model: String },

    /// A field name was declared twice on the same model.
    #[error("duplicate field `{field}` on model `{model}`")]
    DuplicateField { model: String, field: String },
}

/// Broad classification of a column type.
///
/// Only the category matters to the engine: it decides whether default
/// literals and inserted values are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Numeric,
    String,
    DateTime,
    Spatial,
    Json,
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeCategory::Numeric => "Numeric",
            TypeCategory::String => "String",
            TypeCategory::DateTime => "DateTime",
            TypeCategory::Spatial => "Spatial",
            TypeCategory::Json => "JSON",
        };
        f.write_str(s)
    }
}

const NUMERIC_TYPES: &[&str] = &[
    "tinyint", "bool", "smallint", "mediumint", "int", "integer", "bigint", "decimal", "float",
    "double", "bit",
];

const STRING_TYPES: &[&str] = &[
    "char",
    "varchar",
    "binary",
    "varbinary",
    "tinyblob",
    "blob",
    "mediumblob",
    "longblob",
    "tinytext",
    "text",
    "mediumtext",
    "longtext",
    "enum",
    "set",
];

const DATETIME_TYPES: &[&str] = &["date", "time", "datetime", "timestamp", "year"];

const SPATIAL_TYPES: &[&str] = &[
    "geometry",
    "point",
    "linestring",
    "polygon",
    "geometrycollection",
    "multilinestring",
    "multipoint",
    "multipolygon",
];

const JSON_TYPES: &[&str] = &["json"];

/// A validated SQL column type name.
///
/// Construction fails for names outside the recognized MySQL vocabulary,
/// so holding a `SqlType` is proof the name belongs to exactly one
/// [`TypeCategory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlType {
    name: String,
    category: TypeCategory,
}

impl SqlType {
    /// Parse and classify a type name.
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        let category = if NUMERIC_TYPES.contains(&name) {
            TypeCategory::Numeric
        } else if STRING_TYPES.contains(&name) {
            TypeCategory::String
        } else if DATETIME_TYPES.contains(&name) {
            TypeCategory::DateTime
        } else if SPATIAL_TYPES.contains(&name) {
            TypeCategory::Spatial
        } else if JSON_TYPES.contains(&name) {
            TypeCategory::Json
        } else {
            return Err(ModelError::UnknownType(name.to_string()));
        };

        Ok(SqlType {
            name: name.to_string(),
            category,
        })
    }

    /// The type name as declared, e.g. `varchar`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The category this type belongs to.
    pub fn category(&self) -> TypeCategory {
        self.category
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A foreign-key reference declared on a field.
///
/// `model` names the referenced model (not its table — the table is
/// resolved through the registry at populate time), `field` the column
/// on the referenced table that holds the matching value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub model: String,
    pub field: String,
}

impl Reference {
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Reference {
            model: model.into(),
            field: field.into(),
        }
    }
}

/// The SQL shape of a single declared field.
///
/// Fields are NOT NULL unless marked nullable, mirroring how the column
/// definition is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    sql_type: SqlType,
    length: Option<u32>,
    nullable: bool,
    default: Option<String>,
    reference: Option<Reference>,
}

impl FieldDescriptor {
    /// Create a descriptor for `name` with the given column type.
    ///
    /// Fails if the type name is unrecognized.
    pub fn new(name: impl Into<String>, type_name: &str) -> Result<Self, ModelError> {
        Ok(FieldDescriptor {
            name: name.into(),
            sql_type: SqlType::parse(type_name)?,
            length: None,
            nullable: false,
            default: None,
            reference: None,
        })
    }

    /// Set the type length, e.g. `varchar(50)`. Non-positive lengths are
    /// discarded.
    pub fn length(mut self, length: u32) -> Self {
        self.length = if length > 0 { Some(length) } else { None };
        self
    }

    /// Mark the column nullable (drops the NOT NULL constraint).
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Declare a default literal for the column.
    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Declare a foreign-key reference to `model.field`.
    pub fn references(mut self, model: impl Into<String>, field: impl Into<String>) -> Self {
        self.reference = Some(Reference::new(model, field));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> &SqlType {
        &self.sql_type
    }

    pub fn type_length(&self) -> Option<u32> {
        self.length
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }
}

/// A model: its name, its table binding, and its ordered field set.
///
/// A declared field is usually typed (it carries a [`FieldDescriptor`]),
/// but may also be *untyped*: a bare name with no usable column type.
/// Untyped fields count as part of the declared set when diffing against
/// live columns, yet are never emitted as column definitions — they are
/// silently skipped, both at CREATE and when computing columns to add.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    name: String,
    table: String,
    fields: IndexMap<String, Option<FieldDescriptor>>,
}

impl ModelDescriptor {
    /// Create a descriptor binding model `name` to `table`.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        ModelDescriptor {
            name: name.into(),
            table: table.into(),
            fields: IndexMap::new(),
        }
    }

    fn declare(&mut self, name: String, field: Option<FieldDescriptor>) -> Result<(), ModelError> {
        if name == "id" {
            return Err(ModelError::ReservedField {
                model: self.name.clone(),
            });
        }
        if self.fields.contains_key(&name) {
            return Err(ModelError::DuplicateField {
                model: self.name.clone(),
                field: name,
            });
        }
        self.fields.insert(name, field);
        Ok(())
    }

    /// Declare a typed field. Declaration order is preserved.
    pub fn field(mut self, field: FieldDescriptor) -> Result<Self, ModelError> {
        self.declare(field.name().to_string(), Some(field))?;
        Ok(self)
    }

    /// Declare a field with no usable column type.
    pub fn untyped_field(mut self, name: impl Into<String>) -> Result<Self, ModelError> {
        self.declare(name.into(), None)?;
        Ok(self)
    }

    /// The model name (used to resolve references).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// All declared field names, typed or not, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Typed fields in declaration order.
    pub fn typed_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values().filter_map(Option::as_ref)
    }

    /// The descriptor for `name`, if the field is declared and typed.
    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    /// Whether `name` is part of the declared field set.
    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
