//! Statement assembly for SELECT and batched INSERT.

use crate::entity::{Entity, FieldValue};
use crate::error::Error;
use crate::filter::{self, Filter};
use crate::value::quote_str;
use tether_model::{ModelDescriptor, TypeCategory};

/// Options applied to a find call. Only `limit` is currently recognized.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub limit: Option<u64>,
}

impl SelectOptions {
    pub fn limited(limit: u64) -> Self {
        SelectOptions { limit: Some(limit) }
    }
}

/// Build `SELECT * FROM <table>[ WHERE …][ LIMIT n];`.
pub fn build_select(table: &str, filters: &[Filter], options: &SelectOptions) -> String {
    let mut sql = format!("SELECT * FROM {table}");

    if let Some(where_sql) = filter::compile_all(filters) {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }

    if let Some(limit) = options.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    sql.push(';');
    sql
}

/// Build one multi-row INSERT for `entities`, whose column order is fixed
/// by the live (non-id) column list.
///
/// Per entity and column: an absent or Null value becomes the `DEFAULT`
/// keyword when the field declares a default and `NULL` otherwise; a
/// present value is quoted when the field's type category is String and
/// interpolated raw for every other category.
pub fn build_bulk_insert(
    model: &ModelDescriptor,
    columns: &[String],
    entities: &[Entity],
) -> Result<String, Error> {
    let mut rows = Vec::with_capacity(entities.len());

    for entity in entities {
        let mut values = Vec::with_capacity(columns.len() + 1);
        // id slot: the store assigns it
        values.push("NULL".to_string());
        for column in columns {
            values.push(insert_value(model, column, entity.field(column))?);
        }
        rows.push(format!("({})", values.join(", ")));
    }

    Ok(format!(
        "INSERT INTO {} (id, {}) VALUES {};",
        model.table(),
        columns.join(", "),
        rows.join(", ")
    ))
}

fn insert_value(
    model: &ModelDescriptor,
    column: &str,
    value: Option<&FieldValue>,
) -> Result<String, Error> {
    let value = match value {
        Some(FieldValue::Populated(_)) => {
            return Err(Error::PopulatedField(column.to_string()));
        }
        Some(FieldValue::Scalar(value)) if !value.is_null() => value,
        // absent or Null: fall back to the declared default, else NULL
        _ => {
            let keyword = match model.descriptor(column) {
                Some(field) if field.default().is_some() => "DEFAULT",
                _ => "NULL",
            };
            return Ok(keyword.to_string());
        }
    };

    Ok(match model.descriptor(column).map(|f| f.sql_type().category()) {
        Some(TypeCategory::String) => quote_str(&value.raw_text()),
        Some(_) => value.raw_text(),
        // no usable type descriptor: fall back to value-kind formatting
        None => value.sql_literal(),
    })
}
