//! Query results and row-to-entity mapping.
//!
//! A [`QueryResult`] is a snapshot: it is produced once per query call
//! and never refreshed. Whether its records are raw rows or typed
//! entities depends on whether a model is registered for the queried
//! table at mapping time.

use crate::entity::{Entity, FieldValue};
use crate::registry::Registry;
use crate::value::Row;
use std::ops::Index;

/// One record of a result: a raw row (unregistered table) or a typed
/// entity (registered model).
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Row(Row),
    Entity(Entity),
}

impl Record {
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Record::Row(row) => Some(row),
            Record::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Record::Row(_) => None,
            Record::Entity(entity) => Some(entity),
        }
    }
}

/// An ordered, countable, indexable snapshot of query records.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    table: String,
    records: Vec<Record>,
}

impl QueryResult {
    /// Map raw rows for `table`, consulting the registry to decide
    /// between raw and typed records.
    pub(crate) fn map(rows: Vec<Row>, table: &str, registry: &Registry) -> Self {
        let records = match registry.get(table) {
            Some(model) => rows
                .into_iter()
                .map(|row| {
                    let mut entity = Entity::of(model);
                    for (column, value) in row {
                        if column == "id" {
                            // id has no declared descriptor but is always assigned
                            entity.assign_id(value.as_i64());
                        } else if model.declares(&column) {
                            entity.assign(&column, FieldValue::Scalar(value));
                        }
                        // columns with no matching declared field are dropped
                    }
                    Record::Entity(entity)
                })
                .collect(),
            None => rows.into_iter().map(Record::Row).collect(),
        };

        QueryResult {
            table: table.to_string(),
            records,
        }
    }

    /// The table this result was read from.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }
}

impl Index<usize> for QueryResult {
    type Output = Record;

    fn index(&self, index: usize) -> &Record {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for QueryResult {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
