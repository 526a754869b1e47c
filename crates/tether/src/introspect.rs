//! Live schema introspection.
//!
//! Column listings are fetched on demand and never cached: every
//! synchronization or insert re-reads the live table.

use crate::conn::{Conn, ConnError, Traced};
use crate::value::Value;

/// Whether `table` exists in the selected database.
///
/// Probes with a throwaway SELECT; a driver error means the table is not
/// there (or not visible, which amounts to the same for our purposes).
pub fn table_exists<C: Conn>(conn: &mut C, table: &str) -> bool {
    Traced::new(conn)
        .query(&format!("SELECT 1 FROM {table} LIMIT 1;"))
        .is_ok()
}

/// The live column names of `table`, in table order.
///
/// Uses `SHOW COLUMNS`; the `id` column is included and excluded by the
/// callers that need to.
pub fn table_columns<C: Conn>(conn: &mut C, table: &str) -> Result<Vec<String>, ConnError> {
    let rows = Traced::new(conn).query(&format!("SHOW COLUMNS FROM {table};"))?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            row.into_iter().find_map(|(name, value)| {
                match (name.as_str(), value) {
                    ("Field", Value::String(column)) => Some(column),
                    _ => None,
                }
            })
        })
        .collect())
}
