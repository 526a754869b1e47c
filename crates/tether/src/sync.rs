//! Schema synchronization - reconcile a declared model with its live table.
//!
//! [`synchronize`] either creates the table outright or computes the
//! column diff against the live schema and emits a single `ALTER TABLE`
//! covering it. A second run against an unchanged model issues no DDL at
//! all.
//!
//! Column drops are real drops: callers must treat synchronization as
//! potentially destructive and irreversible. There is no dry-run mode.

use crate::conn::{Conn, Traced};
use crate::error::Error;
use crate::introspect;
use crate::value::quote_str;
use tether_model::{FieldDescriptor, ModelDescriptor, TypeCategory};

/// What a synchronization run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The table did not exist and was created.
    Created,
    /// The table existed and columns were added and/or dropped.
    Altered,
    /// Declared fields and live columns already match; no DDL issued.
    Unchanged,
}

/// The column additions/removals needed to reconcile live schema with a
/// declared field set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDiff {
    /// Declared fields absent from the live columns, in declaration order.
    pub to_add: Vec<String>,
    /// Live columns absent from the declared fields, in table order.
    pub to_remove: Vec<String>,
}

impl ColumnDiff {
    /// Compare a model's declared field set against live column names.
    ///
    /// `live` must already exclude the implicit `id` column; declared
    /// fields never contain it (the descriptor refuses the name).
    pub fn compute(model: &ModelDescriptor, live: &[String]) -> ColumnDiff {
        let to_add = model
            .field_names()
            .filter(|name| !live.iter().any(|col| col == name))
            .map(str::to_string)
            .collect();

        let to_remove = live
            .iter()
            .filter(|col| !model.declares(col))
            .cloned()
            .collect();

        ColumnDiff { to_add, to_remove }
    }

    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Render one column definition: `<name> <type>[(length)] [NOT NULL] [DEFAULT <lit>]`.
fn column_def(field: &FieldDescriptor) -> String {
    let mut def = format!("{} {}", field.name(), field.sql_type());

    if let Some(length) = field.type_length() {
        def.push_str(&format!("({length})"));
    }

    if !field.is_nullable() {
        def.push_str(" NOT NULL");
    }

    if let Some(default) = field.default() {
        def.push_str(" DEFAULT ");
        match field.sql_type().category() {
            // Numeric defaults go in raw; everything else is a string literal.
            TypeCategory::Numeric => def.push_str(default),
            _ => def.push_str(&quote_str(default)),
        }
    }

    def
}

/// Generate the CREATE TABLE statement for a model.
///
/// The implicit auto-increment primary key comes first; declared fields
/// follow in declaration order. Untyped fields are skipped.
pub fn create_table_sql(model: &ModelDescriptor) -> String {
    let mut parts = vec!["id INT AUTO_INCREMENT PRIMARY KEY".to_string()];
    parts.extend(model.typed_fields().map(column_def));

    format!(
        "CREATE TABLE {} (\n    {}\n);",
        model.table(),
        parts.join(",\n    ")
    )
}

/// Generate the single ALTER TABLE statement covering a diff: one
/// ADD COLUMN clause per addition (untyped fields silently skipped),
/// then one DROP COLUMN clause per removal.
///
/// Returns `None` when the diff yields no actionable clause (every
/// addition was untyped and nothing is removed).
pub fn alter_table_sql(model: &ModelDescriptor, diff: &ColumnDiff) -> Option<String> {
    let mut clauses = Vec::new();

    for name in &diff.to_add {
        if let Some(field) = model.descriptor(name) {
            clauses.push(format!("ADD COLUMN {}", column_def(field)));
        }
    }

    for name in &diff.to_remove {
        clauses.push(format!("DROP COLUMN {name}"));
    }

    if clauses.is_empty() {
        return None;
    }

    Some(format!(
        "ALTER TABLE {}\n    {};",
        model.table(),
        clauses.join(",\n    ")
    ))
}

/// Make the live table match the declared model.
///
/// DDL failures surface as [`Error::Schema`] with the failing statement
/// attached; nothing is retried or rolled back (MySQL DDL is not
/// transactional).
pub fn synchronize<C: Conn>(conn: &mut C, model: &ModelDescriptor) -> Result<SyncOutcome, Error> {
    if !introspect::table_exists(conn, model.table()) {
        let statement = create_table_sql(model);
        execute_ddl(conn, statement)?;
        return Ok(SyncOutcome::Created);
    }

    let live: Vec<String> = introspect::table_columns(conn, model.table())?
        .into_iter()
        .filter(|column| column != "id")
        .collect();

    let diff = ColumnDiff::compute(model, &live);
    if diff.is_empty() {
        return Ok(SyncOutcome::Unchanged);
    }

    match alter_table_sql(model, &diff) {
        Some(statement) => {
            execute_ddl(conn, statement)?;
            Ok(SyncOutcome::Altered)
        }
        None => Ok(SyncOutcome::Unchanged),
    }
}

fn execute_ddl<C: Conn>(conn: &mut C, statement: String) -> Result<(), Error> {
    if let Err(source) = Traced::new(conn).execute(&statement) {
        return Err(Error::Schema { statement, source });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::ConnError;
    use crate::testing::FakeConn;
    use crate::value::Value;
    use proptest::prelude::*;
    use tether_model::FieldDescriptor;

    fn sample_model() -> ModelDescriptor {
        ModelDescriptor::new("Person", "t")
            .field(
                FieldDescriptor::new("name", "varchar")
                    .unwrap()
                    .length(50),
            )
            .unwrap()
            .field(
                FieldDescriptor::new("age", "int")
                    .unwrap()
                    .nullable()
                    .default_value("0"),
            )
            .unwrap()
    }

    fn show_columns_row(name: &str) -> crate::value::Row {
        vec![
            ("Field".to_string(), Value::from(name)),
            ("Type".to_string(), Value::from("int")),
        ]
    }

    #[test]
    fn diff_correctness() {
        let model = ModelDescriptor::new("M", "t")
            .field(FieldDescriptor::new("b", "int").unwrap())
            .unwrap()
            .field(FieldDescriptor::new("c", "int").unwrap())
            .unwrap()
            .field(FieldDescriptor::new("d", "int").unwrap())
            .unwrap();

        let live = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let diff = ColumnDiff::compute(&model, &live);

        assert_eq!(diff.to_add, vec!["d"]);
        assert_eq!(diff.to_remove, vec!["a"]);
    }

    #[test]
    fn create_table_statement() {
        insta::assert_snapshot!(create_table_sql(&sample_model()), @r"
        CREATE TABLE t (
            id INT AUTO_INCREMENT PRIMARY KEY,
            name varchar(50) NOT NULL,
            age int DEFAULT 0
        );
        ");
    }

    #[test]
    fn string_default_is_quoted() {
        let model = ModelDescriptor::new("M", "t")
            .field(
                FieldDescriptor::new("status", "varchar")
                    .unwrap()
                    .length(10)
                    .default_value("x"),
            )
            .unwrap();

        insta::assert_snapshot!(create_table_sql(&model), @r"
        CREATE TABLE t (
            id INT AUTO_INCREMENT PRIMARY KEY,
            status varchar(10) NOT NULL DEFAULT 'x'
        );
        ");
    }

    #[test]
    fn alter_table_statement() {
        let model = ModelDescriptor::new("M", "t")
            .field(FieldDescriptor::new("b", "int").unwrap())
            .unwrap()
            .field(FieldDescriptor::new("c", "int").unwrap())
            .unwrap()
            .field(
                FieldDescriptor::new("d", "varchar")
                    .unwrap()
                    .length(20)
                    .nullable(),
            )
            .unwrap();

        let live = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let diff = ColumnDiff::compute(&model, &live);

        insta::assert_snapshot!(alter_table_sql(&model, &diff).unwrap(), @r"
        ALTER TABLE t
            ADD COLUMN d varchar(20),
            DROP COLUMN a;
        ");
    }

    #[test]
    fn untyped_additions_are_skipped() {
        let model = ModelDescriptor::new("M", "t")
            .field(FieldDescriptor::new("a", "int").unwrap())
            .unwrap()
            .untyped_field("ghost")
            .unwrap();

        let live = vec!["a".to_string()];
        let diff = ColumnDiff::compute(&model, &live);
        assert_eq!(diff.to_add, vec!["ghost"]);

        // The only addition has no usable type: nothing to emit.
        assert_eq!(alter_table_sql(&model, &diff), None);
    }

    #[test]
    fn creates_missing_table() {
        let mut conn = FakeConn::new();
        // existence probe fails -> table is missing
        conn.push_query(Err(ConnError::new("table t doesn't exist")));

        let outcome = synchronize(&mut conn, &sample_model()).unwrap();
        assert_eq!(outcome, SyncOutcome::Created);
        assert_eq!(conn.executed.len(), 1);
        assert!(conn.executed[0].starts_with("CREATE TABLE t"));
    }

    #[test]
    fn second_run_is_idempotent() {
        let mut conn = FakeConn::new();
        conn.push_query(Ok(vec![])); // existence probe
        conn.push_query(Ok(vec![
            show_columns_row("id"),
            show_columns_row("name"),
            show_columns_row("age"),
        ]));

        let outcome = synchronize(&mut conn, &sample_model()).unwrap();
        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert!(conn.executed.is_empty());
    }

    #[test]
    fn alters_drifted_table() {
        let mut conn = FakeConn::new();
        conn.push_query(Ok(vec![])); // existence probe
        conn.push_query(Ok(vec![
            show_columns_row("id"),
            show_columns_row("name"),
            show_columns_row("stale"),
        ]));

        let outcome = synchronize(&mut conn, &sample_model()).unwrap();
        assert_eq!(outcome, SyncOutcome::Altered);
        assert_eq!(conn.executed.len(), 1);
        insta::assert_snapshot!(conn.executed[0], @r"
        ALTER TABLE t
            ADD COLUMN age int DEFAULT 0,
            DROP COLUMN stale;
        ");
    }

    #[test]
    fn ddl_failure_carries_statement() {
        let mut conn = FakeConn::new();
        conn.push_query(Err(ConnError::new("table t doesn't exist")));
        conn.push_execute(Err(ConnError::new("access denied")));

        let err = synchronize(&mut conn, &sample_model()).unwrap_err();
        match err {
            Error::Schema { statement, source } => {
                assert!(statement.starts_with("CREATE TABLE t"));
                assert_eq!(source, ConnError::new("access denied"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    proptest! {
        /// The diff never adds a live column or removes a declared one,
        /// and together the sets cover exactly the symmetric difference.
        #[test]
        fn diff_set_algebra(
            declared in proptest::collection::btree_set("[a-e]", 0..5),
            live in proptest::collection::btree_set("[c-h]", 0..5),
        ) {
            let mut model = ModelDescriptor::new("M", "t");
            for name in &declared {
                model = model.field(FieldDescriptor::new(name.clone(), "int").unwrap()).unwrap();
            }
            let live: Vec<String> = live.into_iter().collect();

            let diff = ColumnDiff::compute(&model, &live);

            for added in &diff.to_add {
                prop_assert!(declared.contains(added));
                prop_assert!(!live.contains(added));
            }
            for removed in &diff.to_remove {
                prop_assert!(live.contains(removed));
                prop_assert!(!declared.contains(removed));
            }
            let covered = diff.to_add.len() + diff.to_remove.len();
            let symmetric = declared.symmetric_difference(
                &live.iter().cloned().collect()
            ).count();
            prop_assert_eq!(covered, symmetric);
        }
    }
}
