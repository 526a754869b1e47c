//! The adapter: one live connection, one registry, the public surface.
//!
//! Synchronous throughout — every operation blocks until the database
//! round trip completes. A single adapter is meant to be driven from one
//! thread; the registry, the selected database and the connection handle
//! are all mutated in place without locking.

use crate::conn::{ConnectOpts, Driver, MySqlDriver, Traced};
use crate::entity::{Entity, FieldValue};
use crate::error::Error;
use crate::filter::Filter;
use crate::introspect;
use crate::query::{self, SelectOptions};
use crate::registry::Registry;
use crate::result::{QueryResult, Record};
use crate::sync::{self, SyncOutcome};
use crate::Result;
use tether_model::ModelDescriptor;

/// Maps registered models onto live tables and runs queries against them.
pub struct Adapter<D: Driver = MySqlDriver> {
    driver: D,
    opts: ConnectOpts,
    db_name: String,
    conn: Option<D::Conn>,
    registry: Registry,
}

impl Adapter<MySqlDriver> {
    /// Connect against a MySQL server. An empty `db_name` defers the
    /// actual connection until [`Adapter::select_db`].
    pub fn connect(opts: ConnectOpts, db_name: &str) -> Result<Self> {
        Adapter::connect_with(MySqlDriver, opts, db_name)
    }
}

impl<D: Driver> Adapter<D> {
    /// Connect through a specific driver (the seam tests use).
    pub fn connect_with(driver: D, opts: ConnectOpts, db_name: &str) -> Result<Self> {
        let mut adapter = Adapter {
            driver,
            opts,
            db_name: String::new(),
            conn: None,
            registry: Registry::new(),
        };
        if !db_name.is_empty() {
            adapter.select_db(db_name)?;
        }
        Ok(adapter)
    }

    /// Select (or re-select) a database.
    ///
    /// This is a hard cutover: the previous connection is dropped before
    /// the new one is opened, and the registry starts over empty.
    pub fn select_db(&mut self, db_name: &str) -> Result<()> {
        self.conn = None;
        self.db_name.clear();
        self.registry = Registry::new();

        let conn = self.driver.connect(&self.opts, db_name)?;
        self.conn = Some(conn);
        self.db_name = db_name.to_string();
        Ok(())
    }

    /// The currently selected database, if any.
    pub fn database(&self) -> Option<&str> {
        if self.db_name.is_empty() {
            None
        } else {
            Some(&self.db_name)
        }
    }

    /// The registry for the currently selected database.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn conn(&mut self) -> Result<&mut D::Conn> {
        self.conn.as_mut().ok_or(Error::NoDatabase)
    }

    /// Register a model for the current database, optionally
    /// synchronizing its table immediately.
    ///
    /// Returns the synchronization outcome when `migrate` is set.
    pub fn register_model(
        &mut self,
        model: ModelDescriptor,
        migrate: bool,
    ) -> Result<Option<SyncOutcome>> {
        self.conn()?;
        let model = self.registry.register(model);

        if migrate {
            let outcome = sync::synchronize(self.conn()?, &model)?;
            Ok(Some(outcome))
        } else {
            Ok(None)
        }
    }

    /// Find the records matching the predicates.
    pub fn find(
        &mut self,
        table: &str,
        filters: &[Filter],
        options: &SelectOptions,
    ) -> Result<QueryResult> {
        let sql = query::build_select(table, filters, options);
        let rows = Traced::new(self.conn()?).query(&sql)?;
        Ok(QueryResult::map(rows, table, &self.registry))
    }

    /// Find the first record matching the predicates.
    ///
    /// An empty result is not an error.
    pub fn find_one(&mut self, table: &str, filters: &[Filter]) -> Result<QueryResult> {
        self.find(table, filters, &SelectOptions::limited(1))
    }

    /// Insert a single entity.
    pub fn insert(&mut self, entity: &Entity) -> Result<()> {
        self.bulk_insert(std::slice::from_ref(entity))
    }

    /// Insert a batch of same-model entities atomically.
    ///
    /// The target table comes from the first entity's model binding; a
    /// detached entity is refused. The whole batch goes into one
    /// multi-row INSERT inside a single transaction: it commits as a
    /// whole or not at all.
    pub fn bulk_insert(&mut self, entities: &[Entity]) -> Result<()> {
        self.conn()?;
        if entities.is_empty() {
            return Ok(());
        }

        let model = entities[0].model().cloned().ok_or(Error::UnboundEntity)?;

        let columns: Vec<String> = introspect::table_columns(self.conn()?, model.table())?
            .into_iter()
            .filter(|column| column != "id")
            .collect();

        let sql = query::build_bulk_insert(&model, &columns, entities)?;

        let mut traced = Traced::new(self.conn()?);
        traced.begin()?;
        match traced.execute(&sql) {
            Ok(_) => {
                traced.commit()?;
                Ok(())
            }
            Err(source) => {
                let _ = traced.rollback();
                Err(source.into())
            }
        }
    }

    /// Delete an entity by its primary key.
    ///
    /// The id must be resolvable; the statement execution itself is not
    /// implemented and this surfaces as an error rather than silently
    /// doing nothing.
    pub fn delete(&mut self, entity: &Entity) -> Result<()> {
        self.conn()?;
        let _id = entity.id().ok_or(Error::MissingId)?;
        Err(Error::Unimplemented("delete"))
    }

    /// Resolve a declared reference one level deep: replace each
    /// entity's scalar value for `field` with the result of querying the
    /// referenced table for matching rows.
    ///
    /// A no-op (the result is left untouched) unless the owning model is
    /// registered, `field` carries a declared reference, and the
    /// referenced model is registered in the current registry. Values
    /// already populated stay as they are.
    pub fn populate(&mut self, result: &mut QueryResult, field: &str) -> Result<()> {
        let Some(model) = self.registry.get(result.table()) else {
            return Ok(());
        };
        let Some(reference) = model.descriptor(field).and_then(|f| f.reference()) else {
            return Ok(());
        };
        let (ref_model, ref_field) = (reference.model.clone(), reference.field.clone());

        let Some(target) = self.registry.by_model_name(&ref_model) else {
            return Ok(());
        };
        let target_table = target.table().to_string();

        for index in 0..result.len() {
            let value = {
                let Record::Entity(entity) = &result[index] else {
                    continue;
                };
                match entity.field(field) {
                    Some(FieldValue::Scalar(value)) => value.clone(),
                    // absent or already resolved: leave it alone
                    _ => continue,
                }
            };

            let filter = Filter::eq(ref_field.as_str(), value)?;
            let relation = self.find(
                &target_table,
                std::slice::from_ref(&filter),
                &SelectOptions::default(),
            )?;

            if let Record::Entity(entity) = &mut result.records_mut()[index] {
                entity.resolve(field, relation);
            }
        }

        Ok(())
    }
}
