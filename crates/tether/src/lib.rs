//! MySQL toolkit mapping declared models onto live tables.
//!
//! This crate provides:
//! - Schema synchronization: reconcile a model's declared field set with
//!   its live table (create-or-diff, single ALTER covering the drift)
//! - Filter predicates compiled to SQL fragments, validated at
//!   construction
//! - Query execution: SELECT with predicates and options, batched
//!   multi-row INSERT inside one transaction
//! - Result mapping: rows rehydrated into typed entities when a model is
//!   registered, with lazy one-level relation population
//!
//! # Example
//!
//! ```ignore
//! use tether::{Adapter, ConnectOpts, Filter, ModelDescriptor, FieldDescriptor, Op};
//!
//! let opts = ConnectOpts::new("localhost", "app", "secret");
//! let mut db = Adapter::connect(opts, "app_db")?;
//!
//! let user = ModelDescriptor::new("User", "user")
//!     .field(FieldDescriptor::new("name", "varchar")?.length(50))?
//!     .field(FieldDescriptor::new("age", "int")?.nullable().default_value("0"))?;
//!
//! db.register_model(user, true)?;
//!
//! let adults = db.find("user", &[Filter::new("age", Op::Ge, 18)?], &Default::default())?;
//! ```
//!
//! Descriptors are plain values built once at registration time; how a
//! caller derives them from its own type definitions is out of scope
//! here. The database transport sits behind the [`Conn`] trait, with a
//! synchronous MySQL implementation provided.

mod adapter;
mod conn;
mod entity;
mod error;
mod filter;
pub mod introspect;
mod query;
mod registry;
mod result;
pub mod sync;
mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::Adapter;
pub use conn::{Conn, ConnError, ConnectOpts, Driver, MySqlConn, MySqlDriver, Traced};
pub use entity::{Entity, FieldValue};
pub use error::Error;
pub use filter::{Filter, Op, Operand, compile_all};
pub use query::{SelectOptions, build_bulk_insert, build_select};
pub use registry::Registry;
pub use result::{QueryResult, Record};
pub use sync::{ColumnDiff, SyncOutcome};
pub use value::{Row, Value, quote_str};

// Re-export the descriptor types for convenience
pub use tether_model::{
    FieldDescriptor, ModelDescriptor, ModelError, Reference, SqlType, TypeCategory,
};

/// Result type for tether operations.
pub type Result<T> = std::result::Result<T, Error>;
