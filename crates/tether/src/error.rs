use crate::conn::ConnError;
use crate::filter::Op;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no database has been selected")]
    NoDatabase,

    #[error(transparent)]
    Model(#[from] tether_model::ModelError),

    #[error("the operator {op} accepts only {expected} values, {actual} provided")]
    OperatorArity {
        op: Op,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unknown field `{field}` on model `{model}`")]
    UnknownField { model: String, field: String },

    #[error("no model binding on inserted entity")]
    UnboundEntity,

    #[error("field `{0}` holds a populated relation and cannot be inserted")]
    PopulatedField(String),

    #[error("entity has no id")]
    MissingId,

    #[error("schema statement failed: {statement}")]
    Schema {
        statement: String,
        #[source]
        source: ConnError,
    },

    #[error(transparent)]
    Conn(#[from] ConnError),

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for environment variable {0}")]
    InvalidEnv(&'static str),
}
