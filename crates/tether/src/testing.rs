//! Scripted connection fakes shared by the unit tests.

use crate::conn::{Conn, ConnError, ConnectOpts, Driver};
use crate::value::Row;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A connection that replays scripted responses and records every
/// statement it sees. Unscripted queries return no rows; unscripted
/// executes succeed.
#[derive(Default)]
pub(crate) struct FakeConn {
    pub queries: Vec<String>,
    pub executed: Vec<String>,
    query_results: VecDeque<Result<Vec<Row>, ConnError>>,
    execute_results: VecDeque<Result<u64, ConnError>>,
}

impl FakeConn {
    pub fn new() -> Self {
        FakeConn::default()
    }

    pub fn push_query(&mut self, result: Result<Vec<Row>, ConnError>) {
        self.query_results.push_back(result);
    }

    pub fn push_execute(&mut self, result: Result<u64, ConnError>) {
        self.execute_results.push_back(result);
    }
}

impl Conn for FakeConn {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, ConnError> {
        self.queries.push(sql.to_string());
        self.query_results.pop_front().unwrap_or(Ok(Vec::new()))
    }

    fn execute(&mut self, sql: &str) -> Result<u64, ConnError> {
        self.executed.push(sql.to_string());
        self.execute_results.pop_front().unwrap_or(Ok(0))
    }
}

/// A [`FakeConn`] behind shared ownership, so a test can keep inspecting
/// the connection the adapter took.
#[derive(Clone, Default)]
pub(crate) struct SharedConn(pub Rc<RefCell<FakeConn>>);

impl Conn for SharedConn {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, ConnError> {
        self.0.borrow_mut().query(sql)
    }

    fn execute(&mut self, sql: &str) -> Result<u64, ConnError> {
        self.0.borrow_mut().execute(sql)
    }
}

/// Hands out clones of a prepared [`SharedConn`]; counts connections so
/// tests can observe the select-db cutover.
#[derive(Default)]
pub(crate) struct FakeDriver {
    pub conn: SharedConn,
    pub connections: RefCell<usize>,
}

impl FakeDriver {
    pub fn with_conn(conn: SharedConn) -> Self {
        FakeDriver {
            conn,
            connections: RefCell::new(0),
        }
    }
}

impl Driver for FakeDriver {
    type Conn = SharedConn;

    fn connect(&self, _opts: &ConnectOpts, _db_name: &str) -> Result<SharedConn, ConnError> {
        *self.connections.borrow_mut() += 1;
        Ok(self.conn.clone())
    }
}
