//! Database access layer.
//!
//! - `backend`: the driver seam used by the connection manager
//! - `mysql`: the sqlx-backed MySQL implementation
//! - `pool`: lazy pool ownership and session discipline
//! - `executor`, `params`, `types`: statement execution and row decoding
//! - `normalize`: row capping and transport-safe values
//! - `schema`: fixed enumeration statements

pub mod backend;
pub mod executor;
pub mod mysql;
pub mod normalize;
pub mod params;
pub mod pool;
pub mod schema;
pub mod types;

pub use backend::{ExecMode, RawResult, SessionBackend, Statement};
pub use mysql::MySqlBackend;
pub use normalize::{NormalizedRows, normalize};
pub use pool::ConnectionManager;
