//! User store boundary.
//!
//! The authentication core consumes exactly one query contract from the
//! platform's user storage: load-by-username, plus the explicit write path
//! used by registration. [`UserStore`] is that boundary; [`SqliteStore`] is
//! the libsql-backed implementation (local file in production, in-memory in
//! tests).

mod store;

pub use store::{NewUser, SqliteStore, UserRecord, UserStore};
