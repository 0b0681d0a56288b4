//! TychoDB: an embedded document store. Persists arbitrary typed objects as
//! JSON inside a single SQLite file, then retrieves, filters, sorts, counts,
//! indexes and streams them back.

mod blobs;
mod config;
mod documents;
mod engine;
mod filter_sql;
mod index;
mod projection;
mod schema;
mod sort_sql;
mod supervisor;

pub use config::{TychoConfig, TychoConfigBuilder};
pub use engine::TychoDb;
pub use tychodb_core::prelude::*;
