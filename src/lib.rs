pub mod ast;
pub mod config;
pub mod database;
pub mod error;
pub mod parser;
pub mod predicate;
pub mod query;
pub mod scenario;
pub mod store;
pub mod table;
pub mod tokenizer;
pub mod value;
pub mod workload;

pub use config::EngineConfig;
pub use database::{Database, Outcome};
pub use error::{DbError, DbResult, RowShapeError};
pub use predicate::{CompareOp, Condition, ConditionEntry, Connective};
pub use query::QueryResult;
pub use store::{AnyStore, KeyedStore, StoreKind};
pub use table::{Row, Table};
pub use value::Value;
