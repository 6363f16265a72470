use std::collections::HashMap;
use std::fmt;

use allocative::Allocative;
use tracing::debug;

use crate::{
    ast::{CreateTable, Delete, InsertInto, Select, Statement, Update},
    config::EngineConfig,
    error::{DbError, DbResult},
    parser::Parser,
    query::{self, QueryResult},
    table::{Row, Table},
    tokenizer::Tokenizer,
};

/// The main entry point for the in-memory database engine.
/// It manages a collection of tables and orchestrates statement execution.
///
/// Every table is created with the store strategy of the database's
/// [EngineConfig]. Nothing is shared or global: drop the database and all of
/// its tables go with it.
#[derive(Debug, Default, Allocative)]
pub struct Database {
    /// A map of table names to their respective [Table] structures.
    tables: HashMap<String, Table>,
    config: EngineConfig,
}

/// What a successfully executed statement produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { table: String },
    Inserted { table: String },
    Rows(QueryResult),
    Updated { table: String, affected: usize },
    Deleted { table: String, affected: usize },
}

fn rows_affected(affected: usize) -> String {
    match affected {
        1 => "1 row affected.".to_string(),
        n => format!("{n} rows affected."),
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { table } => write!(f, "Table {table} created"),
            Self::Inserted { table } => write!(f, "Row inserted into {table}"),
            Self::Rows(result) => write!(f, "{result}"),
            Self::Updated { table, affected } => {
                write!(f, "Table {table} updated. {}", rows_affected(*affected))
            }
            Self::Deleted { table, affected } => {
                write!(f, "Rows deleted from {table}. {}", rows_affected(*affected))
            }
        }
    }
}

impl Database {
    /// Creates a new, empty database instance.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tables: HashMap::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates a new table in the database.
    ///
    /// # Errors
    /// Returns an error if a table with the same name already exists.
    pub fn create_table(&mut self, name: String, columns: Vec<String>) -> DbResult<()> {
        if self.tables.contains_key(&name) {
            return Err(DbError::TableExists(name));
        }
        debug!(table = %name, ?columns, store = %self.config.store, "creating table");
        let table = Table::new(name.clone(), columns, self.config.store);
        self.tables.insert(name, table);
        Ok(())
    }

    /// Retrieves a reference to a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Retrieves a mutable reference to a table by name.
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    /// Returns a list of all table names currently stored in the database.
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Bytes held on the heap by every table, their rows and stores.
    pub fn allocated_bytes(&self) -> usize {
        allocative::size_of_unique_allocated_data(self)
    }

    /// Executes one SQL statement.
    ///
    /// # Errors
    /// Returns an error if parsing fails, the table is unknown, or the
    /// statement does not fit the table's columns.
    ///
    /// # Example
    /// ```
    /// use probedb::{Database, Outcome};
    ///
    /// let mut db = Database::default();
    /// db.execute("CREATE TABLE users (id, name)").unwrap();
    /// db.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
    /// db.execute("INSERT INTO users VALUES (2, 'Bob')").unwrap();
    ///
    /// let outcome = db.execute("DELETE FROM users WHERE id > 1").unwrap();
    /// assert_eq!(outcome.to_string(), "Rows deleted from users. 1 row affected.");
    ///
    /// let Outcome::Rows(result) = db.execute("SELECT * FROM users").unwrap() else {
    ///     panic!("expected rows");
    /// };
    /// assert_eq!(result.to_string(), "id\tname\n1\t'Alice'");
    /// ```
    pub fn execute(&mut self, sql: &str) -> DbResult<Outcome> {
        let tokens = Tokenizer::new(sql).tokenize();
        let statement = Parser::new(tokens).parse()?;
        debug!(?statement, "dispatching");

        match statement {
            Statement::CreateTable(CreateTable { name, columns }) => {
                self.create_table(name.clone(), columns)?;
                Ok(Outcome::Created { table: name })
            }
            Statement::InsertInto(insert) => self.insert(insert),
            Statement::Select(select) => self.select(select).map(Outcome::Rows),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
        }
    }

    /// Executes `sql` and renders the outcome as text. Failures come back as
    /// `ERROR: <message>` instead of an `Err`.
    ///
    /// ```
    /// # use probedb::Database;
    /// let mut db = Database::default();
    /// assert_eq!(db.run("SELECT * FROM ghosts"), "ERROR: no such table: ghosts");
    /// ```
    pub fn run(&mut self, sql: &str) -> String {
        match self.execute(sql) {
            Ok(outcome) => outcome.to_string(),
            Err(err) => format!("ERROR: {err}"),
        }
    }

    fn table(&self, name: &str) -> DbResult<&Table> {
        self.get_table(name)
            .ok_or_else(|| DbError::NoSuchTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> DbResult<&mut Table> {
        self.get_table_mut(name)
            .ok_or_else(|| DbError::NoSuchTable(name.to_string()))
    }

    /// Builds a row from positional values and stores it under its key.
    ///
    /// The key is the value of the configured key column, or of the first
    /// declared column when the table has no such column.
    fn insert(&mut self, insert: InsertInto) -> DbResult<Outcome> {
        let key_column = self.config.key_column.clone();
        let table = self.table_mut(&insert.table)?;

        let columns = table.columns();
        if insert.values.len() != columns.len() {
            return Err(DbError::ColumnCount {
                expected: columns.len(),
                found: insert.values.len(),
            });
        }

        let key_index = columns
            .iter()
            .position(|column| *column == key_column)
            .unwrap_or(0);
        let key = insert.values[key_index].clone();
        let row: Row = columns.iter().cloned().zip(insert.values).collect();

        table.add_row(key, row)?;
        Ok(Outcome::Inserted {
            table: insert.table,
        })
    }

    fn select(&self, select: Select) -> DbResult<QueryResult> {
        let table = self.table(&select.table)?;
        Ok(query::select(table, &select.where_clause))
    }

    fn update(&mut self, update: Update) -> DbResult<Outcome> {
        let table = self.table_mut(&update.table)?;
        if !table.has_column(&update.column) {
            return Err(DbError::NoSuchColumn {
                table: update.table,
                column: update.column,
            });
        }

        let affected = query::update(table, &update.column, &update.value, &update.where_clause);
        debug!(table = %update.table, affected, "update applied");
        Ok(Outcome::Updated {
            table: update.table,
            affected,
        })
    }

    fn delete(&mut self, delete: Delete) -> DbResult<Outcome> {
        let table = self.table_mut(&delete.table)?;

        let affected = query::delete(table, &delete.where_clause);
        debug!(table = %delete.table, affected, "delete applied");
        Ok(Outcome::Deleted {
            table: delete.table,
            affected,
        })
    }
}
