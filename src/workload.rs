//! The `evaluate` workload: three prepopulated tables hammered with a seeded
//! stream of random statements.

use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::database::Database;
use crate::error::DbResult;

const CITIES: [&str; 10] = [
    "NewYork",
    "LosAngeles",
    "Chicago",
    "Boston",
    "Miami",
    "Seattle",
    "Austin",
    "Dallas",
    "Atlanta",
    "Denver",
];

const CATEGORIES: [&str; 9] = [
    "Electronics",
    "Appliances",
    "Clothing",
    "Furniture",
    "Toys",
    "Sports",
    "Books",
    "Beauty",
    "Garden",
];

const TABLES: [&str; 3] = [
    "CREATE TABLE users (id, name, age, city)",
    "CREATE TABLE products (id, name, price, category)",
    "CREATE TABLE orders (id, user_id, product_id, quantity)",
];

/// The six statement shapes the workload draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Insert,
    Select,
    Update,
    Delete,
    RangeSelect,
    BulkUpdate,
}

impl QueryKind {
    pub const ALL: [QueryKind; 6] = [
        Self::Insert,
        Self::Select,
        Self::Update,
        Self::Delete,
        Self::RangeSelect,
        Self::BulkUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Select => "select",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::RangeSelect => "range select",
            Self::BulkUpdate => "bulk update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadConfig {
    /// Random statements to run after prepopulation.
    pub queries: usize,
    /// Rows inserted into each table before the clock starts.
    pub prepopulate: usize,
    pub seed: u64,
    /// Log progress every this many statements. Zero disables it.
    pub progress_every: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            queries: 1_000_000,
            prepopulate: 50,
            seed: 42,
            progress_every: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadReport {
    /// Random statements run, prepopulation excluded.
    pub executed: usize,
    /// Statements that came back as an error.
    pub failed: usize,
    per_kind: [usize; QueryKind::ALL.len()],
    pub elapsed: Duration,
    pub bytes_before: usize,
    pub bytes_after: usize,
}

impl WorkloadReport {
    /// How many statements of `kind` were drawn.
    pub fn count(&self, kind: QueryKind) -> usize {
        self.per_kind[kind as usize]
    }
}

impl fmt::Display for WorkloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Finished processing {} queries ({} failed) in {:.3} seconds.",
            self.executed,
            self.failed,
            self.elapsed.as_secs_f64()
        )?;
        for kind in QueryKind::ALL {
            writeln!(f, "  {:<13}{}", kind.as_str(), self.count(kind))?;
        }
        let delta = self.bytes_after as i64 - self.bytes_before as i64;
        write!(
            f,
            "Memory used: {delta} bytes ({} before, {} after)",
            self.bytes_before, self.bytes_after
        )
    }
}

/// Produces random statements in the shapes of [QueryKind].
struct Generator {
    rng: StdRng,
}

impl Generator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn city(&mut self) -> &'static str {
        CITIES[self.rng.gen_range(0..CITIES.len())]
    }

    fn category(&mut self) -> &'static str {
        CATEGORIES[self.rng.gen_range(0..CATEGORIES.len())]
    }

    fn price(&mut self) -> f64 {
        50.0 + self.rng.r#gen::<f64>() * 1000.0
    }

    fn kind(&mut self) -> QueryKind {
        QueryKind::ALL[self.rng.gen_range(0..QueryKind::ALL.len())]
    }

    /// Seed rows `0..count` for each of the three tables.
    fn prepopulate(&mut self, count: usize) -> Vec<String> {
        let mut statements = Vec::with_capacity(count * 3);
        for i in 0..count {
            let age = 20 + i % 41;
            let city = self.city();
            statements.push(format!(
                "INSERT INTO users VALUES ({i}, 'User{i}', {age}, '{city}')"
            ));
        }
        for i in 0..count {
            let price = (10 + i % 990) as f64;
            let category = self.category();
            statements.push(format!(
                "INSERT INTO products VALUES ({i}, 'Product{i}', {price:.2}, '{category}')"
            ));
        }
        for i in 0..count {
            let user_id = self.rng.gen_range(0..9999);
            let product_id = self.rng.gen_range(0..9999);
            let quantity = self.rng.gen_range(1..100);
            statements.push(format!(
                "INSERT INTO orders VALUES ({i}, {user_id}, {product_id}, {quantity})"
            ));
        }
        statements
    }

    fn statement(&mut self, kind: QueryKind) -> String {
        match kind {
            QueryKind::Insert => match self.rng.gen_range(0..3) {
                0 => {
                    let id = self.rng.gen_range(10_000..20_000);
                    let age = self.rng.gen_range(20..80);
                    let city = self.city();
                    format!("INSERT INTO users VALUES ({id}, 'User{id}', {age}, '{city}')")
                }
                1 => {
                    let id = self.rng.gen_range(10_000..11_000);
                    let price = self.price();
                    let category = self.category();
                    format!(
                        "INSERT INTO products VALUES ({id}, 'Product{id}', {price}, '{category}')"
                    )
                }
                _ => {
                    let id = self.rng.gen_range(1..=10_000);
                    let user_id = self.rng.gen_range(1..=10_000);
                    let product_id = self.rng.gen_range(1..=1_000);
                    let quantity = self.rng.gen_range(1..=10);
                    format!(
                        "INSERT INTO orders VALUES ({id}, {user_id}, {product_id}, {quantity})"
                    )
                }
            },
            QueryKind::Select => {
                let table = ["users", "products", "orders"][self.rng.gen_range(0..3)];
                format!("SELECT * FROM {table}")
            }
            QueryKind::Update => match self.rng.gen_range(0..3) {
                0 => {
                    let id = self.rng.gen_range(1..=10_000);
                    let age = self.rng.gen_range(20..80);
                    format!("UPDATE users SET age = {age} WHERE id = {id}")
                }
                1 => {
                    let id = self.rng.gen_range(1..=1_000);
                    let price = self.price();
                    format!("UPDATE products SET price = {price} WHERE id = {id}")
                }
                _ => {
                    let id = self.rng.gen_range(1..=10_000);
                    let quantity = self.rng.gen_range(1..=10);
                    format!("UPDATE orders SET quantity = {quantity} WHERE id = {id}")
                }
            },
            QueryKind::Delete => match self.rng.gen_range(0..3) {
                0 => format!("DELETE FROM users WHERE id = {}", self.rng.gen_range(1..=10_000)),
                1 => format!("DELETE FROM products WHERE id = {}", self.rng.gen_range(1..=1_000)),
                _ => format!("DELETE FROM orders WHERE id = {}", self.rng.gen_range(1..=10_000)),
            },
            QueryKind::RangeSelect => {
                if self.rng.gen_bool(0.5) {
                    let min_age = self.rng.gen_range(20..40);
                    let max_age = min_age + self.rng.gen_range(0..30);
                    format!("SELECT * FROM users WHERE age > {min_age} AND age < {max_age}")
                } else {
                    let min_price = 50.0 + self.rng.r#gen::<f64>() * 200.0;
                    let max_price = min_price + self.rng.r#gen::<f64>() * 500.0;
                    format!(
                        "SELECT * FROM products WHERE price > {min_price} AND price < {max_price}"
                    )
                }
            }
            QueryKind::BulkUpdate => {
                if self.rng.gen_bool(0.5) {
                    let age = self.rng.gen_range(20..80);
                    let city = self.city();
                    format!("UPDATE users SET age = {age} WHERE city = '{city}'")
                } else {
                    let price = self.price();
                    let category = self.category();
                    format!("UPDATE products SET price = {price} WHERE category = '{category}'")
                }
            }
        }
    }
}

/// Creates the workload tables in `db`, fills them and runs the random
/// statement stream described by `config`.
///
/// Heap usage is sampled after prepopulation and again at the end.
///
/// # Errors
/// Fails if the tables cannot be created or prepopulated, for instance when
/// they already exist. Errors of random statements are only counted.
pub fn run(db: &mut Database, config: &WorkloadConfig) -> DbResult<WorkloadReport> {
    let mut generator = Generator::new(config.seed);

    for create in TABLES {
        db.execute(create)?;
    }
    for insert in generator.prepopulate(config.prepopulate) {
        db.execute(&insert)?;
    }
    info!(rows = config.prepopulate, "tables prepopulated");

    let bytes_before = db.allocated_bytes();
    let mut per_kind = [0; QueryKind::ALL.len()];
    let mut failed = 0;
    let start = Instant::now();

    for i in 0..config.queries {
        let kind = generator.kind();
        per_kind[kind as usize] += 1;

        let sql = generator.statement(kind);
        if let Err(err) = db.execute(&sql) {
            debug!(%sql, %err, "statement failed");
            failed += 1;
        }

        if config.progress_every > 0 && i % config.progress_every == 0 {
            info!(
                processed = i,
                elapsed_secs = start.elapsed().as_secs_f64(),
                "workload progress"
            );
        }
    }

    Ok(WorkloadReport {
        executed: config.queries,
        failed,
        per_kind,
        elapsed: start.elapsed(),
        bytes_before,
        bytes_after: db.allocated_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::StoreKind;

    fn small(queries: usize) -> WorkloadConfig {
        WorkloadConfig {
            queries,
            prepopulate: 50,
            seed: 7,
            progress_every: 0,
        }
    }

    #[test]
    fn test_prepopulated_tables() {
        let mut db = Database::default();
        run(&mut db, &small(0)).unwrap();

        for table in ["users", "products", "orders"] {
            assert_eq!(db.get_table(table).unwrap().len(), 50, "{table}");
        }
        let user = db.get_table("users").unwrap().get_row("7").unwrap();
        assert_eq!(user.get("name"), Some("'User7'"));
        assert_eq!(user.get("age"), Some("27"));
        let product = db.get_table("products").unwrap().get_row("3").unwrap();
        assert_eq!(product.get("price"), Some("13.00"));
    }

    #[test]
    fn test_generated_statements_never_fail() {
        for kind in StoreKind::ALL {
            let mut db = Database::new(EngineConfig::default().with_store(kind));
            let report = run(&mut db, &small(2_000)).unwrap();

            assert_eq!(report.executed, 2_000);
            assert_eq!(report.failed, 0, "{kind}");
            let drawn: usize = QueryKind::ALL.iter().map(|k| report.count(*k)).sum();
            assert_eq!(drawn, 2_000);
            for query_kind in QueryKind::ALL {
                assert!(report.count(query_kind) > 0, "{}", query_kind.as_str());
            }
        }
    }

    #[test]
    fn test_same_seed_same_tables() {
        let mut first = Database::default();
        let mut second = Database::new(EngineConfig::default().with_store(StoreKind::Chaining));
        let a = run(&mut first, &small(500)).unwrap();
        let b = run(&mut second, &small(500)).unwrap();

        for kind in QueryKind::ALL {
            assert_eq!(a.count(kind), b.count(kind));
        }
        for table in ["users", "products", "orders"] {
            let mut left: Vec<&String> = first.get_table(table).unwrap().keys().collect();
            let mut right: Vec<&String> = second.get_table(table).unwrap().keys().collect();
            left.sort();
            right.sort();
            assert_eq!(left, right, "{table}");
        }
    }

    #[test]
    fn test_tables_must_not_exist() {
        let mut db = Database::default();
        db.execute("CREATE TABLE orders (id)").unwrap();
        assert!(run(&mut db, &small(10)).is_err());
    }

    #[test]
    fn test_report_display() {
        let mut db = Database::default();
        let report = run(&mut db, &small(20)).unwrap();
        let text = report.to_string();

        assert!(text.starts_with("Finished processing 20 queries (0 failed)"));
        assert!(text.contains("range select"));
        assert!(text.contains("Memory used:"));
    }
}
