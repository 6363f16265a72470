//! The `custom` acceptance run: a five-row `student` table and eleven
//! statements whose printed output is checked against known answers.

use tracing::{debug, warn};

use crate::database::Database;
use crate::error::DbResult;

/// Statements that create and fill the `student` table.
pub const SETUP: [&str; 6] = [
    "CREATE TABLE student (id, name, age)",
    "INSERT INTO student VALUES (1, 'Jon', 22)",
    "INSERT INTO student VALUES (2, 'Mary', 25)",
    "INSERT INTO student VALUES (3, 'Jane', 23)",
    "INSERT INTO student VALUES (4, 'Tom', 28)",
    "INSERT INTO student VALUES (5, 'Ali', 22)",
];

/// One statement and the normalised lines it must print.
#[derive(Debug, Clone, Copy)]
pub struct Check {
    pub query: &'static str,
    pub expected: &'static [&'static str],
}

/// Run in order; later checks depend on the writes of earlier ones.
pub const CHECKS: [Check; 11] = [
    Check {
        query: "SELECT * FROM student",
        expected: &[
            "id name age",
            "1 'Jon' 22",
            "2 'Mary' 25",
            "3 'Jane' 23",
            "4 'Tom' 28",
            "5 'Ali' 22",
        ],
    },
    Check {
        query: "SELECT * FROM student WHERE id >= 3 AND age = 22",
        expected: &["id name age", "5 'Ali' 22"],
    },
    Check {
        query: "INSERT INTO student VALUES (6, 'Sara', 24)",
        expected: &["Row inserted into student"],
    },
    Check {
        query: "SELECT * FROM student WHERE id = 6",
        expected: &["id name age", "6 'Sara' 24"],
    },
    Check {
        query: "UPDATE student SET age = 26 WHERE id = 2",
        expected: &["Table student updated. 1 row affected."],
    },
    Check {
        query: "SELECT * FROM student WHERE id = 2",
        expected: &["id name age", "2 'Mary' 26"],
    },
    Check {
        query: "DELETE FROM student WHERE id = 4",
        expected: &["Rows deleted from student. 1 row affected."],
    },
    Check {
        query: "SELECT * FROM student WHERE id = 4",
        expected: &["id name age"],
    },
    Check {
        query: "SELECT * FROM student WHERE age >= 23",
        expected: &["id name age", "2 'Mary' 26", "3 'Jane' 23", "6 'Sara' 24"],
    },
    Check {
        query: "SELECT * FROM student WHERE id <= 3 AND age < 24",
        expected: &["id name age", "1 'Jon' 22", "3 'Jane' 23"],
    },
    Check {
        query: "SELECT * FROM student WHERE id <= 3 OR age > 25",
        expected: &["id name age", "1 'Jon' 22", "2 'Mary' 26", "3 'Jane' 23"],
    },
];

/// Result of a single [Check].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub query: &'static str,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
    pub passed: bool,
}

/// Splits output into lines, trims each and collapses inner whitespace runs
/// to one space.
pub fn normalize(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

/// The first line must match exactly. The remaining lines may come in any
/// order since rows are listed in slot order, not insertion order.
fn same_output(expected: &[String], actual: &[String]) -> bool {
    let (Some((expected_head, expected_rows)), Some((actual_head, actual_rows))) =
        (expected.split_first(), actual.split_first())
    else {
        return expected.is_empty() && actual.is_empty();
    };

    let mut expected_rows = expected_rows.to_vec();
    let mut actual_rows = actual_rows.to_vec();
    expected_rows.sort();
    actual_rows.sort();
    expected_head == actual_head && expected_rows == actual_rows
}

/// Seeds the `student` table into `db` and runs every check against it.
///
/// # Errors
/// Fails if the setup statements fail, for instance when `student` already
/// exists. Failing checks are reported in the outcomes, not as errors.
pub fn run(db: &mut Database) -> DbResult<Vec<CheckOutcome>> {
    for statement in SETUP {
        db.execute(statement)?;
    }

    let outcomes = CHECKS
        .iter()
        .map(|check| {
            debug!(query = check.query, "running check");
            let expected: Vec<String> = check.expected.iter().map(|l| l.to_string()).collect();
            let actual = normalize(&db.run(check.query));
            let passed = same_output(&expected, &actual);
            if !passed {
                warn!(query = check.query, ?expected, ?actual, "check failed");
            }
            CheckOutcome {
                query: check.query,
                expected,
                actual,
                passed,
            }
        })
        .collect();

    Ok(outcomes)
}
