use crate::ast::*;
use crate::error::{DbError, DbResult};
use crate::predicate::{CompareOp, Condition, ConditionEntry, Connective};

/// Turns the words of one statement into a [Statement].
///
/// Keywords are matched case-insensitively. Table names, column names and
/// values are kept verbatim.
pub struct Parser {
    tokens: Vec<String>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(&mut self) -> DbResult<Statement> {
        let command = self
            .current_token()
            .map(str::to_string)
            .ok_or(DbError::EmptyStatement)?;

        match command.to_ascii_uppercase().as_str() {
            "CREATE" => self.parse_create_table(),
            "INSERT" => self.parse_insert(),
            "SELECT" => self.parse_select(),
            "UPDATE" => self.parse_update(),
            "DELETE" => self.parse_delete(),
            _ => Err(DbError::UnknownCommand(command)),
        }
    }

    //helpers
    fn current_token(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn consume(&mut self, keyword: &str, statement: &'static str) -> DbResult<()> {
        if self
            .current_token()
            .is_some_and(|token| token.eq_ignore_ascii_case(keyword))
        {
            self.advance();
            return Ok(());
        }
        Err(DbError::syntax(
            statement,
            format!("expected {keyword}, found {}", describe(self.current_token())),
        ))
    }

    /// Consumes any single word, used for names and values.
    fn consume_word(&mut self, what: &str, statement: &'static str) -> DbResult<String> {
        let word = self
            .current_token()
            .map(str::to_string)
            .ok_or_else(|| DbError::syntax(statement, format!("missing {what}")))?;
        self.advance();
        Ok(word)
    }

    /// Joins the remaining words, drops parentheses and splits on commas.
    fn consume_list(&mut self) -> Vec<String> {
        let joined = self.tokens[self.position..].join(" ");
        self.position = self.tokens.len();

        joined
            .replace(['(', ')'], "")
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn parse_where(&mut self, statement: &'static str) -> DbResult<Vec<ConditionEntry>> {
        if self.is_at_end() {
            return Ok(Vec::new());
        }
        self.consume("WHERE", statement)?;

        let conditions = parse_conditions(&self.tokens[self.position..], statement)?;
        self.position = self.tokens.len();
        Ok(conditions)
    }

    fn parse_create_table(&mut self) -> DbResult<Statement> {
        self.consume("CREATE", "CREATE TABLE")?;
        self.consume("TABLE", "CREATE TABLE")?;
        let name = self.consume_word("table name", "CREATE TABLE")?;

        let columns = self.consume_list();
        if columns.is_empty() {
            return Err(DbError::syntax("CREATE TABLE", "no columns declared"));
        }
        Ok(Statement::CreateTable(CreateTable { name, columns }))
    }

    fn parse_insert(&mut self) -> DbResult<Statement> {
        self.consume("INSERT", "INSERT INTO")?;
        self.consume("INTO", "INSERT INTO")?;
        let table = self.consume_word("table name", "INSERT INTO")?;
        self.consume("VALUES", "INSERT INTO")?;

        let values = self.consume_list();
        if values.is_empty() {
            return Err(DbError::syntax("INSERT INTO", "no values given"));
        }
        Ok(Statement::InsertInto(InsertInto { table, values }))
    }

    fn parse_select(&mut self) -> DbResult<Statement> {
        self.consume("SELECT", "SELECT")?;
        self.consume("*", "SELECT")?;
        self.consume("FROM", "SELECT")?;
        let table = self.consume_word("table name", "SELECT")?;
        let where_clause = self.parse_where("SELECT")?;

        Ok(Statement::Select(Select {
            table,
            where_clause,
        }))
    }

    fn parse_update(&mut self) -> DbResult<Statement> {
        self.consume("UPDATE", "UPDATE")?;
        let table = self.consume_word("table name", "UPDATE")?;
        self.consume("SET", "UPDATE")?;
        let column = self.consume_word("column", "UPDATE")?;
        self.consume("=", "UPDATE")?;
        let value = self.consume_word("value", "UPDATE")?;
        let where_clause = self.parse_where("UPDATE")?;

        Ok(Statement::Update(Update {
            table,
            column,
            value,
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> DbResult<Statement> {
        self.consume("DELETE", "DELETE")?;
        self.consume("FROM", "DELETE")?;
        let table = self.consume_word("table name", "DELETE")?;
        let where_clause = self.parse_where("DELETE")?;

        Ok(Statement::Delete(Delete {
            table,
            where_clause,
        }))
    }
}

/// Builds a flat condition list from the words following `WHERE`.
///
/// `AND` / `OR` become connectives. An operator word takes the word before it
/// as the column and the word after it as the literal; the literal may be
/// missing, in which case the condition never matches. Remaining words are
/// operands already consumed by an operator and are skipped.
///
/// # Errors
/// Returns a syntax error when an operator has no column before it.
pub fn parse_conditions<S: AsRef<str>>(
    tokens: &[S],
    statement: &'static str,
) -> DbResult<Vec<ConditionEntry>> {
    let mut conditions = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i].as_ref();
        if let Some(connective) = Connective::parse(token) {
            conditions.push(ConditionEntry::Connective(connective));
        } else if let Ok(op) = token.parse::<CompareOp>() {
            let column = i
                .checked_sub(1)
                .map(|prev| tokens[prev].as_ref().to_string())
                .ok_or_else(|| {
                    DbError::syntax(statement, format!("operator {op} has no column"))
                })?;
            let literal = tokens.get(i + 1).map(|t| t.as_ref().to_string());
            conditions.push(ConditionEntry::Compare(Condition {
                column,
                op,
                literal,
            }));
            // the literal is consumed with its operator
            i += 1;
        }
        i += 1;
    }

    Ok(conditions)
}

fn describe(token: Option<&str>) -> String {
    match token {
        Some(token) => format!("{token:?}"),
        None => "end of statement".to_string(),
    }
}
