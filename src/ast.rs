use crate::predicate::ConditionEntry;

#[derive(Debug, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    InsertInto(InsertInto),
    Select(Select),
    Update(Update),
    Delete(Delete),
}

#[derive(Debug, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<String>,
}

/// Values are raw text, in declared column order.
#[derive(Debug, PartialEq)]
pub struct InsertInto {
    pub table: String,
    pub values: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub struct Select {
    pub table: String,
    pub where_clause: Vec<ConditionEntry>,
}

/// `UPDATE table SET column = value [WHERE ...]`
#[derive(Debug, PartialEq)]
pub struct Update {
    pub table: String,
    pub column: String,
    pub value: String,
    pub where_clause: Vec<ConditionEntry>,
}

#[derive(Debug, PartialEq)]
pub struct Delete {
    pub table: String,
    pub where_clause: Vec<ConditionEntry>,
}
