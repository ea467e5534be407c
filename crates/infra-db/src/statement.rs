//! Typed statement vocabulary for name/value parameter tables.
//!
//! Drivers receive a [`Statement`] instead of raw SQL. SQL-speaking drivers
//! render it with [`Statement::to_sql`] and bind [`Statement::params`] as
//! positional parameters; other drivers interpret it directly. Values are
//! never spliced into the statement text.

use std::fmt;

/// A two-column table: one column holds parameter names, the other values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub table: String,
    pub name_column: String,
    pub value_column: String,
}

impl TableRef {
    pub fn new(
        table: impl Into<String>,
        name_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            name_column: name_column.into(),
            value_column: value_column.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.table, self.name_column, self.value_column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Every `(name, value)` row of the table.
    SelectPairs(TableRef),

    /// Set the value of the row named `name`. Affects zero rows if absent.
    UpdateValue {
        table: TableRef,
        name: String,
        value: String,
    },

    /// Add a new row. `value` may be null.
    InsertPair {
        table: TableRef,
        name: String,
        value: Option<String>,
    },
}

impl Statement {
    pub fn table(&self) -> &TableRef {
        match self {
            Statement::SelectPairs(table)
            | Statement::UpdateValue { table, .. }
            | Statement::InsertPair { table, .. } => table,
        }
    }

    /// Whether the statement produces rows (as opposed to an update count).
    pub fn is_query(&self) -> bool {
        matches!(self, Statement::SelectPairs(_))
    }

    /// Parameterized SQL with `$n` placeholders and quoted identifiers.
    pub fn to_sql(&self) -> String {
        let t = self.table();
        let (table, name, value) = (
            quote_ident(&t.table),
            quote_ident(&t.name_column),
            quote_ident(&t.value_column),
        );
        match self {
            Statement::SelectPairs(_) => format!("SELECT {name}, {value} FROM {table}"),
            Statement::UpdateValue { .. } => {
                format!("UPDATE {table} SET {value} = $1 WHERE {name} = $2")
            }
            Statement::InsertPair { .. } => {
                format!("INSERT INTO {table} ({name}, {value}) VALUES ($1, $2)")
            }
        }
    }

    /// Positional parameters matching the placeholders of [`Self::to_sql`].
    pub fn params(&self) -> Vec<Option<&str>> {
        match self {
            Statement::SelectPairs(_) => Vec::new(),
            Statement::UpdateValue { name, value, .. } => {
                vec![Some(value.as_str()), Some(name.as_str())]
            }
            Statement::InsertPair { name, value, .. } => {
                vec![Some(name.as_str()), value.as_deref()]
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// One `(name, value)` row. Either column may be null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl Row {
    pub fn new(name: Option<&str>, value: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            value: value.map(str::to_string),
        }
    }
}
