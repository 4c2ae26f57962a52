use std::fmt;

use sea_orm::sea_query::{Alias, ColumnRef, Expr, IntoIden, SimpleExpr};

use crate::error::{ListError, ListResult};

/// A column reference taken from a field name: `column` or `table.column`.
///
/// Segments are restricted to ASCII alphanumerics and `_` and always rendered
/// as quoted identifiers, so a field name can never leak into the SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    table: Option<String>,
    column: String,
}

impl ColumnPath {
    pub fn parse(raw: &str) -> ListResult<Self> {
        let raw = raw.trim();
        let (table, column) = match raw.split_once('.') {
            Some((t, c)) => (Some(t), c),
            None => (None, raw),
        };

        let valid = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !valid(column) || !table.map_or(true, valid) {
            return Err(ListError::InvalidField(raw.to_string()));
        }

        Ok(Self {
            table: table.map(str::to_string),
            column: column.to_string(),
        })
    }

    /// Attach `table` unless the path already names one.
    pub fn qualify(mut self, table: &str) -> Self {
        if self.table.is_none() {
            self.table = Some(table.to_string());
        }
        self
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn column_ref(&self) -> ColumnRef {
        let col = Alias::new(self.column.as_str()).into_iden();
        match &self.table {
            Some(t) => ColumnRef::TableColumn(Alias::new(t.as_str()).into_iden(), col),
            None => ColumnRef::Column(col),
        }
    }

    pub fn expr(&self) -> Expr {
        Expr::col(self.column_ref())
    }

    pub fn simple_expr(&self) -> SimpleExpr {
        SimpleExpr::Column(self.column_ref())
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{}.{}", t, self.column),
            None => f.write_str(&self.column),
        }
    }
}
