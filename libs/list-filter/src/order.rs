use sea_orm::{sea_query::Order, EntityTrait, QueryOrder, Select};

use crate::column::ColumnPath;
use crate::error::{ListError, ListResult};

pub const MAX_ORDER_LEN: usize = 1024;
pub const MAX_ORDER_FIELDS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl From<SortDir> for Order {
    fn from(d: SortDir) -> Self {
        match d {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: ColumnPath,
    pub dir: SortDir,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderBy(pub Vec<OrderKey>);

impl OrderBy {
    /// Parse a sort clause.
    /// Format: "field1 [asc|desc], field2 [asc|desc], ..."; direction defaults to asc.
    pub fn parse(raw: &str) -> ListResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }
        if raw.len() > MAX_ORDER_LEN {
            return Err(ListError::InvalidOrder("order clause too long".into()));
        }

        let mut keys = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = part.split_whitespace().collect();
            let (field, dir) = match tokens.as_slice() {
                [field] => (*field, SortDir::Asc),
                [field, dir] if dir.eq_ignore_ascii_case("asc") => (*field, SortDir::Asc),
                [field, dir] if dir.eq_ignore_ascii_case("desc") => (*field, SortDir::Desc),
                _ => return Err(ListError::InvalidOrder(part.to_string())),
            };

            let field =
                ColumnPath::parse(field).map_err(|_| ListError::InvalidOrder(part.to_string()))?;
            keys.push(OrderKey { field, dir });
        }

        if keys.len() > MAX_ORDER_FIELDS {
            return Err(ListError::InvalidOrder("too many order fields".into()));
        }

        Ok(Self(keys))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append ORDER BY terms; unqualified fields resolve against `table`.
    pub fn apply<E: EntityTrait>(&self, select: Select<E>, table: &str) -> Select<E> {
        self.0.iter().fold(select, |s, key| {
            let col = key.field.clone().qualify(table);
            s.order_by(col.simple_expr(), key.dir.into())
        })
    }
}
