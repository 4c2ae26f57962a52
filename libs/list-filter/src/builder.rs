//! Fluent accumulation of request-driven predicates and their execution.

use std::collections::BTreeSet;

use sea_orm::{
    sea_query::{Alias, DynIden, Expr, TableRef},
    ConnectionTrait, EntityTrait, FromQueryResult, IdenStatic, Iterable, JoinType,
    PaginatorTrait, PrimaryKeyToColumn, QueryFilter, QuerySelect, Related, RelationDef,
    RelationTrait, Select, Value,
};

use crate::column::ColumnPath;
use crate::error::{ListError, ListResult};
use crate::next_link::next_url;
use crate::order::OrderBy;
use crate::page::Listing;
use crate::params::{ParamSource, RequestParams};
use crate::settings::ListSettings;

/// Produces a fresh [`RelationDef`] each time a query is composed.
type RelationFn = Box<dyn Fn() -> RelationDef + Send + Sync>;

/// Eager-loaded to-one relation: aliased LEFT JOIN on the page query plus
/// `<table>_<column>` projections.
struct Preload {
    relation: RelationFn,
    table: String,
    columns: Vec<String>,
    key: BTreeSet<String>,
}

impl Preload {
    fn alias(&self) -> String {
        format!("preload_{}", self.table)
    }

    /// The relation must land on the target's primary key, so it yields at
    /// most one row per parent and never multiplies the page.
    fn to_one(&self) -> ListResult<RelationDef> {
        let rel = (self.relation)();
        let target = table_name(&rel.to_tbl);
        let cols: BTreeSet<String> = rel
            .to_col
            .clone()
            .into_iter()
            .map(|c| iden_name(&c))
            .collect();
        if target.as_deref() != Some(self.table.as_str()) || cols != self.key {
            return Err(ListError::InvalidPreload(self.table.clone()));
        }
        Ok(rel)
    }
}

fn table_name(table: &TableRef) -> Option<String> {
    match table {
        TableRef::Table(t)
        | TableRef::SchemaTable(_, t)
        | TableRef::DatabaseSchemaTable(_, _, t)
        | TableRef::TableAlias(t, _)
        | TableRef::SchemaTableAlias(_, t, _)
        | TableRef::DatabaseSchemaTableAlias(_, _, t, _) => Some(iden_name(t)),
        _ => None,
    }
}

fn iden_name(iden: &DynIden) -> String {
    use sea_orm::sea_query::Iden;
    iden.to_string()
}

/// The two statements a listing runs.
#[derive(Clone, Debug)]
pub struct ComposedQuery<E: EntityTrait> {
    /// All WHERE/JOIN constraints, no ordering or window. Counted.
    pub filtered: Select<E>,
    /// `filtered` plus preloads, ORDER BY, LIMIT and OFFSET. Fetched.
    pub page: Select<E>,
}

/// Per-request list builder over entity `E`.
///
/// Configuration methods only record intent; field names and the order clause
/// are checked when the query is composed. [`ListFilter::find`] consumes the
/// builder, so a listing executes at most once.
pub struct ListFilter<E: EntityTrait> {
    select: Select<E>,
    params: RequestParams,
    api_prefix: String,
    filters: Vec<String>,
    wheres: Vec<(String, Value)>,
    likes: Vec<String>,
    wheres_raw: Vec<(String, Value)>,
    aliases: Vec<(String, String)>,
    preloads: Vec<Preload>,
    joins: Vec<RelationFn>,
    order: String,
    offset: u64,
    limit: u64,
}

// map-shaped state: last write wins, first insertion keeps its position
fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

fn table_of<E: EntityTrait>() -> String {
    E::default().table_name().to_string()
}

impl<E: EntityTrait> ListFilter<E> {
    pub fn new(params: RequestParams, settings: &ListSettings) -> Self {
        Self::from_select(E::find(), params, settings)
    }

    /// Start from an already scoped select instead of `E::find()`.
    pub fn from_select(select: Select<E>, params: RequestParams, settings: &ListSettings) -> Self {
        let offset = params.window_value("offset", 0);
        let limit = settings.clamp_limit(params.window_value("limit", settings.default_limit));

        Self {
            select,
            params,
            api_prefix: settings.api_prefix.clone(),
            filters: Vec::new(),
            wheres: Vec::new(),
            likes: Vec::new(),
            wheres_raw: Vec::new(),
            aliases: Vec::new(),
            preloads: Vec::new(),
            joins: Vec::new(),
            order: settings.default_order.clone(),
            offset,
            limit,
        }
        .order_auto()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    /// Fields whose non-empty request values become `field = value`.
    pub fn filters<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Unconditional `field = value`, independent of the request.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        upsert(&mut self.wheres, field.into(), value.into());
        self
    }

    /// Field whose non-empty request value becomes `field LIKE '%value%'`.
    pub fn like(mut self, field: impl Into<String>) -> Self {
        self.likes.push(field.into());
        self
    }

    pub fn likes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.likes.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Expression applied verbatim with `value` bound to its `?` placeholder.
    /// The expression text must come from the call site, never from the request.
    pub fn where_raw(mut self, expr: impl Into<String>, value: impl Into<Value>) -> Self {
        upsert(&mut self.wheres_raw, expr.into(), value.into());
        self
    }

    /// Request parameter `param`, when non-empty, becomes `field = value`.
    pub fn alias(mut self, param: impl Into<String>, field: impl Into<String>) -> Self {
        upsert(&mut self.aliases, param.into(), field.into());
        self
    }

    /// INNER JOIN `R`; it constrains both the count and the page.
    pub fn join<R>(self) -> Self
    where
        R: EntityTrait,
        E: Related<R>,
    {
        self.join_with(<E as Related<R>>::to)
    }

    /// INNER JOIN each relation in turn.
    pub fn joins<I, T>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: RelationTrait + Send + Sync,
    {
        for rel in relations {
            self.joins.push(Box::new(move || rel.def()));
        }
        self
    }

    /// INNER JOIN a relation built by `relation`, e.g. a reversed one.
    pub fn join_with<F>(mut self, relation: F) -> Self
    where
        F: Fn() -> RelationDef + Send + Sync + 'static,
    {
        self.joins.push(Box::new(relation));
        self
    }

    /// Eager-load the `R` that each row points to: LEFT JOIN on the page query
    /// only and select every column of `R` as `<table>_<column>` so the
    /// destination type can pick them up.
    pub fn preload<R>(self) -> Self
    where
        R: EntityTrait,
        E: Related<R>,
    {
        self.preload_with::<R, _>(<E as Related<R>>::to)
    }

    /// [`ListFilter::preload`] through an explicit relation. Relations that do
    /// not end on `R`'s primary key fail with [`ListError::InvalidPreload`].
    pub fn preload_with<R, F>(mut self, relation: F) -> Self
    where
        R: EntityTrait,
        F: Fn() -> RelationDef + Send + Sync + 'static,
    {
        self.preloads.push(Preload {
            relation: Box::new(relation),
            table: table_of::<R>(),
            columns: R::Column::iter().map(|c| c.as_str().to_string()).collect(),
            key: R::PrimaryKey::iter()
                .map(|k| k.into_column().as_str().to_string())
                .collect(),
        });
        self
    }

    pub fn order(mut self, clause: impl Into<String>) -> Self {
        self.order = clause.into();
        self
    }

    /// Take the order clause from the `order` request parameter when non-empty.
    pub fn order_auto(self) -> Self {
        match self.params.non_empty("order").map(str::to_string) {
            Some(o) => self.order(o),
            None => self,
        }
    }

    /// Let the caller rewrite the underlying query right away, before any
    /// request predicate is applied (e.g. to scope rows by caller identity).
    pub fn apply_access_filter<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(Select<E>) -> Select<E>,
    {
        self.select = hook(self.select);
        self
    }

    fn field(&self, name: &str, table: &str) -> ListResult<ColumnPath> {
        Ok(ColumnPath::parse(name)?.qualify(table))
    }

    /// Translate the accumulated state into the count and page statements.
    pub fn compose(&self) -> ListResult<ComposedQuery<E>> {
        let table = table_of::<E>();
        let mut q = self.select.clone();

        for name in &self.filters {
            if let Some(v) = self.params.non_empty(name) {
                q = q.filter(self.field(name, &table)?.expr().eq(v));
            }
        }

        for (name, v) in &self.wheres {
            q = q.filter(self.field(name, &table)?.expr().eq(v.clone()));
        }

        for name in &self.likes {
            if let Some(v) = self.params.non_empty(name) {
                q = q.filter(self.field(name, &table)?.expr().like(format!("%{v}%")));
            }
        }

        for (expr, v) in &self.wheres_raw {
            q = q.filter(Expr::cust_with_values(expr.as_str(), [v.clone()]));
        }

        for (param, name) in &self.aliases {
            if let Some(v) = self.params.non_empty(param) {
                q = q.filter(self.field(name, &table)?.expr().eq(v));
            }
        }

        for rel in &self.joins {
            q = q.join(JoinType::InnerJoin, rel());
        }

        let order = OrderBy::parse(&self.order)?;
        let mut page = order.apply(q.clone(), &table);

        for p in &self.preloads {
            let alias = p.alias();
            page = page.join_as(
                JoinType::LeftJoin,
                p.to_one()?,
                Alias::new(alias.as_str()),
            );
            for col in &p.columns {
                let src = ColumnPath::parse(col)?.qualify(&alias);
                page = page.column_as(src.simple_expr(), format!("{}_{}", p.table, col));
            }
        }

        let page = page.limit(self.limit).offset(self.offset);

        Ok(ComposedQuery { filtered: q, page })
    }

    /// Run the count and the page fetch, materializing rows as `M`.
    pub async fn find<'db, M, C>(self, conn: &'db C) -> ListResult<Listing<M>>
    where
        M: FromQueryResult,
        C: ConnectionTrait,
        E::Model: Sync + 'db,
    {
        let ComposedQuery { filtered, page } = self.compose()?;

        let rows_count = filtered.count(conn).await?;
        let items = page.into_model::<M>().all(conn).await?;

        let next_url = next_url(
            &self.api_prefix,
            &self.params,
            self.offset,
            self.limit,
            &self.filters,
        );

        tracing::debug!(
            table = %table_of::<E>(),
            rows_count,
            offset = self.offset,
            limit = self.limit,
            fetched = items.len(),
            "list query executed"
        );

        Ok(Listing {
            items,
            rows_count,
            offset: self.offset,
            limit: self.limit,
            next_url,
        })
    }

    /// [`ListFilter::find`] into the entity's own model.
    pub async fn find_models<'db, C>(self, conn: &'db C) -> ListResult<Listing<E::Model>>
    where
        C: ConnectionTrait,
        E::Model: Sync + 'db,
    {
        self.find::<E::Model, C>(conn).await
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod builder_tests;
