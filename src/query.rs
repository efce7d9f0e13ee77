//! Query：面向调用方的 builder。
//!
//! 累积 [`QueryIntent`]，首次读取 SQL 时编译并缓存；任何修改都会清掉缓存，
//! 因此 `compile()` 读到的永远是当前意图对应的 SQL。

use crate::alias::AliasResolver;
use crate::alias_mode::AliasMode;
use crate::column::{ColumnSpec, push_unique, split_list};
use crate::compiler::compile_counted;
use crate::condition::{Condition, ConditionGroup, WhereOptions};
use crate::escape::{Escaper, MySqlEscaper};
use crate::executor::{ExecuteError, Executor, QueryOutput, ResultShape};
use crate::intent::{Action, PendingRow, QueryIntent};
use crate::join::{EquiJoin, Join, JoinType};
use crate::macros::{IntoStrings, collect_into_strings};
use crate::value::SqlValue;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("query compiled to an empty statement")]
    EmptyStatement,
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

#[derive(Debug, Clone)]
pub struct Query {
    intent: QueryIntent,
    escaper: Box<dyn Escaper>,
    compiled: Option<String>,
    counted: AliasResolver,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl From<QueryIntent> for Query {
    fn from(intent: QueryIntent) -> Self {
        Self {
            intent,
            escaper: Box::new(MySqlEscaper),
            compiled: None,
            counted: AliasResolver::new(),
        }
    }
}

fn parse_columns(columns: impl IntoStrings, table: Option<&str>) -> Vec<ColumnSpec> {
    collect_into_strings(columns)
        .iter()
        .flat_map(|s| split_list(s))
        .map(|s| ColumnSpec::parse(&s).with_table(table))
        .collect()
}

fn conditions<C: Into<Condition>>(items: impl IntoIterator<Item = C>) -> Vec<Condition> {
    items.into_iter().map(Into::into).collect()
}

impl Query {
    pub fn new() -> Self {
        QueryIntent::new().into()
    }

    /// 使用执行端提供的转义原语。
    pub fn with_escaper(escaper: impl Escaper + 'static) -> Self {
        let mut q = Self::new();
        q.escaper = Box::new(escaper);
        q
    }

    pub fn set_escaper(&mut self, escaper: Box<dyn Escaper>) -> &mut Self {
        self.compiled = None;
        self.escaper = escaper;
        self
    }

    pub fn intent(&self) -> &QueryIntent {
        &self.intent
    }

    pub fn into_intent(self) -> QueryIntent {
        self.intent
    }

    /// 所有修改都经过这里：清缓存。
    fn edit(&mut self) -> &mut QueryIntent {
        self.compiled = None;
        &mut self.intent
    }

    /// SELECT 指定表的列；`"*"` 或空列表表示全部列。
    pub fn select(&mut self, columns: impl IntoStrings, table: &str) -> &mut Self {
        let cols = parse_columns(columns, Some(table));
        let i = self.edit();
        i.action = Some(Action::Select);
        i.declare_table(table);
        i.columns.clear();
        for c in cols {
            push_unique(&mut i.columns, c);
        }
        self
    }

    /// 声明 FROM 表，按顺序分配别名。
    pub fn tables(&mut self, names: impl IntoStrings) -> &mut Self {
        let names = collect_into_strings(names);
        let i = self.edit();
        for name in names.iter().flat_map(|s| split_list(s)) {
            i.declare_table(&name);
        }
        self
    }

    /// 替换列清单。
    pub fn columns(&mut self, columns: impl IntoStrings) -> &mut Self {
        let cols = parse_columns(columns, None);
        let i = self.edit();
        i.columns.clear();
        for c in cols {
            push_unique(&mut i.columns, c);
        }
        self
    }

    /// 追加列；同名列跳过。
    pub fn columns_more(&mut self, columns: impl IntoStrings) -> &mut Self {
        let cols = parse_columns(columns, None);
        let i = self.edit();
        for c in cols {
            push_unique(&mut i.columns, c);
        }
        self
    }

    /// 追加属于 `table` 的列（没有 `table.` 前缀的列归入该表）。
    pub fn columns_for(&mut self, table: &str, columns: impl IntoStrings) -> &mut Self {
        let cols = parse_columns(columns, Some(table));
        let i = self.edit();
        i.declare_table(table);
        for c in cols {
            push_unique(&mut i.columns, c);
        }
        self
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.edit().distinct = distinct;
        self
    }

    /// 追加一组 AND 条件：`where_([("id", 5)])`。
    pub fn where_<C: Into<Condition>>(&mut self, conds: impl IntoIterator<Item = C>) -> &mut Self {
        self.where_with(WhereOptions::default(), conds)
    }

    pub fn where_with<C: Into<Condition>>(
        &mut self,
        opts: WhereOptions,
        conds: impl IntoIterator<Item = C>,
    ) -> &mut Self {
        let group = ConditionGroup::new(conditions(conds), opts);
        if !group.conditions.is_empty() {
            self.edit().wheres.push(group);
        }
        self
    }

    pub fn having<C: Into<Condition>>(&mut self, conds: impl IntoIterator<Item = C>) -> &mut Self {
        self.having_with(WhereOptions::default(), conds)
    }

    pub fn having_with<C: Into<Condition>>(
        &mut self,
        opts: WhereOptions,
        conds: impl IntoIterator<Item = C>,
    ) -> &mut Self {
        let group = ConditionGroup::new(conditions(conds), opts);
        if !group.conditions.is_empty() {
            self.edit().having.push(group);
        }
        self
    }

    /// `INNER JOIN`：`on` 为 `(左表列, 右表列)`。
    pub fn join<L, R>(
        &mut self,
        left: &str,
        right: &str,
        on: impl IntoIterator<Item = (L, R)>,
    ) -> &mut Self
    where
        L: Into<String>,
        R: Into<String>,
    {
        self.join_with(JoinType::Inner, left, right, on)
    }

    pub fn join_with<L, R>(
        &mut self,
        kind: JoinType,
        left: &str,
        right: &str,
        on: impl IntoIterator<Item = (L, R)>,
    ) -> &mut Self
    where
        L: Into<String>,
        R: Into<String>,
    {
        let on = on.into_iter().map(|(l, r)| (l.into(), r.into())).collect();
        let i = self.edit();
        i.declare_table(left);
        i.aliases.register(right);
        i.joins.push(Join::On {
            left: left.to_string(),
            right: right.to_string(),
            on,
            kind,
        });
        self
    }

    /// 原样输出的 JOIN 子句，紧跟在 `left` 之后。
    pub fn join_raw(&mut self, left: &str, sql: impl Into<String>) -> &mut Self {
        let i = self.edit();
        i.declare_table(left);
        i.joins.push(Join::Raw {
            left: left.to_string(),
            sql: sql.into(),
        });
        self
    }

    /// 隐式等值 JOIN：只有两张表都在查询别处被引用时才写入 WHERE。
    /// 不声明表；两侧表需要另行通过 `tables`/`select`/`join` 等加入查询。
    pub fn equi_join(
        &mut self,
        left: &str,
        left_col: &str,
        right: &str,
        right_col: &str,
    ) -> &mut Self {
        self.edit()
            .equi_joins
            .push(EquiJoin::new(left, left_col, right, right_col));
        self
    }

    pub fn set_table_alias(&mut self, table: &str, alias: &str) -> &mut Self {
        self.edit().aliases.set_alias(table, alias);
        self
    }

    /// 表的别名；首次调用时分配。
    pub fn alias_for(&mut self, table: &str) -> String {
        if let Some(alias) = self.intent.aliases.lookup(table) {
            return alias.to_string();
        }
        self.edit().aliases.alias_for(table)
    }

    /// 表别名在编译后的 SQL 中出现的次数（必要时先编译）。
    pub fn reference_count(&mut self, table: &str) -> usize {
        self.compile();
        self.counted.reference_count(table)
    }

    pub fn order_by(&mut self, columns: impl IntoStrings) -> &mut Self {
        let cols = parse_columns(columns, None);
        self.edit().order_by.extend(cols);
        self
    }

    pub fn order_by_for(&mut self, table: &str, columns: impl IntoStrings) -> &mut Self {
        let cols = parse_columns(columns, Some(table));
        self.edit().order_by.extend(cols);
        self
    }

    pub fn group_by(&mut self, columns: impl IntoStrings) -> &mut Self {
        let cols = parse_columns(columns, None);
        self.edit().group_by.extend(cols);
        self
    }

    pub fn group_by_for(&mut self, table: &str, columns: impl IntoStrings) -> &mut Self {
        let cols = parse_columns(columns, Some(table));
        self.edit().group_by.extend(cols);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.edit().limit = Some(limit);
        self
    }

    /// 只在设置了 LIMIT 时输出。
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.edit().offset = Some(offset);
        self
    }

    /// 追加一行并设为 upsert：编译时 WHERE 非空则输出 UPDATE（用第一行作 SET），否则 INSERT。
    pub fn insert(&mut self, fields: impl Into<PendingRow>) -> &mut Self {
        self.upsert(fields)
    }

    pub fn upsert(&mut self, fields: impl Into<PendingRow>) -> &mut Self {
        let i = self.edit();
        i.action = Some(Action::Upsert);
        i.push_row(fields.into());
        self
    }

    /// 纯 INSERT，可多行；不会转换成 UPDATE。
    pub fn insert_rows<R: Into<PendingRow>>(&mut self, rows: impl IntoIterator<Item = R>) -> &mut Self {
        let i = self.edit();
        i.action = Some(Action::Insert);
        for row in rows {
            i.push_row(row.into());
        }
        self
    }

    /// 列名 + 按列顺序的值元组。值多于列时多余部分丢弃，少于列时缺的列输出 `DEFAULT`。
    pub fn insert_multi(
        &mut self,
        columns: impl IntoStrings,
        values: impl IntoIterator<Item = Vec<SqlValue>>,
    ) -> &mut Self {
        let columns = collect_into_strings(columns);
        let rows: Vec<PendingRow> = values
            .into_iter()
            .map(|tuple| {
                if tuple.len() > columns.len() {
                    tracing::warn!(target: "halo_query::query", columns = columns.len(), values = tuple.len(), "extra values in insert tuple dropped");
                }
                columns.iter().cloned().zip(tuple).collect()
            })
            .collect();
        let i = self.edit();
        for c in &columns {
            if !i.insert_columns.contains(c) {
                i.insert_columns.push(c.clone());
            }
        }
        self.insert_rows(rows)
    }

    /// UPDATE：`items` 作为 SET 列表，`wheres` 追加为一组 AND 条件。
    pub fn update<C: Into<Condition>>(
        &mut self,
        items: impl Into<PendingRow>,
        wheres: impl IntoIterator<Item = C>,
    ) -> &mut Self {
        let items: PendingRow = items.into();
        let i = self.edit();
        i.action = Some(Action::Update);
        for (col, v) in items.iter() {
            i.assignments.set(col, v.clone());
        }
        self.where_(wheres)
    }

    pub fn delete<C: Into<Condition>>(
        &mut self,
        conds: impl IntoIterator<Item = C>,
        table: &str,
    ) -> &mut Self {
        let i = self.edit();
        i.action = Some(Action::Delete);
        i.declare_table(table);
        self.where_(conds)
    }

    pub fn truncate(&mut self, table: &str) -> &mut Self {
        let i = self.edit();
        i.action = Some(Action::Truncate);
        i.declare_table(table);
        self
    }

    /// 按动词设置语句类型；无法识别时清空动作，编译结果为空串。
    pub fn action(&mut self, verb: &str) -> &mut Self {
        let action = match verb.parse::<Action>() {
            Ok(action) => Some(action),
            Err(err) => {
                tracing::warn!(target: "halo_query::query", error = %err, "unrecognized action, query will compile to nothing");
                None
            }
        };
        self.edit().action = action;
        self
    }

    pub fn set_action(&mut self, action: Action) -> &mut Self {
        self.edit().action = Some(action);
        self
    }

    pub fn set_alias_mode(&mut self, mode: AliasMode) -> &mut Self {
        self.edit().alias_mode = mode;
        self
    }

    /// 编译（或返回缓存的）SQL；无法编译时为空串。
    pub fn compile(&mut self) -> &str {
        let Self {
            intent,
            escaper,
            compiled,
            counted,
        } = self;
        compiled.get_or_insert_with(|| {
            let (sql, refs) = compile_counted(intent, &**escaper);
            *counted = refs;
            sql
        })
    }

    /// 丢弃缓存并重新编译。
    pub fn recompile(&mut self) -> &str {
        self.compiled = None;
        self.compile()
    }

    pub fn try_compile(&mut self) -> Result<String, QueryError> {
        match self.compile() {
            "" => Err(QueryError::EmptyStatement),
            sql => Ok(sql.to_string()),
        }
    }

    /// 上一次编译的结果，不触发编译。
    pub fn export(&self) -> Option<&str> {
        self.compiled.as_deref()
    }

    /// 清空全部意图与缓存，保留转义原语。
    pub fn reset(&mut self) -> &mut Self {
        self.intent = QueryIntent::new();
        self.compiled = None;
        self.counted = AliasResolver::new();
        self
    }

    pub fn result_shape(&self, single: bool) -> ResultShape {
        self.intent.result_shape(single)
    }

    /// 编译并交给执行端；空语句不会被发送。
    pub fn query<E: Executor + ?Sized>(
        &mut self,
        executor: &mut E,
        single: bool,
    ) -> Result<QueryOutput, QueryError> {
        let shape = self.result_shape(single);
        let sql = self.try_compile()?;
        tracing::debug!(target: "halo_query::query", shape = ?shape, sql = %sql, "executing query");
        let output = executor.execute(&sql, shape)?;
        if !output.matches(shape) {
            return Err(ExecuteError::ShapeMismatch {
                expected: shape,
                got: output.kind(),
            }
            .into());
        }
        Ok(output)
    }
}
