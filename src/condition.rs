//! 条件描述与条件解析：把 `Condition` 渲染成 `key op value` 片段。
//!
//! 渲染规则（按优先级）：
//! 1. 列表值 + `BETWEEN` → `'<v0>' AND '<v1>'`；
//! 2. 其余列表值默认 `IN`，过滤掉 NULL/空串后为空则整条条件被丢弃；
//! 3. 布尔值转为 `1`/`0`；
//! 4. 文本是 `SELECT` 语句时作为子查询加括号、不加引号；
//! 5. `LIKE` 做 LIKE 转义并包上 `%…%`，其余做普通字面量转义；
//! 6. 除非分组声明了 unquoted，否则值加单引号。

use crate::column::split_qualified;
use crate::escape::{Escaper, Literal, literal};
use crate::value::SqlValue;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// 比较运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqualThan,
    LessThan,
    LessEqualThan,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::GreaterThan => ">",
            Self::GreaterEqualThan => ">=",
            Self::LessThan => "<",
            Self::LessEqualThan => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    fn is_between(self) -> bool {
        matches!(self, Self::Between | Self::NotBetween)
    }

    fn is_null_check(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    fn is_like(self) -> bool {
        matches!(self, Self::Like | Self::NotLike)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compare operator `{0}`")]
pub struct ParseOperatorError(pub String);

impl FromStr for Operator {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let op = match normalized.to_ascii_uppercase().as_str() {
            "=" | "==" => Self::Equal,
            "!=" | "<>" => Self::NotEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterEqualThan,
            "<" => Self::LessThan,
            "<=" => Self::LessEqualThan,
            "LIKE" => Self::Like,
            "NOT LIKE" => Self::NotLike,
            "IN" => Self::In,
            "NOT IN" => Self::NotIn,
            "BETWEEN" => Self::Between,
            "NOT BETWEEN" => Self::NotBetween,
            "IS NULL" => Self::IsNull,
            "IS NOT NULL" => Self::IsNotNull,
            _ => return Err(ParseOperatorError(s.to_string())),
        };
        Ok(op)
    }
}

/// 同一分组内条件之间的布尔关系。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Relation {
    #[default]
    And,
    Or,
}

impl Relation {
    fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// 条件值，支持单值或列表值。
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Single(SqlValue),
    List(Vec<SqlValue>),
}

impl ConditionValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::List(v) if v.is_empty())
    }
}

impl Default for ConditionValue {
    fn default() -> Self {
        Self::Single(SqlValue::Null)
    }
}

impl<T: Into<SqlValue>> From<T> for ConditionValue {
    fn from(v: T) -> Self {
        Self::Single(v.into())
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for ConditionValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>, const N: usize> From<[T; N]> for ConditionValue {
    fn from(v: [T; N]) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// 一条条件描述。
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field op value`；`operator` 为 `None` 时按值推断（标量 `=`，列表 `IN`）。
    Compare {
        field: String,
        operator: Option<Operator>,
        value: ConditionValue,
    },
    /// 按表分组的条件：表能解析时列名用该表别名限定，且值不加引号。
    Table {
        table: String,
        conditions: Vec<Condition>,
    },
    /// 原样输出的 SQL 片段。
    Raw(String),
}

impl Condition {
    /// 按值推断运算符。
    ///
    /// 注意：以 `SELECT` 开头的文本值会被当成子查询原样输出，不做转义。
    /// 不可信的输入不要以文本直接传入；确实要写子查询时用 [`Condition::raw`]
    /// 或 [`crate::raw`] 表明意图。
    pub fn value(field: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        Self::Compare {
            field: field.into(),
            operator: None,
            value: value.into(),
        }
    }

    pub fn compare(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self::Compare {
            field: field.into(),
            operator: Some(operator),
            value: value.into(),
        }
    }

    /// `field = value`。文本值以 `SELECT` 开头时按子查询输出，见 [`Condition::value`]。
    pub fn eq(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(field, Operator::Equal, value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(field, Operator::NotEqual, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(field, Operator::GreaterThan, value.into())
    }

    pub fn ge(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(field, Operator::GreaterEqualThan, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(field, Operator::LessThan, value.into())
    }

    pub fn le(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(field, Operator::LessEqualThan, value.into())
    }

    pub fn like(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(field, Operator::Like, value.into())
    }

    pub fn not_like(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(field, Operator::NotLike, value.into())
    }

    pub fn in_<T: Into<SqlValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        Self::compare(field, Operator::In, ConditionValue::List(values))
    }

    pub fn not_in<T: Into<SqlValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        Self::compare(field, Operator::NotIn, ConditionValue::List(values))
    }

    pub fn between(
        field: impl Into<String>,
        lower: impl Into<SqlValue>,
        upper: impl Into<SqlValue>,
    ) -> Self {
        Self::compare(
            field,
            Operator::Between,
            ConditionValue::List(vec![lower.into(), upper.into()]),
        )
    }

    pub fn not_between(
        field: impl Into<String>,
        lower: impl Into<SqlValue>,
        upper: impl Into<SqlValue>,
    ) -> Self {
        Self::compare(
            field,
            Operator::NotBetween,
            ConditionValue::List(vec![lower.into(), upper.into()]),
        )
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::compare(field, Operator::IsNull, ConditionValue::default())
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::compare(field, Operator::IsNotNull, ConditionValue::default())
    }

    pub fn table(
        table: impl Into<String>,
        conditions: impl IntoIterator<Item = impl Into<Condition>>,
    ) -> Self {
        Self::Table {
            table: table.into(),
            conditions: conditions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }
}

/// 扁平 `{column: value}` 形式。
impl<K: Into<String>, V: Into<ConditionValue>> From<(K, V)> for Condition {
    fn from((field, value): (K, V)) -> Self {
        Self::value(field, value)
    }
}

/// `where_with` 的可选项。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereOptions {
    pub relation: Relation,
    pub table: Option<String>,
    pub unquoted: bool,
}

impl WhereOptions {
    pub fn relation(mut self, relation: Relation) -> Self {
        self.relation = relation;
        self
    }

    pub fn or(self) -> Self {
        self.relation(Relation::Or)
    }

    /// 列名用该表的别名限定。
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// 值不加引号（数字、标识符、已限定的列引用）。
    pub fn unquoted(mut self, unquoted: bool) -> Self {
        self.unquoted = unquoted;
        self
    }
}

/// 一次 `where`/`having` 调用产生的条件分组。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionGroup {
    pub conditions: Vec<Condition>,
    pub relation: Relation,
    pub table: Option<String>,
    pub unquoted: bool,
}

impl ConditionGroup {
    pub fn new(conditions: Vec<Condition>, opts: WhereOptions) -> Self {
        Self {
            conditions,
            relation: opts.relation,
            table: opts.table,
            unquoted: opts.unquoted,
        }
    }
}

/// 渲染条件时对表的解析。
pub(crate) trait TableScope {
    /// 返回表（或别名）在输出中的限定符，并计一次引用；不需要限定或无法解析时返回 `None`。
    fn qualify(&mut self, table: &str) -> Option<String>;

    /// 表名或别名是否已声明。
    fn resolves(&self, table: &str) -> bool;
}

fn subquery_regex() -> &'static regex::Regex {
    static SUBQUERY_RE: OnceLock<regex::Regex> = OnceLock::new();
    SUBQUERY_RE.get_or_init(|| {
        regex::Regex::new(r"(?is)^\s*\(?\s*SELECT\s").expect("invalid built-in subquery regex")
    })
}

pub(crate) fn is_subquery(text: &str) -> bool {
    subquery_regex().is_match(text)
}

fn wrap_subquery(text: &str) -> String {
    let t = text.trim();
    if t.starts_with('(') && t.ends_with(')') {
        t.to_string()
    } else {
        format!("({t})")
    }
}

/// 渲染一个分组；没有任何条件生效时返回 `None`。
pub(crate) fn render_group(
    group: &ConditionGroup,
    scope: &mut dyn TableScope,
    escaper: &dyn Escaper,
) -> Option<String> {
    let mut nodes = Vec::new();
    for cond in &group.conditions {
        collect_nodes(
            cond,
            group.table.as_deref(),
            !group.unquoted,
            scope,
            escaper,
            &mut nodes,
        );
    }
    if nodes.is_empty() {
        return None;
    }
    Some(format!("({})", nodes.join(group.relation.separator())))
}

fn collect_nodes(
    cond: &Condition,
    context_table: Option<&str>,
    quoted: bool,
    scope: &mut dyn TableScope,
    escaper: &dyn Escaper,
    out: &mut Vec<String>,
) {
    match cond {
        Condition::Raw(sql) => {
            if !sql.trim().is_empty() {
                out.push(sql.clone());
            }
        }
        Condition::Compare {
            field,
            operator,
            value,
        } => {
            if field.is_empty() {
                return;
            }
            let Some(rhs) = render_rhs(*operator, value, quoted, escaper) else {
                tracing::debug!(target: "halo_query::condition", field = %field, "condition evaluated to nothing, dropped");
                return;
            };
            let key = qualify_key(field, context_table, scope);
            out.push(format!("{key} {rhs}"));
        }
        Condition::Table { table, conditions } => {
            let (ctx, quoted) = if scope.resolves(table) {
                (Some(table.as_str()), false)
            } else {
                tracing::warn!(target: "halo_query::condition", table = %table, "condition group references an undeclared table");
                (None, quoted)
            };
            for c in conditions {
                collect_nodes(c, ctx, quoted, scope, escaper, out);
            }
        }
    }
}

/// `t.col` 按前缀限定；否则按上下文表限定。
pub(crate) fn qualify_key(
    field: &str,
    context_table: Option<&str>,
    scope: &mut dyn TableScope,
) -> String {
    if let (Some(prefix), name) = split_qualified(field) {
        return match scope.qualify(&prefix) {
            Some(q) => format!("{q}.{name}"),
            None => field.to_string(),
        };
    }
    match context_table.and_then(|t| scope.qualify(t)) {
        Some(q) => format!("{q}.{field}"),
        None => field.to_string(),
    }
}

/// 渲染运算符右侧（`= '5'`、`IN ('a','b')`、`IS NULL` …）；条件应被丢弃时返回 `None`。
pub(crate) fn render_rhs(
    operator: Option<Operator>,
    value: &ConditionValue,
    quoted: bool,
    escaper: &dyn Escaper,
) -> Option<String> {
    if let Some(op) = operator.filter(|op| op.is_null_check()) {
        return Some(op.as_str().to_string());
    }

    match value {
        ConditionValue::List(items) => {
            let op = match operator {
                None | Some(Operator::Equal) => Operator::In,
                Some(Operator::NotEqual) => Operator::NotIn,
                Some(op) => op,
            };
            if op.is_between() {
                let [lower, upper, ..] = items.as_slice() else {
                    return None;
                };
                let lower = literal(lower, escaper)?.render(quoted);
                let upper = literal(upper, escaper)?.render(quoted);
                return Some(format!("{op} {lower} AND {upper}"));
            }
            let rendered: Vec<String> = items
                .iter()
                .filter(|v| !v.is_blank())
                .filter_map(|v| literal(v, escaper))
                .map(|l| l.render(quoted))
                .collect();
            if rendered.is_empty() {
                return None;
            }
            Some(format!("{op} ({})", rendered.join(",")))
        }
        ConditionValue::Single(v) => {
            let op = operator.unwrap_or(Operator::Equal);
            if op.is_between() || v.is_null() {
                return None;
            }
            if let SqlValue::String(s) = v
                && is_subquery(s)
            {
                return Some(format!("{op} {}", wrap_subquery(s)));
            }
            let lit = if op.is_like() {
                match v {
                    SqlValue::String(s) => {
                        Literal::Text(format!("%{}%", escaper.escape_like(s.trim())))
                    }
                    other => match literal(other, escaper)? {
                        Literal::Text(t) => Literal::Text(format!("%{t}%")),
                        bare => bare,
                    },
                }
            } else {
                literal(v, escaper)?
            };
            let rendered = lit.render(quoted);
            if matches!(op, Operator::In | Operator::NotIn) {
                Some(format!("{op} ({rendered})"))
            } else {
                Some(format!("{op} {rendered}"))
            }
        }
    }
}
