//! QueryIntent：调用方描述的查询意图（纯数据），由 `compiler::compile` 编译成 SQL。

use crate::alias::AliasResolver;
use crate::alias_mode::{AliasMode, default_alias_mode};
use crate::column::ColumnSpec;
use crate::executor::ResultShape;
use crate::join::{EquiJoin, Join};
use crate::value::SqlValue;
use std::fmt;
use std::str::FromStr;

pub use crate::condition::ConditionGroup;

/// 语句类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Select,
    /// 纯 INSERT，永不转换成 UPDATE。
    Insert,
    /// WHERE 非空时编译成 UPDATE，否则 INSERT。
    Upsert,
    Update,
    Delete,
    Truncate,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Upsert => "upsert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Truncate => "truncate",
        }
    }

    pub fn is_mutation(self) -> bool {
        self != Self::Select
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown query action `{0}`")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.trim().to_ascii_lowercase().as_str() {
            "select" => Self::Select,
            "insert" => Self::Insert,
            "upsert" => Self::Upsert,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "truncate" => Self::Truncate,
            _ => return Err(ParseActionError(s.to_string())),
        };
        Ok(action)
    }
}

/// 一行待写入的值，保持调用方给出的列顺序。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingRow {
    values: Vec<(String, SqlValue)>,
}

impl PendingRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置列值；列已存在时覆盖。
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for PendingRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

impl<K: Into<String>, V: Into<SqlValue>> From<Vec<(K, V)>> for PendingRow {
    fn from(v: Vec<(K, V)>) -> Self {
        v.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<SqlValue>, const N: usize> From<[(K, V); N]> for PendingRow {
    fn from(v: [(K, V); N]) -> Self {
        v.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    pub action: Option<Action>,
    pub aliases: AliasResolver,
    pub alias_mode: AliasMode,
    /// FROM 中声明的表，按声明顺序。
    pub tables: Vec<String>,
    pub columns: Vec<ColumnSpec>,
    pub distinct: bool,
    pub joins: Vec<Join>,
    pub equi_joins: Vec<EquiJoin>,
    pub wheres: Vec<ConditionGroup>,
    pub group_by: Vec<ColumnSpec>,
    pub having: Vec<ConditionGroup>,
    pub order_by: Vec<ColumnSpec>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// 所有待插入行的列的并集，按首次出现顺序。
    pub insert_columns: Vec<String>,
    pub rows: Vec<PendingRow>,
    /// UPDATE 的 SET 列表。
    pub assignments: PendingRow,
}

impl Default for QueryIntent {
    fn default() -> Self {
        Self {
            action: None,
            aliases: AliasResolver::new(),
            alias_mode: default_alias_mode(),
            tables: Vec::new(),
            columns: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            equi_joins: Vec::new(),
            wheres: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            insert_columns: Vec::new(),
            rows: Vec::new(),
            assignments: PendingRow::new(),
        }
    }
}

impl QueryIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// 声明一张 FROM 表并登记别名；重复声明无效。
    pub fn declare_table(&mut self, table: &str) {
        let table = table.trim();
        if table.is_empty() {
            return;
        }
        self.aliases.register(table);
        if !self.tables.iter().any(|t| t == table) {
            self.tables.push(table.to_string());
        }
    }

    /// 主表：第一个声明的表。
    pub fn primary_table(&self) -> Option<&str> {
        self.tables.first().map(String::as_str)
    }

    /// 追加一行待插入数据，并扩展全局列顺序。
    pub fn push_row(&mut self, row: PendingRow) {
        if row.is_empty() {
            return;
        }
        for col in row.columns() {
            if !self.insert_columns.iter().any(|c| c == col) {
                self.insert_columns.push(col.to_string());
            }
        }
        self.rows.push(row);
    }

    /// 执行结果的期望形状。没有显式列或只有 `*` 时视为多列。
    pub fn result_shape(&self, single: bool) -> ResultShape {
        match self.action {
            Some(Action::Select) => {}
            _ => return ResultShape::None,
        }
        let many = self.columns.is_empty() || self.columns.iter().any(ColumnSpec::is_star);
        match (single, many || self.columns.len() > 1) {
            (true, false) => ResultShape::Scalar,
            (true, true) => ResultShape::Row,
            (false, false) => ResultShape::Column,
            (false, true) => ResultShape::Rows,
        }
    }
}
