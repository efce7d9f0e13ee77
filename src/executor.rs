//! 执行端接口：本 crate 只负责生成 SQL，真正的执行交给实现 [`Executor`] 的一方。

use crate::value::SqlValue;

/// 调用方期望的结果形状。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultShape {
    /// 写语句：只关心影响行数。
    #[default]
    None,
    /// 单行单列。
    Scalar,
    /// 单行多列。
    Row,
    /// 多行多列。
    Rows,
    /// 多行单列。
    Column,
}

/// 一行结果：`(列名, 值)`，保持列顺序。
pub type Row = Vec<(String, SqlValue)>;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Affected(u64),
    Scalar(Option<SqlValue>),
    Row(Option<Row>),
    Rows(Vec<Row>),
    Column(Vec<SqlValue>),
}

impl QueryOutput {
    /// 结果是否与形状匹配。
    pub fn matches(&self, shape: ResultShape) -> bool {
        matches!(
            (self, shape),
            (Self::Affected(_), ResultShape::None)
                | (Self::Scalar(_), ResultShape::Scalar)
                | (Self::Row(_), ResultShape::Row)
                | (Self::Rows(_), ResultShape::Rows)
                | (Self::Column(_), ResultShape::Column)
        )
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Affected(_) => "Affected",
            Self::Scalar(_) => "Scalar",
            Self::Row(_) => "Row",
            Self::Rows(_) => "Rows",
            Self::Column(_) => "Column",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("database error: {0}")]
    Database(String),
    #[error("executor returned {got} for expected shape {expected:?}")]
    ShapeMismatch {
        expected: ResultShape,
        got: &'static str,
    },
}

/// 执行一条已编译的 SQL。
pub trait Executor {
    fn execute(&mut self, sql: &str, shape: ResultShape) -> Result<QueryOutput, ExecuteError>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, sql: &str, shape: ResultShape) -> Result<QueryOutput, ExecuteError> {
        (**self).execute(sql, shape)
    }
}
