//! JOIN 声明与渲染。
//!
//! 三种形式：
//! - `Join::Raw`：调用方写好的 JOIN 子句，紧跟在左表之后原样输出；
//! - `Join::On`：结构化 JOIN，渲染成 `INNER JOIN posts AS T1 ON T0.id = T1.user_id`；
//! - `EquiJoin`：隐式等值连接，只有两侧表都在查询别处被引用时才写入 WHERE。

use crate::condition::{TableScope, qualify_key};
use std::fmt;

/// JOIN 类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    LeftOuter,
    Right,
    RightOuter,
    Cross,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::LeftOuter => "LEFT OUTER",
            Self::Right => "RIGHT",
            Self::RightOuter => "RIGHT OUTER",
            Self::Cross => "CROSS",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Join {
    Raw {
        left: String,
        sql: String,
    },
    On {
        left: String,
        right: String,
        /// `(左表列, 右表列)`；列可以带 `table.` 前缀改变所属表。
        on: Vec<(String, String)>,
        kind: JoinType,
    },
}

impl Join {
    pub fn left(&self) -> &str {
        match self {
            Self::Raw { left, .. } | Self::On { left, .. } => left,
        }
    }

    /// 结构化 JOIN 的右表。
    pub fn right(&self) -> Option<&str> {
        match self {
            Self::Raw { .. } => None,
            Self::On { right, .. } => Some(right),
        }
    }

    /// 渲染 JOIN 子句；`declared_right` 是右表在 FROM 中的声明形式（`posts AS T1`）。
    pub(crate) fn render(&self, declared_right: &str, scope: &mut dyn TableScope) -> String {
        match self {
            Self::Raw { sql, .. } => sql.trim().to_string(),
            Self::On {
                left,
                right,
                on,
                kind,
            } => {
                let mut out = format!("{kind} JOIN {declared_right}");
                let predicates: Vec<String> = on
                    .iter()
                    .map(|(lc, rc)| {
                        let l = qualify_key(lc, Some(left), scope);
                        let r = qualify_key(rc, Some(right), scope);
                        format!("{l} = {r}")
                    })
                    .collect();
                if !predicates.is_empty() {
                    out.push_str(" ON ");
                    out.push_str(&predicates.join(" AND "));
                }
                out
            }
        }
    }
}

/// 在 `join()` 之外声明的等值连接条件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquiJoin {
    pub left: String,
    pub left_col: String,
    pub right: String,
    pub right_col: String,
}

impl EquiJoin {
    pub fn new(
        left: impl Into<String>,
        left_col: impl Into<String>,
        right: impl Into<String>,
        right_col: impl Into<String>,
    ) -> Self {
        Self {
            left: left.into(),
            left_col: left_col.into(),
            right: right.into(),
            right_col: right_col.into(),
        }
    }

    pub(crate) fn render(&self, scope: &mut dyn TableScope) -> String {
        let l = qualify_key(&self.left_col, Some(&self.left), scope);
        let r = qualify_key(&self.right_col, Some(&self.right), scope);
        format!("{l} = {r}")
    }
}
