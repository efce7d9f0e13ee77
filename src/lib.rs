//! halo-query：把表、列、条件、JOIN 等描述编译成单条已转义 SQL（MySQL 风格）。
//!
//! 调用方通过 [`Query`] 累积查询意图，编译交给纯函数 [`compile`]；
//! 表别名（`T0, T1, …`）自动分配，隐式等值 JOIN 只在两侧表都被用到时输出。

pub mod alias;
pub mod alias_mode;
pub mod column;
#[cfg(test)]
mod column_tests;
pub mod compiler;
pub mod condition;
pub mod escape;
#[cfg(test)]
mod escape_tests;
pub mod executor;
pub mod intent;
pub mod join;
pub mod macros;
pub use crate::macros::*;
pub mod query;
#[cfg(test)]
mod query_tests;
mod string_builder;
pub mod value;

pub use crate::alias::{AliasResolver, TableId, TableRef};
pub use crate::alias_mode::{
    AliasMode, DefaultAliasModeGuard, default_alias_mode, set_default_alias_mode,
    set_default_alias_mode_scoped,
};
pub use crate::column::ColumnSpec;
pub use crate::compiler::{compile, compile_counted, compile_with};
pub use crate::condition::{
    Condition, ConditionGroup, ConditionValue, Operator, ParseOperatorError, Relation,
    WhereOptions,
};
pub use crate::escape::{Escaper, MySqlEscaper};
pub use crate::executor::{ExecuteError, Executor, QueryOutput, ResultShape, Row};
pub use crate::intent::{Action, ParseActionError, PendingRow, QueryIntent};
pub use crate::join::{EquiJoin, Join, JoinType};
pub use crate::query::{Query, QueryError};
pub use crate::value::{SqlValue, raw};
