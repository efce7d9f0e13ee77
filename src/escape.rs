//! 字面量转义：执行端提供的底层转义原语，以及把 `SqlValue` 渲染成 SQL 字面量。
//!
//! 本 crate 总是把值转义后内联进 SQL，不使用占位符。

use crate::value::SqlValue;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// 转义原语。通常由执行端（持有连接的一方）实现。
pub trait Escaper: dyn_clone::DynClone + std::fmt::Debug {
    /// 转义普通字符串字面量（不含外层引号）。
    fn escape_literal(&self, value: &str) -> String;

    /// 转义 LIKE 模式：先转义 `%`/`_`/`\`，再做普通字面量转义。
    fn escape_like(&self, value: &str) -> String;
}

dyn_clone::clone_trait_object!(Escaper);

/// MySQL 风格的反斜杠转义。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MySqlEscaper;

impl Escaper for MySqlEscaper {
    fn escape_literal(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 8);
        for ch in value.chars() {
            match ch {
                '\u{0000}' => out.push_str("\\0"),
                '\u{0008}' => out.push_str("\\b"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                '\u{001a}' => out.push_str("\\Z"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                _ => out.push(ch),
            }
        }
        out
    }

    fn escape_like(&self, value: &str) -> String {
        let mut pattern = String::with_capacity(value.len() + 4);
        for ch in value.chars() {
            if matches!(ch, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        self.escape_literal(&pattern)
    }
}

/// 已转义的字面量，尚未决定是否加引号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Literal {
    /// 可加引号的转义文本。
    Text(String),
    /// 永远原样输出（raw 表达式、NULL）。
    Bare(String),
}

impl Literal {
    pub(crate) fn render(self, quoted: bool) -> String {
        match self {
            Self::Text(s) if quoted => format!("'{s}'"),
            Self::Text(s) | Self::Bare(s) => s,
        }
    }
}

/// 把值转成字面量；`Null` 返回 `None`，由调用方决定丢弃还是输出 `NULL`。
pub(crate) fn literal(value: &SqlValue, escaper: &dyn Escaper) -> Option<Literal> {
    let lit = match value {
        SqlValue::Null => return None,
        SqlValue::Bool(b) => Literal::Text(if *b { "1" } else { "0" }.to_string()),
        SqlValue::I64(n) => Literal::Text(n.to_string()),
        SqlValue::U64(n) => Literal::Text(n.to_string()),
        SqlValue::F64(n) => Literal::Text(n.to_string()),
        SqlValue::String(s) => Literal::Text(escaper.escape_literal(s)),
        SqlValue::DateTime(dt) => match dt.format(DATETIME_FORMAT) {
            Ok(s) => Literal::Text(s),
            Err(err) => {
                tracing::warn!(target: "halo_query::escape", error = %err, "datetime format failed, emitting NULL");
                Literal::Bare("NULL".to_string())
            }
        },
        SqlValue::Raw(expr) => Literal::Bare(expr.clone()),
    };
    Some(lit)
}

/// INSERT/SET 用：`NULL` 输出为 `NULL`，其余加引号。
pub(crate) fn value_sql(value: &SqlValue, escaper: &dyn Escaper) -> String {
    literal(value, escaper)
        .map(|l| l.render(true))
        .unwrap_or_else(|| "NULL".to_string())
}
