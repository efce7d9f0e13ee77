//! 列描述解析：`field`、`COUNT(field)`、`table.field AS total`、`field DESC`。

use std::sync::OnceLock;

fn column_regex() -> &'static regex::Regex {
    static COLUMN_RE: OnceLock<regex::Regex> = OnceLock::new();
    COLUMN_RE.get_or_init(|| {
        regex::Regex::new(
            r"(?i)^\s*(?:(?P<func>[a-z_][a-z0-9_]*)\s*\(\s*(?:(?P<distinct>DISTINCT)\s+)?(?P<inner>[^()]*?)\s*\)|(?P<expr>[^\s()]+))(?:\s+(?P<modifier>[a-z_][a-z0-9_]*))?(?:\s+AS\s+(?P<alias>[a-z_][a-z0-9_]*))?\s*$",
        )
        .expect("invalid built-in column regex")
    })
}

fn qualified_regex() -> &'static regex::Regex {
    static QUALIFIED_RE: OnceLock<regex::Regex> = OnceLock::new();
    QUALIFIED_RE.get_or_init(|| {
        regex::Regex::new(r"^(?P<table>[A-Za-z_][A-Za-z0-9_]*)\.(?P<name>[A-Za-z_][A-Za-z0-9_]*|\*)$")
            .expect("invalid built-in qualified-name regex")
    })
}

/// 拆分 `table.name`；不是这种形式时原样返回。
pub(crate) fn split_qualified(expr: &str) -> (Option<String>, String) {
    match qualified_regex().captures(expr) {
        Some(caps) => (Some(caps["table"].to_string()), caps["name"].to_string()),
        None => (None, expr.to_string()),
    }
}

/// 按顶层逗号拆分列清单：`"id, COUNT(a, b) AS n"` → `["id", "COUNT(a, b) AS n"]`。
pub(crate) fn split_list(spec: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in spec.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    items.push(current);
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// 解析后的列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// 表名（或别名），渲染时解析成限定符。
    pub table: Option<String>,
    /// 聚合函数名，如 `COUNT`。
    pub function: Option<String>,
    /// 聚合函数内的 `DISTINCT`：`COUNT(DISTINCT id)`。
    pub distinct: bool,
    pub name: String,
    /// 尾随修饰，如 `DESC`。
    pub modifier: Option<String>,
    /// 输出别名（`AS xxx`）。
    pub alias: Option<String>,
    /// 无法解析的表达式，原样输出。
    verbatim: bool,
}

impl ColumnSpec {
    pub fn parse(spec: &str) -> Self {
        let Some(caps) = column_regex().captures(spec) else {
            return Self::bare(spec.trim());
        };

        let function = caps.name("func").map(|m| m.as_str().to_string());
        let expr = caps
            .name("inner")
            .or_else(|| caps.name("expr"))
            .map(|m| m.as_str())
            .unwrap_or_default();
        // 函数参数为空或是表达式（`NOW()`、`COUNT(a, b)`）时不加限定符。
        if function.is_some() && (expr.is_empty() || expr.contains([' ', '\t', ','])) {
            return Self::bare(spec.trim());
        }
        let (table, name) = split_qualified(expr);
        let modifier = caps
            .name("modifier")
            .map(|m| m.as_str())
            .filter(|m| !m.eq_ignore_ascii_case("AS"))
            .map(str::to_string);

        Self {
            table,
            function,
            distinct: caps.name("distinct").is_some(),
            name,
            modifier,
            alias: caps.name("alias").map(|m| m.as_str().to_string()),
            verbatim: false,
        }
    }

    fn bare(expr: &str) -> Self {
        Self {
            table: None,
            function: None,
            distinct: false,
            name: expr.to_string(),
            modifier: None,
            alias: None,
            verbatim: true,
        }
    }

    /// 没有显式表前缀时补上表上下文。
    pub fn with_table(mut self, table: Option<&str>) -> Self {
        if self.table.is_none() {
            self.table = table.map(str::to_string);
        }
        self
    }

    pub fn is_star(&self) -> bool {
        self.name == "*"
    }

    /// 去重用的名字：输出别名 > `FUNC(name)` > name。
    pub fn resolved_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.function {
            Some(f) => format!("{f}({}{})", self.distinct_prefix(), self.name),
            None => self.name.clone(),
        }
    }

    fn distinct_prefix(&self) -> &'static str {
        if self.distinct { "DISTINCT " } else { "" }
    }

    pub fn is_verbatim(&self) -> bool {
        self.verbatim
    }

    /// `*` 永远不加限定符。
    pub fn render(&self, qualifier: Option<&str>) -> String {
        if self.verbatim {
            return self.name.clone();
        }
        let expr = match qualifier {
            Some(q) if !self.is_star() => format!("{q}.{}", self.name),
            _ => self.name.clone(),
        };
        let mut out = match &self.function {
            Some(f) => format!("{f}({}{expr})", self.distinct_prefix()),
            None => expr,
        };
        if let Some(m) = &self.modifier {
            out.push(' ');
            out.push_str(m);
        }
        if let Some(a) = &self.alias {
            out.push_str(" AS ");
            out.push_str(a);
        }
        out
    }
}

/// 追加列；同名（resolved name）已存在时跳过。返回是否真的追加了。
pub(crate) fn push_unique(columns: &mut Vec<ColumnSpec>, spec: ColumnSpec) -> bool {
    let resolved = spec.resolved_name();
    if columns.iter().any(|c| c.resolved_name() == resolved) {
        return false;
    }
    columns.push(spec);
    true
}
