//! 编译器：把 [`QueryIntent`] 编译成单条已转义的 SQL。
//!
//! 编译是纯函数：不修改输入，同一个 intent 总是得到同一条 SQL。
//! 别名引用计数在编译过程中累加（只在别名真正写进 SQL 时计数），
//! 隐式等值 JOIN 在其余子句都渲染完之后才根据计数决定是否输出。

use crate::alias::{AliasResolver, TableId};
use crate::alias_mode::AliasMode;
use crate::column::ColumnSpec;
use crate::condition::{ConditionGroup, TableScope, qualify_key, render_group};
use crate::escape::{Escaper, MySqlEscaper, value_sql};
use crate::intent::{Action, PendingRow, QueryIntent};
use crate::join::Join;
use crate::string_builder::{StringBuilder, join_non_empty};
use std::collections::HashSet;

/// 用默认的 MySQL 转义编译。
pub fn compile(intent: &QueryIntent) -> String {
    compile_with(intent, &MySqlEscaper)
}

pub fn compile_with(intent: &QueryIntent, escaper: &dyn Escaper) -> String {
    compile_counted(intent, escaper).0
}

/// 编译，并返回带本次引用计数的别名表。
pub fn compile_counted(intent: &QueryIntent, escaper: &dyn Escaper) -> (String, AliasResolver) {
    let mut scope = Scope::new(intent);
    let sql = match intent.action {
        None => String::new(),
        Some(_) if intent.tables.is_empty() => {
            tracing::warn!(target: "halo_query::compile", "no table declared, nothing to compile");
            String::new()
        }
        Some(Action::Select) => compile_select(intent, &mut scope, escaper),
        Some(Action::Insert) => {
            if !intent.wheres.is_empty() {
                tracing::warn!(target: "halo_query::compile", "WHERE is ignored by a plain INSERT");
            }
            compile_insert(intent, escaper)
        }
        Some(Action::Upsert) => compile_upsert(intent, &mut scope, escaper),
        Some(Action::Update) => compile_update(intent, &intent.assignments, &mut scope, escaper),
        Some(Action::Delete) => compile_delete(intent, &mut scope, escaper),
        Some(Action::Truncate) => compile_truncate(intent),
    };
    tracing::debug!(
        target: "halo_query::compile",
        action = ?intent.action,
        tables = intent.tables.len(),
        alias_mode = %intent.alias_mode,
        sql = %sql,
        "compiled query"
    );
    (sql, scope.aliases)
}

/// 真正出现在 FROM/JOIN 里的表数；只登记过别名的表不算。
fn tables_in_query(intent: &QueryIntent) -> usize {
    let mut seen: HashSet<&str> = intent.tables.iter().map(String::as_str).collect();
    seen.extend(intent.joins.iter().filter_map(Join::right));
    seen.len()
}

/// 编译期的表解析：持有一份清零了引用计数的别名表。
#[derive(Debug, Clone)]
struct Scope {
    aliases: AliasResolver,
    mode: AliasMode,
    active: bool,
}

impl Scope {
    fn new(intent: &QueryIntent) -> Self {
        let mut aliases = intent.aliases.clone();
        aliases.clear_references();
        let active = intent.alias_mode.qualifies(tables_in_query(intent));
        Self {
            aliases,
            mode: intent.alias_mode,
            active,
        }
    }

    fn resolve(&self, table: &str) -> Option<TableId> {
        self.aliases
            .find(table)
            .or_else(|| self.aliases.find_by_alias(table))
    }

    fn references(&self, table: &str) -> usize {
        self.resolve(table)
            .map(|id| self.aliases.get(id).references())
            .unwrap_or(0)
    }

    /// FROM/JOIN 中的表声明：`users AS T0`，限定符与表名相同时只输出表名。不计引用。
    fn declaration(&self, table: &str) -> String {
        let Some(id) = self.resolve(table) else {
            return table.to_string();
        };
        let t = self.aliases.get(id);
        let qualifier = t.qualifier(self.mode);
        if self.active && qualifier != t.name {
            format!("{} AS {qualifier}", t.name)
        } else {
            t.name.clone()
        }
    }

    fn column(&mut self, col: &ColumnSpec) -> String {
        if col.is_star() || col.is_verbatim() {
            return col.render(None);
        }
        let qualifier = col.table.as_deref().and_then(|t| self.qualify(t));
        col.render(qualifier.as_deref())
    }
}

impl TableScope for Scope {
    fn qualify(&mut self, table: &str) -> Option<String> {
        let Some(id) = self.resolve(table) else {
            tracing::warn!(target: "halo_query::alias", table = %table, "table is not declared in this query, emitting unqualified");
            return None;
        };
        if !self.active {
            return None;
        }
        self.aliases.reference(id);
        Some(self.aliases.get(id).qualifier(self.mode).to_string())
    }

    fn resolves(&self, table: &str) -> bool {
        self.resolve(table).is_some()
    }
}

fn compile_select(intent: &QueryIntent, scope: &mut Scope, escaper: &dyn Escaper) -> String {
    let columns = if intent.columns.is_empty() {
        "*".to_string()
    } else {
        render_columns(&intent.columns, scope)
    };
    let from = render_from(intent, scope);
    let mut wheres = render_groups(&intent.wheres, scope, escaper);
    let group_by = render_columns(&intent.group_by, scope);
    let having = render_groups(&intent.having, scope, escaper);
    let order_by = render_columns(&intent.order_by, scope);
    wheres.extend(render_equi_joins(intent, scope));

    let mut sb = StringBuilder::new();
    sb.write_leading("SELECT");
    if intent.distinct {
        sb.write_leading("DISTINCT");
    }
    sb.write_leading(&columns);
    sb.write_clause("FROM", &from);
    sb.write_clause("WHERE", &join_non_empty(&wheres, " AND "));
    sb.write_clause("GROUP BY", &group_by);
    sb.write_clause("HAVING", &join_non_empty(&having, " AND "));
    sb.write_clause("ORDER BY", &order_by);
    write_limit(&mut sb, intent, true);
    sb.into_string()
}

fn compile_insert(intent: &QueryIntent, escaper: &dyn Escaper) -> String {
    let Some(table) = intent.primary_table() else {
        return String::new();
    };
    if intent.rows.is_empty() || intent.insert_columns.is_empty() {
        tracing::warn!(target: "halo_query::compile", table = %table, "INSERT without values");
        return String::new();
    }

    let tuples: Vec<String> = intent
        .rows
        .iter()
        .map(|row| {
            let values: Vec<String> = intent
                .insert_columns
                .iter()
                .map(|col| match row.get(col) {
                    Some(v) => value_sql(v, escaper),
                    None => "DEFAULT".to_string(),
                })
                .collect();
            format!("({})", values.join(", "))
        })
        .collect();

    let mut sb = StringBuilder::new();
    sb.write_leading("INSERT INTO");
    sb.write_leading(table);
    sb.write_leading(&format!("({})", intent.insert_columns.join(", ")));
    sb.write_clause("VALUES", &tuples.join(", "));
    sb.into_string()
}

/// WHERE 渲染后非空时改写成 UPDATE（以第一行作为 SET），否则 INSERT。
fn compile_upsert(intent: &QueryIntent, scope: &mut Scope, escaper: &dyn Escaper) -> String {
    let rendered_wheres = render_groups(&intent.wheres, &mut scope.clone(), escaper);
    if rendered_wheres.is_empty() {
        return compile_insert(intent, escaper);
    }
    let Some(first) = intent.rows.first() else {
        tracing::warn!(target: "halo_query::compile", "UPDATE without values");
        return String::new();
    };
    compile_update(intent, first, scope, escaper)
}

fn compile_update(
    intent: &QueryIntent,
    set: &PendingRow,
    scope: &mut Scope,
    escaper: &dyn Escaper,
) -> String {
    if set.is_empty() {
        tracing::warn!(target: "halo_query::compile", "UPDATE without assignments");
        return String::new();
    }
    let target = render_from(intent, scope);
    let primary = intent.primary_table();
    let assignments: Vec<String> = set
        .iter()
        .map(|(col, v)| format!("{}={}", qualify_key(col, primary, scope), value_sql(v, escaper)))
        .collect();
    let mut wheres = render_groups(&intent.wheres, scope, escaper);
    let order_by = render_columns(&intent.order_by, scope);
    wheres.extend(render_equi_joins(intent, scope));

    let mut sb = StringBuilder::new();
    sb.write_clause("UPDATE", &target);
    sb.write_clause("SET", &assignments.join(", "));
    sb.write_clause("WHERE", &join_non_empty(&wheres, " AND "));
    sb.write_clause("ORDER BY", &order_by);
    write_limit(&mut sb, intent, false);
    sb.into_string()
}

fn compile_delete(intent: &QueryIntent, scope: &mut Scope, escaper: &dyn Escaper) -> String {
    let target = render_from(intent, scope);
    let mut wheres = render_groups(&intent.wheres, scope, escaper);
    let order_by = render_columns(&intent.order_by, scope);
    wheres.extend(render_equi_joins(intent, scope));

    let mut sb = StringBuilder::new();
    sb.write_clause("DELETE FROM", &target);
    sb.write_clause("WHERE", &join_non_empty(&wheres, " AND "));
    sb.write_clause("ORDER BY", &order_by);
    write_limit(&mut sb, intent, false);
    sb.into_string()
}

fn compile_truncate(intent: &QueryIntent) -> String {
    if !intent.wheres.is_empty() {
        tracing::warn!(target: "halo_query::compile", "WHERE is ignored by TRUNCATE");
    }
    let mut sb = StringBuilder::new();
    sb.write_clause("TRUNCATE", &intent.tables.join(", "));
    sb.into_string()
}

/// OFFSET 只跟随 LIMIT 输出。
fn write_limit(sb: &mut StringBuilder, intent: &QueryIntent, with_offset: bool) {
    let Some(limit) = intent.limit else {
        if intent.offset.is_some() {
            tracing::debug!(target: "halo_query::compile", "OFFSET without LIMIT ignored");
        }
        return;
    };
    sb.write_clause("LIMIT", &limit.to_string());
    if let Some(offset) = intent.offset.filter(|_| with_offset) {
        sb.write_clause("OFFSET", &offset.to_string());
    }
}

fn render_columns(columns: &[ColumnSpec], scope: &mut Scope) -> String {
    let rendered: Vec<String> = columns.iter().map(|c| scope.column(c)).collect();
    join_non_empty(&rendered, ", ")
}

fn render_groups(
    groups: &[ConditionGroup],
    scope: &mut dyn TableScope,
    escaper: &dyn Escaper,
) -> Vec<String> {
    groups
        .iter()
        .filter_map(|g| render_group(g, scope, escaper))
        .collect()
}

/// 两侧表都已被引用的等值 JOIN 才输出；判断基于输出前的计数。
fn render_equi_joins(intent: &QueryIntent, scope: &mut Scope) -> Vec<String> {
    let live: Vec<_> = intent
        .equi_joins
        .iter()
        .filter(|e| {
            let used = scope.references(&e.left) > 0 && scope.references(&e.right) > 0;
            if !used {
                tracing::debug!(target: "halo_query::join", left = %e.left, right = %e.right, "equi-join skipped, table not referenced");
            }
            used
        })
        .collect();
    live.into_iter().map(|e| e.render(scope)).collect()
}

/// FROM 列表：声明顺序的表，JOIN 紧跟在左表之后并可链式展开；
/// 作为结构化 JOIN 右表的表不再出现在逗号列表里。
fn render_from(intent: &QueryIntent, scope: &mut Scope) -> String {
    let joined: HashSet<&str> = intent.joins.iter().filter_map(Join::right).collect();
    let mut emitted = vec![false; intent.joins.len()];
    let mut items = Vec::new();

    for table in &intent.tables {
        if joined.contains(table.as_str()) {
            continue;
        }
        let mut item = scope.declaration(table);
        append_joins(table, intent, scope, &mut emitted, &mut item);
        items.push(item);
    }

    for (i, join) in intent.joins.iter().enumerate() {
        if emitted[i] {
            continue;
        }
        tracing::warn!(target: "halo_query::join", left = %join.left(), "join's left table is not in FROM, appending at the end");
        emitted[i] = true;
        let rendered = render_join(join, scope);
        match items.last_mut() {
            Some(last) => {
                last.push(' ');
                last.push_str(&rendered);
            }
            None => items.push(rendered),
        }
        if let (Some(right), Some(last)) = (join.right(), items.last_mut()) {
            append_joins(right, intent, scope, &mut emitted, last);
        }
    }

    join_non_empty(&items, ", ")
}

fn append_joins(
    table: &str,
    intent: &QueryIntent,
    scope: &mut Scope,
    emitted: &mut [bool],
    out: &mut String,
) {
    for (i, join) in intent.joins.iter().enumerate() {
        if emitted[i] || join.left() != table {
            continue;
        }
        emitted[i] = true;
        out.push(' ');
        out.push_str(&render_join(join, scope));
        if let Some(right) = join.right() {
            append_joins(right, intent, scope, emitted, out);
        }
    }
}

fn render_join(join: &Join, scope: &mut Scope) -> String {
    let declared = join
        .right()
        .map(|r| scope.declaration(r))
        .unwrap_or_default();
    join.render(&declared, scope)
}
