//! AliasResolver：为查询中出现的表分配稳定别名，并统计别名在 SQL 中被实际输出的次数。
//!
//! 表以 arena 方式存放，用 [`TableId`] 引用。引用计数只在编译期累加，
//! 用于判断隐式等值 JOIN 两侧的表是否在查询别处被用到。

use crate::alias_mode::AliasMode;

const AUTO_ALIAS_PREFIX: &str = "T";

/// 表在 arena 中的句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(usize);

/// 一张被引用的表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: String,
    /// 别名由调用方显式指定。
    pub explicit: bool,
    references: usize,
}

impl TableRef {
    pub fn references(&self) -> usize {
        self.references
    }

    /// 按模式决定输出时使用的限定符。
    pub fn qualifier(&self, mode: AliasMode) -> &str {
        if self.explicit || mode.generates_aliases() {
            &self.alias
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasResolver {
    tables: Vec<TableRef>,
    next_auto: usize,
}

impl AliasResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableRef> {
        self.tables.iter()
    }

    pub fn get(&self, id: TableId) -> &TableRef {
        &self.tables[id.0]
    }

    pub fn find(&self, table: &str) -> Option<TableId> {
        self.tables.iter().position(|t| t.name == table).map(TableId)
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<TableId> {
        self.tables.iter().position(|t| t.alias == alias).map(TableId)
    }

    /// 登记一张表；已登记时直接返回原句柄，别名保持不变。
    pub fn register(&mut self, table: &str) -> TableId {
        if let Some(id) = self.find(table) {
            return id;
        }
        let alias = self.next_auto_alias();
        self.tables.push(TableRef {
            name: table.to_string(),
            alias,
            explicit: false,
            references: 0,
        });
        TableId(self.tables.len() - 1)
    }

    /// 显式指定别名，覆盖自动分配的别名。
    ///
    /// 别名被另一张表的自动别名占用时，那张表改用下一个空闲的 `T<n>`；
    /// 被另一个显式别名占用时保留原状并记录警告。
    pub fn set_alias(&mut self, table: &str, alias: &str) -> TableId {
        let holder = self
            .find_by_alias(alias)
            .filter(|&h| self.tables[h.0].name != table);
        if let Some(h) = holder
            && self.tables[h.0].explicit
        {
            tracing::warn!(
                target: "halo_query::alias",
                table = %table,
                alias = %alias,
                holder = %self.tables[h.0].name,
                "alias is already taken by another table, keeping the existing one"
            );
            return self.register(table);
        }

        let id = match self.find(table) {
            Some(id) => {
                let t = &mut self.tables[id.0];
                t.alias = alias.to_string();
                t.explicit = true;
                id
            }
            None => {
                self.tables.push(TableRef {
                    name: table.to_string(),
                    alias: alias.to_string(),
                    explicit: true,
                    references: 0,
                });
                TableId(self.tables.len() - 1)
            }
        };
        if let Some(h) = holder {
            let moved = self.next_auto_alias();
            self.tables[h.0].alias = moved;
        }
        id
    }

    /// 幂等：同一张表总是得到同一个别名，首次调用时分配。
    pub fn alias_for(&mut self, table: &str) -> String {
        let id = self.register(table);
        self.tables[id.0].alias.clone()
    }

    /// 只查不分配。
    pub fn lookup(&self, table: &str) -> Option<&str> {
        self.find(table).map(|id| self.tables[id.0].alias.as_str())
    }

    /// 别名将被输出到 SQL：计数加一。
    pub fn reference(&mut self, id: TableId) {
        self.tables[id.0].references += 1;
    }

    pub fn reference_count(&self, table: &str) -> usize {
        self.find(table)
            .map(|id| self.tables[id.0].references)
            .unwrap_or(0)
    }

    pub fn clear_references(&mut self) {
        for t in &mut self.tables {
            t.references = 0;
        }
    }

    fn next_auto_alias(&mut self) -> String {
        loop {
            let alias = format!("{AUTO_ALIAS_PREFIX}{}", self.next_auto);
            self.next_auto += 1;
            if !self.tables.iter().any(|t| t.alias == alias) {
                return alias;
            }
        }
    }
}
