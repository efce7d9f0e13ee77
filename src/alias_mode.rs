//! AliasMode：控制编译时是否、以及如何给表起别名。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};

/// 表限定方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AliasMode {
    /// 查询涉及多于一张表时使用 `T0, T1, …` 别名；单表查询不做限定。
    #[default]
    Auto,
    /// 单表查询也使用别名。
    Always,
    /// 多表时直接用表名限定，不生成别名（显式别名仍然生效）。
    TableNames,
}

static DEFAULT_ALIAS_MODE: AtomicU8 = AtomicU8::new(AliasMode::Auto as u8);
static DEFAULT_ALIAS_MODE_LOCK: Mutex<()> = Mutex::new(());

impl AliasMode {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Always,
            2 => Self::TableNames,
            _ => Self::Auto,
        }
    }

    /// 在声明了 `table_count` 张表时是否需要限定列名。
    pub fn qualifies(self, table_count: usize) -> bool {
        match self {
            Self::Always => table_count > 0,
            Self::Auto | Self::TableNames => table_count > 1,
        }
    }

    pub(crate) fn generates_aliases(self) -> bool {
        self != Self::TableNames
    }
}

/// 获取当前全局默认 AliasMode。
pub fn default_alias_mode() -> AliasMode {
    AliasMode::from_u8(DEFAULT_ALIAS_MODE.load(Ordering::Relaxed))
}

/// 设置全局默认 AliasMode，返回旧值。
pub fn set_default_alias_mode(mode: AliasMode) -> AliasMode {
    let old = DEFAULT_ALIAS_MODE.swap(mode as u8, Ordering::Relaxed);
    AliasMode::from_u8(old)
}

/// 修改全局默认 AliasMode 的 RAII guard（持有全局锁，避免并行测试互相干扰）。
pub struct DefaultAliasModeGuard {
    _lock: MutexGuard<'static, ()>,
    old: AliasMode,
}

impl Drop for DefaultAliasModeGuard {
    fn drop(&mut self) {
        set_default_alias_mode(self.old);
    }
}

/// 在一个作用域内临时设置默认 AliasMode，退出作用域后自动恢复。
pub fn set_default_alias_mode_scoped(mode: AliasMode) -> DefaultAliasModeGuard {
    let lock = DEFAULT_ALIAS_MODE_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let old = set_default_alias_mode(mode);
    DefaultAliasModeGuard { _lock: lock, old }
}

impl fmt::Display for AliasMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Always => "always",
            Self::TableNames => "table-names",
        };
        f.write_str(s)
    }
}
