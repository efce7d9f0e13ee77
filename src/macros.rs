//! 宏集合：字符串清单参数、扁平 `{key: value}` 条件与行数据的便捷写法。
//! 例如 `conditions! { "id" => 5, "status" => vec!["a", "b"] }`、`fields! { "name" => "x" }`，
//! 以及 `tables!(q, "users", "posts")` 这类不定长参数调用。

#[doc(hidden)]
#[macro_export]
macro_rules! __collect_strings {
    () => {
        Vec::<String>::new()
    };
    ($($value:expr),+ $(,)?) => {{
        let mut values = Vec::<String>::new();
        $(
            $crate::extend_into_strings($value, &mut values);
        )*
        values
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __builder_with_strings {
    ($builder:expr, $method:ident $(, $arg:expr)* $(,)?) => {
        $builder.$method($crate::__collect_strings!($($arg),*))
    };
}

/// 表名、列名等字符串清单参数：单个字符串、数组、切片或 `Vec` 都可以传入。
pub trait IntoStrings {
    fn extend_into_strings(self, dst: &mut Vec<String>);
}

impl IntoStrings for String {
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.push(self);
    }
}

impl IntoStrings for &str {
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.push(self.to_string());
    }
}

impl<const N: usize, T> IntoStrings for [T; N]
where
    T: Into<String>,
{
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.extend(self.into_iter().map(Into::into));
    }
}

impl<T> IntoStrings for &[T]
where
    T: Into<String> + Clone,
{
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.extend(self.iter().cloned().map(Into::into));
    }
}

impl<T> IntoStrings for Vec<T>
where
    T: Into<String>,
{
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.extend(self.into_iter().map(Into::into));
    }
}

#[doc(hidden)]
pub fn extend_into_strings<T>(value: T, dst: &mut Vec<String>)
where
    T: IntoStrings,
{
    value.extend_into_strings(dst);
}

#[doc(hidden)]
pub fn collect_into_strings<T>(value: T) -> Vec<String>
where
    T: IntoStrings,
{
    let mut dst = Vec::new();
    value.extend_into_strings(&mut dst);
    dst
}

/// 扁平 `{key: value}` 条件，运算符按值推断（标量 `=`，列表 `IN`）。
#[macro_export]
macro_rules! conditions {
    () => {
        Vec::<$crate::Condition>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        vec![$($crate::Condition::value($key, $value)),+]
    };
}
pub use crate::conditions;

/// 一行待写入的数据（`PendingRow`），保持书写顺序。
#[macro_export]
macro_rules! fields {
    () => {
        $crate::PendingRow::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::PendingRow::new();
        $(
            row.set($key, $value);
        )+
        row
    }};
}
pub use crate::fields;

/// 为 `Query::tables` 提供不定长参数调用。
#[macro_export]
macro_rules! tables {
    ($builder:expr $(, $table:expr)* $(,)?) => {
        $crate::__builder_with_strings!($builder, tables $(, $table)*)
    };
}
pub use crate::tables;

/// 为 `Query::columns_more` 提供不定长参数调用。
#[macro_export]
macro_rules! columns_more {
    ($builder:expr $(, $col:expr)* $(,)?) => {
        $crate::__builder_with_strings!($builder, columns_more $(, $col)*)
    };
}
pub use crate::columns_more;

/// 为 `Query::order_by` 提供不定长参数调用。
#[macro_export]
macro_rules! order_by_cols {
    ($builder:expr $(, $col:expr)* $(,)?) => {
        $crate::__builder_with_strings!($builder, order_by $(, $col)*)
    };
}
pub use crate::order_by_cols;

/// 为 `Query::group_by` 提供不定长参数调用。
#[macro_export]
macro_rules! group_by_cols {
    ($builder:expr $(, $col:expr)* $(,)?) => {
        $crate::__builder_with_strings!($builder, group_by $(, $col)*)
    };
}
pub use crate::group_by_cols;
