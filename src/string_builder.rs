//! 语句拼接工具：按子句依次写入，子句之间自动补空格。

#[derive(Debug, Default, Clone)]
pub(crate) struct StringBuilder {
    buf: String,
}

impl StringBuilder {
    pub(crate) fn new() -> Self {
        Self { buf: String::new() }
    }

    /// 写入 `s`；如果不是首次写入，会先写入一个空格。空串忽略。
    pub(crate) fn write_leading(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if !self.buf.is_empty() {
            self.buf.push(' ');
        }
        self.buf.push_str(s);
    }

    /// 写入关键字与非空主体：`keyword body`；主体为空时什么也不写。
    pub(crate) fn write_clause(&mut self, keyword: &str, body: &str) {
        if body.is_empty() {
            return;
        }
        self.write_leading(keyword);
        self.buf.push(' ');
        self.buf.push_str(body);
    }

    /// 用 `sep` 连接非空项后写入。
    pub(crate) fn write_strings(&mut self, items: &[String], sep: &str) {
        let mut first_added = false;
        for s in items {
            if s.is_empty() {
                continue;
            }
            if first_added {
                self.buf.push_str(sep);
            }
            self.buf.push_str(s);
            first_added = true;
        }
    }

    pub(crate) fn into_string(self) -> String {
        self.buf
    }
}

/// 用 `sep` 连接非空项。
pub(crate) fn join_non_empty(items: &[String], sep: &str) -> String {
    let mut sb = StringBuilder::new();
    sb.write_strings(items, sep);
    sb.into_string()
}
