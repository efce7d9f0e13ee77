#[cfg(test)]
mod tests {
    use crate::escape::{Escaper, Literal, MySqlEscaper, literal, value_sql};
    use crate::value::{SqlValue, raw};
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    #[test]
    fn escape_literal_mysql() {
        let e = MySqlEscaper;
        assert_eq!(e.escape_literal("O'Reilly"), "O\\'Reilly");
        assert_eq!(e.escape_literal("a\\b"), "a\\\\b");
        assert_eq!(e.escape_literal("line\nbreak\t"), "line\\nbreak\\t");
        assert_eq!(e.escape_literal("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(e.escape_literal("\u{0000}\u{001a}"), "\\0\\Z");
    }

    #[test]
    fn escape_like_escapes_wildcards_then_literal() {
        let e = MySqlEscaper;
        assert_eq!(e.escape_like("50%"), "50\\\\%");
        assert_eq!(e.escape_like("a_b"), "a\\\\_b");
        assert_eq!(e.escape_like("it's"), "it\\'s");
    }

    #[test]
    fn literal_shapes() {
        let e = MySqlEscaper;
        assert_eq!(literal(&SqlValue::Null, &e), None);
        assert_eq!(
            literal(&SqlValue::from(true), &e),
            Some(Literal::Text("1".into()))
        );
        assert_eq!(
            literal(&SqlValue::from(false), &e),
            Some(Literal::Text("0".into()))
        );
        assert_eq!(
            literal(&raw("NOW()"), &e),
            Some(Literal::Bare("NOW()".into()))
        );
    }

    #[test]
    fn value_sql_quotes_everything_but_null_and_raw() {
        let e = MySqlEscaper;
        assert_eq!(value_sql(&SqlValue::from(5_i64), &e), "'5'");
        assert_eq!(value_sql(&SqlValue::from("x"), &e), "'x'");
        assert_eq!(value_sql(&SqlValue::Null, &e), "NULL");
        assert_eq!(value_sql(&raw("NOW()"), &e), "NOW()");
        assert_eq!(
            value_sql(&SqlValue::from(datetime!(2024-03-05 07:08:09)), &e),
            "'2024-03-05 07:08:09'"
        );
    }

    #[test]
    fn boxed_escaper_clones() {
        let boxed: Box<dyn Escaper> = Box::new(MySqlEscaper);
        let cloned = boxed.clone();
        assert_eq!(cloned.escape_literal("'"), "\\'");
    }
}
