#[cfg(test)]
mod tests {
    use crate::column::{ColumnSpec, push_unique, split_list, split_qualified};
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_plain_field() {
        let c = ColumnSpec::parse("field");
        assert_eq!(c.name, "field");
        assert_eq!(c.table, None);
        assert_eq!(c.function, None);
        assert_eq!(c.modifier, None);
        assert_eq!(c.alias, None);
        assert_eq!(c.render(None), "field");
    }

    #[test]
    fn parse_aggregate() {
        let c = ColumnSpec::parse("COUNT(id)");
        assert_eq!(c.function.as_deref(), Some("COUNT"));
        assert_eq!(c.name, "id");
        assert_eq!(c.render(Some("T0")), "COUNT(T0.id)");
        assert_eq!(c.resolved_name(), "COUNT(id)");
    }

    #[test]
    fn parse_qualified_with_alias() {
        let c = ColumnSpec::parse("users.name AS total");
        assert_eq!(c.table.as_deref(), Some("users"));
        assert_eq!(c.name, "name");
        assert_eq!(c.modifier, None);
        assert_eq!(c.alias.as_deref(), Some("total"));
        assert_eq!(c.render(Some("T1")), "T1.name AS total");
        assert_eq!(c.resolved_name(), "total");
    }

    #[test]
    fn parse_modifier() {
        let c = ColumnSpec::parse("created_at DESC");
        assert_eq!(c.name, "created_at");
        assert_eq!(c.modifier.as_deref(), Some("DESC"));
        assert_eq!(c.render(None), "created_at DESC");

        let c = ColumnSpec::parse("score asc as s");
        assert_eq!(c.modifier.as_deref(), Some("asc"));
        assert_eq!(c.alias.as_deref(), Some("s"));
    }

    #[test]
    fn parse_aggregate_distinct() {
        let c = ColumnSpec::parse("COUNT(DISTINCT users.id) AS n");
        assert!(c.distinct);
        assert_eq!(c.table.as_deref(), Some("users"));
        assert_eq!(c.name, "id");
        assert_eq!(c.render(Some("T0")), "COUNT(DISTINCT T0.id) AS n");

        let c = ColumnSpec::parse("count(distinct id)");
        assert_eq!(c.render(Some("T1")), "count(DISTINCT T1.id)");
        assert_eq!(c.resolved_name(), "count(DISTINCT id)");
        assert!(!ColumnSpec::parse("COUNT(id)").distinct);
    }

    #[test]
    fn aggregate_over_expression_is_verbatim() {
        for input in ["COUNT(a, b) AS n", "NOW()", "SUM(price * qty)"] {
            let c = ColumnSpec::parse(input).with_table(Some("orders"));
            assert!(c.is_verbatim(), "{input}");
            assert_eq!(c.render(Some("T0")), input);
        }
    }

    #[test]
    fn star_is_never_qualified() {
        let c = ColumnSpec::parse("*").with_table(Some("users"));
        assert!(c.is_star());
        assert_eq!(c.render(Some("T0")), "*");

        let c = ColumnSpec::parse("COUNT(*) AS c");
        assert_eq!(c.render(Some("T0")), "COUNT(*) AS c");
    }

    #[test]
    fn with_table_keeps_explicit_prefix() {
        let c = ColumnSpec::parse("posts.title").with_table(Some("users"));
        assert_eq!(c.table.as_deref(), Some("posts"));
        let c = ColumnSpec::parse("title").with_table(Some("users"));
        assert_eq!(c.table.as_deref(), Some("users"));
    }

    #[test]
    fn unparseable_falls_back_to_bare() {
        let c = ColumnSpec::parse("a + b");
        assert_eq!(c.name, "a + b");
        assert!(c.is_verbatim());
        assert_eq!(c.render(Some("T0")), "a + b");
    }

    #[test]
    fn split_qualified_only_simple_names() {
        assert_eq!(
            split_qualified("t.id"),
            (Some("t".to_string()), "id".to_string())
        );
        assert_eq!(split_qualified("t.*"), (Some("t".to_string()), "*".to_string()));
        assert_eq!(split_qualified("id"), (None, "id".to_string()));
        assert_eq!(
            split_qualified("DISTINCT t.id"),
            (None, "DISTINCT t.id".to_string())
        );
    }

    #[test]
    fn push_unique_dedupes_by_resolved_name() {
        let mut cols = vec![ColumnSpec::parse("name")];
        assert!(!push_unique(&mut cols, ColumnSpec::parse("users.name")));
        assert!(push_unique(&mut cols, ColumnSpec::parse("COUNT(name)")));
        assert!(push_unique(&mut cols, ColumnSpec::parse("name AS n")));
        assert!(push_unique(&mut cols, ColumnSpec::parse("COUNT(DISTINCT name)")));
        assert_eq!(cols.len(), 4);
    }

    #[test]
    fn split_list_respects_parentheses() {
        assert_eq!(
            split_list("id, COUNT(a, b) AS n ,, name"),
            vec!["id", "COUNT(a, b) AS n", "name"]
        );
        assert!(split_list("  ").is_empty());
    }
}
