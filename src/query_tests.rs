#[cfg(test)]
mod tests {
    use crate::alias_mode::AliasMode;
    use crate::condition::{Condition, Operator, WhereOptions};
    use crate::executor::{ExecuteError, Executor, QueryOutput, ResultShape};
    use crate::intent::Action;
    use crate::join::JoinType;
    use crate::query::{Query, QueryError};
    use crate::value::SqlValue;
    use crate::{conditions, fields};
    use pretty_assertions::{assert_eq, assert_ne};

    fn query() -> Query {
        let mut q = Query::new();
        q.set_alias_mode(AliasMode::Auto);
        q
    }

    #[test]
    fn alias_is_stable_and_distinct() {
        let mut q = query();
        q.tables(["users", "posts"]);
        let users = q.alias_for("users");
        let posts = q.alias_for("posts");
        assert_eq!(q.alias_for("users"), users);
        assert_eq!(q.alias_for("posts"), posts);
        assert_ne!(users, posts);
    }

    #[test]
    fn compile_is_idempotent_and_cached() {
        let mut q = query();
        q.select("id, name", "users").where_([("id", 5_i64)]);
        assert_eq!(q.export(), None);
        let first = q.compile().to_string();
        assert_eq!(first, "SELECT id, name FROM users WHERE (id = '5')");
        assert_eq!(q.compile(), first);
        assert_eq!(q.export(), Some(first.as_str()));
        assert_eq!(q.recompile(), first);
    }

    #[test]
    fn mutation_invalidates_cache() {
        let mut q = query();
        q.select("*", "users");
        assert_eq!(q.compile(), "SELECT * FROM users");
        q.limit(10);
        assert_eq!(q.export(), None);
        assert_eq!(q.compile(), "SELECT * FROM users LIMIT 10");
    }

    #[test]
    fn between_list() {
        let mut q = query();
        q.select("*", "users")
            .where_([Condition::compare("age", Operator::Between, vec![18_i64, 30])]);
        assert_eq!(
            q.compile(),
            "SELECT * FROM users WHERE (age BETWEEN '18' AND '30')"
        );
    }

    #[test]
    fn list_value_becomes_in() {
        let mut q = query();
        q.select("*", "users").where_([("status", vec!["a", "b"])]);
        assert_eq!(q.compile(), "SELECT * FROM users WHERE (status IN ('a','b'))");
    }

    #[test]
    fn empty_list_yields_no_where() {
        let mut q = query();
        q.select("*", "users")
            .where_([("status", Vec::<&'static str>::new())]);
        assert_eq!(q.compile(), "SELECT * FROM users");
    }

    #[test]
    fn insert_then_where_becomes_update() {
        let mut q = query();
        q.tables("users")
            .insert(fields! { "name" => "x" })
            .where_([("id", 5_i64)]);
        assert_eq!(q.compile(), "UPDATE users SET name='x' WHERE (id = '5')");
    }

    #[test]
    fn insert_without_where_stays_insert() {
        let mut q = query();
        q.tables("users")
            .insert(fields! { "name" => "x", "age" => 3 })
            .insert([("age", 4)]);
        assert_eq!(
            q.compile(),
            "INSERT INTO users (name, age) VALUES ('x', '3'), (DEFAULT, '4')"
        );
    }

    #[test]
    fn insert_rows_never_converts() {
        let mut q = query();
        q.tables("users")
            .insert_rows([fields! { "name" => "a" }, fields! { "name" => "b" }])
            .where_([("id", 5_i64)]);
        assert_eq!(
            q.compile(),
            "INSERT INTO users (name) VALUES ('a'), ('b')"
        );
    }

    #[test]
    fn insert_multi_aligns_tuples() {
        let mut q = query();
        q.tables("users").insert_multi(
            ["name", "age"],
            vec![
                vec![SqlValue::from("a"), SqlValue::from(1_i64)],
                vec![SqlValue::from("b")],
                vec![SqlValue::from("c"), SqlValue::from(3_i64), SqlValue::from(9_i64)],
            ],
        );
        assert_eq!(
            q.compile(),
            "INSERT INTO users (name, age) VALUES ('a', '1'), ('b', DEFAULT), ('c', '3')"
        );
    }

    #[test]
    fn declared_join_with_columns_from_both() {
        let mut q = query();
        q.set_action(Action::Select)
            .tables(["t1", "t2"])
            .join("t1", "t2", [("id", "t1_id")])
            .columns_for("t1", "name")
            .columns_for("t2", "title");
        let sql = q.compile().to_string();
        assert_eq!(
            sql,
            "SELECT T0.name, T1.title FROM t1 AS T0 INNER JOIN t2 AS T1 ON T0.id = T1.t1_id"
        );
        assert_eq!(sql.matches("JOIN").count(), 1);
        assert_eq!(q.reference_count("t1"), 2);
        assert_eq!(q.reference_count("t2"), 2);
    }

    #[test]
    fn left_join_and_table_scoped_where() {
        let mut q = query();
        q.select(["name"], "users")
            .join_with(JoinType::Left, "users", "posts", [("id", "user_id")])
            .where_with(WhereOptions::default().table("posts"), [("status", "draft")])
            .order_by_for("posts", "created_at DESC");
        assert_eq!(
            q.compile(),
            "SELECT T0.name FROM users AS T0 LEFT JOIN posts AS T1 ON T0.id = T1.user_id \
             WHERE (T1.status = 'draft') ORDER BY T1.created_at DESC"
        );
    }

    #[test]
    fn nested_table_condition_compares_columns() {
        let mut q = query();
        q.select("*", "users")
            .tables("posts")
            .where_([Condition::table(
                "posts",
                [("author_id", SqlValue::Raw("T0.id".into()))],
            )]);
        assert_eq!(
            q.compile(),
            "SELECT * FROM users AS T0, posts AS T1 WHERE (T1.author_id = T0.id)"
        );
    }

    #[test]
    fn equi_join_needs_references() {
        let mut q = query();
        q.select("name", "users")
            .equi_join("users", "id", "posts", "user_id");
        assert_eq!(q.compile(), "SELECT name FROM users");
        assert_eq!(q.intent().tables, vec!["users"]);

        q.columns_for("posts", "title");
        assert_eq!(
            q.compile(),
            "SELECT T0.name, T1.title FROM users AS T0, posts AS T1 WHERE T0.id = T1.user_id"
        );
    }

    #[test]
    fn alias_lookup_on_unused_table_keeps_sql() {
        let mut q = query();
        q.select("name", "users");
        assert_eq!(q.compile(), "SELECT name FROM users");
        assert_eq!(q.alias_for("posts"), "T1");
        q.set_table_alias("comments", "c");
        assert_eq!(q.compile(), "SELECT name FROM users");
    }

    #[test]
    fn explicit_alias_takes_over_auto_alias() {
        let mut q = query();
        q.tables(["users", "posts"])
            .set_table_alias("users", "T1")
            .select("name", "users")
            .columns_for("posts", "title");
        assert_eq!(
            q.compile(),
            "SELECT T1.name, T2.title FROM users AS T1, posts AS T2"
        );
    }

    #[test]
    fn count_distinct_keeps_keyword_outside_qualifier() {
        let mut q = query();
        q.tables(["users", "posts"]).select("COUNT(DISTINCT id)", "users");
        assert_eq!(
            q.compile(),
            "SELECT COUNT(DISTINCT T0.id) FROM users AS T0, posts AS T1"
        );
    }

    #[test]
    fn explicit_alias_is_used() {
        let mut q = query();
        q.set_table_alias("users", "u")
            .select("name", "users")
            .join("users", "posts", [("id", "user_id")]);
        assert_eq!(q.alias_for("users"), "u");
        assert_eq!(
            q.compile(),
            "SELECT u.name FROM users AS u INNER JOIN posts AS T0 ON u.id = T0.user_id"
        );
    }

    #[test]
    fn group_by_having() {
        let mut q = query();
        q.select("status, COUNT(id) AS total", "orders")
            .group_by("status")
            .having_with(
                WhereOptions::default().unquoted(true),
                [Condition::gt("total", 10_i64)],
            );
        assert_eq!(
            q.compile(),
            "SELECT status, COUNT(id) AS total FROM orders GROUP BY status HAVING (total > 10)"
        );
    }

    #[test]
    fn distinct_and_columns_more_dedupes() {
        let mut q = query();
        q.select("name", "users")
            .columns_more(["name", "email"])
            .distinct(true);
        assert_eq!(q.compile(), "SELECT DISTINCT name, email FROM users");
    }

    #[test]
    fn update_and_delete() {
        let mut q = query();
        q.tables("users")
            .update(fields! { "name" => "y" }, conditions! { "id" => 7 })
            .limit(1);
        assert_eq!(q.compile(), "UPDATE users SET name='y' WHERE (id = '7') LIMIT 1");

        let mut q = query();
        q.delete(conditions! { "status" => vec!["spam", "junk"] }, "comments");
        assert_eq!(
            q.compile(),
            "DELETE FROM comments WHERE (status IN ('spam','junk'))"
        );
    }

    #[test]
    fn truncate_and_action_verbs() {
        let mut q = query();
        q.truncate("logs");
        assert_eq!(q.compile(), "TRUNCATE logs");

        let mut q = query();
        q.tables("users").action("SELECT");
        assert_eq!(q.compile(), "SELECT * FROM users");

        q.action("merge");
        assert_eq!(q.compile(), "");
        assert!(matches!(q.try_compile(), Err(QueryError::EmptyStatement)));
    }

    #[test]
    fn reset_clears_everything() {
        let mut q = query();
        q.select("*", "users").where_([("id", 1_i64)]);
        q.compile();
        q.reset();
        assert_eq!(q.export(), None);
        assert!(q.intent().tables.is_empty());
        assert_eq!(q.compile(), "");
    }

    #[test]
    fn result_shapes() {
        let mut q = query();
        q.select("*", "users");
        assert_eq!(q.result_shape(true), ResultShape::Row);
        assert_eq!(q.result_shape(false), ResultShape::Rows);

        q.select("COUNT(id)", "users");
        assert_eq!(q.result_shape(true), ResultShape::Scalar);
        assert_eq!(q.result_shape(false), ResultShape::Column);

        q.select("id, name", "users");
        assert_eq!(q.result_shape(true), ResultShape::Row);

        q.columns(Vec::<String>::new());
        assert_eq!(q.result_shape(true), ResultShape::Row);

        q.truncate("users");
        assert_eq!(q.result_shape(true), ResultShape::None);
    }

    /// 记录收到的 SQL，按形状返回固定结果。
    #[derive(Default)]
    struct RecordingExecutor {
        seen: Vec<(String, ResultShape)>,
        wrong_shape: bool,
    }

    impl Executor for RecordingExecutor {
        fn execute(&mut self, sql: &str, shape: ResultShape) -> Result<QueryOutput, ExecuteError> {
            self.seen.push((sql.to_string(), shape));
            if self.wrong_shape {
                return Ok(QueryOutput::Affected(0));
            }
            Ok(match shape {
                ResultShape::None => QueryOutput::Affected(1),
                ResultShape::Scalar => QueryOutput::Scalar(Some(SqlValue::from(3_i64))),
                ResultShape::Row => QueryOutput::Row(Some(vec![(
                    "id".to_string(),
                    SqlValue::from(1_i64),
                )])),
                ResultShape::Rows => QueryOutput::Rows(Vec::new()),
                ResultShape::Column => QueryOutput::Column(Vec::new()),
            })
        }
    }

    #[test]
    fn select_star_single_asks_for_row() {
        let mut exec = RecordingExecutor::default();
        let mut q = query();
        q.select("*", "users").where_([("id", 1_i64)]);
        let out = q.query(&mut exec, true).unwrap();
        assert!(matches!(out, QueryOutput::Row(Some(_))));
        assert_eq!(
            exec.seen,
            vec![(
                "SELECT * FROM users WHERE (id = '1')".to_string(),
                ResultShape::Row
            )]
        );
    }

    #[test]
    fn empty_statement_is_never_sent() {
        let mut exec = RecordingExecutor::default();
        let mut q = query();
        let err = q.query(&mut exec, false).unwrap_err();
        assert!(matches!(err, QueryError::EmptyStatement));
        assert!(exec.seen.is_empty());
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let mut exec = RecordingExecutor {
            wrong_shape: true,
            ..Default::default()
        };
        let mut q = query();
        q.select("COUNT(id)", "users");
        let err = q.query(&mut exec, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "executor returned Affected for expected shape Scalar"
        );
    }

    #[test]
    fn mutations_expect_affected_rows() {
        let mut exec = RecordingExecutor::default();
        let mut q = query();
        q.delete(conditions! { "id" => 1 }, "users");
        let out = q.query(&mut exec, true).unwrap();
        assert_eq!(out, QueryOutput::Affected(1));
    }
}
