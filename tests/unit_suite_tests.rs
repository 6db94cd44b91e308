//! # Suite Unit Tests / 套件单元测试
//!
//! Tests for building suites from documents (macro expansion, skipping,
//! service checks) and for running them against stub services.
//!
//! 测试从文档构建套件（宏展开、跳过、服务检查）以及针对桩服务运行套件。

mod common;

use std::sync::Arc;

use common::{StubHttp, registry_with};
use itom_runner::core::blocks::Block;
use itom_runner::core::error::{DocumentError, EngineError};
use itom_runner::core::services::ServiceRegistry;
use itom_runner::core::{Suite, TestReport};

async fn run_suite(source: &str, registry: &ServiceRegistry) -> Vec<TestReport> {
    let suite = Suite::parse(source, 0).unwrap();
    suite.check_services(registry).unwrap();
    suite.execute(registry, |_| {}).await.unwrap()
}

#[cfg(test)]
mod build_tests {
    use super::*;

    #[test]
    fn test_macros_flatten_in_order_regardless_of_position() {
        let source = r#"
            [[macros]]
            name = "outer"
            [[macros.blocks]]
            kind = "assign"
            var = "a"
            const = "1"
            [[macros.blocks]]
            kind = "macro"
            name = "inner"

            [[macros]]
            name = "inner"
            [[macros.blocks]]
            kind = "assign"
            var = "b"
            const = "2"

            [[tests.cases]]
            name = "uses outer"
            [[tests.cases.blocks]]
            kind = "macro"
            name = "outer"
            [[tests.cases.blocks]]
            kind = "assign"
            var = "c"
            const = "3"
        "#;
        let suite = Suite::parse(source, 0).unwrap();

        let vars: Vec<&str> = suite.tests[0]
            .blocks
            .iter()
            .map(|block| match block {
                Block::Assign(assign) => assign.var.as_str(),
                other => panic!("unexpected block {other:?}"),
            })
            .collect();
        assert_eq!(vars, vec!["a", "b", "c"]);
        assert_eq!(suite.macros["outer"].blocks.len(), 2);
        assert_eq!(suite.macros["inner"].blocks.len(), 1);
    }

    #[test]
    fn test_macro_cycle_is_rejected() {
        let source = r#"
            [[macros]]
            name = "a"
            [[macros.blocks]]
            kind = "macro"
            name = "b"

            [[macros]]
            name = "b"
            [[macros.blocks]]
            kind = "macro"
            name = "a"
        "#;
        match Suite::parse(source, 0).unwrap_err() {
            DocumentError::MacroCycle { chain, .. } => assert_eq!(chain, "a -> b -> a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_undefined_macro_is_rejected() {
        let source = r#"
            [[tests.cases]]
            name = "broken"
            [[tests.cases.blocks]]
            kind = "macro"
            name = "nowhere"
        "#;
        match Suite::parse(source, 0).unwrap_err() {
            DocumentError::UndefinedMacro {
                name,
                referenced_from,
            } => {
                assert_eq!(name, "nowhere");
                assert_eq!(referenced_from, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_macro_is_rejected() {
        let source = r#"
            [[macros]]
            name = "twice"
            [[macros]]
            name = "twice"
        "#;
        assert!(matches!(
            Suite::parse(source, 0).unwrap_err(),
            DocumentError::DuplicateMacro { .. }
        ));
    }

    #[test]
    fn test_malformed_document_is_a_parse_error() {
        assert!(matches!(
            Suite::parse("[[tests.cases]\nname = 1", 0).unwrap_err(),
            DocumentError::Parse(_)
        ));
    }

    #[test]
    fn test_skip_first_drops_leading_tests() {
        let source = (1..=5)
            .map(|i| format!("[[tests.cases]]\nname = \"t{i}\"\n"))
            .collect::<String>();

        let suite = Suite::parse(&source, 2).unwrap();
        let names: Vec<&str> = suite.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["t3", "t4", "t5"]);

        assert!(Suite::parse(&source, 9).unwrap().tests.is_empty());
    }

    #[test]
    fn test_continue_on_fail_accepts_both_spellings() {
        let snake = Suite::parse("[tests]\ncontinue_on_fail = true", 0).unwrap();
        let camel = Suite::parse("[tests]\ncontinueOnFail = true", 0).unwrap();
        assert!(snake.continue_on_fail);
        assert!(camel.continue_on_fail);
        assert!(!Suite::parse("", 0).unwrap().continue_on_fail);
    }

    #[test]
    fn test_check_services_reports_unknown_and_mismatched_services() {
        let registry = registry_with(Arc::new(StubHttp::new("http://stub")));
        let unknown = r#"
            [[tests.cases]]
            name = "t"
            [[tests.cases.blocks]]
            kind = "command"
            type = "http.get"
            service = "missing"
        "#;
        let mismatched = r#"
            [[tests.cases]]
            name = "t"
            [[tests.cases.blocks]]
            kind = "command"
            type = "sql.query"
            service = "api"
            body = "SELECT 1"
        "#;
        for source in [unknown, mismatched] {
            let suite = Suite::parse(source, 0).unwrap();
            assert!(matches!(
                suite.check_services(&registry).unwrap_err(),
                DocumentError::UnknownService { .. }
            ));
        }
    }
}

#[cfg(test)]
mod execution_tests {
    use super::*;

    const OK_SUITE: &str = r#"
        [[tests.cases]]
        name = "passes"
        [[tests.cases.blocks]]
        kind = "command"
        type = "http.get.json"
        service = "api"
        path = "/status"
        [[tests.cases.blocks]]
        kind = "expected"
        section = "ok"
        body = "true"

        [[tests.cases]]
        name = "fails"
        [[tests.cases.blocks]]
        kind = "command"
        type = "http.get.json"
        service = "api"
        path = "/status"
        [[tests.cases.blocks]]
        kind = "expected"
        that = "service is down"
        body = '{"ok": false}'
    "#;

    #[tokio::test]
    async fn test_reports_pass_and_failure_details() {
        let stub = Arc::new(StubHttp::new("http://stub").always(r#"{"ok": true}"#));
        let registry = registry_with(Arc::clone(&stub));

        let reports = run_suite(OK_SUITE, &registry).await;
        assert_eq!(reports.len(), 2);
        assert!(reports[0].passed);
        assert!(reports[0].on_fail.is_none());

        assert!(!reports[1].passed);
        let failure = reports[1].on_fail.as_ref().unwrap();
        assert_eq!(failure.expected_description, "service is down");
        assert_eq!(failure.expected_pretty, "{\n  \"ok\": false\n}");
        assert_eq!(failure.received_pretty, "{\n  \"ok\": true\n}");
    }

    #[tokio::test]
    async fn test_services_are_prepared_before_each_test() {
        let stub = Arc::new(StubHttp::new("http://stub").always(r#"{"ok": true}"#));
        let registry = registry_with(Arc::clone(&stub));
        run_suite(OK_SUITE, &registry).await;
        assert_eq!(stub.resets(), 2);
    }

    #[tokio::test]
    async fn test_variables_flow_between_blocks_but_not_tests() {
        let source = r#"
            [[tests.cases]]
            name = "create then fetch"
            [[tests.cases.blocks]]
            kind = "command"
            type = "http.post.json"
            service = "api"
            path = "/users"
            body = '{"name": "ada"}'
            [[tests.cases.blocks]]
            kind = "assign"
            var = "id"
            section = "id"
            [[tests.cases.blocks]]
            kind = "command"
            type = "http.get.json"
            service = "api"
            path = "/users/$id"

            [[tests.cases]]
            name = "fresh context"
            [[tests.cases.blocks]]
            kind = "command"
            type = "http.get.json"
            service = "api"
            path = "/users/$id"
        "#;
        let stub = Arc::new(
            StubHttp::new("http://stub")
                .respond(201, r#"{"id": 7}"#)
                .always(r#"{"id": 7, "name": "ada"}"#),
        );
        let registry = registry_with(Arc::clone(&stub));

        let reports = run_suite(source, &registry).await;
        assert!(reports.iter().all(|r| r.passed));

        let urls: Vec<String> = stub.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://stub/users".to_string(),
                "http://stub/users/7".to_string(),
                "http://stub/users/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_content_response_matches_null() {
        let source = r#"
            [[tests.cases]]
            name = "delete user"
            [[tests.cases.blocks]]
            kind = "command"
            type = "http.delete.json"
            service = "api"
            path = "/users/1"
            [[tests.cases.blocks]]
            kind = "expected"
            that = "null"
        "#;
        let stub = Arc::new(StubHttp::new("http://stub").respond(204, ""));
        let registry = registry_with(Arc::clone(&stub));

        let reports = run_suite(source, &registry).await;
        assert!(reports[0].passed, "{reports:?}");
    }

    const TWO_FAILURES: &str = r#"
        [[tests.cases]]
        name = "two failures"
        [[tests.cases.blocks]]
        kind = "command"
        type = "http.get.json"
        service = "api"
        path = "/a"
        [[tests.cases.blocks]]
        kind = "expected"
        that = "first"
        body = "1"
        [[tests.cases.blocks]]
        kind = "command"
        type = "http.get.json"
        service = "api"
        path = "/b"
        [[tests.cases.blocks]]
        kind = "expected"
        that = "second"
        body = "2"
    "#;

    #[tokio::test]
    async fn test_first_failure_stops_the_test() {
        let stub = Arc::new(StubHttp::new("http://stub").always("0"));
        let registry = registry_with(Arc::clone(&stub));

        let reports = run_suite(TWO_FAILURES, &registry).await;
        assert_eq!(
            reports[0].on_fail.as_ref().unwrap().expected_description,
            "first"
        );
        assert_eq!(stub.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_continue_on_fail_runs_remaining_blocks() {
        let stub = Arc::new(StubHttp::new("http://stub").always("0"));
        let registry = registry_with(Arc::clone(&stub));
        let source = format!("[tests]\ncontinue_on_fail = true\n{TWO_FAILURES}");

        let reports = run_suite(&source, &registry).await;
        assert_eq!(
            reports[0].on_fail.as_ref().unwrap().expected_description,
            "first"
        );
        assert_eq!(stub.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_command_fails_only_its_test() {
        let source = r#"
            [[tests.cases]]
            name = "unknown"
            [[tests.cases.blocks]]
            kind = "command"
            type = "ftp.get"

            [[tests.cases]]
            name = "still runs"
            [[tests.cases.blocks]]
            kind = "expected"
            that = "null"
        "#;
        let registry = registry_with(Arc::new(StubHttp::new("http://stub")));

        let reports = run_suite(source, &registry).await;
        assert!(!reports[0].passed);
        let failure = reports[0].on_fail.as_ref().unwrap();
        assert_eq!(failure.expected_description, "Command: ftp.get unknown");
        assert_eq!(failure.received_pretty, "null");
        assert!(reports[1].passed);
    }

    #[tokio::test]
    async fn test_backend_error_aborts_the_suite() {
        let registry = registry_with(Arc::new(StubHttp::broken("http://stub")));
        let suite = Suite::parse(OK_SUITE, 0).unwrap();

        let mut seen = 0;
        let error = suite
            .execute(&registry, |_| seen += 1)
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::Backend { .. }));
        assert_eq!(seen, 0);
    }

    #[tokio::test]
    async fn test_sql_round_trip_through_a_suite() {
        let source = r#"
            [[macros]]
            name = "schema"
            [[macros.blocks]]
            kind = "command"
            type = "sql.exec"
            service = "db"
            body = "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)"

            [[tests.cases]]
            name = "insert and select"
            [[tests.cases.blocks]]
            kind = "macro"
            name = "schema"
            [[tests.cases.blocks]]
            kind = "assign"
            var = "name"
            const = "grace"
            [[tests.cases.blocks]]
            kind = "command"
            type = "sql.exec"
            service = "db"
            body = "INSERT INTO users (name) VALUES ('$name')"
            [[tests.cases.blocks]]
            kind = "expected"
            section = "changes"
            body = "1"
            [[tests.cases.blocks]]
            kind = "command"
            type = "sql.query"
            service = "db"
            body = "SELECT name FROM users"
            [[tests.cases.blocks]]
            kind = "expected"
            body = '[{"name": "grace"}]'
        "#;
        let registry = registry_with(Arc::new(StubHttp::new("http://stub")));
        let reports = run_suite(source, &registry).await;
        assert!(reports[0].passed, "{:?}", reports[0].on_fail);
    }
}
