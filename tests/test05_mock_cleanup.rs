use sql_accessor::cleanup;
use sql_accessor::prelude::*;
use sql_accessor::test_utils::{MockDatabase, MockEvent, MockFailure, MockResult, MockScript};

fn closes(db: &MockDatabase) -> Vec<MockEvent> {
    db.events_matching(|e| {
        matches!(
            e,
            MockEvent::CursorClosed | MockEvent::StatementClosed | MockEvent::ConnectionClosed
        )
    })
}

fn rows_script() -> MockScript {
    MockScript::new().result(MockResult::rows(
        vec![ColumnMeta::new("id", SqlType::BigInt)],
        vec![vec![SqlValue::BigInt(1)], vec![SqlValue::BigInt(2)]],
    ))
}

#[test]
fn self_acquired_resources_close_innermost_first() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    db.script("SELECT id FROM t", rows_script());
    let accessor = Accessor::builder().source(db.source()).build();

    let ids: Vec<i64> = accessor.query("SELECT id FROM t", &ColumnListHandler::new(), &params![])?;
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(
        closes(&db),
        vec![
            MockEvent::CursorClosed,
            MockEvent::StatementClosed,
            MockEvent::ConnectionClosed
        ]
    );
    Ok(())
}

#[test]
fn caller_connections_stay_open() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let accessor = Accessor::new();
    let mut conn = db.connect();

    accessor.update_with(&mut conn, "DELETE FROM t", &params![])?;
    assert_eq!(closes(&db), vec![MockEvent::StatementClosed]);
    Ok(())
}

#[test]
fn close_failure_after_success_is_reported() {
    let db = MockDatabase::new();
    db.script("SELECT id FROM t", rows_script().fail_at(MockFailure::CursorClose));
    let accessor = Accessor::new();
    let mut conn = db.connect();

    let err = accessor
        .query_with(&mut conn, "SELECT id FROM t", &ArrayListHandler::new(), &params![])
        .unwrap_err();
    assert!(err.to_string().contains("cursor close failed"));
    assert!(err.to_string().contains("Query: SELECT id FROM t"));
    // The statement is still closed after the cursor failed to close.
    assert_eq!(closes(&db), vec![MockEvent::CursorClosed, MockEvent::StatementClosed]);
}

#[test]
fn connection_close_failure_after_success_is_reported() {
    let db = MockDatabase::new();
    db.script(
        "UPDATE t SET a = ?",
        MockScript::new().fail_at(MockFailure::ConnectionClose),
    );
    let accessor = Accessor::builder().source(db.source()).build();

    let err = accessor.update("UPDATE t SET a = ?", &params![5]).unwrap_err();
    match err {
        SqlAccessorError::DatabaseOperationFailed {
            ref message,
            ref sql,
            ref params,
            ..
        } => {
            assert_eq!(message, "connection close failed");
            assert_eq!(sql, "UPDATE t SET a = ?");
            assert_eq!(params, "[5]");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

fn failing_update_db() -> MockDatabase {
    let db = MockDatabase::new();
    db.script(
        "UPDATE t SET a = ?",
        MockScript::new().fail_at(MockFailure::Execute),
    );
    db
}

#[test]
fn execution_failure_wins_over_close_failure() {
    let db = failing_update_db();
    let source_db = db.clone();
    let accessor = Accessor::builder()
        .source(move || -> Result<Box<dyn Connection>, DriverError> {
            Ok(Box::new(source_db.connect().failing_close()))
        })
        .build();

    let err = accessor.update("UPDATE t SET a = ?", &params!["x"]).unwrap_err();
    let Some(DriverError::Sql { state, message }) = err.driver_error() else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(state.as_deref(), Some("42000"));
    assert!(message.contains("execution of UPDATE t SET a = ? failed"));
    assert!(err.to_string().contains("Parameters: ['x']"));
    assert_eq!(
        closes(&db),
        vec![MockEvent::StatementClosed, MockEvent::ConnectionClosed]
    );
}

#[test]
fn caller_connection_failures_still_close_the_statement() {
    let db = failing_update_db();
    let mut conn = db.connect();

    let err = Accessor::new()
        .update_with(&mut conn, "UPDATE t SET a = ?", &params!["x"])
        .unwrap_err();
    assert!(err.driver_error().is_some());
    assert_eq!(closes(&db), vec![MockEvent::StatementClosed]);
}

#[test]
fn failed_configuration_closes_the_statement() {
    let db = MockDatabase::new();
    db.script("SELECT id FROM t", rows_script().fail_at(MockFailure::Configure));
    let accessor = Accessor::builder()
        .statement_config(StatementConfiguration::builder().fetch_size(10).build())
        .build();
    let mut conn = db.connect();

    let err = accessor
        .query_with(&mut conn, "SELECT id FROM t", &ArrayListHandler::new(), &params![])
        .unwrap_err();
    assert!(
        err.driver_error()
            .is_some_and(DriverError::is_feature_not_supported)
    );
    assert!(db.events_matching(|e| matches!(e, MockEvent::Executed)).is_empty());
    assert_eq!(closes(&db), vec![MockEvent::StatementClosed]);
}

#[test]
fn prepare_and_bind_failures_are_wrapped() {
    let db = MockDatabase::new();
    db.script("SELECT 1", MockScript::new().fail_at(MockFailure::Prepare));
    db.script("UPDATE t SET b = ?", MockScript::new().fail_at(MockFailure::Bind));
    let accessor = Accessor::new();
    let mut conn = db.connect();

    let err = accessor
        .query_with(&mut conn, "SELECT 1", &ArrayHandler::new(), &params![])
        .unwrap_err();
    assert!(err.to_string().starts_with("cannot prepare SELECT 1"));
    assert!(err.to_string().ends_with("Parameters: []"));

    let err = accessor
        .update_with(&mut conn, "UPDATE t SET b = ?", &params![1.5])
        .unwrap_err();
    assert!(matches!(err.driver_error(), Some(DriverError::Conversion(_))));
    assert!(err.to_string().contains("Parameters: [1.5]"));
}

#[test]
fn missing_or_refusing_sources_fail_cleanly() {
    let unsourced = Accessor::new()
        .batch("UPDATE t SET a = ?", &[params![1]])
        .unwrap_err();
    assert!(matches!(unsourced, SqlAccessorError::ConfigError(_)));
    assert!(unsourced.to_string().contains("connection source"));

    let db = MockDatabase::new();
    db.refuse_connections("too many clients");
    let accessor = Accessor::builder().source(db.source()).build();
    let err = accessor.execute("{call p()}", &params![]).unwrap_err();
    assert!(err.to_string().starts_with("too many clients"));
    assert!(db.events().is_empty());
}

#[test]
fn transaction_helpers_end_and_close() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();

    cleanup::commit_and_close(Box::new(db.connect()))?;
    cleanup::rollback_and_close_quietly(Box::new(db.connect().failing_close()));
    let mut conn = db.connect();
    cleanup::rollback(&mut conn)?;

    let tail: Vec<MockEvent> = db
        .events()
        .into_iter()
        .filter(|e| *e != MockEvent::ConnectionOpened)
        .collect();
    assert_eq!(
        tail,
        vec![
            MockEvent::Commit,
            MockEvent::ConnectionClosed,
            MockEvent::Rollback,
            MockEvent::ConnectionClosed,
            MockEvent::Rollback,
        ]
    );

    let err = cleanup::commit_and_close(Box::new(db.connect().failing_close())).unwrap_err();
    assert_eq!(err.to_string(), "connection close failed");
    Ok(())
}
