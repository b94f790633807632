use sql_accessor::prelude::*;
use sql_accessor::test_utils::{MetadataMode, MockDatabase, MockEvent, MockResult, MockScript};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn binds(db: &MockDatabase) -> Vec<MockEvent> {
    db.events_matching(|e| {
        matches!(
            e,
            MockEvent::SetValue { .. } | MockEvent::SetNull { .. } | MockEvent::RegisterOut { .. }
        )
    })
}

fn metadata_requests(db: &MockDatabase) -> usize {
    db.events_matching(|e| matches!(e, MockEvent::MetadataRequested))
        .len()
}

#[test]
fn typed_metadata_drives_null_types() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let db = MockDatabase::new();
    let sql = "UPDATE t SET a = ?, b = ?, c = ? WHERE id = ?";
    db.script(
        sql,
        MockScript::new().metadata(MetadataMode::Typed(vec![
            SqlType::Integer,
            SqlType::Timestamp,
            SqlType::Varchar,
            SqlType::BigInt,
        ])),
    );
    let accessor = Accessor::new();
    let mut conn = db.connect();

    let none: Option<i32> = None;
    let rows = accessor.update_with(
        &mut conn,
        sql,
        &params![none, Param::null(), "x", 9_i64],
    )?;
    assert_eq!(rows, 1);
    assert_eq!(
        binds(&db),
        vec![
            MockEvent::SetNull {
                index: 1,
                sql_type: SqlType::Integer
            },
            MockEvent::SetNull {
                index: 2,
                sql_type: SqlType::Timestamp
            },
            MockEvent::SetValue {
                index: 3,
                value: SqlValue::from("x")
            },
            MockEvent::SetValue {
                index: 4,
                value: SqlValue::BigInt(9)
            },
        ]
    );
    assert!(!accessor.is_pmd_known_broken());
    Ok(())
}

#[test]
fn absent_metadata_trips_the_latch_once() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "INSERT INTO t (a) VALUES (?)";
    let accessor = Accessor::new();
    let mut conn = db.connect();

    accessor.update_with(&mut conn, sql, &params![Param::null()])?;
    assert!(accessor.is_pmd_known_broken());
    accessor.update_with(&mut conn, sql, &params![Param::null()])?;

    assert_eq!(metadata_requests(&db), 1);
    let nulls = db.events_matching(|e| matches!(e, MockEvent::SetNull { .. }));
    assert_eq!(
        nulls,
        vec![
            MockEvent::SetNull {
                index: 1,
                sql_type: SqlType::DEFAULT_NULL
            };
            2
        ]
    );
    Ok(())
}

#[test]
fn unsupported_metadata_is_not_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "DELETE FROM t WHERE a = ?";
    db.script(sql, MockScript::new().metadata(MetadataMode::Unsupported));
    let accessor = Accessor::new();
    let mut conn = db.connect();

    assert_eq!(accessor.update_with(&mut conn, sql, &params![1])?, 1);
    assert!(accessor.is_pmd_known_broken());
    Ok(())
}

#[test]
fn count_only_metadata_checks_count_then_latches_on_type_lookup()
-> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "UPDATE t SET a = ? WHERE id = ?";
    db.script(sql, MockScript::new().metadata(MetadataMode::CountOnly(2)));
    let accessor = Accessor::new();
    let mut conn = db.connect();

    let err = accessor.update_with(&mut conn, sql, &params![1]).unwrap_err();
    assert!(matches!(
        err,
        SqlAccessorError::ParameterCountMismatch {
            expected: 2,
            given: 1
        }
    ));
    assert!(db.events_matching(|e| matches!(e, MockEvent::Executed)).is_empty());
    assert_eq!(db.events().last(), Some(&MockEvent::StatementClosed));

    accessor.update_with(&mut conn, sql, &params![Param::null(), 1])?;
    assert!(accessor.is_pmd_known_broken());
    assert!(binds(&db).contains(&MockEvent::SetNull {
        index: 1,
        sql_type: SqlType::DEFAULT_NULL
    }));

    // Counts are no longer checked once the latch is set.
    accessor.update_with(&mut conn, sql, &params![1, 2, 3])?;
    Ok(())
}

#[test]
fn known_broken_accessor_never_asks_for_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "UPDATE t SET a = ?";
    db.script(sql, MockScript::new().metadata(MetadataMode::CountOnly(3)));
    let accessor = Accessor::builder().pmd_known_broken(true).build();
    let mut conn = db.connect();

    accessor.update_with(&mut conn, sql, &params![Param::null()])?;
    assert_eq!(metadata_requests(&db), 0);
    assert_eq!(
        binds(&db),
        vec![MockEvent::SetNull {
            index: 1,
            sql_type: SqlType::Varchar
        }]
    );
    Ok(())
}

#[test]
fn output_parameters_are_registered_and_read_back() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "{call transfer(?, ?, ?)}";
    db.script(
        sql,
        MockScript::new()
            .metadata(MetadataMode::CountOnly(3))
            .result(MockResult::Count(2))
            .out_value(2, SqlValue::Double(12.5))
            .out_value(3, SqlValue::Int(4)),
    );
    let accessor = Accessor::new();
    let mut conn = db.connect();

    let balance = OutParameter::new(SqlType::Double);
    let counter = OutParameter::with_value(SqlType::Integer, SqlValue::Int(3));
    let rows = accessor.execute_with(&mut conn, sql, &params![7, &balance, &counter])?;

    assert_eq!(rows, 2);
    assert_eq!(balance.value(), SqlValue::Double(12.5));
    assert_eq!(counter.value(), SqlValue::Int(4));
    assert_eq!(
        binds(&db),
        vec![
            MockEvent::SetValue {
                index: 1,
                value: SqlValue::Int(7)
            },
            MockEvent::RegisterOut {
                index: 2,
                sql_type: SqlType::Double
            },
            MockEvent::RegisterOut {
                index: 3,
                sql_type: SqlType::Integer
            },
            MockEvent::SetValue {
                index: 3,
                value: SqlValue::Int(3)
            },
        ]
    );
    assert!(db.events().contains(&MockEvent::Prepared {
        sql: sql.to_string(),
        callable: true,
        keys: GeneratedKeys::None,
    }));
    Ok(())
}

#[test]
fn output_parameters_outside_calls_are_rejected_before_io() {
    let db = MockDatabase::new();
    let accessor = Accessor::new();
    let mut conn = db.connect();
    let out = OutParameter::new(SqlType::Integer);

    let err = accessor
        .query_with(&mut conn, "SELECT ?", &ArrayHandler::new(), &params![&out])
        .unwrap_err();
    assert!(matches!(err, SqlAccessorError::InvalidArgument(_)));

    let err = accessor
        .batch_with(&mut conn, "UPDATE t SET a = ?", &[params![1], params![&out]])
        .unwrap_err();
    assert!(matches!(err, SqlAccessorError::InvalidArgument(_)));
    assert_eq!(db.events(), vec![MockEvent::ConnectionOpened]);
}

#[test]
fn caller_prepared_statements_can_be_filled() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "INSERT INTO t VALUES (?, ?)";
    db.script(
        sql,
        MockScript::new().metadata(MetadataMode::Typed(vec![SqlType::Date, SqlType::Blob])),
    );
    let accessor = Accessor::new();
    let mut conn = db.connect();

    let mut stmt = conn.prepare(sql, GeneratedKeys::None)?;
    accessor.fill_statement(&mut *stmt, &params![Param::null(), vec![1_u8, 2]])?;
    let err = accessor
        .fill_statement(&mut *stmt, &params![1, 2, 3])
        .unwrap_err();
    assert!(matches!(
        err,
        SqlAccessorError::ParameterCountMismatch {
            expected: 2,
            given: 3
        }
    ));
    stmt.close()?;

    assert_eq!(
        binds(&db),
        vec![
            MockEvent::SetNull {
                index: 1,
                sql_type: SqlType::Date
            },
            MockEvent::SetValue {
                index: 2,
                value: SqlValue::Blob(vec![1, 2])
            },
        ]
    );
    Ok(())
}

#[test]
fn statement_options_are_applied_when_set() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "SELECT name FROM t";
    db.script(
        sql,
        MockScript::new().result(MockResult::rows(
            vec![ColumnMeta::new("name", SqlType::Varchar)],
            vec![
                vec![SqlValue::from("abcdef")],
                vec![SqlValue::from("ghijkl")],
                vec![SqlValue::from("mnopqr")],
            ],
        )),
    );
    let config = StatementConfiguration::builder()
        .fetch_direction(FetchDirection::Forward)
        .fetch_size(50)
        .max_field_size(2)
        .max_rows(2)
        .query_timeout(std::time::Duration::from_secs(30))
        .build();
    let accessor = Accessor::builder().statement_config(config).build();
    let mut conn = db.connect();

    let names: Vec<String> =
        accessor.query_with(&mut conn, sql, &ColumnListHandler::new(), &params![])?;
    assert_eq!(names, vec!["ab", "gh"]);

    let configured: Vec<(&str, String)> = db
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MockEvent::Configured { option, value } => Some((option, value)),
            _ => None,
        })
        .collect();
    assert_eq!(
        configured,
        vec![
            ("fetch_direction", "Forward".to_string()),
            ("fetch_size", "50".to_string()),
            ("max_field_size", "2".to_string()),
            ("max_rows", "2".to_string()),
            ("query_timeout", "30".to_string()),
        ]
    );

    db.clear_events();
    Accessor::new().query_with(&mut conn, sql, &ArrayListHandler::new(), &params![])?;
    assert!(
        db.events_matching(|e| matches!(e, MockEvent::Configured { .. }))
            .is_empty()
    );
    Ok(())
}

#[test]
fn mock_batches_report_counts_and_keys() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "INSERT INTO t (a) VALUES (?)";
    db.script(
        sql,
        MockScript::new()
            .metadata(MetadataMode::CountOnly(1))
            .update_count(1)
            .generated_keys(vec![10, 11, 12]),
    );
    let accessor = Accessor::new();
    let mut conn = db.connect();

    let keys: Vec<i64> = accessor.insert_batch_with(
        &mut conn,
        sql,
        &ColumnListHandler::new(),
        &[params![1], params![2], params![3]],
    )?;
    assert_eq!(keys, vec![10, 11, 12]);
    assert_eq!(
        db.events_matching(|e| matches!(e, MockEvent::BatchAdded)).len(),
        3
    );
    assert_eq!(metadata_requests(&db), 3);

    let counts = accessor.batch_with(&mut conn, sql, &[])?;
    assert!(counts.is_empty());

    let first: Option<i64> =
        accessor.insert_with(&mut conn, sql, &ScalarHandler::new(), &params![4])?;
    assert_eq!(first, Some(10));
    Ok(())
}

#[test]
fn execute_results_collects_every_cursor() -> Result<(), Box<dyn std::error::Error>> {
    let db = MockDatabase::new();
    let sql = "{call report()}";
    let column = || vec![ColumnMeta::new("n", SqlType::Integer)];
    db.script(
        sql,
        MockScript::new()
            .result(MockResult::rows(column(), vec![vec![SqlValue::Int(1)]]))
            .result(MockResult::rows(
                column(),
                vec![vec![SqlValue::Int(2)], vec![SqlValue::Int(3)]],
            ))
            .result(MockResult::Count(5))
            .result(MockResult::rows(column(), vec![vec![SqlValue::Int(4)]])),
    );
    let accessor = Accessor::new();
    let mut conn = db.connect();

    let results: Vec<Vec<i32>> =
        accessor.execute_results_with(&mut conn, sql, &ColumnListHandler::new(), &params![])?;
    assert_eq!(results, vec![vec![1], vec![2, 3]]);
    assert_eq!(
        db.events_matching(|e| matches!(e, MockEvent::CursorClosed))
            .len(),
        2
    );

    let rows = accessor.execute_with(&mut conn, sql, &params![])?;
    assert_eq!(rows, 0);
    Ok(())
}
