mod common;

use std::sync::Arc;

use support_chat_api::loader::{LoadError, Table, load_all, load_table};

use common::{ScriptedLlm, db_state, lazy_state};

const USERS_CSV: &str = "\
id,first_name,last_name,email,age,gender,state,street_address,postal_code,city,country,latitude,longitude,traffic_source,created_at
1,Ada,Lovelace,ada@example.com,36,F,London,1 Main St,N1,London,UK,51.5,-0.12,Search,2022-03-04 05:06:07
2,Alan,Turing,alan@example.com,,M,,,,,UK,,,Email,
";

const ORDERS_CSV: &str = "\
order_id,user_id,status,gender,created_at,returned_at,shipped_at,delivered_at,num_of_item
10,1,Shipped,F,2022-04-01 10:00:00,,2022-04-02 10:00:00,,1
11,2,Processing,M,2022-04-03 10:00:00,,,,2
";

// Sequential on purpose: every section truncates the shared tables.
#[tokio::test]
async fn loader_inserts_once_and_refuses_to_reload() -> anyhow::Result<()> {
    let Some(state) = db_state(Arc::new(ScriptedLlm::default())).await? else {
        return Ok(());
    };

    let rows = load_table(&state.pool, Table::Users, USERS_CSV.as_bytes()).await?;
    assert_eq!(rows, 2);
    let rows = load_table(&state.pool, Table::Orders, ORDERS_CSV.as_bytes()).await?;
    assert_eq!(rows, 2);

    // second run collides on the primary key instead of upserting
    let err = load_table(&state.pool, Table::Users, USERS_CSV.as_bytes())
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "unexpected error: {err}");
    assert!(matches!(err, LoadError::Insert { row: 1, .. }));

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(count.0, 2);

    // identity continues after the imported ids
    let next: (i64,) = sqlx::query_as(
        "INSERT INTO users (first_name, last_name, email) VALUES ('new', '', 'new@example.com') RETURNING id",
    )
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(next.0, 3);

    // a failing row rolls back its own file but not the files before it
    let Some(state) = db_state(Arc::new(ScriptedLlm::default())).await? else {
        return Ok(());
    };

    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("users.csv"), USERS_CSV)?;
    // order 21 points at a user that does not exist
    std::fs::write(
        dir.path().join("orders.csv"),
        "order_id,user_id,status,gender,created_at,returned_at,shipped_at,delivered_at,num_of_item\n20,1,Shipped,F,,,,,1\n21,99,Shipped,F,,,,,1\n",
    )?;

    let err = load_all(&state.pool, dir.path(), &[Table::Orders, Table::Users])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Insert {
            table: Table::Orders,
            row: 2,
            ..
        }
    ));

    let users: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;
    let orders: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(users.0, 2);
    assert_eq!(orders.0, 0);

    Ok(())
}

#[tokio::test]
async fn missing_file_is_reported_with_its_path() -> anyhow::Result<()> {
    let state = lazy_state(Arc::new(ScriptedLlm::default()));

    let dir = tempfile::tempdir()?;
    let err = load_all(&state.pool, dir.path(), &[Table::Products])
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { table: Table::Products, .. }));
    assert!(err.to_string().contains("products.csv"));
    Ok(())
}
