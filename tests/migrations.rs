use coach_api::test_support::{TestDatabase, database_or_skip};

async fn table_exists(pool: &sqlx::PgPool, table: &str) -> bool {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public' AND table_name = $1",
    )
    .bind(table)
    .fetch_one(pool)
    .await
    .expect("lookup succeeded");
    count == 1
}

#[tokio::test]
async fn migrations_apply_and_revert_cleanly() {
    let Some(test_db) = database_or_skip("migration revert test").await else {
        return;
    };

    let pool = test_db.pool_clone();
    let migrator = TestDatabase::migrator();

    migrator.run(&pool).await.expect("migrations run");
    for table in ["users", "schools", "user_profiles", "degree_tracks", "objective_points"] {
        assert!(table_exists(&pool, table).await, "{table} should exist");
    }

    migrator.undo(&pool, 0).await.expect("migrations revert");

    for table in ["users", "schools", "course_overviews", "degrees", "degree_tracks"] {
        assert!(
            !table_exists(&pool, table).await,
            "{table} should be dropped after revert"
        );
    }

    migrator.run(&pool).await.expect("migrations rerun");
    assert!(table_exists(&pool, "users").await);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn school_names_are_unique() {
    let Some(test_db) = database_or_skip("school uniqueness test").await else {
        return;
    };
    let pool = test_db.pool_clone();

    sqlx::query("INSERT INTO schools (id, name) VALUES (gen_random_uuid(), 'Central')")
        .execute(&pool)
        .await
        .expect("first school");
    let duplicate =
        sqlx::query("INSERT INTO schools (id, name) VALUES (gen_random_uuid(), 'Central')")
            .execute(&pool)
            .await;
    assert!(duplicate.is_err(), "duplicate school names must be rejected");

    test_db.close().await.expect("failed to drop test database");
}
