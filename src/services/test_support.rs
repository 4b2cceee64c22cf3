use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::db::{establish_connection_with_config, run_migrations, DbConfig};

/// Fresh migrated in-memory SQLite database. One connection keeps every
/// query on the same in-memory instance.
pub(crate) async fn memory_db() -> Arc<DatabaseConnection> {
    let config = DbConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = establish_connection_with_config(&config)
        .await
        .expect("in-memory database");
    run_migrations(&db).await.expect("migrations");
    Arc::new(db)
}
