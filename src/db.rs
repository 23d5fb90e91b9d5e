use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::MigratorTrait;

use crate::{config::Config, error::AppResult};

pub async fn connect_and_migrate(config: &Config) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(config.database_url.clone());
    opts.max_connections(config.db_max_pool_size)
        .min_connections(1)
        .connect_timeout(config.db_connect_timeout)
        .acquire_timeout(config.db_connect_timeout)
        .idle_timeout(config.db_idle_timeout)
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;

    if db.get_database_backend() == DbBackend::Sqlite {
        db.execute(Statement::from_string(DbBackend::Sqlite, "PRAGMA journal_mode=WAL".to_string()))
            .await?;
    }

    migration::Migrator::up(&db, None).await?;
    tracing::debug!(url = %config.database_url, "database ready");
    Ok(db)
}
