use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema,
    Statement,
};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{department, menu, post, role, user};

/// Initialize database connection and auto-migrate tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let database_url = config.connection_url();

    match &config.url {
        Some(_) => info!("Connecting to database via configured url"),
        None => info!(
            "Connecting to database: {}:{}/{}",
            config.host, config.port, config.name
        ),
    }

    let mut opt = ConnectOptions::new(&database_url);
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Create every entity table that does not exist yet
pub async fn auto_migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    // Referenced tables first, then the tables pointing at them
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(department::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(post::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(role::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(menu::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user::Entity)).await?;

    info!("Auto-migration completed successfully");
    Ok(())
}

/// Create a table if it doesn't exist
async fn create_table_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();

    let sql = backend.build(&stmt);

    db.execute(Statement::from_string(backend, sql.to_string())).await?;

    Ok(())
}
