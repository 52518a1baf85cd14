use anyhow::Context;
use the_eye_server::config::Config;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("Failed to load configuration")?;

    if config.is_postgres() {
        return serve_postgres(config).await;
    }

    serve_sqlite(config).await
}

#[cfg(feature = "sqlite")]
async fn serve_sqlite(config: Config) -> anyhow::Result<()> {
    let store = the_eye_storage_sqlx::SqlxSqliteStore::connect(
        &config.database_url,
        config.database_max_connections,
    )
    .await
    .context("Failed to open SQLite database")?;

    the_eye_server::run(&config, store).await?;

    Ok(())
}

#[cfg(not(feature = "sqlite"))]
async fn serve_sqlite(config: Config) -> anyhow::Result<()> {
    anyhow::bail!(
        "{} needs the `sqlite` feature, which this binary was built without",
        config.database_url
    )
}

#[cfg(feature = "postgres")]
async fn serve_postgres(config: Config) -> anyhow::Result<()> {
    let store = the_eye_storage_sqlx::SqlxPgStore::connect(
        &config.database_url,
        config.database_max_connections,
    )
    .await
    .context("Failed to connect to Postgres")?;

    the_eye_server::run(&config, store).await?;

    Ok(())
}

#[cfg(not(feature = "postgres"))]
async fn serve_postgres(config: Config) -> anyhow::Result<()> {
    anyhow::bail!(
        "{} needs the `postgres` feature, which this binary was built without",
        config.database_url
    )
}
