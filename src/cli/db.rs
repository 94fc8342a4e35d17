use sqlx::{
    migrate::{Migrate, Migrator},
    PgPool,
};
use tokio::process::Command;

/// Migrations compiled into the binary.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Adds a reversible migration pair through sqlx-cli.
pub async fn db_generate(migration_name: &str) -> anyhow::Result<()> {
    let status = Command::new("sqlx")
        .arg("migrate")
        .arg("add")
        .arg(migration_name)
        .arg("-r")
        .status()
        .await?;
    anyhow::ensure!(status.success(), "sqlx migrate add exited with {}", status);
    Ok(())
}

/// Every known migration with whether it has been applied.
pub async fn db_list(pool: &PgPool) -> anyhow::Result<Vec<(i64, String, bool)>> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    let applied: Vec<i64> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|x| x.version)
        .collect();
    Ok(MIGRATOR
        .iter()
        .filter(|x| !x.migration_type.is_down_migration())
        .map(|x| {
            (
                x.version,
                x.description.to_string(),
                applied.contains(&x.version),
            )
        })
        .collect())
}

pub async fn db_migrate(pool: &PgPool) -> anyhow::Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Reverts the latest applied migration. Returns its version, if any.
pub async fn db_revert(pool: &PgPool) -> anyhow::Result<Option<i64>> {
    let mut applied: Vec<i64> = {
        let mut conn = pool.acquire().await?;
        conn.ensure_migrations_table().await?;
        conn.list_applied_migrations()
            .await?
            .into_iter()
            .map(|x| x.version)
            .collect()
    };
    applied.sort_unstable();
    let Some(latest) = applied.pop() else {
        return Ok(None);
    };
    let target = applied.last().copied().unwrap_or(0);
    MIGRATOR.undo(pool, target).await?;
    Ok(Some(latest))
}
