use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait,
};
use tokio::fs;

pub type OrmConn = DatabaseConnection;

const MIGRATIONS_TABLE: &str = "_schema_migrations";

pub async fn create_orm_conn(database_url: &str) -> Result<OrmConn> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(20)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Apply `migrations/*.sql` that have not run yet, in filename order.
pub async fn run_migrations(conn: &OrmConn) -> Result<()> {
    run_migrations_from(conn, Path::new("migrations")).await
}

pub async fn run_migrations_from(conn: &OrmConn, dir: &Path) -> Result<()> {
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_string(
        backend,
        format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                name TEXT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"
        ),
    ))
    .await?;

    for file in migration_files(dir).await? {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .context("migration file name is not UTF-8")?
            .to_string();

        let applied = conn
            .query_one(Statement::from_sql_and_values(
                backend,
                format!("SELECT name FROM {MIGRATIONS_TABLE} WHERE name = $1"),
                [name.clone().into()],
            ))
            .await?
            .is_some();
        if applied {
            continue;
        }

        let sql = fs::read_to_string(&file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;

        // One transaction per file; Postgres rejects multi-command prepared statements.
        let txn = conn.begin().await?;
        for stmt in split_statements(&sql) {
            txn.execute(Statement::from_string(backend, stmt))
                .await
                .with_context(|| format!("migration {name} failed"))?;
        }
        txn.execute(Statement::from_sql_and_values(
            backend,
            format!("INSERT INTO {MIGRATIONS_TABLE} (name) VALUES ($1)"),
            [name.clone().into()],
        ))
        .await?;
        txn.commit().await?;

        tracing::info!(migration = %name, "migration applied");
    }

    Ok(())
}

async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("opening {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn split_statements(sql: &str) -> Vec<String> {
    let without_comments = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}
