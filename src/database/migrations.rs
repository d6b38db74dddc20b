use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_work_logs_table(pool).await?;
    create_invoices_table(pool).await?;
    create_app_state_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_work_logs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS work_logs (
            date_iso TEXT PRIMARY KEY,
            id TEXT NOT NULL,
            hours REAL NOT NULL CHECK (hours > 0),
            description TEXT NOT NULL DEFAULT '',
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_invoices_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS invoices (
            number INTEGER PRIMARY KEY CHECK (number > 0),
            id TEXT UNIQUE NOT NULL,
            position INTEGER NOT NULL,
            issue_date TEXT NOT NULL,
            period_start TEXT NOT NULL,
            period_end TEXT NOT NULL,
            items TEXT NOT NULL,
            subtotal REAL NOT NULL,
            gst_included BOOLEAN NOT NULL,
            gst_amount REAL NOT NULL,
            total REAL NOT NULL,
            document_uri TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_app_state_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
