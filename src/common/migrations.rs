// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if missing. Set `RESET_DB=true` to drop and recreate the schema.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    } else {
        info!("ℹ️  Skipping table drop (RESET_DB not set). Tables will be created if they don't exist.");
    }

    create_account_tables(pool).await?;
    create_code_tables(pool).await?;
    create_job_tables(pool).await?;
    create_activity_tables(pool).await?;
    create_decal_tables(pool).await?;
    create_indexes(pool).await?;

    info!("✅ Database migration completed successfully!");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Drop tables in reverse dependency order
    let tables = vec![
        "decal_scans",
        "decals",
        "popular_jobs",
        "search_history",
        "viewed_jobs",
        "saved_jobs",
        "applications",
        "job_posts",
        "auth_codes",
        "otps",
        "employment_history",
        "applicants",
        "employers",
    ];

    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn create_account_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employers (
            id TEXT PRIMARY KEY,
            company_name TEXT NOT NULL,
            full_name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            phone TEXT UNIQUE NOT NULL,
            password_hash TEXT,
            company_logo TEXT,
            address TEXT NOT NULL,
            location_lng REAL,
            location_lat REAL,
            heading TEXT,
            body TEXT,
            is_verified INTEGER NOT NULL DEFAULT 0,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // google_id / linkedin_id are NULL for password accounts; SQLite allows many NULLs under UNIQUE
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applicants (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            name TEXT,
            password_hash TEXT,
            pending_password_hash TEXT,
            google_id TEXT UNIQUE,
            linkedin_id TEXT UNIQUE,
            profile_pic TEXT,
            heading TEXT,
            description TEXT,
            is_verified INTEGER NOT NULL DEFAULT 0,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employment_history (
            id TEXT PRIMARY KEY,
            applicant_id TEXT NOT NULL,
            job_title TEXT NOT NULL,
            company_logo TEXT,
            company_name TEXT NOT NULL,
            employment_type TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            description TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(applicant_id) REFERENCES applicants(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // An email belongs to at most one account type
    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS employers_email_role_guard
        BEFORE INSERT ON employers
        WHEN EXISTS (SELECT 1 FROM applicants WHERE email = NEW.email)
        BEGIN
            SELECT RAISE(ABORT, 'email registered under another role');
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS applicants_email_role_guard
        BEFORE INSERT ON applicants
        WHEN EXISTS (SELECT 1 FROM employers WHERE email = NEW.email)
        BEGIN
            SELECT RAISE(ABORT, 'email registered under another role');
        END
        "#,
    )
    .execute(pool)
    .await?;

    info!("👤 Account tables ready");
    Ok(())
}

async fn create_code_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // One active OTP per email
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS otps (
            email TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            created_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS auth_codes (
            code TEXT PRIMARY KEY,
            applicant_id TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(applicant_id) REFERENCES applicants(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("🔑 One-time code tables ready");
    Ok(())
}

async fn create_job_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // key_responsibilities / qualifications hold JSON arrays
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_posts (
            id TEXT PRIMARY KEY,
            employer_id TEXT NOT NULL,
            company_name TEXT NOT NULL,
            job_title TEXT NOT NULL,
            job_address TEXT NOT NULL,
            location_lng REAL NOT NULL,
            location_lat REAL NOT NULL,
            summary TEXT NOT NULL DEFAULT '',
            key_responsibilities TEXT NOT NULL DEFAULT '[]',
            qualifications TEXT NOT NULL DEFAULT '[]',
            closing_statement TEXT NOT NULL DEFAULT '',
            salary_min REAL,
            salary_max REAL,
            salary_currency TEXT,
            salary_period TEXT CHECK (salary_period IN ('Hourly', 'Weekly', 'Monthly', 'Annually')),
            work_type TEXT CHECK (work_type IN ('Remote', 'Hybrid', 'Onsite')),
            employment_type TEXT CHECK (employment_type IN ('Full Time', 'Part Time', 'Contract')),
            seniority TEXT CHECK (seniority IN ('Junior', 'Mid', 'Senior')),
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(employer_id) REFERENCES employers(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL,
            applicant_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Pending'
                CHECK (status IN ('Pending', 'Reviewed', 'Interview', 'Hired', 'Rejected')),
            applied_at TEXT DEFAULT (datetime('now')),
            UNIQUE(job_id, applicant_id),
            FOREIGN KEY(job_id) REFERENCES job_posts(id),
            FOREIGN KEY(applicant_id) REFERENCES applicants(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS popular_jobs (
            job_id TEXT PRIMARY KEY,
            application_count INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(job_id) REFERENCES job_posts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("💼 Job tables ready");
    Ok(())
}

async fn create_activity_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_jobs (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL,
            applicant_id TEXT NOT NULL,
            saved_at TEXT DEFAULT (datetime('now')),
            UNIQUE(job_id, applicant_id),
            FOREIGN KEY(job_id) REFERENCES job_posts(id),
            FOREIGN KEY(applicant_id) REFERENCES applicants(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS viewed_jobs (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL,
            applicant_id TEXT NOT NULL,
            viewed_at TEXT DEFAULT (datetime('now')),
            UNIQUE(job_id, applicant_id),
            FOREIGN KEY(job_id) REFERENCES job_posts(id),
            FOREIGN KEY(applicant_id) REFERENCES applicants(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_history (
            id TEXT PRIMARY KEY,
            applicant_id TEXT NOT NULL,
            query TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            UNIQUE(applicant_id, query),
            FOREIGN KEY(applicant_id) REFERENCES applicants(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("🕘 Activity tables ready");
    Ok(())
}

async fn create_decal_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS decals (
            id TEXT PRIMARY KEY,
            employer_id TEXT NOT NULL,
            nfc_tag_id TEXT NOT NULL UNIQUE,
            created_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(employer_id) REFERENCES employers(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS decal_scans (
            id TEXT PRIMARY KEY,
            decal_id TEXT NOT NULL,
            applicant_id TEXT NOT NULL,
            scanned_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(decal_id) REFERENCES decals(id),
            FOREIGN KEY(applicant_id) REFERENCES applicants(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("🏷️  Decal tables ready");
    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_employment_history_applicant ON employment_history(applicant_id)",
        "CREATE INDEX IF NOT EXISTS idx_otps_expires_at ON otps(expires_at)",
        "CREATE INDEX IF NOT EXISTS idx_auth_codes_applicant ON auth_codes(applicant_id)",
        "CREATE INDEX IF NOT EXISTS idx_auth_codes_expires_at ON auth_codes(expires_at)",
        "CREATE INDEX IF NOT EXISTS idx_job_posts_employer ON job_posts(employer_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_job_posts_created_at ON job_posts(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_applications_applicant ON applications(applicant_id, applied_at)",
        "CREATE INDEX IF NOT EXISTS idx_popular_jobs_count ON popular_jobs(application_count)",
        "CREATE INDEX IF NOT EXISTS idx_saved_jobs_applicant ON saved_jobs(applicant_id, saved_at)",
        "CREATE INDEX IF NOT EXISTS idx_viewed_jobs_applicant ON viewed_jobs(applicant_id, viewed_at)",
        "CREATE INDEX IF NOT EXISTS idx_search_history_applicant ON search_history(applicant_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_decals_employer ON decals(employer_id)",
        "CREATE INDEX IF NOT EXISTS idx_decal_scans_decal ON decal_scans(decal_id, scanned_at)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}
