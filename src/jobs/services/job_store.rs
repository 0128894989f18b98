// src/jobs/services/job_store.rs
//! Job post, application and applicant-activity persistence

use chrono::{SecondsFormat, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashSet;
use tracing::{error, info};

use super::geo::BoundingBox;
use crate::common::helpers::encode_string_list;
use crate::common::{
    generate_application_id, generate_job_id, generate_saved_job_id, generate_search_id,
    generate_view_id, ApiError,
};
use crate::jobs::models::*;

/// Most recent searches / recent jobs / popular jobs returned
pub const SHORT_LIST_LIMIT: i64 = 10;

/// Job row joined with one timestamp from an activity table
#[derive(FromRow, Debug)]
pub struct JobActivityRow {
    #[sqlx(flatten)]
    pub job: JobPostRow,
    pub activity_at: Option<String>,
}

#[derive(FromRow, Debug)]
pub struct AppliedRow {
    #[sqlx(flatten)]
    pub job: JobPostRow,
    pub application_id: String,
    pub application_status: String,
    pub applied_at: Option<String>,
}

#[derive(FromRow, Debug)]
pub struct PopularRow {
    #[sqlx(flatten)]
    pub job: JobPostRow,
    pub application_count: i64,
    pub last_updated: Option<String>,
}

/// Microsecond timestamps keep "most recent first" ordering stable within a second
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Escapes LIKE wildcards so a search matches the title literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> ApiError {
    move |e| {
        error!(error = %e, "Database error {}", context);
        ApiError::DatabaseError(e)
    }
}

#[derive(Clone)]
pub struct JobStore {
    db: SqlitePool,
}

impl JobStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Employer side
    // ========================================================================

    pub async fn find_job(&self, job_id: &str) -> Result<Option<JobPostRow>, ApiError> {
        sqlx::query_as::<_, JobPostRow>("SELECT * FROM job_posts WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&self.db)
            .await
            .map_err(db_error("fetching job post"))
    }

    pub async fn find_owned_job(
        &self,
        job_id: &str,
        employer_id: &str,
    ) -> Result<Option<JobPostRow>, ApiError> {
        sqlx::query_as::<_, JobPostRow>("SELECT * FROM job_posts WHERE id = ? AND employer_id = ?")
            .bind(job_id)
            .bind(employer_id)
            .fetch_optional(&self.db)
            .await
            .map_err(db_error("fetching owned job post"))
    }

    pub async fn create(
        &self,
        employer_id: &str,
        company_name: &str,
        post: &CreateJobPost,
    ) -> Result<JobPostRow, ApiError> {
        let job_id = generate_job_id();
        let [lng, lat] = post.location.unwrap_or([0.0, 0.0]);
        let timestamp = now();

        sqlx::query(
            r#"
            INSERT INTO job_posts (id, employer_id, company_name, job_title, job_address,
                                   location_lng, location_lat, summary, key_responsibilities,
                                   qualifications, closing_statement, salary_min, salary_max,
                                   salary_currency, salary_period, work_type, employment_type,
                                   seniority, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job_id)
        .bind(employer_id)
        .bind(company_name)
        .bind(post.job_title.trim())
        .bind(post.job_address.trim())
        .bind(lng)
        .bind(lat)
        .bind(post.summary.as_deref().unwrap_or(""))
        .bind(encode_string_list(post.key_responsibilities.as_deref().unwrap_or(&[])))
        .bind(encode_string_list(post.qualifications.as_deref().unwrap_or(&[])))
        .bind(post.closing_statement.as_deref().unwrap_or(""))
        .bind(post.salary_min)
        .bind(post.salary_max)
        .bind(post.salary_currency.as_deref())
        .bind(post.salary_period.as_deref())
        .bind(post.work_type.as_deref())
        .bind(post.employment_type.as_deref())
        .bind(post.seniority.as_deref())
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.db)
        .await
        .map_err(db_error("creating job post"))?;

        info!(job_id = %job_id, employer_id = %employer_id, "Job post created");

        self.find_job(&job_id)
            .await?
            .ok_or_else(|| ApiError::InternalServer("Job post vanished after insert".to_string()))
    }

    /// Partial update of an owned post. `None` when the post does not exist or
    /// belongs to another employer.
    pub async fn update(
        &self,
        job_id: &str,
        employer_id: &str,
        company_name: &str,
        update: &UpdateJobPost,
    ) -> Result<Option<JobPostRow>, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE job_posts
            SET company_name = ?,
                job_title = COALESCE(?, job_title),
                job_address = COALESCE(?, job_address),
                location_lng = COALESCE(?, location_lng),
                location_lat = COALESCE(?, location_lat),
                summary = COALESCE(?, summary),
                key_responsibilities = COALESCE(?, key_responsibilities),
                qualifications = COALESCE(?, qualifications),
                closing_statement = COALESCE(?, closing_statement),
                salary_min = COALESCE(?, salary_min),
                salary_max = COALESCE(?, salary_max),
                salary_currency = COALESCE(?, salary_currency),
                salary_period = COALESCE(?, salary_period),
                work_type = COALESCE(?, work_type),
                employment_type = COALESCE(?, employment_type),
                seniority = COALESCE(?, seniority),
                updated_at = ?
            WHERE id = ? AND employer_id = ?
            "#,
        )
        .bind(company_name)
        .bind(update.job_title.as_deref().map(str::trim))
        .bind(update.job_address.as_deref().map(str::trim))
        .bind(update.location.map(|l| l[0]))
        .bind(update.location.map(|l| l[1]))
        .bind(update.summary.as_deref())
        .bind(update.key_responsibilities.as_deref().map(encode_string_list))
        .bind(update.qualifications.as_deref().map(encode_string_list))
        .bind(update.closing_statement.as_deref())
        .bind(update.salary_min)
        .bind(update.salary_max)
        .bind(update.salary_currency.as_deref())
        .bind(update.salary_period.as_deref())
        .bind(update.work_type.as_deref())
        .bind(update.employment_type.as_deref())
        .bind(update.seniority.as_deref())
        .bind(now())
        .bind(job_id)
        .bind(employer_id)
        .execute(&self.db)
        .await
        .map_err(db_error("updating job post"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_job(job_id).await
    }

    /// Deletes an owned post together with its applications, saves, views and
    /// popularity row. Returns false when nothing matched.
    pub async fn delete(&self, job_id: &str, employer_id: &str) -> Result<bool, ApiError> {
        let mut tx = self.db.begin().await.map_err(db_error("starting delete"))?;

        let owned: Option<(String,)> =
            sqlx::query_as("SELECT id FROM job_posts WHERE id = ? AND employer_id = ?")
                .bind(job_id)
                .bind(employer_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("checking job ownership"))?;

        if owned.is_none() {
            tx.rollback().await.map_err(db_error("rolling back delete"))?;
            return Ok(false);
        }

        for table in ["applications", "saved_jobs", "viewed_jobs", "popular_jobs"] {
            sqlx::query(&format!("DELETE FROM {} WHERE job_id = ?", table))
                .bind(job_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("deleting job dependents"))?;
        }

        sqlx::query("DELETE FROM job_posts WHERE id = ?")
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("deleting job post"))?;

        tx.commit().await.map_err(db_error("committing delete"))?;

        info!(job_id = %job_id, employer_id = %employer_id, "Job post deleted");
        Ok(true)
    }

    /// Newest first, `PAGE_SIZE` per page
    pub async fn list_for_employer(
        &self,
        employer_id: &str,
        page: i64,
    ) -> Result<(Vec<JobPostRow>, i64), ApiError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_posts WHERE employer_id = ?")
            .bind(employer_id)
            .fetch_one(&self.db)
            .await
            .map_err(db_error("counting employer jobs"))?;

        let jobs = sqlx::query_as::<_, JobPostRow>(
            r#"
            SELECT * FROM job_posts
            WHERE employer_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(employer_id)
        .bind(PAGE_SIZE)
        .bind(page_offset(page))
        .fetch_all(&self.db)
        .await
        .map_err(db_error("listing employer jobs"))?;

        Ok((jobs, total))
    }

    pub async fn application_stats(&self, job_id: &str) -> Result<ApplicationStats, ApiError> {
        let (total, rejected, hired): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'Rejected' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'Hired' THEN 1 ELSE 0 END), 0)
            FROM applications WHERE job_id = ?
            "#,
        )
        .bind(job_id)
        .fetch_one(&self.db)
        .await
        .map_err(db_error("computing application stats"))?;

        Ok(ApplicationStats {
            total,
            rejected,
            hired,
        })
    }

    pub async fn applications_for(&self, job_id: &str) -> Result<Vec<Application>, ApiError> {
        sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE job_id = ? ORDER BY applied_at DESC, rowid DESC",
        )
        .bind(job_id)
        .fetch_all(&self.db)
        .await
        .map_err(db_error("listing job applications"))
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    pub async fn within_box(&self, bbox: BoundingBox) -> Result<Vec<JobPostRow>, ApiError> {
        sqlx::query_as::<_, JobPostRow>(
            r#"
            SELECT * FROM job_posts
            WHERE location_lat BETWEEN ? AND ? AND location_lng BETWEEN ? AND ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lng)
        .bind(bbox.max_lng)
        .fetch_all(&self.db)
        .await
        .map_err(db_error("querying jobs by area"))
    }

    /// Case-insensitive substring match on the title
    pub async fn search_title(&self, term: &str) -> Result<Vec<JobPostRow>, ApiError> {
        sqlx::query_as::<_, JobPostRow>(
            r#"
            SELECT * FROM job_posts
            WHERE job_title LIKE ? ESCAPE '\'
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(like_pattern(term))
        .fetch_all(&self.db)
        .await
        .map_err(db_error("searching jobs"))
    }

    pub async fn recent(&self) -> Result<Vec<JobPostRow>, ApiError> {
        sqlx::query_as::<_, JobPostRow>(
            "SELECT * FROM job_posts ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(SHORT_LIST_LIMIT)
        .fetch_all(&self.db)
        .await
        .map_err(db_error("listing recent jobs"))
    }

    pub async fn all_jobs(&self) -> Result<Vec<JobPostRow>, ApiError> {
        sqlx::query_as::<_, JobPostRow>("SELECT * FROM job_posts ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.db)
            .await
            .map_err(db_error("listing jobs"))
    }

    pub async fn popular(&self) -> Result<Vec<PopularRow>, ApiError> {
        sqlx::query_as::<_, PopularRow>(
            r#"
            SELECT j.*, p.application_count, p.last_updated
            FROM popular_jobs p
            JOIN job_posts j ON j.id = p.job_id
            ORDER BY p.application_count DESC, p.last_updated DESC
            LIMIT ?
            "#,
        )
        .bind(SHORT_LIST_LIMIT)
        .fetch_all(&self.db)
        .await
        .map_err(db_error("listing popular jobs"))
    }

    // ========================================================================
    // Search history
    // ========================================================================

    /// Inserts the query or refreshes its timestamp when it was searched before
    pub async fn record_search(&self, applicant_id: &str, query: &str) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO search_history (id, applicant_id, query, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(applicant_id, query) DO UPDATE SET created_at = excluded.created_at
            "#,
        )
        .bind(generate_search_id())
        .bind(applicant_id)
        .bind(query.trim())
        .bind(now())
        .execute(&self.db)
        .await
        .map_err(db_error("recording search"))?;
        Ok(())
    }

    pub async fn recent_searches(
        &self,
        applicant_id: &str,
    ) -> Result<Vec<SearchHistoryEntry>, ApiError> {
        sqlx::query_as::<_, SearchHistoryEntry>(
            r#"
            SELECT id, query, created_at FROM search_history
            WHERE applicant_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(applicant_id)
        .bind(SHORT_LIST_LIMIT)
        .fetch_all(&self.db)
        .await
        .map_err(db_error("listing search history"))
    }

    // ========================================================================
    // Applications
    // ========================================================================

    /// Creates a Pending application and bumps the job's popularity in one
    /// transaction. `None` when the applicant already applied.
    pub async fn apply(
        &self,
        applicant_id: &str,
        job_id: &str,
    ) -> Result<Option<Application>, ApiError> {
        let application_id = generate_application_id();
        let timestamp = now();

        let mut tx = self.db.begin().await.map_err(db_error("starting application"))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO applications (id, job_id, applicant_id, status, applied_at)
            VALUES (?, ?, ?, 'Pending', ?)
            ON CONFLICT(job_id, applicant_id) DO NOTHING
            "#,
        )
        .bind(&application_id)
        .bind(job_id)
        .bind(applicant_id)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await
        .map_err(db_error("creating application"))?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await.map_err(db_error("rolling back application"))?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO popular_jobs (job_id, application_count, last_updated)
            VALUES (?, 1, ?)
            ON CONFLICT(job_id) DO UPDATE
            SET application_count = application_count + 1, last_updated = excluded.last_updated
            "#,
        )
        .bind(job_id)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await
        .map_err(db_error("updating job popularity"))?;

        tx.commit().await.map_err(db_error("committing application"))?;

        info!(applicant_id = %applicant_id, job_id = %job_id, "Application submitted");

        Ok(Some(Application {
            id: application_id,
            job_id: job_id.to_string(),
            applicant_id: applicant_id.to_string(),
            status: "Pending".to_string(),
            applied_at: Some(timestamp),
        }))
    }

    pub async fn is_applied(&self, applicant_id: &str, job_id: &str) -> Result<bool, ApiError> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT id FROM applications WHERE applicant_id = ? AND job_id = ?")
                .bind(applicant_id)
                .bind(job_id)
                .fetch_optional(&self.db)
                .await
                .map_err(db_error("checking application"))?;
        Ok(found.is_some())
    }

    pub async fn applied(
        &self,
        applicant_id: &str,
        page: i64,
    ) -> Result<(Vec<AppliedRow>, i64), ApiError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE applicant_id = ?")
                .bind(applicant_id)
                .fetch_one(&self.db)
                .await
                .map_err(db_error("counting applications"))?;

        let rows = sqlx::query_as::<_, AppliedRow>(
            r#"
            SELECT j.*, a.id AS application_id, a.status AS application_status, a.applied_at
            FROM applications a
            JOIN job_posts j ON j.id = a.job_id
            WHERE a.applicant_id = ?
            ORDER BY a.applied_at DESC, a.rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(applicant_id)
        .bind(PAGE_SIZE)
        .bind(page_offset(page))
        .fetch_all(&self.db)
        .await
        .map_err(db_error("listing applications"))?;

        Ok((rows, total))
    }

    // ========================================================================
    // Saved and viewed jobs
    // ========================================================================

    pub async fn saved_job_ids(&self, applicant_id: &str) -> Result<HashSet<String>, ApiError> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT job_id FROM saved_jobs WHERE applicant_id = ?")
                .bind(applicant_id)
                .fetch_all(&self.db)
                .await
                .map_err(db_error("listing saved job ids"))?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Saves the job, or unsaves it when already saved. Returns the new state.
    pub async fn toggle_save(&self, applicant_id: &str, job_id: &str) -> Result<bool, ApiError> {
        if self.unsave(applicant_id, job_id).await? {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO saved_jobs (id, job_id, applicant_id, saved_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(job_id, applicant_id) DO NOTHING
            "#,
        )
        .bind(generate_saved_job_id())
        .bind(job_id)
        .bind(applicant_id)
        .bind(now())
        .execute(&self.db)
        .await
        .map_err(db_error("saving job"))?;

        Ok(true)
    }

    /// Returns false when the job was not saved
    pub async fn unsave(&self, applicant_id: &str, job_id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM saved_jobs WHERE applicant_id = ? AND job_id = ?")
            .bind(applicant_id)
            .bind(job_id)
            .execute(&self.db)
            .await
            .map_err(db_error("unsaving job"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn saved(&self, applicant_id: &str) -> Result<Vec<JobActivityRow>, ApiError> {
        sqlx::query_as::<_, JobActivityRow>(
            r#"
            SELECT j.*, s.saved_at AS activity_at
            FROM saved_jobs s
            JOIN job_posts j ON j.id = s.job_id
            WHERE s.applicant_id = ?
            ORDER BY s.saved_at DESC, s.rowid DESC
            "#,
        )
        .bind(applicant_id)
        .fetch_all(&self.db)
        .await
        .map_err(db_error("listing saved jobs"))
    }

    /// Records a view, refreshing the timestamp of an earlier one
    pub async fn mark_viewed(&self, applicant_id: &str, job_id: &str) -> Result<String, ApiError> {
        let timestamp = now();
        sqlx::query(
            r#"
            INSERT INTO viewed_jobs (id, job_id, applicant_id, viewed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(job_id, applicant_id) DO UPDATE SET viewed_at = excluded.viewed_at
            "#,
        )
        .bind(generate_view_id())
        .bind(job_id)
        .bind(applicant_id)
        .bind(&timestamp)
        .execute(&self.db)
        .await
        .map_err(db_error("marking job viewed"))?;
        Ok(timestamp)
    }

    pub async fn viewed(&self, applicant_id: &str) -> Result<Vec<JobActivityRow>, ApiError> {
        sqlx::query_as::<_, JobActivityRow>(
            r#"
            SELECT j.*, v.viewed_at AS activity_at
            FROM viewed_jobs v
            JOIN job_posts j ON j.id = v.job_id
            WHERE v.applicant_id = ?
            ORDER BY v.viewed_at DESC
            "#,
        )
        .bind(applicant_id)
        .fetch_all(&self.db)
        .await
        .map_err(db_error("listing viewed jobs"))
    }
}
