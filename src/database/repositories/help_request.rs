use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction, types::Json};

use crate::database::{
    models::{
        HelpHelper, HelpRequest, HelpRequestItem, HelpStatus, PageRequest, UrgencyLevel,
        UserSummary,
    },
    new_id,
};

const HELP_REQUEST_COLUMNS: &str = r#"
    h.id,
    h.title,
    h.description,
    h.urgency_level,
    h.status,
    h.requestor_id,
    h.created_at,
    h.updated_at
"#;

const HELP_REQUEST_RETURNING: &str = r#"
    id,
    title,
    description,
    urgency_level,
    status,
    requestor_id,
    created_at,
    updated_at
"#;

// Helpers are aggregated into a JSON array of user summaries per request.
const HELPER_SUMMARIES: &str = r#"
    (
        SELECT COUNT(*) FROM help_helpers hh WHERE hh.help_request_id = h.id
    ) AS helper_count,
    (
        SELECT
            json_group_array(
                json_object('id', hu.id, 'name', hu.name, 'profileImage', hu.profile_image)
            )
        FROM
            help_helpers hh
            INNER JOIN users hu ON hu.id = hh.user_id
        WHERE
            hh.help_request_id = h.id
    ) AS helpers
"#;

#[derive(sqlx::FromRow)]
struct HelpRequestRow {
    #[sqlx(flatten)]
    help_request: HelpRequest,
    requestor_name: String,
    requestor_profile_image: Option<String>,
    requestor_email: Option<String>,
    helper_count: i64,
    helpers: Json<Vec<UserSummary>>,
}

impl From<HelpRequestRow> for HelpRequestItem {
    fn from(row: HelpRequestRow) -> Self {
        Self {
            requestor: UserSummary {
                id: row.help_request.requestor_id.clone(),
                name: row.requestor_name,
                profile_image: row.requestor_profile_image,
                email: row.requestor_email,
            },
            helper_count: row.helper_count,
            helpers: row.helpers.0,
            help_request: row.help_request,
        }
    }
}

#[derive(Clone)]
pub struct HelpRequestRepository {
    pool: SqlitePool,
}

impl HelpRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest requests first.
    pub async fn list_help_requests(
        &self,
        urgency_level: Option<UrgencyLevel>,
        status: Option<HelpStatus>,
        page: PageRequest,
    ) -> Result<(Vec<HelpRequestItem>, i64), sqlx::Error> {
        let rows = sqlx::query_as::<_, HelpRequestRow>(&format!(
            r#"
            SELECT
                {HELP_REQUEST_COLUMNS},
                u.name AS requestor_name,
                u.profile_image AS requestor_profile_image,
                NULL AS requestor_email,
                {HELPER_SUMMARIES}
            FROM
                help_requests h
                INNER JOIN users u ON u.id = h.requestor_id
            WHERE
                (?1 IS NULL OR h.urgency_level = ?1)
                AND (?2 IS NULL OR h.status = ?2)
            ORDER BY
                h.created_at DESC,
                h.rowid DESC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(urgency_level)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT
                COUNT(*)
            FROM
                help_requests h
            WHERE
                (?1 IS NULL OR h.urgency_level = ?1)
                AND (?2 IS NULL OR h.status = ?2)
            "#,
        )
        .bind(urgency_level)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(HelpRequestItem::from).collect(), total))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<HelpRequest>, sqlx::Error> {
        sqlx::query_as::<_, HelpRequest>(&format!(
            "SELECT {HELP_REQUEST_COLUMNS} FROM help_requests h WHERE h.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Detail view; unlike the list it carries the requestor's email.
    pub async fn find_detail(&self, id: &str) -> Result<Option<HelpRequestItem>, sqlx::Error> {
        let row = sqlx::query_as::<_, HelpRequestRow>(&format!(
            r#"
            SELECT
                {HELP_REQUEST_COLUMNS},
                u.name AS requestor_name,
                u.profile_image AS requestor_profile_image,
                u.email AS requestor_email,
                {HELPER_SUMMARIES}
            FROM
                help_requests h
                INNER JOIN users u ON u.id = h.requestor_id
            WHERE
                h.id = ?
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(HelpRequestItem::from))
    }

    pub async fn create_help_request(
        &self,
        help_request: &HelpRequest,
    ) -> Result<HelpRequest, sqlx::Error> {
        sqlx::query_as::<_, HelpRequest>(&format!(
            r#"
            INSERT INTO
                help_requests (
                    id,
                    title,
                    description,
                    urgency_level,
                    status,
                    requestor_id,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {HELP_REQUEST_RETURNING}
            "#
        ))
        .bind(&help_request.id)
        .bind(&help_request.title)
        .bind(&help_request.description)
        .bind(help_request.urgency_level)
        .bind(help_request.status)
        .bind(&help_request.requestor_id)
        .bind(help_request.created_at)
        .bind(help_request.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_help_request(
        &self,
        help_request: &HelpRequest,
    ) -> Result<Option<HelpRequest>, sqlx::Error> {
        sqlx::query_as::<_, HelpRequest>(&format!(
            r#"
            UPDATE
                help_requests
            SET
                title = ?,
                description = ?,
                urgency_level = ?,
                status = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {HELP_REQUEST_RETURNING}
            "#
        ))
        .bind(&help_request.title)
        .bind(&help_request.description)
        .bind(help_request.urgency_level)
        .bind(help_request.status)
        .bind(Utc::now())
        .bind(&help_request.id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_help_request(&self, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM help_helpers WHERE help_request_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM help_requests WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn find_helper(
        &self,
        help_request_id: &str,
        user_id: &str,
    ) -> Result<Option<HelpHelper>, sqlx::Error> {
        sqlx::query_as::<_, HelpHelper>(
            r#"
            SELECT
                id,
                help_request_id,
                user_id,
                created_at
            FROM
                help_helpers
            WHERE
                help_request_id = ?
                AND user_id = ?
            "#,
        )
        .bind(help_request_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Inserts the helper only while the request is still open.
    pub async fn insert_helper_if_open(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        help_request_id: &str,
        user_id: &str,
    ) -> Result<Option<HelpHelper>, sqlx::Error> {
        sqlx::query_as::<_, HelpHelper>(
            r#"
            INSERT INTO
                help_helpers (
                    id,
                    help_request_id,
                    user_id,
                    created_at
                )
            SELECT
                ?1,
                h.id,
                ?2,
                ?3
            FROM
                help_requests h
            WHERE
                h.id = ?4
                AND h.status = 'open'
            RETURNING
                id,
                help_request_id,
                user_id,
                created_at
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(Utc::now())
        .bind(help_request_id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn remove_helper(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        help_request_id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM help_helpers
            WHERE
                help_request_id = ?
                AND user_id = ?
            "#,
        )
        .bind(help_request_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_helpers(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        help_request_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM help_helpers WHERE help_request_id = ?")
            .bind(help_request_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn current_status(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        help_request_id: &str,
    ) -> Result<Option<HelpStatus>, sqlx::Error> {
        sqlx::query_scalar("SELECT status FROM help_requests WHERE id = ?")
            .bind(help_request_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn set_status(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        help_request_id: &str,
        status: HelpStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE
                help_requests
            SET
                status = ?,
                updated_at = ?
            WHERE
                id = ?
            "#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(help_request_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }
}
