use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, types::Json};

use crate::database::{
    models::{HistoryEvent, VolunteerHistoryEntry, VolunteerLog, VolunteerLogVerifier},
    new_id,
};

use super::UserRepository;

#[derive(sqlx::FromRow)]
struct HistoryRow {
    #[sqlx(flatten)]
    log: VolunteerLog,
    event_title: String,
    event_date: DateTime<Utc>,
    verifier_ids: Json<Vec<String>>,
}

#[derive(Clone)]
pub struct VolunteerLogRepository {
    pool: SqlitePool,
    users: UserRepository,
}

impl VolunteerLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    /// Records the log and credits the volunteer's totals in one transaction.
    pub async fn create_log(&self, log: &VolunteerLog) -> Result<VolunteerLog, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, VolunteerLog>(
            r#"
            INSERT INTO
                volunteer_logs (
                    id,
                    user_id,
                    event_id,
                    hours,
                    points,
                    notes,
                    created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                user_id,
                event_id,
                hours,
                points,
                notes,
                created_at
            "#,
        )
        .bind(&log.id)
        .bind(&log.user_id)
        .bind(&log.event_id)
        .bind(log.hours)
        .bind(log.points)
        .bind(&log.notes)
        .bind(log.created_at)
        .fetch_one(&mut *tx)
        .await?;

        self.users
            .add_volunteer_totals(&mut tx, &created.user_id, created.hours, created.points)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<VolunteerLog>, sqlx::Error> {
        sqlx::query_as::<_, VolunteerLog>(
            r#"
            SELECT
                id,
                user_id,
                event_id,
                hours,
                points,
                notes,
                created_at
            FROM
                volunteer_logs
            WHERE
                id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn add_verifier(
        &self,
        log_id: &str,
        verifier_id: &str,
    ) -> Result<VolunteerLogVerifier, sqlx::Error> {
        sqlx::query_as::<_, VolunteerLogVerifier>(
            r#"
            INSERT INTO
                volunteer_log_verifiers (
                    id,
                    log_id,
                    verifier_id,
                    created_at
                )
            VALUES
                (?, ?, ?, ?)
            RETURNING
                id,
                log_id,
                verifier_id,
                created_at
            "#,
        )
        .bind(new_id())
        .bind(log_id)
        .bind(verifier_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    /// A user's logs, newest first, with the event they belong to.
    pub async fn history_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<VolunteerHistoryEntry>, sqlx::Error> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT
                l.id,
                l.user_id,
                l.event_id,
                l.hours,
                l.points,
                l.notes,
                l.created_at,
                e.title AS event_title,
                e.date AS event_date,
                (
                    SELECT json_group_array(v.verifier_id) FROM volunteer_log_verifiers v WHERE v.log_id = l.id
                ) AS verifier_ids
            FROM
                volunteer_logs l
                INNER JOIN events e ON e.id = l.event_id
            WHERE
                l.user_id = ?
            ORDER BY
                l.created_at DESC,
                l.rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| VolunteerHistoryEntry {
                log: row.log,
                event: HistoryEvent {
                    title: row.event_title,
                    date: row.event_date,
                },
                verified_by: row.verifier_ids.0,
            })
            .collect())
    }
}
