use chrono::Utc;
use sqlx::{SqlitePool, types::Json};

use crate::database::{
    models::{
        Event, EventAttendee, EventDetail, EventListItem, EventStatus, PageRequest, TeamSummary,
        UserSummary,
    },
    new_id,
};

const EVENT_COLUMNS: &str = r#"
    e.id,
    e.title,
    e.description,
    e.category,
    e.date,
    e.time,
    e.address,
    e.latitude,
    e.longitude,
    e.max_attendees,
    e.image_url,
    e.status,
    e.organizer_id,
    e.created_at,
    e.updated_at
"#;

const EVENT_RETURNING: &str = r#"
    id,
    title,
    description,
    category,
    date,
    time,
    address,
    latitude,
    longitude,
    max_attendees,
    image_url,
    status,
    organizer_id,
    created_at,
    updated_at
"#;

#[derive(sqlx::FromRow)]
struct EventListRow {
    #[sqlx(flatten)]
    event: Event,
    organizer_name: String,
    organizer_profile_image: Option<String>,
    attendee_count: i64,
    attendee_ids: Json<Vec<String>>,
}

impl From<EventListRow> for EventListItem {
    fn from(row: EventListRow) -> Self {
        Self {
            organizer: UserSummary {
                id: row.event.organizer_id.clone(),
                name: row.organizer_name,
                profile_image: row.organizer_profile_image,
                email: None,
            },
            attendee_count: row.attendee_count,
            attendees: row.attendee_ids.0,
            event: row.event,
        }
    }
}

#[derive(Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Soonest events first.
    pub async fn list_events(
        &self,
        category: Option<&str>,
        status: Option<EventStatus>,
        page: PageRequest,
    ) -> Result<(Vec<EventListItem>, i64), sqlx::Error> {
        let rows = sqlx::query_as::<_, EventListRow>(&format!(
            r#"
            SELECT
                {EVENT_COLUMNS},
                u.name AS organizer_name,
                u.profile_image AS organizer_profile_image,
                (
                    SELECT COUNT(*) FROM event_attendees a WHERE a.event_id = e.id
                ) AS attendee_count,
                (
                    SELECT json_group_array(a.user_id) FROM event_attendees a WHERE a.event_id = e.id
                ) AS attendee_ids
            FROM
                events e
                INNER JOIN users u ON u.id = e.organizer_id
            WHERE
                (?1 IS NULL OR e.category = ?1)
                AND (?2 IS NULL OR e.status = ?2)
            ORDER BY
                e.date ASC,
                e.created_at ASC,
                e.rowid ASC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(category)
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
                events e
            WHERE
                (?1 IS NULL OR e.category = ?1)
                AND (?2 IS NULL OR e.status = ?2)
            "#,
        )
        .bind(category)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(EventListItem::from).collect(), total))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Event>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn find_detail(&self, id: &str) -> Result<Option<EventDetail>, sqlx::Error> {
        let Some(row) = sqlx::query_as::<_, EventListRow>(&format!(
            r#"
            SELECT
                {EVENT_COLUMNS},
                u.name AS organizer_name,
                u.profile_image AS organizer_profile_image,
                (
                    SELECT COUNT(*) FROM event_attendees a WHERE a.event_id = e.id
                ) AS attendee_count,
                '[]' AS attendee_ids
            FROM
                events e
                INNER JOIN users u ON u.id = e.organizer_id
            WHERE
                e.id = ?
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let attendees = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT
                u.id,
                u.name,
                u.profile_image
            FROM
                event_attendees a
                INNER JOIN users u ON u.id = a.user_id
            WHERE
                a.event_id = ?
            ORDER BY
                a.created_at,
                a.rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let teams = sqlx::query_as::<_, TeamSummary>(
            r#"
            SELECT
                t.id,
                t.name,
                t.team_image
            FROM
                team_events te
                INNER JOIN teams t ON t.id = te.team_id
            WHERE
                te.event_id = ?
            ORDER BY
                te.created_at,
                te.rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let item = EventListItem::from(row);

        Ok(Some(EventDetail {
            event: item.event,
            organizer: item.organizer,
            attendee_count: item.attendee_count,
            attendees,
            teams,
        }))
    }

    pub async fn create_event(&self, event: &Event) -> Result<Event, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO
                events (
                    id,
                    title,
                    description,
                    category,
                    date,
                    time,
                    address,
                    latitude,
                    longitude,
                    max_attendees,
                    image_url,
                    status,
                    organizer_id,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {EVENT_RETURNING}
            "#
        ))
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.address)
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.max_attendees)
        .bind(&event.image_url)
        .bind(event.status)
        .bind(&event.organizer_id)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Writes every mutable column of `event`; the organizer is never changed.
    pub async fn update_event(&self, event: &Event) -> Result<Option<Event>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE
                events
            SET
                title = ?,
                description = ?,
                category = ?,
                date = ?,
                time = ?,
                address = ?,
                latitude = ?,
                longitude = ?,
                max_attendees = ?,
                image_url = ?,
                status = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {EVENT_RETURNING}
            "#
        ))
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.address)
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.max_attendees)
        .bind(&event.image_url)
        .bind(event.status)
        .bind(Utc::now())
        .bind(&event.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Deletes the event together with everything that hangs off it.
    pub async fn delete_event(&self, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM volunteer_log_verifiers
            WHERE
                log_id IN (
                    SELECT id FROM volunteer_logs WHERE event_id = ?
                )
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        for statement in [
            "DELETE FROM volunteer_logs WHERE event_id = ?",
            "DELETE FROM event_attendees WHERE event_id = ?",
            "DELETE FROM team_events WHERE event_id = ?",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }

        let result = sqlx::query("DELETE FROM events WHERE id = ?")
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

    pub async fn count_attendees(&self, event_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM event_attendees WHERE event_id = ?")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn find_attendance(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventAttendee>, sqlx::Error> {
        sqlx::query_as::<_, EventAttendee>(
            r#"
            SELECT
                id,
                event_id,
                user_id,
                created_at
            FROM
                event_attendees
            WHERE
                event_id = ?
                AND user_id = ?
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Inserts the attendee only while the event has room, as a single statement.
    ///
    /// Returns `None` when the event is full or no longer exists. A duplicate
    /// attendee surfaces as a unique violation.
    pub async fn add_attendee_if_room(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventAttendee>, sqlx::Error> {
        sqlx::query_as::<_, EventAttendee>(
            r#"
            INSERT INTO
                event_attendees (
                    id,
                    event_id,
                    user_id,
                    created_at
                )
            SELECT
                ?1,
                e.id,
                ?2,
                ?3
            FROM
                events e
            WHERE
                e.id = ?4
                AND (
                    e.max_attendees = 0
                    OR (
                        SELECT COUNT(*) FROM event_attendees a WHERE a.event_id = e.id
                    ) < e.max_attendees
                )
            RETURNING
                id,
                event_id,
                user_id,
                created_at
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(Utc::now())
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn remove_attendee(&self, event_id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM event_attendees
            WHERE
                event_id = ?
                AND user_id = ?
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
