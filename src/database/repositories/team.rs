use chrono::Utc;
use sqlx::{SqlitePool, types::Json};

use crate::database::{
    models::{
        Event, PageRequest, Team, TeamDetail, TeamEvent, TeamListItem, TeamMember, UserSummary,
    },
    new_id,
};

const TEAM_COLUMNS: &str = r#"
    t.id,
    t.name,
    t.description,
    t.is_public,
    t.team_image,
    t.creator_id,
    t.created_at,
    t.updated_at
"#;

const TEAM_RETURNING: &str = r#"
    id,
    name,
    description,
    is_public,
    team_image,
    creator_id,
    created_at,
    updated_at
"#;

#[derive(sqlx::FromRow)]
struct TeamListRow {
    #[sqlx(flatten)]
    team: Team,
    creator_name: String,
    creator_profile_image: Option<String>,
    member_count: i64,
    member_ids: Json<Vec<String>>,
}

impl From<TeamListRow> for TeamListItem {
    fn from(row: TeamListRow) -> Self {
        Self {
            creator: UserSummary {
                id: row.team.creator_id.clone(),
                name: row.creator_name,
                profile_image: row.creator_profile_image,
                email: None,
            },
            member_count: row.member_count,
            members: row.member_ids.0,
            team: row.team,
        }
    }
}

#[derive(Clone)]
pub struct TeamRepository {
    pool: SqlitePool,
}

impl TeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest teams first.
    pub async fn list_teams(
        &self,
        is_public: Option<bool>,
        page: PageRequest,
    ) -> Result<(Vec<TeamListItem>, i64), sqlx::Error> {
        let rows = sqlx::query_as::<_, TeamListRow>(&format!(
            r#"
            SELECT
                {TEAM_COLUMNS},
                u.name AS creator_name,
                u.profile_image AS creator_profile_image,
                (
                    SELECT COUNT(*) FROM team_members m WHERE m.team_id = t.id
                ) AS member_count,
                (
                    SELECT json_group_array(m.user_id) FROM team_members m WHERE m.team_id = t.id
                ) AS member_ids
            FROM
                teams t
                INNER JOIN users u ON u.id = t.creator_id
            WHERE
                (?1 IS NULL OR t.is_public = ?1)
            ORDER BY
                t.created_at DESC,
                t.rowid DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(is_public)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM teams t WHERE (?1 IS NULL OR t.is_public = ?1)")
                .bind(is_public)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows.into_iter().map(TeamListItem::from).collect(), total))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>(&format!("SELECT {TEAM_COLUMNS} FROM teams t WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Whether `name` belongs to a team other than `excluding_id`.
    pub async fn name_taken(
        &self,
        name: &str,
        excluding_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT
                COUNT(*)
            FROM
                teams
            WHERE
                name = ?1
                AND (?2 IS NULL OR id != ?2)
            "#,
        )
        .bind(name)
        .bind(excluding_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn find_detail(&self, id: &str) -> Result<Option<TeamDetail>, sqlx::Error> {
        let Some(row) = sqlx::query_as::<_, TeamListRow>(&format!(
            r#"
            SELECT
                {TEAM_COLUMNS},
                u.name AS creator_name,
                u.profile_image AS creator_profile_image,
                (
                    SELECT COUNT(*) FROM team_members m WHERE m.team_id = t.id
                ) AS member_count,
                '[]' AS member_ids
            FROM
                teams t
                INNER JOIN users u ON u.id = t.creator_id
            WHERE
                t.id = ?
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let members = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT
                u.id,
                u.name,
                u.profile_image
            FROM
                team_members m
                INNER JOIN users u ON u.id = m.user_id
            WHERE
                m.team_id = ?
            ORDER BY
                m.created_at,
                m.rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT
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
            FROM
                team_events te
                INNER JOIN events e ON e.id = te.event_id
            WHERE
                te.team_id = ?
            ORDER BY
                e.date ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let item = TeamListItem::from(row);

        Ok(Some(TeamDetail {
            team: item.team,
            creator: item.creator,
            member_count: item.member_count,
            members,
            events,
        }))
    }

    /// Inserts the team and enrolls its creator in one transaction.
    pub async fn create_team(&self, team: &Team) -> Result<Team, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Team>(&format!(
            r#"
            INSERT INTO
                teams (
                    id,
                    name,
                    description,
                    is_public,
                    team_image,
                    creator_id,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {TEAM_RETURNING}
            "#
        ))
        .bind(&team.id)
        .bind(&team.name)
        .bind(&team.description)
        .bind(team.is_public)
        .bind(&team.team_image)
        .bind(&team.creator_id)
        .bind(team.created_at)
        .bind(team.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO
                team_members (
                    id,
                    team_id,
                    user_id,
                    created_at
                )
            VALUES
                (?, ?, ?, ?)
            "#,
        )
        .bind(new_id())
        .bind(&created.id)
        .bind(&created.creator_id)
        .bind(created.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    pub async fn update_team(&self, team: &Team) -> Result<Option<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>(&format!(
            r#"
            UPDATE
                teams
            SET
                name = ?,
                description = ?,
                is_public = ?,
                team_image = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {TEAM_RETURNING}
            "#
        ))
        .bind(&team.name)
        .bind(&team.description)
        .bind(team.is_public)
        .bind(&team.team_image)
        .bind(Utc::now())
        .bind(&team.id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Deletes the team, its memberships and its event links together.
    pub async fn delete_team(&self, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for statement in [
            "DELETE FROM team_members WHERE team_id = ?",
            "DELETE FROM team_events WHERE team_id = ?",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }

        let result = sqlx::query("DELETE FROM teams WHERE id = ?")
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

    pub async fn find_member(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<TeamMember>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT
                id,
                team_id,
                user_id,
                created_at
            FROM
                team_members
            WHERE
                team_id = ?
                AND user_id = ?
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn add_member(&self, team_id: &str, user_id: &str) -> Result<TeamMember, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO
                team_members (
                    id,
                    team_id,
                    user_id,
                    created_at
                )
            VALUES
                (?, ?, ?, ?)
            RETURNING
                id,
                team_id,
                user_id,
                created_at
            "#,
        )
        .bind(new_id())
        .bind(team_id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn remove_member(&self, team_id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM team_members
            WHERE
                team_id = ?
                AND user_id = ?
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn link_event(&self, team_id: &str, event_id: &str) -> Result<TeamEvent, sqlx::Error> {
        sqlx::query_as::<_, TeamEvent>(
            r#"
            INSERT INTO
                team_events (
                    id,
                    team_id,
                    event_id,
                    created_at
                )
            VALUES
                (?, ?, ?, ?)
            RETURNING
                id,
                team_id,
                event_id,
                created_at
            "#,
        )
        .bind(new_id())
        .bind(team_id)
        .bind(event_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn unlink_event(&self, team_id: &str, event_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM team_events
            WHERE
                team_id = ?
                AND event_id = ?
            "#,
        )
        .bind(team_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
