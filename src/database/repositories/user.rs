use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction, types::Json};

use crate::database::models::{PageRequest, User, UserRow};

const USER_COLUMNS: &str = r#"
    id,
    email,
    password_hash,
    name,
    profile_image,
    bio,
    skills,
    causes,
    total_hours,
    total_points,
    joined_date,
    updated_at
"#;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, user: &User) -> Result<User, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO
                users (
                    id,
                    email,
                    password_hash,
                    name,
                    profile_image,
                    bio,
                    skills,
                    causes,
                    total_hours,
                    total_points,
                    joined_date,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.profile_image)
        .bind(&user.bio)
        .bind(Json(&user.skills))
        .bind(Json(&user.causes))
        .bind(user.total_hours)
        .bind(user.total_points)
        .bind(user.joined_date)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    pub async fn exists(&self, id: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Newest members first.
    pub async fn list_users(&self, page: PageRequest) -> Result<(Vec<User>, i64), sqlx::Error> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM
                users
            ORDER BY
                joined_date DESC,
                rowid DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(User::from).collect(), total))
    }

    /// Writes every mutable profile column of `user`.
    pub async fn update_profile(&self, user: &User) -> Result<User, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE
                users
            SET
                name = ?,
                password_hash = ?,
                profile_image = ?,
                bio = ?,
                skills = ?,
                causes = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.profile_image)
        .bind(&user.bio)
        .bind(Json(&user.skills))
        .bind(Json(&user.causes))
        .bind(Utc::now())
        .bind(&user.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn add_volunteer_totals(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
        hours: f64,
        points: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE
                users
            SET
                total_hours = total_hours + ?,
                total_points = total_points + ?,
                updated_at = ?
            WHERE
                id = ?
            "#,
        )
        .bind(hours)
        .bind(points)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
