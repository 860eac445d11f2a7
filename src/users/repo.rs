use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{Role, User};

const USER_COLUMNS: &str = "id, full_name, email, phone, affiliation, password_hash, role, \
     subscriptions, reset_token_hash, reset_token_expires_at, created_at, updated_at";

/// Fields required to create a user. The password arrives here already
/// hashed; hashing is an explicit step at the call site.
pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub affiliation: &'a str,
    pub password_hash: &'a str,
}

/// Optional profile patch. Absent fields are left untouched; the
/// password hash is never writable through this path.
#[derive(Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub affiliation: Option<String>,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let sql = format!(
            "INSERT INTO users (full_name, email, phone, affiliation, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(new.full_name)
            .bind(new.email)
            .bind(new.phone)
            .bind(new.affiliation)
            .bind(new.password_hash)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(db).await?;
        Ok(users)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        patch: ProfilePatch,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                 full_name = COALESCE($2, full_name), \
                 phone = COALESCE($3, phone), \
                 affiliation = COALESCE($4, affiliation), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(patch.full_name)
            .bind(patch.phone)
            .bind(patch.affiliation)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Replace the password hash. The only non-reset write path that
    /// touches `password_hash`.
    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(db)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        digest: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(digest)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Look up a user by reset-token digest; the expiry check lives in
    /// the query so an expired match behaves exactly like no match.
    pub async fn find_by_valid_reset_token(
        db: &PgPool,
        digest: &str,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_token_hash = $1 AND reset_token_expires_at > now()"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(digest)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Consume a reset token: replace the hash and clear both reset
    /// fields in one atomic write.
    pub async fn reset_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, reset_token_hash = NULL, \
             reset_token_expires_at = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Set-semantics add: a category already present is left alone.
    pub async fn add_subscription(
        db: &PgPool,
        id: Uuid,
        category_id: &str,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                 subscriptions = CASE WHEN $2 = ANY(subscriptions) THEN subscriptions \
                                      ELSE array_append(subscriptions, $2) END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(category_id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn remove_subscription(
        db: &PgPool,
        id: Uuid,
        category_id: &str,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET subscriptions = array_remove(subscriptions, $2), \
             updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(category_id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn update_role(db: &PgPool, id: Uuid, role: Role) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
