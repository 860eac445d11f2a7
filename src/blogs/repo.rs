use sqlx::PgPool;
use uuid::Uuid;

use crate::blogs::dto::BlogBody;
use crate::blogs::repo_types::Blog;

const BLOG_COLUMNS: &str = "id, title, image, content, kind, link, created_at";

impl Blog {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Blog>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs ORDER BY created_at DESC");
        let blogs = sqlx::query_as::<_, Blog>(&sql).fetch_all(db).await?;
        Ok(blogs)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Blog>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1");
        let blog = sqlx::query_as::<_, Blog>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(blog)
    }

    pub async fn find_by_link(db: &PgPool, link: &str) -> anyhow::Result<Option<Blog>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE link = $1");
        let blog = sqlx::query_as::<_, Blog>(&sql)
            .bind(link)
            .fetch_optional(db)
            .await?;
        Ok(blog)
    }

    pub async fn create(db: &PgPool, body: &BlogBody) -> anyhow::Result<Blog> {
        let sql = format!(
            "INSERT INTO blogs (title, image, content, kind, link) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {BLOG_COLUMNS}"
        );
        let blog = sqlx::query_as::<_, Blog>(&sql)
            .bind(&body.title)
            .bind(&body.image)
            .bind(&body.content)
            .bind(&body.kind)
            .bind(&body.link)
            .fetch_one(db)
            .await?;
        Ok(blog)
    }

    /// Full replace of the content fields.
    pub async fn update(db: &PgPool, id: Uuid, body: &BlogBody) -> anyhow::Result<Option<Blog>> {
        let sql = format!(
            "UPDATE blogs SET title = $2, image = $3, content = $4, kind = $5, link = $6 \
             WHERE id = $1 RETURNING {BLOG_COLUMNS}"
        );
        let blog = sqlx::query_as::<_, Blog>(&sql)
            .bind(id)
            .bind(&body.title)
            .bind(&body.image)
            .bind(&body.content)
            .bind(&body.kind)
            .bind(&body.link)
            .fetch_optional(db)
            .await?;
        Ok(blog)
    }

    pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
