use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Blog post record. `kind` is exposed as `type` on the wire, matching
/// the client contract.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub image: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
    pub created_at: OffsetDateTime,
}
