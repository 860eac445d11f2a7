use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    blogs::{dto::BlogBody, repo_types::Blog},
    error::ApiError,
    state::AppState,
};

#[instrument(skip(state))]
pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<Blog>>, ApiError> {
    let blogs = Blog::list(&state.db).await?;
    Ok(Json(blogs))
}

#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Blog>, ApiError> {
    let blog = Blog::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;
    Ok(Json(blog))
}

#[instrument(skip(state))]
pub async fn get_blog_by_link(
    State(state): State<AppState>,
    Path(link): Path<String>,
) -> Result<Json<Blog>, ApiError> {
    let blog = Blog::find_by_link(&state.db, &link)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;
    Ok(Json(blog))
}

#[instrument(skip(state, payload))]
pub async fn create_blog(
    State(state): State<AppState>,
    Json(payload): Json<BlogBody>,
) -> Result<(StatusCode, Json<Blog>), ApiError> {
    if !payload.is_complete() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let blog = Blog::create(&state.db, &payload).await?;
    info!(blog_id = %blog.id, "blog created");
    Ok((StatusCode::CREATED, Json(blog)))
}

#[instrument(skip(state, payload))]
pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BlogBody>,
) -> Result<Json<Blog>, ApiError> {
    if !payload.is_complete() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let blog = Blog::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;
    info!(blog_id = %id, "blog updated");
    Ok(Json(blog))
}

#[instrument(skip(state))]
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !Blog::delete_by_id(&state.db, id).await? {
        return Err(ApiError::NotFound("Blog not found".into()));
    }
    info!(blog_id = %id, "blog deleted");
    Ok(Json(json!({ "message": "Blog deleted" })))
}
