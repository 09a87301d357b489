//! Request handlers for the tweet API

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tweetbot_domain::{GeneratedImage, ListQuery, PostStatus, Tweet, TweetPage, TweetUpdate};

use super::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub tweet: GeneratedBody,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct GeneratedBody {
    pub topic: String,
    pub tweet: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub status: PostStatus,
    pub tweet: String,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub message: &'static str,
    pub tweet: Tweet,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub posted: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        let defaults = ListQuery::default();
        Self {
            posted: params.posted,
            search: params.search,
            limit: params.limit.unwrap_or(defaults.limit),
            offset: params.offset.unwrap_or(defaults.offset),
        }
    }
}

/// Positive tweet id from the path, or a 400
fn tweet_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    match path {
        Ok(Path(id)) if id > 0 => Ok(id),
        Ok(Path(id)) => Err(ApiError::invalid_argument(format!(
            "tweet_id must be a positive integer, got {}",
            id
        ))),
        Err(rejection) => Err(ApiError::invalid_argument(format!(
            "Invalid tweet_id: {}",
            rejection.body_text()
        ))),
    }
}

pub async fn generate_tweet(
    State(service): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_argument(e.body_text()))?;

    let generated = service.generate(&request.topic).await?;

    Ok(Json(GenerateResponse {
        id: generated.id,
        tweet: GeneratedBody {
            topic: generated.topic,
            tweet: generated.content,
            image: generated.image_path,
        },
    }))
}

pub async fn post_tweet(
    State(service): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<PostResponse>, ApiError> {
    let id = tweet_id(path)?;
    let outcome = service.post(id).await?;

    Ok(Json(PostResponse {
        status: outcome.status,
        tweet: outcome.content,
    }))
}

pub async fn edit_tweet(
    State(service): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TweetUpdate>, JsonRejection>,
) -> Result<Json<EditResponse>, ApiError> {
    let id = tweet_id(path)?;
    let Json(update) = payload.map_err(|e| ApiError::invalid_argument(e.body_text()))?;

    let tweet = service.edit(id, update).await?;

    Ok(Json(EditResponse {
        message: "Tweet updated successfully",
        tweet,
    }))
}

pub async fn list_tweets(
    State(service): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TweetPage>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::invalid_argument(e.body_text()))?;
    let page = service.list(params.into()).await?;
    Ok(Json(page))
}

pub async fn get_tweet(
    State(service): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Tweet>, ApiError> {
    let id = tweet_id(path)?;
    Ok(Json(service.get(id).await?))
}

pub async fn generate_image(
    State(service): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<GeneratedImage>, ApiError> {
    let id = tweet_id(path)?;
    Ok(Json(service.regenerate_image(id).await?))
}

pub async fn get_image(
    State(service): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = tweet_id(path)?;
    let image = service.image_file(id).await?;

    Ok((
        [(header::CONTENT_TYPE, image.format.content_type())],
        image.bytes,
    )
        .into_response())
}

pub async fn delete_image(
    State(service): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = tweet_id(path)?;
    service.delete_image(id).await?;

    Ok(Json(json!({ "message": "Image deleted successfully" })))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn root() -> Redirect {
    Redirect::temporary("/health")
}
