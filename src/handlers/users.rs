use actix_web::{HttpResponse, Result, web};
use serde::Deserialize;

use crate::AppState;
use crate::database::models::{Page, PageRequest, UpdateUserInput, optional_text, require_text};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{Claims, auth::hash_password};

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_users(
    state: web::Data<AppState>,
    _claims: Claims,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::new(query.page, query.limit)?;
    let (users, total) = state.user_repository.list_users(page).await.map_err(|e| {
        log::error!("Failed to list users: {}", e);
        AppError::DatabaseError(e)
    })?;

    Ok(ApiResponse::paginated("users", Page::new(users, total, page)))
}

pub async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    let user = state
        .user_repository
        .find_by_id(&user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(ApiResponse::success(user))
}

pub async fn update_user(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
    input: web::Json<UpdateUserInput>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let input = input.into_inner();

    let mut user = state
        .user_repository
        .find_by_id(&user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !claims.is_user(&user.id) {
        return Err(AppError::forbidden("Not authorized to update this user").into());
    }

    if let Some(name) = optional_text("name", input.name)? {
        user.name = name;
    }
    if let Some(bio) = input.bio {
        user.bio = bio;
    }
    if let Some(skills) = input.skills {
        user.skills = skills;
    }
    if let Some(causes) = input.causes {
        user.causes = causes;
    }
    if let Some(profile_image) = input.profile_image {
        user.profile_image = profile_image;
    }
    if input.password.is_some() {
        let password = require_text("password", input.password)?;
        user.password_hash = hash_password(&password)?;
    }

    let user = state
        .user_repository
        .update_profile(&user)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(user))
}

pub async fn get_history(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    if !state
        .user_repository
        .exists(&user_id)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::not_found("User not found").into());
    }

    let history = state
        .volunteer_log_repository
        .history_for_user(&user_id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(history))
}
