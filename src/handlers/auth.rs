use actix_web::{HttpResponse, Result, web};

use crate::AppState;
use crate::database::models::{CreateUserInput, LoginInput};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn register(
    state: web::Data<AppState>,
    input: web::Json<CreateUserInput>,
) -> Result<HttpResponse> {
    let response = state.auth_service.register(input.into_inner()).await?;

    Ok(ApiResponse::created(response))
}

pub async fn login(
    state: web::Data<AppState>,
    input: web::Json<LoginInput>,
) -> Result<HttpResponse> {
    let response = state.auth_service.login(input.into_inner()).await?;

    Ok(ApiResponse::success(response))
}

pub async fn me(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    let user = state
        .user_repository
        .find_by_id(claims.user_id())
        .await
        .map_err(|e| {
            log::error!("Failed to load user {}: {}", claims.user_id(), e);
            AppError::DatabaseError(e)
        })?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(ApiResponse::success(user))
}
