use actix_web::{HttpResponse, Result, web};
use chrono::Utc;

use crate::AppState;
use crate::database::{
    models::{
        CreateHelpRequestInput, HelpRequest, HelpRequestQuery, HelpStatus, Page, PageRequest,
        UpdateHelpRequestInput, optional_text, require_text,
    },
    new_id,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

async fn owned_help_request(
    state: &AppState,
    help_request_id: &str,
    claims: &Claims,
    action: &str,
) -> Result<HelpRequest, AppError> {
    let help_request = state
        .help_request_repository
        .find_by_id(help_request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Help request not found"))?;

    if !claims.is_user(&help_request.requestor_id) {
        return Err(AppError::forbidden(format!(
            "Not authorized to {} this help request",
            action
        )));
    }

    Ok(help_request)
}

pub async fn list_help_requests(
    state: web::Data<AppState>,
    query: web::Query<HelpRequestQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page = PageRequest::new(query.page, query.limit)?;

    let (help_requests, total) = state
        .help_request_repository
        .list_help_requests(query.urgency_level, query.status, page)
        .await
        .map_err(|e| {
            log::error!("Failed to list help requests: {}", e);
            AppError::DatabaseError(e)
        })?;

    Ok(ApiResponse::paginated(
        "helpRequests",
        Page::new(help_requests, total, page),
    ))
}

pub async fn get_help_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let help_request = state
        .help_request_repository
        .find_detail(&path.into_inner())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Help request not found"))?;

    Ok(ApiResponse::success(help_request))
}

pub async fn create_help_request(
    state: web::Data<AppState>,
    claims: Claims,
    input: web::Json<CreateHelpRequestInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    let now = Utc::now();

    let help_request = HelpRequest {
        id: new_id(),
        title: require_text("title", input.title)?,
        description: require_text("description", input.description)?,
        urgency_level: input.urgency_level.unwrap_or_default(),
        status: HelpStatus::Open,
        requestor_id: claims.user_id().to_string(),
        created_at: now,
        updated_at: now,
    };

    let help_request = state
        .help_request_repository
        .create_help_request(&help_request)
        .await
        .map_err(|e| {
            log::error!("Failed to create help request: {}", e);
            AppError::DatabaseError(e)
        })?;

    log::info!(
        "User {} created help request {}",
        claims.user_id(),
        help_request.id
    );

    Ok(ApiResponse::created(help_request))
}

pub async fn update_help_request(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
    input: web::Json<UpdateHelpRequestInput>,
) -> Result<HttpResponse> {
    let help_request_id = path.into_inner();
    let input = input.into_inner();

    let mut help_request =
        owned_help_request(&state, &help_request_id, &claims, "update").await?;

    if let Some(title) = optional_text("title", input.title)? {
        help_request.title = title;
    }
    if let Some(description) = optional_text("description", input.description)? {
        help_request.description = description;
    }
    if let Some(urgency_level) = input.urgency_level {
        help_request.urgency_level = urgency_level;
    }
    if let Some(status) = input.status {
        help_request.status = status;
    }

    let help_request = state
        .help_request_repository
        .update_help_request(&help_request)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Help request not found"))?;

    Ok(ApiResponse::success(help_request))
}

pub async fn delete_help_request(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let help_request_id = path.into_inner();

    owned_help_request(&state, &help_request_id, &claims, "delete").await?;

    if !state
        .help_request_repository
        .delete_help_request(&help_request_id)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::not_found("Help request not found").into());
    }

    Ok(ApiResponse::success_message("Help request removed"))
}

pub async fn offer_help(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    state
        .membership_service
        .offer_help(&path.into_inner(), claims.user_id())
        .await?;

    Ok(ApiResponse::success_message("Successfully offered help"))
}

pub async fn withdraw_help(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    state
        .membership_service
        .withdraw_help(&path.into_inner(), claims.user_id())
        .await?;

    Ok(ApiResponse::success_message("Successfully withdrew help"))
}
