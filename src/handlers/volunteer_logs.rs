use actix_web::{HttpResponse, Result, web};
use chrono::Utc;

use crate::AppState;
use crate::database::{
    models::{CreateVolunteerLogInput, VolunteerLog, optional_text},
    new_id,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

/// Records volunteered hours for one attendee; organizer only.
pub async fn create_log(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
    input: web::Json<CreateVolunteerLogInput>,
) -> Result<HttpResponse> {
    let event_id = path.into_inner();
    let input = input.into_inner();

    let event = state
        .event_repository
        .find_by_id(&event_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Event not found"))?;

    if !claims.is_user(&event.organizer_id) {
        return Err(AppError::forbidden("Not authorized to log hours for this event").into());
    }

    if !input.hours.is_finite() || input.hours <= 0.0 {
        return Err(AppError::bad_request("hours must be greater than 0").into());
    }

    if state
        .event_repository
        .find_attendance(&event_id, &input.user_id)
        .await
        .map_err(AppError::from)?
        .is_none()
    {
        return Err(AppError::bad_request("User is not attending this event").into());
    }

    let log = VolunteerLog {
        id: new_id(),
        user_id: input.user_id.clone(),
        event_id,
        hours: input.hours,
        points: input.resolved_points(),
        notes: optional_text("notes", input.notes)?,
        created_at: Utc::now(),
    };

    let log = state
        .volunteer_log_repository
        .create_log(&log)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(e, "Hours already logged for this user and event")
        })?;

    log::info!(
        "Logged {} hours for user {} on event {}",
        log.hours,
        log.user_id,
        log.event_id
    );

    Ok(ApiResponse::created(log))
}

pub async fn verify_log(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let log_id = path.into_inner();

    let log = state
        .volunteer_log_repository
        .find_by_id(&log_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Volunteer log not found"))?;

    if claims.is_user(&log.user_id) {
        return Err(AppError::forbidden("Cannot verify your own volunteer log").into());
    }

    let verifier = state
        .volunteer_log_repository
        .add_verifier(&log.id, claims.user_id())
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Already verified this volunteer log"))?;

    Ok(ApiResponse::created(verifier))
}
