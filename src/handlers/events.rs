use actix_web::{HttpResponse, Result, web};
use chrono::Utc;

use crate::AppState;
use crate::database::{
    models::{
        CreateEventInput, Event, EventQuery, EventStatus, Page, PageRequest, UpdateEventInput,
        optional_text, require_text,
    },
    new_id,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

const DEFAULT_EVENT_IMAGE: &str = "default-event.jpg";

fn validate_capacity(max_attendees: i64) -> Result<i64, AppError> {
    if max_attendees < 0 {
        return Err(AppError::bad_request("maxAttendees cannot be negative"));
    }
    Ok(max_attendees)
}

/// Loads the event and checks that the caller organizes it.
async fn owned_event(
    state: &AppState,
    event_id: &str,
    claims: &Claims,
    action: &str,
) -> Result<Event, AppError> {
    let event = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;

    if !claims.is_user(&event.organizer_id) {
        return Err(AppError::forbidden(format!(
            "Not authorized to {} this event",
            action
        )));
    }

    Ok(event)
}

pub async fn list_events(
    state: web::Data<AppState>,
    query: web::Query<EventQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page = PageRequest::new(query.page, query.limit)?;

    let (events, total) = state
        .event_repository
        .list_events(query.category.as_deref(), query.status, page)
        .await
        .map_err(|e| {
            log::error!("Failed to list events: {}", e);
            AppError::DatabaseError(e)
        })?;

    Ok(ApiResponse::paginated("events", Page::new(events, total, page)))
}

pub async fn get_event(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let event_id = path.into_inner();

    let event = state
        .event_repository
        .find_detail(&event_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Event not found"))?;

    Ok(ApiResponse::success(event))
}

pub async fn create_event(
    state: web::Data<AppState>,
    claims: Claims,
    input: web::Json<CreateEventInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    let now = Utc::now();

    let event = Event {
        id: new_id(),
        title: require_text("title", input.title)?,
        description: require_text("description", input.description)?,
        category: require_text("category", input.category)?,
        date: input
            .date
            .ok_or_else(|| AppError::bad_request("date is required"))?,
        time: require_text("time", input.time)?,
        address: require_text("address", input.address)?,
        latitude: input.latitude,
        longitude: input.longitude,
        max_attendees: validate_capacity(input.max_attendees.unwrap_or(0))?,
        image_url: optional_text("imageUrl", input.image_url)?
            .unwrap_or_else(|| DEFAULT_EVENT_IMAGE.to_string()),
        status: EventStatus::default(),
        organizer_id: claims.user_id().to_string(),
        created_at: now,
        updated_at: now,
    };

    let event = state
        .event_repository
        .create_event(&event)
        .await
        .map_err(|e| {
            log::error!("Failed to create event: {}", e);
            AppError::DatabaseError(e)
        })?;

    log::info!("User {} created event {}", claims.user_id(), event.id);

    Ok(ApiResponse::created(event))
}

pub async fn update_event(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
    input: web::Json<UpdateEventInput>,
) -> Result<HttpResponse> {
    let event_id = path.into_inner();
    let input = input.into_inner();

    let mut event = owned_event(&state, &event_id, &claims, "update").await?;

    if let Some(title) = optional_text("title", input.title)? {
        event.title = title;
    }
    if let Some(description) = optional_text("description", input.description)? {
        event.description = description;
    }
    if let Some(category) = optional_text("category", input.category)? {
        event.category = category;
    }
    if let Some(date) = input.date {
        event.date = date;
    }
    if let Some(time) = optional_text("time", input.time)? {
        event.time = time;
    }
    if let Some(address) = optional_text("address", input.address)? {
        event.address = address;
    }
    if let Some(latitude) = input.latitude {
        event.latitude = latitude;
    }
    if let Some(longitude) = input.longitude {
        event.longitude = longitude;
    }
    if let Some(max_attendees) = input.max_attendees {
        event.max_attendees = validate_capacity(max_attendees)?;
    }
    if let Some(image_url) = optional_text("imageUrl", input.image_url)? {
        event.image_url = image_url;
    }
    if let Some(status) = input.status {
        event.status = status;
    }

    let event = state
        .event_repository
        .update_event(&event)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Event not found"))?;

    Ok(ApiResponse::success(event))
}

pub async fn delete_event(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let event_id = path.into_inner();

    owned_event(&state, &event_id, &claims, "delete").await?;

    if !state
        .event_repository
        .delete_event(&event_id)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::not_found("Event not found").into());
    }

    log::info!("User {} deleted event {}", claims.user_id(), event_id);

    Ok(ApiResponse::success_message("Event removed"))
}

pub async fn join_event(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    state
        .membership_service
        .join_event(&path.into_inner(), claims.user_id())
        .await?;

    Ok(ApiResponse::success_message("Successfully joined event"))
}

pub async fn leave_event(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    state
        .membership_service
        .leave_event(&path.into_inner(), claims.user_id())
        .await?;

    Ok(ApiResponse::success_message("Successfully left event"))
}

pub async fn join_status(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let status = state
        .membership_service
        .event_join_status(&path.into_inner(), claims.user_id())
        .await?;

    Ok(ApiResponse::success(status))
}
