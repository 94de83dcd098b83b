use actix_web::{HttpResponse, Result, web};
use chrono::Utc;

use crate::AppState;
use crate::database::{
    models::{
        CreateTeamInput, LinkEventInput, Page, PageRequest, Team, TeamQuery, UpdateTeamInput,
        optional_text, require_text,
    },
    new_id,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

const DEFAULT_TEAM_IMAGE: &str = "default-team.jpg";

async fn owned_team(
    state: &AppState,
    team_id: &str,
    claims: &Claims,
    action: &str,
) -> Result<Team, AppError> {
    let team = state
        .team_repository
        .find_by_id(team_id)
        .await?
        .ok_or_else(|| AppError::not_found("Team not found"))?;

    if !claims.is_user(&team.creator_id) {
        return Err(AppError::forbidden(format!(
            "Not authorized to {} this team",
            action
        )));
    }

    Ok(team)
}

async fn ensure_name_available(
    state: &AppState,
    name: &str,
    excluding_id: Option<&str>,
) -> Result<(), AppError> {
    if state.team_repository.name_taken(name, excluding_id).await? {
        return Err(AppError::conflict("Team name already exists"));
    }
    Ok(())
}

pub async fn list_teams(
    state: web::Data<AppState>,
    query: web::Query<TeamQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page = PageRequest::new(query.page, query.limit)?;

    let (teams, total) = state
        .team_repository
        .list_teams(query.is_public, page)
        .await
        .map_err(|e| {
            log::error!("Failed to list teams: {}", e);
            AppError::DatabaseError(e)
        })?;

    Ok(ApiResponse::paginated("teams", Page::new(teams, total, page)))
}

pub async fn get_team(
    state: web::Data<AppState>,
    claims: Option<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();

    let team = state
        .team_repository
        .find_detail(&team_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Team not found"))?;

    if !team.is_visible_to(claims.as_ref().map(Claims::user_id)) {
        return Err(AppError::forbidden("This team is private").into());
    }

    Ok(ApiResponse::success(team))
}

pub async fn create_team(
    state: web::Data<AppState>,
    claims: Claims,
    input: web::Json<CreateTeamInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    let now = Utc::now();

    let name = require_text("name", input.name)?;
    let description = require_text("description", input.description)?;
    ensure_name_available(&state, &name, None).await?;

    let team = Team {
        id: new_id(),
        name,
        description,
        is_public: input.is_public.unwrap_or(true),
        team_image: optional_text("teamImage", input.team_image)?
            .unwrap_or_else(|| DEFAULT_TEAM_IMAGE.to_string()),
        creator_id: claims.user_id().to_string(),
        created_at: now,
        updated_at: now,
    };

    let team = state
        .team_repository
        .create_team(&team)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Team name already exists"))?;

    log::info!("User {} created team {}", claims.user_id(), team.id);

    Ok(ApiResponse::created(team))
}

pub async fn update_team(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
    input: web::Json<UpdateTeamInput>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    let input = input.into_inner();

    let mut team = owned_team(&state, &team_id, &claims, "update").await?;

    if let Some(name) = optional_text("name", input.name)? {
        ensure_name_available(&state, &name, Some(&team.id)).await?;
        team.name = name;
    }
    if let Some(description) = optional_text("description", input.description)? {
        team.description = description;
    }
    if let Some(is_public) = input.is_public {
        team.is_public = is_public;
    }
    if let Some(team_image) = optional_text("teamImage", input.team_image)? {
        team.team_image = team_image;
    }

    let team = state
        .team_repository
        .update_team(&team)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Team name already exists"))?
        .ok_or_else(|| AppError::not_found("Team not found"))?;

    Ok(ApiResponse::success(team))
}

pub async fn delete_team(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();

    owned_team(&state, &team_id, &claims, "delete").await?;

    if !state
        .team_repository
        .delete_team(&team_id)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::not_found("Team not found").into());
    }

    log::info!("User {} deleted team {}", claims.user_id(), team_id);

    Ok(ApiResponse::success_message("Team removed"))
}

pub async fn join_team(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    state
        .membership_service
        .join_team(&path.into_inner(), claims.user_id())
        .await?;

    Ok(ApiResponse::success_message("Successfully joined team"))
}

pub async fn leave_team(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    state
        .membership_service
        .leave_team(&path.into_inner(), claims.user_id())
        .await?;

    Ok(ApiResponse::success_message("Successfully left team"))
}

pub async fn link_event(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
    input: web::Json<LinkEventInput>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    let event_id = input.into_inner().event_id;

    owned_team(&state, &team_id, &claims, "update").await?;

    if state
        .event_repository
        .find_by_id(&event_id)
        .await
        .map_err(AppError::from)?
        .is_none()
    {
        return Err(AppError::not_found("Event not found").into());
    }

    let link = state
        .team_repository
        .link_event(&team_id, &event_id)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Team is already linked to this event"))?;

    Ok(ApiResponse::created(link))
}

pub async fn unlink_event(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (team_id, event_id) = path.into_inner();

    owned_team(&state, &team_id, &claims, "update").await?;

    if !state
        .team_repository
        .unlink_event(&team_id, &event_id)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::not_found("Team is not linked to this event").into());
    }

    Ok(ApiResponse::success_message("Event unlinked from team"))
}
