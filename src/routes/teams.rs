use actix_web::web;

use crate::handlers::teams;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/teams")
            .route("", web::get().to(teams::list_teams))
            .route("", web::post().to(teams::create_team))
            .route("/{id}", web::get().to(teams::get_team))
            .route("/{id}", web::put().to(teams::update_team))
            .route("/{id}", web::delete().to(teams::delete_team))
            .route("/{id}/join", web::post().to(teams::join_team))
            .route("/{id}/leave", web::post().to(teams::leave_team))
            .route("/{id}/events", web::post().to(teams::link_event))
            .route(
                "/{id}/events/{event_id}",
                web::delete().to(teams::unlink_event),
            ),
    );
}
