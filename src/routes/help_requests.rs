use actix_web::web;

use crate::handlers::help_requests;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/help-requests")
            .route("", web::get().to(help_requests::list_help_requests))
            .route("", web::post().to(help_requests::create_help_request))
            .route("/{id}", web::get().to(help_requests::get_help_request))
            .route("/{id}", web::put().to(help_requests::update_help_request))
            .route("/{id}", web::delete().to(help_requests::delete_help_request))
            .route("/{id}/offer-help", web::post().to(help_requests::offer_help))
            .route(
                "/{id}/withdraw-help",
                web::post().to(help_requests::withdraw_help),
            ),
    );
}
