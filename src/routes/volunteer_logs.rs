use actix_web::web;

use crate::handlers::volunteer_logs;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/volunteer-logs")
            .route("/{id}/verify", web::post().to(volunteer_logs::verify_log)),
    );
}
