use actix_web::web;

use crate::handlers::shared::configure_extractors;

pub mod auth;
pub mod events;
pub mod help_requests;
pub mod teams;
pub mod users;
pub mod volunteer_logs;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_extractors).service(
        web::scope("/api")
            .configure(auth::configure)
            .configure(users::configure)
            .configure(events::configure)
            .configure(volunteer_logs::configure)
            .configure(teams::configure)
            .configure(help_requests::configure),
    );
}
