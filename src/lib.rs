use sqlx::SqlitePool;

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use database::repositories::{
    EventRepository, HelpRequestRepository, TeamRepository, UserRepository,
    VolunteerLogRepository,
};
pub use error::AppError;
pub use services::{AuthService, MembershipService};

/// Repositories and services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub membership_service: MembershipService,
    pub user_repository: UserRepository,
    pub event_repository: EventRepository,
    pub team_repository: TeamRepository,
    pub help_request_repository: HelpRequestRepository,
    pub volunteer_log_repository: VolunteerLogRepository,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let user_repository = UserRepository::new(pool.clone());
        let event_repository = EventRepository::new(pool.clone());
        let team_repository = TeamRepository::new(pool.clone());
        let help_request_repository = HelpRequestRepository::new(pool.clone());
        let volunteer_log_repository = VolunteerLogRepository::new(pool);

        Self {
            auth_service: AuthService::new(user_repository.clone(), config),
            membership_service: MembershipService::new(
                event_repository.clone(),
                team_repository.clone(),
                help_request_repository.clone(),
            ),
            user_repository,
            event_repository,
            team_repository,
            help_request_repository,
            volunteer_log_repository,
        }
    }
}
