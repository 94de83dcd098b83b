pub mod event;
pub mod help_request;
pub mod team;
pub mod user;
pub mod volunteer_log;

pub use event::EventRepository;
pub use help_request::HelpRequestRepository;
pub use team::TeamRepository;
pub use user::UserRepository;
pub use volunteer_log::VolunteerLogRepository;
