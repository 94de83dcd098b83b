pub mod auth;
pub mod events;
pub mod help_requests;
pub mod shared;
pub mod teams;
pub mod users;
pub mod volunteer_logs;
