pub mod auth;
pub mod membership;

pub use auth::{AuthService, Claims};
pub use membership::MembershipService;
