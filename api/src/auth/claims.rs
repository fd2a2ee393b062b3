use std::str::FromStr;

use services::subject_service::Role;
use uuid::Uuid;

pub use util::jwt::Claims;

/// Validated access-ticket claims of the caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.sub
    }

    /// `None` when the ticket names a role this build does not know.
    pub fn role(&self) -> Option<Role> {
        Role::from_str(&self.0.role).ok()
    }
}
