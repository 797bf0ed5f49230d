use crate::error::CoordinatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

/// Identity of the caller as resolved by the web tier's session layer.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Membership checks, delegated to the platform's user/company service.
/// Platform admins bypass these; everyone else needs an active membership.
pub trait Authorizer {
    /// May the user fund escrows and approve payouts for this company?
    fn can_approve_payments(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<bool, CoordinatorError>;

    /// Does the user hold any active membership in this company?
    fn is_company_member(&self, user_id: &str, company_id: &str)
        -> Result<bool, CoordinatorError>;
}
