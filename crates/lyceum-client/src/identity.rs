//! Resolution of the logged-in session to a user identity.
//!
//! The chain runs at most once per resolver. Its outcome, success or
//! failure, is kept for the lifetime of the session.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use lyceum_net::{ApiError, SchoolApi};
use lyceum_shared::{Role, UserIdentity};

use crate::error::{ClientError, IdentityStep, Result};

#[derive(Debug, Clone)]
struct IdentityFailure {
    step: IdentityStep,
    reason: String,
}

impl IdentityFailure {
    fn at(step: IdentityStep) -> impl FnOnce(ApiError) -> Self {
        move |e| Self {
            step,
            reason: e.to_string(),
        }
    }
}

impl From<IdentityFailure> for ClientError {
    fn from(f: IdentityFailure) -> Self {
        ClientError::IdentityUnavailable {
            step: f.step,
            reason: f.reason,
        }
    }
}

pub struct IdentityResolver {
    api: Arc<dyn SchoolApi>,
    role: Role,
    outcome: OnceCell<std::result::Result<UserIdentity, IdentityFailure>>,
}

impl IdentityResolver {
    pub fn new(api: Arc<dyn SchoolApi>, role: Role) -> Self {
        Self {
            api,
            role,
            outcome: OnceCell::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Resolve the session identity, running the lookup chain on first use.
    ///
    /// Concurrent callers share a single run of the chain.
    pub async fn resolve(&self) -> Result<UserIdentity> {
        let outcome = self.outcome.get_or_init(|| self.run_chain()).await;
        outcome.clone().map_err(ClientError::from)
    }

    /// Identity if already resolved successfully.
    pub fn resolved(&self) -> Option<&UserIdentity> {
        self.outcome.get().and_then(|o| o.as_ref().ok())
    }

    async fn run_chain(&self) -> std::result::Result<UserIdentity, IdentityFailure> {
        let result = self.lookup().await;
        match &result {
            Ok(identity) => info!(
                role = %identity.role,
                user_id = %identity.user_id,
                username = %identity.username,
                "Identity resolved"
            ),
            Err(f) => error!(step = %f.step, reason = %f.reason, "Identity resolution failed"),
        }
        result
    }

    async fn lookup(&self) -> std::result::Result<UserIdentity, IdentityFailure> {
        match self.role {
            Role::Student => self.lookup_student().await,
            Role::Teacher => self.lookup_teacher().await,
        }
    }

    /// `current/student` carries the username; the directory maps it to
    /// the user id. The role-id exchange is never used for students.
    async fn lookup_student(&self) -> std::result::Result<UserIdentity, IdentityFailure> {
        let student = self
            .api
            .current_student()
            .await
            .map_err(IdentityFailure::at(IdentityStep::CurrentPrincipal))?;
        debug!(role_id = %student.id, "Current student");

        let username = student
            .username
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| IdentityFailure {
                step: IdentityStep::Username,
                reason: "current student has no username".into(),
            })?;

        let user_id = self
            .api
            .user_id_for_username(&username)
            .await
            .map_err(IdentityFailure::at(IdentityStep::UserId))?;

        Ok(UserIdentity {
            role: Role::Student,
            user_id,
            username,
        })
    }

    async fn lookup_teacher(&self) -> std::result::Result<UserIdentity, IdentityFailure> {
        let teacher_id = self
            .api
            .current_teacher()
            .await
            .map_err(IdentityFailure::at(IdentityStep::CurrentPrincipal))?;
        debug!(role_id = %teacher_id, "Current teacher");

        let user_id = self
            .api
            .user_id_for_role(teacher_id)
            .await
            .map_err(IdentityFailure::at(IdentityStep::UserId))?;

        let username = self
            .api
            .username_for(user_id)
            .await
            .map_err(IdentityFailure::at(IdentityStep::Username))?;

        Ok(UserIdentity {
            role: Role::Teacher,
            user_id,
            username,
        })
    }
}
