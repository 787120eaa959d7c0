//! Teacher-side recipient directory: every student enrolled in one of the
//! teacher's classrooms, keyed by username.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use lyceum_net::SchoolApi;
use lyceum_shared::types::{Role, UserId};

use crate::error::{ClientError, Result};

pub struct RecipientDirectory {
    api: Arc<dyn SchoolApi>,
    role: Role,
}

impl RecipientDirectory {
    pub fn new(api: Arc<dyn SchoolApi>, role: Role) -> Self {
        Self { api, role }
    }

    /// Load the students of all the teacher's classrooms.
    ///
    /// Classrooms are queried concurrently. A classroom whose roster cannot
    /// be fetched is skipped; failing to list the classrooms fails the load.
    /// A student enrolled in several classrooms appears once.
    pub async fn load(&self) -> Result<BTreeMap<String, UserId>> {
        if self.role != Role::Teacher {
            return Err(ClientError::NotTeacher);
        }

        let teacher = self.api.current_teacher().await?;
        let classrooms = self.api.teacher_classrooms(teacher).await?;
        debug!(teacher = %teacher, classrooms = classrooms.len(), "Loading recipients");

        let rosters = join_all(
            classrooms
                .iter()
                .map(|c| async move { (c.id, self.api.classroom_students(c.id).await) }),
        )
        .await;

        let mut recipients = BTreeMap::new();
        for (classroom, roster) in rosters {
            match roster {
                Ok(students) => {
                    for student in students {
                        recipients.insert(student.username, student.id);
                    }
                }
                Err(e) => warn!(classroom = %classroom, error = %e, "Skipping classroom roster"),
            }
        }
        info!(count = recipients.len(), "Recipients loaded");
        Ok(recipients)
    }
}
