//! One running portal: the session guard and the assignment store, owned
//! together and handed to the views that need them.

use anyhow::Context;

use crate::assignments::{AssignmentStore, SharedAssignments};
use crate::auth::SessionGuard;
use crate::config::PortalConfig;
use crate::directory::Directory;
use crate::io::{FileStorage, MemoryStorage, SessionStorage};
use crate::models::{Assignment, Grade, Identity, NewAssignment, Role, Submission};
use crate::upload::{start_upload, UploadTask};
use crate::{Error, Result};

pub struct Portal {
    session: SessionGuard,
    assignments: SharedAssignments,
    config: PortalConfig,
}

impl Portal {
    pub fn new(
        directory: Directory,
        storage: Box<dyn SessionStorage>,
        assignments: AssignmentStore,
        config: PortalConfig,
    ) -> Self {
        let session = SessionGuard::with_login_path(directory, storage, config.login_path.clone());
        Self {
            session,
            assignments: SharedAssignments::new(assignments),
            config,
        }
    }

    /// Builds the portal described by `config` and restores any stored session.
    pub fn boot(config: PortalConfig, assignments: AssignmentStore) -> anyhow::Result<Self> {
        let directory = match &config.directory_file {
            Some(path) => Directory::load(path).context("could not load the login directory")?,
            None => Directory::seed(),
        };
        let storage: Box<dyn SessionStorage> = match &config.storage_dir {
            Some(dir) => Box::new(FileStorage::new(dir)),
            None => Box::new(MemoryStorage::new()),
        };
        log::info!(
            "Booting portal with {} directory entries and {} assignments",
            directory.len(),
            assignments.len()
        );

        let mut portal = Self::new(directory, storage, assignments, config);
        portal.session.restore_session();
        Ok(portal)
    }

    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionGuard {
        &mut self.session
    }

    pub fn assignments(&self) -> SharedAssignments {
        self.assignments.clone()
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Assignments visible to whoever is logged in.
    pub fn my_assignments(&self) -> Vec<Assignment> {
        match self.session.current() {
            Some(identity) => self.assignments.lock().visible_to(identity),
            None => Vec::new(),
        }
    }

    /// Staff only. The assignment is attributed to the logged in staff member.
    pub fn create_assignment(&self, mut new: NewAssignment) -> Result<Assignment> {
        let staff = self.acting_as(Role::Staff)?;
        new.created_by = staff.id().to_string();
        Ok(self.assignments.lock().create(new))
    }

    /// Students only. Starts the simulated upload for one of their own assignments.
    pub fn start_submission(&self, assignment_id: &str, submission: Submission) -> Result<UploadTask> {
        let student = self.acting_as(Role::Student)?;
        match self.assignments.lock().find_by_id(assignment_id) {
            Some(assignment) if assignment.student_id == student.id() => {}
            Some(_) => {
                return Err(Error::Forbidden {
                    message: format!("{} does not own assignment {}", student.id(), assignment_id),
                })
            }
            None => return Err(Error::not_found(format!("assignment {}", assignment_id))),
        }
        Ok(start_upload(
            self.assignments.clone(),
            assignment_id,
            submission,
            self.config.upload_delay,
        ))
    }

    /// Staff only, and only for assignments they created.
    pub fn grade(&self, assignment_id: &str, grade: Grade) -> Result<Assignment> {
        let staff = self.acting_as(Role::Staff)?;
        self.assignments.lock().grade_as(staff.id(), assignment_id, grade)
    }

    fn acting_as(&self, role: Role) -> Result<&Identity> {
        match self.session.current() {
            Some(identity) if identity.role() == role => Ok(identity),
            Some(identity) => Err(Error::Forbidden {
                message: format!("{} is a {}, not a {}", identity.id(), identity.role(), role),
            }),
            None => Err(Error::Forbidden {
                message: "nobody is logged in".to_string(),
            }),
        }
    }
}
