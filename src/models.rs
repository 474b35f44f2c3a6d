use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
    Tpo,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Staff, Role::Tpo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Tpo => "tpo",
        }
    }

    /// Where a freshly logged in actor lands when no redirect is pending.
    pub fn landing_path(&self) -> String {
        format!("/{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "staff" => Ok(Role::Staff),
            "tpo" => Ok(Role::Tpo),
            other => Err(Error::unknown(format!("unknown role `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub year: Option<String>,
    pub department: Option<String>,
    pub cgpa: Option<f64>,
    pub attendance: Option<u8>,
    pub division: Option<String>,
    pub semester: Option<u8>,
}

/// An authenticated actor. The role is fixed at construction and only
/// students carry a profile; decoding rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IdentityRecord")]
pub struct Identity {
    id: String,
    name: String,
    role: Role,
    profile: Option<StudentProfile>,
}

impl Identity {
    pub fn student<I: Into<String>, N: Into<String>>(id: I, name: N, profile: StudentProfile) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Student,
            profile: Some(profile),
        }
    }

    pub fn staff<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        Self::without_profile(id.into(), name.into(), Role::Staff)
    }

    pub fn tpo<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        Self::without_profile(id.into(), name.into(), Role::Tpo)
    }

    fn without_profile(id: String, name: String, role: Role) -> Self {
        Self {
            id,
            name,
            role,
            profile: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn profile(&self) -> Option<&StudentProfile> {
        self.profile.as_ref()
    }
}

#[derive(Deserialize)]
struct IdentityRecord {
    id: String,
    name: String,
    role: Role,
    profile: Option<StudentProfile>,
}

impl TryFrom<IdentityRecord> for Identity {
    type Error = String;

    fn try_from(record: IdentityRecord) -> Result<Self, Self::Error> {
        if record.role != Role::Student && record.profile.is_some() {
            return Err(format!(
                "`{}` carries a student profile but is a {}",
                record.id, record.role
            ));
        }
        Ok(Self {
            id: record.id,
            name: record.name,
            role: record.role,
            profile: record.profile,
        })
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Submitted,
    Completed,
    Late,
}

impl AssignmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Completed | AssignmentStatus::Late)
    }
}

/// The two outcomes staff may grade a submission into.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradedStatus {
    Completed,
    Late,
}

impl From<GradedStatus> for AssignmentStatus {
    fn from(status: GradedStatus) -> Self {
        match status {
            GradedStatus::Completed => AssignmentStatus::Completed,
            GradedStatus::Late => AssignmentStatus::Late,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    /// Stored as given, never parsed.
    pub due_date: String,
    /// 24-hour time of day, e.g. `23:59`.
    pub upload_time_deadline: String,
    pub created_by: String,
    pub student_id: String,
    pub status: AssignmentStatus,
    pub submission_date: Option<NaiveDate>,
    pub submission_file: Option<String>,
    pub submission_notes: Option<String>,
    pub rating: Option<u8>,
    pub remarks: Option<String>,
}

impl Assignment {
    pub(crate) fn from_new(id: String, new: NewAssignment) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            subject: new.subject,
            due_date: new.due_date,
            upload_time_deadline: new.upload_time_deadline,
            created_by: new.created_by,
            student_id: new.student_id,
            status: AssignmentStatus::Pending,
            submission_date: None,
            submission_file: None,
            submission_notes: None,
            rating: None,
            remarks: None,
        }
    }

    /// Checks the field/status pairing rules. Used to vet seeded records.
    pub fn is_consistent(&self) -> bool {
        let submitted = self.status != AssignmentStatus::Pending;
        let graded = self.status.is_terminal();
        let rating_ok = self.rating.map_or(true, |r| (1..=5).contains(&r));

        self.submission_date.is_some() == submitted
            && self.submission_file.is_some() == submitted
            && (submitted || self.submission_notes.is_none())
            && self.rating.is_some() == graded
            && self.remarks.is_some() == graded
            && rating_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub due_date: String,
    pub upload_time_deadline: String,
    pub created_by: String,
    pub student_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub file: String,
    pub notes: Option<String>,
}

impl Submission {
    pub fn file<S: Into<String>>(file: S) -> Self {
        Self {
            file: file.into(),
            notes: None,
        }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub rating: u8,
    pub remarks: String,
    pub status: GradedStatus,
}

/// Per-status counts backing the student dashboard tiles.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct StatusSummary {
    pub pending: usize,
    pub submitted: usize,
    pub completed: usize,
    pub late: usize,
}

impl StatusSummary {
    pub fn total(&self) -> usize {
        self.pending + self.submitted + self.completed + self.late
    }

    pub(crate) fn count(&mut self, status: AssignmentStatus) {
        match status {
            AssignmentStatus::Pending => self.pending += 1,
            AssignmentStatus::Submitted => self.submitted += 1,
            AssignmentStatus::Completed => self.completed += 1,
            AssignmentStatus::Late => self.late += 1,
        }
    }
}
