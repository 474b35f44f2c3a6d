//! Assignment collection and its lifecycle.
//!
//! ```text
//! pending --submit--> submitted --grade(completed)--> completed
//!                         |
//!                         +------grade(late)--------> late
//! ```
//!
//! Every mutation either applies fully and returns the updated snapshot, or
//! returns an error and leaves the collection untouched.

use chrono::{NaiveDate, Utc};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Assignment, AssignmentStatus, Grade, Identity, NewAssignment, Role, StatusSummary, Submission,
};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct AssignmentStore {
    assignments: Vec<Assignment>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from mocked records, skipping any that break the lifecycle rules.
    pub fn with_seed<I: IntoIterator<Item = Assignment>>(seed: I) -> Self {
        let mut store = Self::new();
        for assignment in seed {
            if !assignment.is_consistent() {
                log::warn!("Skipping inconsistent seeded assignment {}", assignment.id);
            } else if store.find_by_id(&assignment.id).is_some() {
                log::warn!("Skipping duplicate seeded assignment {}", assignment.id);
            } else {
                store.assignments.push(assignment);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn create(&mut self, new: NewAssignment) -> Assignment {
        let assignment = Assignment::from_new(Uuid::new_v4().to_string(), new);
        log::info!(
            "{} assigned `{}` to {} as {}",
            assignment.created_by,
            assignment.title,
            assignment.student_id,
            assignment.id
        );
        self.assignments.push(assignment.clone());
        assignment
    }

    pub fn submit(&mut self, id: &str, submission: Submission) -> Result<Assignment> {
        self.submit_on(id, submission, Utc::now().date_naive())
    }

    /// Like [`submit`](Self::submit) but only for the owning student.
    pub fn submit_as(&mut self, student_id: &str, id: &str, submission: Submission) -> Result<Assignment> {
        let idx = self.position(id)?;
        if self.assignments[idx].student_id != student_id {
            return Err(self.ignored(Error::Forbidden {
                message: format!("{} does not own assignment {}", student_id, id),
            }));
        }
        self.submit(id, submission)
    }

    fn submit_on(&mut self, id: &str, submission: Submission, today: NaiveDate) -> Result<Assignment> {
        let idx = self.position(id)?;
        let status = self.assignments[idx].status;
        if status != AssignmentStatus::Pending {
            return Err(self.ignored(Error::invalid_transition(format!(
                "cannot submit assignment {} while {:?}",
                id, status
            ))));
        }

        let assignment = &mut self.assignments[idx];
        assignment.status = AssignmentStatus::Submitted;
        assignment.submission_date = Some(today);
        assignment.submission_file = Some(submission.file);
        assignment.submission_notes = submission.notes.filter(|notes| !notes.trim().is_empty());
        log::info!("{} submitted assignment {}", assignment.student_id, assignment.id);
        Ok(assignment.clone())
    }

    pub fn grade(&mut self, id: &str, grade: Grade) -> Result<Assignment> {
        let idx = self.position(id)?;
        let status = self.assignments[idx].status;
        if status != AssignmentStatus::Submitted {
            return Err(self.ignored(Error::invalid_transition(format!(
                "cannot grade assignment {} while {:?}",
                id, status
            ))));
        }
        if !(1..=5).contains(&grade.rating) {
            return Err(self.ignored(Error::InvalidRating { rating: grade.rating }));
        }

        let assignment = &mut self.assignments[idx];
        assignment.status = grade.status.into();
        assignment.rating = Some(grade.rating);
        assignment.remarks = Some(grade.remarks);
        log::info!(
            "Assignment {} graded {:?} with rating {}",
            assignment.id,
            assignment.status,
            grade.rating
        );
        Ok(assignment.clone())
    }

    /// Like [`grade`](Self::grade) but only for the staff member who created it.
    pub fn grade_as(&mut self, staff_id: &str, id: &str, grade: Grade) -> Result<Assignment> {
        let idx = self.position(id)?;
        if self.assignments[idx].created_by != staff_id {
            return Err(self.ignored(Error::Forbidden {
                message: format!("{} did not create assignment {}", staff_id, id),
            }));
        }
        self.grade(id, grade)
    }

    pub fn list_for_student(&self, student_id: &str) -> Vec<Assignment> {
        self.filtered(|a| a.student_id == student_id)
    }

    pub fn list_for_staff(&self, staff_id: &str) -> Vec<Assignment> {
        self.filtered(|a| a.created_by == staff_id)
    }

    /// What the given actor gets to see. The placement office sees none.
    pub fn visible_to(&self, identity: &Identity) -> Vec<Assignment> {
        match identity.role() {
            Role::Student => self.list_for_student(identity.id()),
            Role::Staff => self.list_for_staff(identity.id()),
            Role::Tpo => Vec::new(),
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<Assignment> {
        self.assignments.iter().find(|a| a.id == id).cloned()
    }

    pub fn summary_for_student(&self, student_id: &str) -> StatusSummary {
        let mut summary = StatusSummary::default();
        self.assignments
            .iter()
            .filter(|a| a.student_id == student_id)
            .for_each(|a| summary.count(a.status));
        summary
    }

    fn filtered<F: Fn(&Assignment) -> bool>(&self, keep: F) -> Vec<Assignment> {
        self.assignments.iter().filter(|a| keep(*a)).cloned().collect()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.assignments
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| self.ignored(Error::not_found(format!("assignment {}", id))))
    }

    fn ignored(&self, err: Error) -> Error {
        log::debug!("Ignored assignment mutation: {}", err);
        err
    }
}

/// The single store instance, shared between the UI and deferred uploads.
#[derive(Clone, Debug, Default)]
pub struct SharedAssignments {
    inner: Arc<Mutex<AssignmentStore>>,
}

impl SharedAssignments {
    pub fn new(store: AssignmentStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, AssignmentStore> {
        self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GradedStatus, StudentProfile};

    fn new_assignment(title: &str, staff: &str, student: &str) -> NewAssignment {
        NewAssignment {
            title: title.to_string(),
            description: format!("{} worksheet", title),
            subject: "Operating Systems".to_string(),
            due_date: "2024-04-02".to_string(),
            upload_time_deadline: "18:00".to_string(),
            created_by: staff.to_string(),
            student_id: student.to_string(),
        }
    }

    fn graded(rating: u8, status: GradedStatus) -> Grade {
        Grade {
            rating,
            remarks: "Good".to_string(),
            status,
        }
    }

    #[test]
    fn create_assigns_unique_pending_ids() {
        let mut store = AssignmentStore::new();
        let first = store.create(new_assignment("Paging", "STF001", "21CS001"));
        let second = store.create(new_assignment("Paging", "STF001", "21CS001"));

        assert_ne!(first.id, second.id);
        let found = store.find_by_id(&first.id).unwrap();
        assert_eq!(found.status, AssignmentStatus::Pending);
        assert_eq!(found.due_date, "2024-04-02");
        assert!(found.submission_date.is_none());
    }

    #[test]
    fn submit_moves_pending_to_submitted_once() {
        let mut store = AssignmentStore::new();
        let id = store.create(new_assignment("Paging", "STF001", "21CS001")).id;
        let today = NaiveDate::from_ymd_opt(2024, 3, 30).unwrap();

        let submitted = store
            .submit_on(&id, Submission::file("x.pdf").with_notes("see appendix"), today)
            .unwrap();
        assert_eq!(submitted.status, AssignmentStatus::Submitted);
        assert_eq!(submitted.submission_file.as_deref(), Some("x.pdf"));
        assert_eq!(submitted.submission_date, Some(today));
        assert_eq!(submitted.submission_notes.as_deref(), Some("see appendix"));

        let again = store.submit(&id, Submission::file("y.pdf")).unwrap_err();
        assert!(matches!(again, Error::InvalidTransition { .. }));
        assert_eq!(store.find_by_id(&id).unwrap(), submitted);
    }

    #[test]
    fn blank_notes_are_not_kept() {
        let mut store = AssignmentStore::new();
        let id = store.create(new_assignment("Paging", "STF001", "21CS001")).id;
        let submitted = store.submit(&id, Submission::file("x.pdf").with_notes("  ")).unwrap();
        assert_eq!(submitted.submission_notes, None);
        assert!(submitted.is_consistent());
    }

    #[test]
    fn grade_requires_submitted() {
        let mut store = AssignmentStore::new();
        let id = store.create(new_assignment("Paging", "STF001", "21CS001")).id;

        assert!(store.grade(&id, graded(4, GradedStatus::Completed)).is_err());
        assert_eq!(store.find_by_id(&id).unwrap().status, AssignmentStatus::Pending);

        store.submit(&id, Submission::file("x.pdf")).unwrap();
        let done = store.grade(&id, graded(4, GradedStatus::Completed)).unwrap();
        assert_eq!(done.status, AssignmentStatus::Completed);
        assert_eq!(done.rating, Some(4));
        assert_eq!(done.remarks.as_deref(), Some("Good"));
        assert!(done.is_consistent());

        assert!(store.grade(&id, graded(2, GradedStatus::Late)).is_err());
        assert!(store.submit(&id, Submission::file("late.pdf")).is_err());
        assert_eq!(store.find_by_id(&id).unwrap(), done);
    }

    #[test]
    fn late_grading_is_terminal() {
        let mut store = AssignmentStore::new();
        let id = store.create(new_assignment("Paging", "STF001", "21CS001")).id;
        store.submit(&id, Submission::file("x.pdf")).unwrap();
        let late = store.grade(&id, graded(2, GradedStatus::Late)).unwrap();
        assert_eq!(late.status, AssignmentStatus::Late);
        assert!(late.status.is_terminal());
    }

    #[test]
    fn out_of_range_rating_is_ignored() {
        let mut store = AssignmentStore::new();
        let id = store.create(new_assignment("Paging", "STF001", "21CS001")).id;
        store.submit(&id, Submission::file("x.pdf")).unwrap();

        for rating in [0, 6] {
            let err = store.grade(&id, graded(rating, GradedStatus::Completed)).unwrap_err();
            assert_eq!(err, Error::InvalidRating { rating });
        }
        assert_eq!(store.find_by_id(&id).unwrap().status, AssignmentStatus::Submitted);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut store = AssignmentStore::new();
        assert!(matches!(
            store.submit("missing", Submission::file("x.pdf")),
            Err(Error::NotFound { .. })
        ));
        assert!(store.grade("missing", graded(3, GradedStatus::Late)).unwrap_err().is_ignored());
        assert!(store.find_by_id("missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn listings_keep_insertion_order() {
        let mut store = AssignmentStore::new();
        let a = store.create(new_assignment("A", "STF001", "21CS001")).id;
        let b = store.create(new_assignment("B", "STF002", "21CS002")).id;
        let c = store.create(new_assignment("C", "STF002", "21CS001")).id;
        let d = store.create(new_assignment("D", "STF001", "21CS001")).id;
        store.submit(&c, Submission::file("c.pdf")).unwrap();
        store.submit(&a, Submission::file("a.pdf")).unwrap();
        store.grade(&a, graded(5, GradedStatus::Completed)).unwrap();

        let ids = |list: Vec<Assignment>| list.into_iter().map(|x| x.id).collect::<Vec<_>>();
        assert_eq!(ids(store.list_for_student("21CS001")), vec![a.clone(), c.clone(), d.clone()]);
        assert_eq!(ids(store.list_for_staff("STF002")), vec![b, c]);
        assert_eq!(ids(store.list_for_staff("STF001")), vec![a, d]);
        assert!(store.list_for_student("22IT014").is_empty());
    }

    #[test]
    fn listings_are_snapshots() {
        let mut store = AssignmentStore::new();
        let id = store.create(new_assignment("A", "STF001", "21CS001")).id;
        let mut listed = store.list_for_student("21CS001");
        listed[0].status = AssignmentStatus::Completed;
        assert_eq!(store.find_by_id(&id).unwrap().status, AssignmentStatus::Pending);
    }

    #[test]
    fn attributed_mutations_check_the_actor() {
        let mut store = AssignmentStore::new();
        let id = store.create(new_assignment("A", "STF001", "21CS001")).id;

        assert!(matches!(
            store.submit_as("21CS002", &id, Submission::file("x.pdf")),
            Err(Error::Forbidden { .. })
        ));
        store.submit_as("21CS001", &id, Submission::file("x.pdf")).unwrap();

        assert!(matches!(
            store.grade_as("STF002", &id, graded(3, GradedStatus::Completed)),
            Err(Error::Forbidden { .. })
        ));
        let done = store.grade_as("STF001", &id, graded(3, GradedStatus::Completed)).unwrap();
        assert_eq!(done.rating, Some(3));
    }

    #[test]
    fn visibility_follows_role() {
        let mut store = AssignmentStore::new();
        store.create(new_assignment("A", "STF001", "21CS001"));
        store.create(new_assignment("B", "STF002", "21CS001"));

        let student = Identity::student("21CS001", "Aarav", StudentProfile::default());
        assert_eq!(store.visible_to(&student).len(), 2);
        assert_eq!(store.visible_to(&Identity::staff("STF002", "Prof. Joshi")).len(), 1);
        assert!(store.visible_to(&Identity::tpo("TPO001", "Sunita")).is_empty());
    }

    #[test]
    fn summary_counts_one_students_work() {
        let mut store = AssignmentStore::new();
        let a = store.create(new_assignment("A", "STF001", "21CS001")).id;
        store.create(new_assignment("B", "STF001", "21CS001"));
        store.create(new_assignment("C", "STF001", "21CS002"));
        store.submit(&a, Submission::file("a.pdf")).unwrap();

        let summary = store.summary_for_student("21CS001");
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.submitted, 1);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn seed_skips_inconsistent_and_duplicate_records() {
        let valid = Assignment::from_new("seed-1".to_string(), new_assignment("A", "STF001", "21CS001"));
        let mut broken = Assignment::from_new("seed-2".to_string(), new_assignment("B", "STF001", "21CS001"));
        broken.status = AssignmentStatus::Submitted;

        let store = AssignmentStore::with_seed(vec![valid.clone(), broken, valid]);
        assert_eq!(store.len(), 1);
        assert!(store.find_by_id("seed-2").is_none());
    }

    #[test]
    fn shared_handle_sees_the_same_store() {
        let shared = SharedAssignments::default();
        let other = shared.clone();
        let id = shared.lock().create(new_assignment("A", "STF001", "21CS001")).id;
        assert!(other.lock().find_by_id(&id).is_some());
    }
}
