//! Simulated file upload: waits a fixed delay, then submits.
//!
//! Cancelling the [`UploadTask`], dropping it, or dropping the future
//! returned by [`UploadTask::finish`] all cancel the upload; no submission
//! starts after that.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::assignments::SharedAssignments;
use crate::models::{Assignment, Submission};
use crate::{Error, Result};

pub struct UploadTask {
    assignment_id: String,
    token: CancellationToken,
    handle: JoinHandle<Result<Assignment>>,
    cancel_on_drop: DropGuard,
}

/// Must be called from within a tokio runtime.
pub fn start_upload(
    assignments: SharedAssignments,
    assignment_id: &str,
    submission: Submission,
    delay: Duration,
) -> UploadTask {
    let token = CancellationToken::new();
    let task_token = token.clone();
    let id = assignment_id.to_string();

    log::debug!("Uploading {} for assignment {}", submission.file, id);
    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = task_token.cancelled() => return Err(cancelled_error(&id)),
            _ = tokio::time::sleep(delay) => {}
        }
        let mut store = assignments.lock();
        if task_token.is_cancelled() {
            return Err(cancelled_error(&id));
        }
        store.submit(&id, submission)
    });

    UploadTask {
        assignment_id: assignment_id.to_string(),
        cancel_on_drop: token.clone().drop_guard(),
        token,
        handle,
    }
}

impl UploadTask {
    pub fn assignment_id(&self) -> &str {
        &self.assignment_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stops the upload. Does not touch the store, so it is safe to call
    /// while holding its lock.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() && !self.handle.is_finished() {
            log::info!("Upload for assignment {} cancelled", self.assignment_id);
        }
        self.token.cancel();
    }

    /// Waits for the upload and reports the submit outcome.
    pub async fn finish(self) -> Result<Assignment> {
        let UploadTask {
            assignment_id,
            handle,
            cancel_on_drop,
            ..
        } = self;

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => Err(cancelled_error(&assignment_id)),
            Err(err) => Err(Error::InternalError {
                kind: "UploadFailed",
                message: err.to_string(),
            }),
        };
        cancel_on_drop.disarm();
        outcome
    }
}

fn cancelled_error(id: &str) -> Error {
    Error::InternalError {
        kind: "Cancelled",
        message: format!("upload for assignment {} was cancelled", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::AssignmentStore;
    use crate::models::{AssignmentStatus, NewAssignment};

    fn shared_with_one() -> (SharedAssignments, String) {
        let shared = SharedAssignments::new(AssignmentStore::new());
        let id = shared
            .lock()
            .create(NewAssignment {
                title: "Deadlocks".to_string(),
                description: "Banker's algorithm exercise".to_string(),
                subject: "Operating Systems".to_string(),
                due_date: "2024-04-10".to_string(),
                upload_time_deadline: "17:30".to_string(),
                created_by: "STF001".to_string(),
                student_id: "21CS001".to_string(),
            })
            .id;
        (shared, id)
    }

    fn status(shared: &SharedAssignments, id: &str) -> AssignmentStatus {
        shared.lock().find_by_id(id).unwrap().status
    }

    #[tokio::test(start_paused = true)]
    async fn submits_after_the_delay() {
        let (shared, id) = shared_with_one();
        let task = start_upload(shared.clone(), &id, Submission::file("bankers.pdf"), Duration::from_millis(1500));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(status(&shared, &id), AssignmentStatus::Pending);

        let submitted = task.finish().await.unwrap();
        assert_eq!(submitted.submission_file.as_deref(), Some("bankers.pdf"));
        assert_eq!(status(&shared, &id), AssignmentStatus::Submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_task_never_writes() {
        let (shared, id) = shared_with_one();
        let task = start_upload(shared.clone(), &id, Submission::file("bankers.pdf"), Duration::from_millis(1500));
        drop(task);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(status(&shared, &id), AssignmentStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_reports_cancellation() {
        let (shared, id) = shared_with_one();
        let task = start_upload(shared.clone(), &id, Submission::file("bankers.pdf"), Duration::from_millis(1500));
        task.cancel();
        assert!(task.is_cancelled());

        let err = task.finish().await.unwrap_err();
        assert!(matches!(err, Error::InternalError { kind: "Cancelled", .. }));
        assert_eq!(status(&shared, &id), AssignmentStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_finish_never_writes() {
        let (shared, id) = shared_with_one();
        let task = start_upload(shared.clone(), &id, Submission::file("bankers.pdf"), Duration::from_millis(1500));

        let waited = tokio::time::timeout(Duration::from_millis(500), task.finish()).await;
        assert!(waited.is_err());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(status(&shared, &id), AssignmentStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_while_holding_the_store() {
        let (shared, id) = shared_with_one();
        let task = start_upload(shared.clone(), &id, Submission::file("bankers.pdf"), Duration::from_millis(1500));

        let store = shared.lock();
        task.cancel();
        drop(task);
        drop(store);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(status(&shared, &id), AssignmentStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn second_upload_hits_invalid_transition() {
        let (shared, id) = shared_with_one();
        let delay = Duration::from_millis(10);
        start_upload(shared.clone(), &id, Submission::file("v1.pdf"), delay)
            .finish()
            .await
            .unwrap();

        let err = start_upload(shared.clone(), &id, Submission::file("v2.pdf"), delay)
            .finish()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(
            shared.lock().find_by_id(&id).unwrap().submission_file.as_deref(),
            Some("v1.pdf")
        );
    }
}
