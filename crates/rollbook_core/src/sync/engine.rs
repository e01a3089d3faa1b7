//! Sync engine state machine.
//!
//! # Responsibility
//! - Drive explicit push (local -> remote) and pull (remote -> local)
//!   passes over the repositories and the remote seam.
//! - Guard the Idle/Pushing/Pulling state so the two passes never overlap.
//!
//! # Invariants
//! - Push reads every owned row including tombstones, so deletions reach
//!   other devices as `is_deleted = true`, never as removed rows.
//! - A remote name conflict skips that class's subtree for the round and is
//!   surfaced in the report; it never fails the whole push.
//! - Pull preserves remote identifiers and commits one class subtree per
//!   transaction; the first I/O failure aborts the rest of the pull, while
//!   already-committed subtrees stay.
//! - Push row upserts retry bounded times (idempotent); pull is never
//!   retried by the engine because a subtree may already have committed.

use crate::model::class::ClassId;
use crate::model::now_ms;
use crate::repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
use crate::repo::class_repo::{ClassRepository, SqliteClassRepository};
use crate::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use crate::repo::sync_state_repo::{SqliteSyncStateRepository, SyncMetadata, SyncStateRepository};
use crate::session::SessionProvider;
use crate::sync::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::sync::{SyncError, SyncResult};
use log::{info, warn};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Externally observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No sync pass in flight.
    Idle,
    /// Local state is being pushed to the remote.
    Pushing,
    /// Remote state is being pulled into the local store.
    Pulling,
}

/// Bounded retry for push row upserts. Upserts are idempotent by id, so
/// re-sending after a transport failure is safe.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per row, including the first.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(150),
        }
    }
}

/// A class whose push was skipped due to a remote name conflict. Its
/// students and attendance were not pushed this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedClass {
    /// Stable id of the skipped class.
    pub id: ClassId,
    /// Local name that collided remotely.
    pub name: String,
}

/// Aggregate outcome of one push pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Class rows upserted remotely (tombstones included).
    pub classes_pushed: u64,
    /// Student rows upserted remotely.
    pub students_pushed: u64,
    /// Attendance rows upserted remotely.
    pub attendance_pushed: u64,
    /// Classes skipped on remote name conflict, children unpushed.
    pub skipped: Vec<SkippedClass>,
    /// Row-level failures that were logged and not retried further.
    pub row_errors: u64,
}

impl PushReport {
    /// True when every row landed and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.row_errors == 0
    }
}

/// Aggregate outcome of one pull pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Class rows upserted locally.
    pub classes_pulled: u64,
    /// Student rows upserted locally.
    pub students_pulled: u64,
    /// Attendance rows upserted locally.
    pub attendance_pulled: u64,
    /// Ownerless local classes reattached to the identity before fetching.
    pub orphans_adopted: u64,
}

type StatusListener = Arc<dyn Fn(SyncStatus) + Send + Sync>;

/// Explicitly constructed sync service; lifecycle belongs to the host
/// session, not the process. Inject the remote seam and identity seam at
/// construction.
pub struct SyncEngine {
    remote: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionProvider>,
    retry: RetryPolicy,
    status: Mutex<SyncStatus>,
    listeners: Mutex<Vec<StatusListener>>,
}

impl SyncEngine {
    /// Creates an engine with the default retry policy.
    pub fn new(remote: Arc<dyn RemoteStore>, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_retry_policy(remote, session, RetryPolicy::default())
    }

    /// Creates an engine with an explicit retry policy for push rows.
    pub fn with_retry_policy(
        remote: Arc<dyn RemoteStore>,
        session: Arc<dyn SessionProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            remote,
            session,
            retry,
            status: Mutex::new(SyncStatus::Idle),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current engine state.
    pub fn status(&self) -> SyncStatus {
        *self.status.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Registers a listener notified on every state transition. Listeners
    /// are invoked outside the engine's locks and may call back into the
    /// engine, e.g. retrigger a pass after observing `Idle`.
    pub fn subscribe(&self, listener: impl Fn(SyncStatus) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(Arc::new(listener));
    }

    /// Returns sync bookkeeping (last sync timestamp, best-effort pending
    /// counters) for the active identity.
    pub fn metadata(&self, conn: &Connection) -> SyncResult<SyncMetadata> {
        let owner = self
            .session
            .current_user_id()
            .ok_or(SyncError::NotAuthenticated)?;
        let sync_state = SqliteSyncStateRepository::try_new(conn)?;
        Ok(sync_state.metadata(owner)?)
    }

    /// Pushes the whole local state of the current identity to the remote.
    ///
    /// Best effort: row-level failures and remote name conflicts are logged,
    /// counted in the report and do not abort the pass. The sync timestamp
    /// is recorded even on partial completion.
    ///
    /// # Errors
    /// - `Busy` while another pass is in flight.
    /// - `NotAuthenticated` without an identity.
    /// - `Unreachable` when the reachability probe fails before any upsert.
    pub fn push(&self, conn: &Connection) -> SyncResult<PushReport> {
        self.begin(SyncStatus::Pushing)?;
        let result = self.run_push(conn);
        self.finish();
        result
    }

    /// Pulls the whole remote state of the current identity into the local
    /// store, reattaching ownerless local rows to the identity first.
    ///
    /// # Errors
    /// - `Busy` while another pass is in flight.
    /// - `NotAuthenticated` without an identity.
    /// - `Unreachable` when the reachability probe fails.
    /// - Any remote or local I/O failure aborts the remainder of the pass;
    ///   class subtrees committed before the failure stay.
    pub fn pull(&self, conn: &Connection) -> SyncResult<PullReport> {
        self.begin(SyncStatus::Pulling)?;
        let result = self.run_pull(conn);
        self.finish();
        result
    }

    fn begin(&self, target: SyncStatus) -> SyncResult<()> {
        let mut status = self.status.lock().unwrap_or_else(|err| err.into_inner());
        if *status != SyncStatus::Idle {
            return Err(SyncError::Busy(*status));
        }
        *status = target;
        drop(status);
        self.notify(target);
        Ok(())
    }

    fn finish(&self) {
        *self.status.lock().unwrap_or_else(|err| err.into_inner()) = SyncStatus::Idle;
        self.notify(SyncStatus::Idle);
    }

    fn notify(&self, status: SyncStatus) {
        // Snapshot under the lock, invoke outside it: listeners may call
        // back into the engine (subscribe, status, a follow-up push/pull).
        let listeners: Vec<StatusListener> = self
            .listeners
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone();
        for listener in listeners {
            listener(status);
        }
    }

    fn run_push(&self, conn: &Connection) -> SyncResult<PushReport> {
        let owner = self
            .session
            .current_user_id()
            .ok_or(SyncError::NotAuthenticated)?;
        if !self.remote.is_reachable() {
            return Err(SyncError::Unreachable);
        }

        let classes = SqliteClassRepository::try_new(conn)?;
        let students = SqliteStudentRepository::try_new(conn)?;
        let attendance = SqliteAttendanceRepository::try_new(conn)?;
        let sync_state = SqliteSyncStateRepository::try_new(conn)?;

        let mut report = PushReport::default();
        let owned = classes.list_for_owner(owner, true)?;
        info!(
            "event=sync_push module=sync status=start owner={owner} classes={}",
            owned.len()
        );

        for class in &owned {
            match self.upsert_with_retry(|| self.remote.upsert_class(class)) {
                Ok(()) => report.classes_pushed += 1,
                Err(RemoteError::UniqueViolation(detail)) => {
                    warn!(
                        "event=sync_push module=sync status=skip class_id={} reason=remote_name_conflict detail={detail}",
                        class.id
                    );
                    report.skipped.push(SkippedClass {
                        id: class.id,
                        name: class.name.clone(),
                    });
                    continue;
                }
                Err(err) => {
                    warn!(
                        "event=sync_push module=sync status=row_error class_id={} error={err}",
                        class.id
                    );
                    report.row_errors += 1;
                    // Children are withheld: their parent may not exist
                    // remotely yet. They go out on the next round.
                    continue;
                }
            }

            for student in students.list_for_class(class.id, true)? {
                match self.upsert_with_retry(|| self.remote.upsert_student(&student)) {
                    Ok(()) => report.students_pushed += 1,
                    Err(err) => {
                        warn!(
                            "event=sync_push module=sync status=row_error student_id={} error={err}",
                            student.id
                        );
                        report.row_errors += 1;
                    }
                }
            }

            for record in attendance.list_for_class(class.id)? {
                match self.upsert_with_retry(|| self.remote.upsert_attendance(&record)) {
                    Ok(()) => report.attendance_pushed += 1,
                    Err(err) => {
                        warn!(
                            "event=sync_push module=sync status=row_error record_id={} error={err}",
                            record.id
                        );
                        report.row_errors += 1;
                    }
                }
            }
        }

        sync_state.set_last_synced_at(now_ms())?;
        info!(
            "event=sync_push module=sync status=ok classes={} students={} attendance={} skipped={} row_errors={}",
            report.classes_pushed,
            report.students_pushed,
            report.attendance_pushed,
            report.skipped.len(),
            report.row_errors
        );
        Ok(report)
    }

    fn run_pull(&self, conn: &Connection) -> SyncResult<PullReport> {
        let owner = self
            .session
            .current_user_id()
            .ok_or(SyncError::NotAuthenticated)?;
        if !self.remote.is_reachable() {
            return Err(SyncError::Unreachable);
        }

        let classes = SqliteClassRepository::try_new(conn)?;
        let students = SqliteStudentRepository::try_new(conn)?;
        let attendance = SqliteAttendanceRepository::try_new(conn)?;
        let sync_state = SqliteSyncStateRepository::try_new(conn)?;

        let mut report = PullReport {
            orphans_adopted: classes.adopt_orphans(owner)?,
            ..PullReport::default()
        };

        let remote_classes = self.remote.fetch_classes(owner)?;
        info!(
            "event=sync_pull module=sync status=start owner={owner} classes={} orphans_adopted={}",
            remote_classes.len(),
            report.orphans_adopted
        );

        for class in &remote_classes {
            // One atomic unit per class subtree. A failure here rolls back
            // only this subtree; earlier commits stay.
            let tx = conn.unchecked_transaction().map_err(|err| {
                SyncError::Repo(crate::repo::RepoError::from(err))
            })?;

            classes.upsert(class)?;
            report.classes_pulled += 1;

            for student in self.remote.fetch_students(class.id)? {
                students.upsert(&student)?;
                report.students_pulled += 1;
            }

            for record in self.remote.fetch_attendance(class.id)? {
                attendance.upsert(&record)?;
                report.attendance_pulled += 1;
            }

            tx.commit()
                .map_err(|err| SyncError::Repo(crate::repo::RepoError::from(err)))?;
        }

        sync_state.set_last_synced_at(now_ms())?;
        info!(
            "event=sync_pull module=sync status=ok classes={} students={} attendance={}",
            report.classes_pulled, report.students_pulled, report.attendance_pulled
        );
        Ok(report)
    }

    fn upsert_with_retry(&self, op: impl Fn() -> RemoteResult<()>) -> RemoteResult<()> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(()) => return Ok(()),
                // Conflicts are deterministic; retrying cannot help.
                Err(err @ RemoteError::UniqueViolation(_)) => return Err(err),
                Err(err @ RemoteError::Transport(_)) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(err);
                    }
                    std::thread::sleep(self.retry.backoff * attempt);
                    attempt += 1;
                }
            }
        }
    }
}
