//! Enrollment controller - seat and enrollment state for one course view
//!
//! A `CourseView` is a cloneable handle onto the cached state of a single
//! course detail view. The controller loads it, validates enroll/unenroll
//! requests against the cached state, performs the gateway mutation and
//! merges the result back. At most one mutation per view is in flight.
//!
//! The cache is advisory: the gateway decides, and the next authoritative
//! fetch overwrites whatever was patched locally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{Course, Enrollment, Identity, SeatInfo, UserEnrollmentSet};
use crate::ports::{CourseGateway, IdentitySession};

// =============================================================================
// View state
// =============================================================================

/// Lifecycle of a course view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "message", rename_all = "camelCase")]
pub enum ViewPhase {
    Unloaded,
    Loading,
    Loaded,
    LoadError(String),
    EnrollPending,
    UnenrollPending,
    EnrollError(String),
    UnenrollError(String),
}

impl ViewPhase {
    pub fn is_pending(&self) -> bool {
        matches!(self, ViewPhase::EnrollPending | ViewPhase::UnenrollPending)
    }
}

/// Which part of the context a load failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextPart {
    Course,
    Seats,
    EnrollmentStatus,
    UserEnrollments,
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
    pub part: ContextPart,
    pub message: String,
    pub not_found: bool,
}

/// Why the enroll control is disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisabledReason {
    InFlight,
    NotFound,
    Unauthenticated,
    SeatsExhausted,
    EnrollmentLimitReached,
}

impl DisabledReason {
    pub fn label(&self) -> &'static str {
        match self {
            DisabledReason::InFlight => "Working...",
            DisabledReason::NotFound => "Course Unavailable",
            DisabledReason::Unauthenticated => "Sign in to enroll",
            DisabledReason::SeatsExhausted => "No Seats Available",
            DisabledReason::EnrollmentLimitReached => "Enrollment Limit Reached",
        }
    }
}

/// What the enroll/unenroll control offers right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "camelCase")]
pub enum ControlState {
    Enroll,
    Unenroll,
    Disabled(DisabledReason),
}

/// Cached state of one course view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub course_id: String,
    pub phase: ViewPhase,
    pub course: Option<Course>,
    pub seat_info: Option<SeatInfo>,
    pub is_enrolled: bool,
    pub user_enrollments: UserEnrollmentSet,
    pub load_errors: Vec<LoadFailure>,
    /// Email of the user the user-scoped fields were loaded for
    pub viewer: Option<String>,
    /// Bumped whenever a mutation starts; fetches begun earlier are stale
    #[serde(skip)]
    mutations: u64,
}

impl ViewState {
    fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            phase: ViewPhase::Unloaded,
            course: None,
            seat_info: None,
            is_enrolled: false,
            user_enrollments: UserEnrollmentSet::new(),
            load_errors: Vec::new(),
            viewer: None,
            mutations: 0,
        }
    }

    /// True once a load found that the course id does not resolve
    pub fn is_not_found(&self) -> bool {
        self.load_errors
            .iter()
            .any(|f| f.part == ContextPart::Course && f.not_found)
    }

    /// Control state for `viewer`, decided from cached state only
    pub fn enroll_control(&self, viewer: Option<&Identity>) -> ControlState {
        if self.phase.is_pending() {
            return ControlState::Disabled(DisabledReason::InFlight);
        }
        if self.is_not_found() {
            return ControlState::Disabled(DisabledReason::NotFound);
        }
        if viewer.is_none() {
            return ControlState::Disabled(DisabledReason::Unauthenticated);
        }
        if self.is_enrolled {
            return ControlState::Unenroll;
        }
        if self.seat_info.is_some_and(|s| s.is_full) {
            return ControlState::Disabled(DisabledReason::SeatsExhausted);
        }
        if self.user_enrollments.is_at_limit() {
            return ControlState::Disabled(DisabledReason::EnrollmentLimitReached);
        }
        ControlState::Enroll
    }

    /// The first load error, as shown inline by the view
    pub fn load_error_message(&self) -> Option<&str> {
        match &self.phase {
            ViewPhase::LoadError(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}

/// Shared handle to a course view
///
/// Clones observe the same state. After `unmount` every late response is
/// discarded instead of being applied.
#[derive(Debug, Clone)]
pub struct CourseView {
    state: Arc<Mutex<ViewState>>,
    mounted: Arc<AtomicBool>,
}

impl CourseView {
    pub fn new(course_id: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState::new(course_id))),
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn course_id(&self) -> String {
        self.lock().course_id.clone()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ViewState {
        self.lock().clone()
    }

    pub fn phase(&self) -> ViewPhase {
        self.lock().phase.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Tear the view down; pending responses will be dropped
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Apply `f` if the view is still mounted; returns whether it ran
    fn update(&self, f: impl FnOnce(&mut ViewState)) -> bool {
        if !self.is_mounted() {
            debug!("view unmounted; discarding update");
            return false;
        }
        f(&mut self.lock());
        true
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn generation(&self) -> u64 {
        self.lock().mutations
    }

    /// Move into a pending phase unless a mutation is already running or
    /// `check` rejects the current state
    ///
    /// Both checks run under the same lock that flips the phase.
    fn begin_mutation(
        &self,
        pending: ViewPhase,
        check: impl FnOnce(&ViewState) -> Result<()>,
    ) -> Result<PendingMutation> {
        let mut state = self.lock();
        if state.phase.is_pending() {
            return Err(Error::MutationInFlight);
        }
        check(&state)?;
        state.phase = pending;
        state.mutations += 1;
        Ok(PendingMutation {
            view: self.clone(),
            settled: false,
        })
    }
}

/// Resets a pending phase if the mutation future is dropped before settling
struct PendingMutation {
    view: CourseView,
    settled: bool,
}

impl PendingMutation {
    fn settle(mut self, f: impl FnOnce(&mut ViewState)) -> bool {
        self.settled = true;
        let applied = self.view.update(f);
        if !applied {
            // Leave a torn-down view in a non-pending phase
            self.view.lock().phase = ViewPhase::Loaded;
        }
        applied
    }
}

impl Drop for PendingMutation {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = self.view.lock();
            if state.phase.is_pending() {
                state.phase = ViewPhase::Loaded;
            }
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Result of fetching the user-scoped half of the context
type UserScope = Option<Result<(Result<bool>, Result<Vec<Enrollment>>)>>;

/// The single implementation of the enrollment rules
pub struct EnrollmentController {
    gateway: Arc<dyn CourseGateway>,
    reconcile_after_write: bool,
}

impl EnrollmentController {
    pub fn new(gateway: Arc<dyn CourseGateway>, reconcile_after_write: bool) -> Self {
        Self {
            gateway,
            reconcile_after_write,
        }
    }

    /// Open and load a view for `course_id`
    pub async fn open(&self, course_id: &str, session: &dyn IdentitySession) -> CourseView {
        let view = CourseView::new(course_id);
        self.load_context(&view, session).await;
        view
    }

    /// Fetch course, seats and (when signed in) enrollment status and the
    /// caller's enrollment list, all at once
    ///
    /// Each fetch fails independently; whatever loaded is kept and the view
    /// moves to `LoadError` if anything failed.
    ///
    /// While a mutation is in flight nothing is fetched. A load overtaken by
    /// a mutation that started after it is discarded.
    pub async fn load_context(&self, view: &CourseView, session: &dyn IdentitySession) {
        let course_id = view.course_id();
        let user = session.current_user();
        let mut generation = None;
        view.update(|s| {
            if !s.phase.is_pending() {
                s.phase = ViewPhase::Loading;
                generation = Some(s.mutations);
            }
        });
        let Some(generation) = generation else {
            debug!(course_id = %course_id, "view pending or unmounted; load skipped");
            return;
        };

        let (course, seats, scope) = tokio::join!(
            self.gateway.get_course(&course_id),
            self.gateway.seat_info(&course_id),
            self.fetch_user_scope(&course_id, user.as_ref(), session),
        );

        let mut stale = false;
        view.update(|s| {
            if s.mutations != generation {
                stale = true;
                return;
            }
            s.load_errors.clear();
            match course {
                Ok(Some(course)) => s.course = Some(course),
                Ok(None) => {
                    s.course = None;
                    s.load_errors.push(LoadFailure {
                        part: ContextPart::Course,
                        message: "Course not found".to_string(),
                        not_found: true,
                    });
                }
                Err(e) => s.load_errors.push(failure(ContextPart::Course, &e)),
            }
            match seats {
                Ok(seats) => s.seat_info = Some(seats),
                Err(e) => s.load_errors.push(failure(ContextPart::Seats, &e)),
            }
            apply_user_scope(s, user.as_ref(), scope);

            s.phase = match s.load_errors.first() {
                None => ViewPhase::Loaded,
                Some(f) if f.not_found => ViewPhase::LoadError(f.message.clone()),
                Some(_) => ViewPhase::LoadError(
                    "Failed to fetch course details. Please try again later.".to_string(),
                ),
            };
        });

        if stale {
            debug!(course_id = %course_id, "load overtaken by a mutation; discarded");
            return;
        }
        let snapshot = view.snapshot();
        for f in &snapshot.load_errors {
            warn!(course_id = %course_id, part = ?f.part, error = %f.message, "course context fetch failed");
        }
    }

    async fn fetch_user_scope(
        &self,
        course_id: &str,
        user: Option<&Identity>,
        session: &dyn IdentitySession,
    ) -> UserScope {
        let user = user?;
        let token = match session.id_token().await {
            Ok(token) => token,
            Err(e) => return Some(Err(e)),
        };
        let (check, list) = tokio::join!(
            self.gateway.check_enrollment(&token, &user.email, course_id),
            self.gateway.user_enrollments(&token, &user.email),
        );
        Some(Ok((check, list)))
    }

    /// Enroll the signed-in user in the view's course
    ///
    /// Local checks, in order: signed in, no mutation in flight, seats left,
    /// fewer than three enrollments, not already enrolled. A failed check
    /// issues no request. The seat, cap and membership rules are judged
    /// again when the view enters the pending phase, after the token fetch.
    pub async fn enroll(&self, view: &CourseView, session: &dyn IdentitySession) -> Result<()> {
        let user = session.current_user().ok_or_else(|| {
            info!(course_id = %view.course_id(), "enroll rejected: not signed in");
            Error::Unauthenticated
        })?;
        if view.phase().is_pending() {
            return Err(Error::MutationInFlight);
        }
        self.prepare(view, &user, session).await;

        let course_id = view.course_id();
        let state = view.snapshot();
        if let Err(e) = check_enroll_preconditions(&state) {
            info!(course_id = %course_id, reason = %e, "enroll rejected locally");
            return Err(e);
        }

        let token = session.id_token().await?;
        let pending = view.begin_mutation(ViewPhase::EnrollPending, |s| {
            check_enroll_preconditions(s).inspect_err(
                |e| info!(course_id = %course_id, reason = %e, "enroll rejected locally"),
            )
        })?;

        match self
            .gateway
            .create_enrollment(&token, &course_id, Utc::now())
            .await
        {
            Ok(receipt) => {
                info!(course_id = %course_id, "enrolled");
                let applied = pending.settle(|s| {
                    s.user_enrollments.insert(Enrollment::new(&course_id, &user.email));
                    if let Some(seats) = s.seat_info.as_mut() {
                        match receipt.available_seats {
                            Some(n) => seats.apply_available(n),
                            None => seats.reserve(),
                        }
                    }
                    if let Some(course) = s.course.as_mut() {
                        course.enrollments += 1;
                    }
                    s.is_enrolled = true;
                    s.phase = ViewPhase::Loaded;
                });
                if applied && self.reconcile_after_write {
                    self.reconcile(view, session).await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(course_id = %course_id, error = %e, "enroll failed");
                let message = e.to_string();
                pending.settle(|s| s.phase = ViewPhase::EnrollError(message));
                self.refresh_seats(view).await;
                Err(e)
            }
        }
    }

    /// Remove the signed-in user's enrollment in the view's course
    pub async fn unenroll(&self, view: &CourseView, session: &dyn IdentitySession) -> Result<()> {
        let user = session.current_user().ok_or_else(|| {
            info!(course_id = %view.course_id(), "unenroll rejected: not signed in");
            Error::Unauthenticated
        })?;
        if view.phase().is_pending() {
            return Err(Error::MutationInFlight);
        }

        let course_id = view.course_id();
        let token = session.id_token().await?;
        let pending = view.begin_mutation(ViewPhase::UnenrollPending, |_| Ok(()))?;

        match self
            .gateway
            .delete_enrollment(&token, &course_id, &user.email)
            .await
        {
            Ok(()) => {
                info!(course_id = %course_id, "unenrolled");
                let applied = pending.settle(|s| {
                    let was_member = s.user_enrollments.remove(&course_id);
                    if let Some(seats) = s.seat_info.as_mut() {
                        seats.release();
                    }
                    if let Some(course) = s.course.as_mut() {
                        if was_member || s.is_enrolled {
                            course.enrollments = course.enrollments.saturating_sub(1);
                        }
                    }
                    s.is_enrolled = false;
                    s.phase = ViewPhase::Loaded;
                });
                if applied && self.reconcile_after_write {
                    self.reconcile(view, session).await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(course_id = %course_id, error = %e, "unenroll failed");
                let message = e.to_string();
                pending.settle(|s| s.phase = ViewPhase::UnenrollError(message));
                Err(e)
            }
        }
    }

    /// Re-fetch seats and the user-scoped fields and overwrite the cache
    ///
    /// Failures are logged and leave the cached values in place. Results
    /// are dropped when a mutation started while they were being fetched.
    pub async fn reconcile(&self, view: &CourseView, session: &dyn IdentitySession) {
        let course_id = view.course_id();
        let user = session.current_user();
        let generation = view.generation();
        let (seats, scope) = tokio::join!(
            self.gateway.seat_info(&course_id),
            self.fetch_user_scope(&course_id, user.as_ref(), session),
        );

        view.update(|s| {
            if s.mutations != generation {
                debug!(course_id = %course_id, "reconciliation overtaken by a mutation; discarded");
                return;
            }
            match seats {
                Ok(seats) => s.seat_info = Some(seats),
                Err(e) => warn!(course_id = %course_id, error = %e, "seat reconciliation failed"),
            }
            match scope {
                Some(Ok((check, list))) => {
                    match check {
                        Ok(enrolled) => s.is_enrolled = enrolled,
                        Err(e) => warn!(course_id = %course_id, error = %e, "enrollment check reconciliation failed"),
                    }
                    match list {
                        Ok(list) => s.user_enrollments = UserEnrollmentSet::from_enrollments(list),
                        Err(e) => warn!(course_id = %course_id, error = %e, "enrollment list reconciliation failed"),
                    }
                    s.viewer = user.as_ref().map(|u| u.email.clone());
                }
                Some(Err(e)) => warn!(course_id = %course_id, error = %e, "session token unavailable"),
                None => {}
            }
        });
    }

    /// Best-effort seat refresh after a rejected write
    async fn refresh_seats(&self, view: &CourseView) {
        let course_id = view.course_id();
        match self.gateway.seat_info(&course_id).await {
            Ok(seats) => {
                view.update(|s| s.seat_info = Some(seats));
            }
            Err(e) => debug!(course_id = %course_id, error = %e, "seat refresh failed"),
        }
    }

    /// Make sure the cache belongs to `user` before judging a request
    async fn prepare(&self, view: &CourseView, user: &Identity, session: &dyn IdentitySession) {
        let state = view.snapshot();
        if state.phase == ViewPhase::Unloaded {
            self.load_context(view, session).await;
        } else if state.viewer.as_deref() != Some(user.email.as_str()) {
            debug!(course_id = %state.course_id, "viewer changed; refreshing enrollment cache");
            self.reconcile(view, session).await;
        }
    }
}

fn failure(part: ContextPart, error: &Error) -> LoadFailure {
    LoadFailure {
        part,
        message: error.to_string(),
        not_found: matches!(error, Error::NotFound(_)),
    }
}

fn apply_user_scope(s: &mut ViewState, user: Option<&Identity>, scope: UserScope) {
    match scope {
        None => {
            s.is_enrolled = false;
            s.user_enrollments = UserEnrollmentSet::new();
            s.viewer = None;
        }
        Some(Err(e)) => {
            s.is_enrolled = false;
            s.user_enrollments = UserEnrollmentSet::new();
            s.viewer = None;
            s.load_errors.push(failure(ContextPart::Session, &e));
        }
        Some(Ok((check, list))) => {
            match check {
                Ok(enrolled) => s.is_enrolled = enrolled,
                Err(e) => {
                    s.is_enrolled = false;
                    s.load_errors.push(failure(ContextPart::EnrollmentStatus, &e));
                }
            }
            match list {
                Ok(list) => s.user_enrollments = UserEnrollmentSet::from_enrollments(list),
                Err(e) => {
                    s.user_enrollments = UserEnrollmentSet::new();
                    s.load_errors.push(failure(ContextPart::UserEnrollments, &e));
                }
            }
            s.viewer = user.map(|u| u.email.clone());
        }
    }
}

/// Seat, cap and membership rules, in the order they are reported
fn check_enroll_preconditions(state: &ViewState) -> Result<()> {
    if state.is_not_found() {
        return Err(Error::not_found(format!("course {}", state.course_id)));
    }
    if state.seat_info.is_some_and(|s| s.is_full) {
        return Err(Error::SeatsExhausted);
    }
    if state.user_enrollments.is_at_limit() {
        return Err(Error::EnrollmentLimitReached);
    }
    if state.is_enrolled || state.user_enrollments.contains(&state.course_id) {
        return Err(Error::AlreadyEnrolled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_state(available: u32, enrollments: &[&str]) -> ViewState {
        let mut state = ViewState::new("c1");
        state.phase = ViewPhase::Loaded;
        state.seat_info = Some(SeatInfo::new(10, available));
        state.user_enrollments = UserEnrollmentSet::from_enrollments(
            enrollments
                .iter()
                .map(|id| Enrollment::new(*id, "u@example.com"))
                .collect(),
        );
        state
    }

    fn user() -> Identity {
        Identity::new("u", "u@example.com")
    }

    #[test]
    fn test_control_enroll_when_everything_allows() {
        let state = loaded_state(3, &[]);
        assert_eq!(state.enroll_control(Some(&user())), ControlState::Enroll);
    }

    #[test]
    fn test_control_disabled_without_identity() {
        let state = loaded_state(3, &[]);
        assert_eq!(
            state.enroll_control(None),
            ControlState::Disabled(DisabledReason::Unauthenticated)
        );
    }

    #[test]
    fn test_control_disabled_at_limit_unless_enrolled() {
        let mut state = loaded_state(3, &["a", "b", "c"]);
        assert_eq!(
            state.enroll_control(Some(&user())),
            ControlState::Disabled(DisabledReason::EnrollmentLimitReached)
        );

        state.is_enrolled = true;
        assert_eq!(state.enroll_control(Some(&user())), ControlState::Unenroll);
    }

    #[test]
    fn test_control_disabled_when_full_or_pending() {
        let mut state = loaded_state(0, &[]);
        assert_eq!(
            state.enroll_control(Some(&user())),
            ControlState::Disabled(DisabledReason::SeatsExhausted)
        );

        state.phase = ViewPhase::UnenrollPending;
        assert_eq!(
            state.enroll_control(Some(&user())),
            ControlState::Disabled(DisabledReason::InFlight)
        );
    }

    #[test]
    fn test_precondition_order() {
        // Full and at the limit: seats are reported first
        let state = loaded_state(0, &["a", "b", "c"]);
        assert!(matches!(check_enroll_preconditions(&state), Err(Error::SeatsExhausted)));

        let state = loaded_state(2, &["a", "b", "c"]);
        assert!(matches!(
            check_enroll_preconditions(&state),
            Err(Error::EnrollmentLimitReached)
        ));

        let state = loaded_state(2, &["c1"]);
        assert!(matches!(check_enroll_preconditions(&state), Err(Error::AlreadyEnrolled)));

        let state = loaded_state(2, &["a"]);
        assert!(check_enroll_preconditions(&state).is_ok());
    }

    #[test]
    fn test_begin_mutation_is_exclusive_and_dropping_resets() {
        let view = CourseView::new("c1");
        let pending = view.begin_mutation(ViewPhase::EnrollPending, |_| Ok(())).unwrap();
        assert!(matches!(
            view.begin_mutation(ViewPhase::UnenrollPending, |_| Ok(())),
            Err(Error::MutationInFlight)
        ));

        drop(pending);
        assert_eq!(view.phase(), ViewPhase::Loaded);
        assert!(view.begin_mutation(ViewPhase::UnenrollPending, |_| Ok(())).is_ok());
    }

    #[test]
    fn test_begin_mutation_rejected_by_check_stays_put() {
        let view = CourseView::new("c1");
        view.update(|s| {
            s.phase = ViewPhase::Loaded;
            s.is_enrolled = true;
        });
        assert!(matches!(
            view.begin_mutation(ViewPhase::EnrollPending, check_enroll_preconditions),
            Err(Error::AlreadyEnrolled)
        ));
        assert_eq!(view.phase(), ViewPhase::Loaded);
        assert_eq!(view.generation(), 0);
    }

    #[test]
    fn test_control_disabled_when_course_missing() {
        let mut state = loaded_state(3, &[]);
        state.load_errors.push(LoadFailure {
            part: ContextPart::Course,
            message: "Course not found".to_string(),
            not_found: true,
        });
        assert_eq!(
            state.enroll_control(Some(&user())),
            ControlState::Disabled(DisabledReason::NotFound)
        );
        assert_eq!(
            state.enroll_control(None),
            ControlState::Disabled(DisabledReason::NotFound)
        );
    }

    #[test]
    fn test_unmounted_view_discards_updates() {
        let view = CourseView::new("c1");
        view.unmount();
        assert!(!view.update(|s| s.is_enrolled = true));
        assert!(!view.snapshot().is_enrolled);
    }
}
