//! Tracker: the explicit `NotTracking -> Tracking -> (applied | cleared)` state machine.
//!
//! Hosts drive a tracker from UI callbacks. Editing calls outside `Tracking` fail with
//! [`RedirectError::NotTracking`]. A hierarchy-changed notification marks the session
//! dirty; fix-target and auto-match calls poll first so they never decide on stale
//! paths, and apply always reconciles on its own.

use log::{debug, info};

use crate::apply::ApplyReport;
use crate::auto_match::AutoMatchReport;
use crate::config::Config;
use crate::curve::{ClipScope, CurveStore};
use crate::error::RedirectError;
use crate::ids::{EntryId, NodeHandle};
use crate::reconcile::ReconcileReport;
use crate::scene::SceneTree;
use crate::session::Session;

#[derive(Debug, Default)]
pub enum TrackingState {
    #[default]
    NotTracking,
    Tracking(Box<Session>),
}

/// Owns at most one session (one tracked root) at a time.
#[derive(Debug, Default)]
pub struct Tracker {
    cfg: Config,
    state: TrackingState,
    hierarchy_dirty: bool,
}

impl Tracker {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            state: TrackingState::NotTracking,
            hierarchy_dirty: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackingState::Tracking(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            TrackingState::Tracking(session) => Some(&**session),
            TrackingState::NotTracking => None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session, RedirectError> {
        match &mut self.state {
            TrackingState::Tracking(session) => Ok(&mut **session),
            TrackingState::NotTracking => Err(RedirectError::NotTracking),
        }
    }

    /// Snapshot `scope` under `root`. An empty scope leaves the tracker idle.
    pub fn start_tracking<T, S>(
        &mut self,
        tree: &T,
        store: &S,
        root: NodeHandle,
        scope: ClipScope,
    ) -> Result<&Session, RedirectError>
    where
        T: SceneTree + ?Sized,
        S: CurveStore + ?Sized,
    {
        if self.is_tracking() {
            return Err(RedirectError::AlreadyTracking);
        }
        let session = Session::start(tree, store, root, scope, self.cfg.clone())?;
        self.hierarchy_dirty = false;
        self.state = TrackingState::Tracking(Box::new(session));
        self.session().ok_or(RedirectError::NotTracking)
    }

    /// Record that the host hierarchy changed; the next `poll` reconciles.
    pub fn notify_hierarchy_changed(&mut self) {
        if self.is_tracking() {
            self.hierarchy_dirty = true;
        }
    }

    /// Reconcile when a hierarchy change is pending; `None` when nothing was pending.
    pub fn poll<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
    ) -> Result<Option<ReconcileReport>, RedirectError> {
        let dirty = self.hierarchy_dirty;
        let session = self.session_mut()?;
        if !dirty {
            return Ok(None);
        }
        let report = session.reconcile(tree);
        self.hierarchy_dirty = false;
        Ok(Some(report))
    }

    /// Unconditional reconciliation pass.
    pub fn reconcile<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
    ) -> Result<ReconcileReport, RedirectError> {
        let report = self.session_mut()?.reconcile(tree);
        self.hierarchy_dirty = false;
        Ok(report)
    }

    pub fn assign_fix_target<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
        original_path: &str,
        candidate: Option<NodeHandle>,
    ) -> Result<(), RedirectError> {
        self.poll(tree)?;
        self.session_mut()?
            .assign_fix_target(tree, original_path, candidate)
    }

    pub fn mark_for_removal<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
        entries: &[EntryId],
        marked: bool,
    ) -> Result<usize, RedirectError> {
        self.session_mut()?.mark_for_removal(tree, entries, marked)
    }

    pub fn set_ignore_unresolved_missing(&mut self, ignore: bool) -> Result<(), RedirectError> {
        self.session_mut()?.set_ignore_unresolved_missing(ignore);
        Ok(())
    }

    pub fn auto_match<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
    ) -> Result<AutoMatchReport, RedirectError> {
        self.poll(tree)?;
        let report = self.session_mut()?.auto_match(tree);
        debug!("auto-match: {report:?}");
        Ok(report)
    }

    /// Rewrite the clips and return to `NotTracking`, whatever the outcome.
    pub fn apply<T, S>(&mut self, tree: &T, store: &mut S) -> Result<ApplyReport, RedirectError>
    where
        T: SceneTree + ?Sized,
        S: CurveStore + ?Sized,
    {
        let TrackingState::Tracking(session) = std::mem::take(&mut self.state) else {
            return Err(RedirectError::NotTracking);
        };
        self.hierarchy_dirty = false;
        (*session).apply(tree, store)
    }

    /// Discard the session without writing anything.
    pub fn clear_tracking(&mut self) {
        if let TrackingState::Tracking(session) = std::mem::take(&mut self.state) {
            info!(
                "tracking cleared without applying ({} path group(s), {} missing group(s))",
                session.path_change_groups.len(),
                session.missing_groups.len()
            );
        }
        self.hierarchy_dirty = false;
    }
}
