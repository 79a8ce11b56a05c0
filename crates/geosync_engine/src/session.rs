//! The offline editing session facade.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::{info, warn};

use geosync_model::{AttributeValue, Point};
use geosync_service::{FeatureEditResult, FeatureService, SyncParameters};
use geosync_store::{LoadStatus, Replica};

use crate::config::SessionConfig;
use crate::edit::EditController;
use crate::error::{EngineError, EngineResult, ErrorKind};
use crate::events::{SessionEvent, SessionEventFeed};
use crate::generate::{self, GenerateOptions};
use crate::job::{JobContext, JobHandle, JobKind};
use crate::state::{EditAction, EditState, EditStateMachine};
use crate::sync;

/// One client's offline replica lifecycle: generate, edit, sync.
///
/// The session owns the edit state machine, the attached replica and
/// the event feed. It hands out [`JobHandle`]s for the two background
/// jobs and applies their outcomes to its own state before a handle's
/// done listeners fire, so an observer never sees a finished job with
/// a stale session. At most one job runs at a time; starting a second
/// is rejected with [`EngineError::JobActive`].
pub struct OfflineSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    service: Arc<dyn FeatureService>,
    config: SessionConfig,
    events: SessionEventFeed,
    job_active: AtomicBool,
    editing: Mutex<EditingState>,
}

/// State guarded by one lock; the machine and the attachment move
/// together.
struct EditingState {
    machine: EditStateMachine,
    replica: Option<Arc<Replica>>,
    controller: Option<EditController>,
}

impl SessionInner {
    fn emit_state_change(&self, from: EditState, to: EditState) {
        info!(?from, ?to, "edit state changed");
        self.events.emit(SessionEvent::StateChanged { from, to });
    }

    fn release_job(&self) {
        self.job_active.store(false, Ordering::Release);
    }
}

impl OfflineSession {
    /// Creates a session over a feature service.
    #[must_use]
    pub fn new(service: Arc<dyn FeatureService>, config: SessionConfig) -> Self {
        let events = SessionEventFeed::new(config.event_history);
        Self {
            inner: Arc::new(SessionInner {
                service,
                config,
                events,
                job_active: AtomicBool::new(false),
                editing: Mutex::new(EditingState {
                    machine: EditStateMachine::new(),
                    replica: None,
                    controller: None,
                }),
            }),
        }
    }

    /// Current edit state.
    #[must_use]
    pub fn edit_state(&self) -> EditState {
        self.inner.editing.lock().machine.state()
    }

    /// The attached replica, once a generate has succeeded.
    #[must_use]
    pub fn replica(&self) -> Option<Arc<Replica>> {
        self.inner.editing.lock().replica.clone()
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Events emitted so far, oldest first, within the history bound.
    #[must_use]
    pub fn event_history(&self) -> Vec<SessionEvent> {
        self.inner.events.history()
    }

    /// True when any replicated layer has a pending local edit.
    #[must_use]
    pub fn has_local_edits(&self) -> bool {
        self.inner
            .editing
            .lock()
            .replica
            .as_ref()
            .is_some_and(|replica| replica.store().has_local_edits())
    }

    /// Number of currently selected features.
    #[must_use]
    pub fn selection_len(&self) -> usize {
        self.inner
            .editing
            .lock()
            .controller
            .as_ref()
            .map_or(0, |controller| controller.selection().len())
    }

    /// Default sync parameters derived from the attached replica:
    /// bidirectional, independent edits, one layer option per
    /// replicated layer in layer order. `None` until a replica is
    /// attached.
    #[must_use]
    pub fn default_sync_parameters(&self) -> Option<SyncParameters> {
        let editing = self.inner.editing.lock();
        let replica = editing.replica.as_ref()?;
        Some(SyncParameters::for_layers(
            replica.layer_ids().iter().copied(),
        ))
    }

    /// Starts a replica generation job.
    ///
    /// On success the session attaches the loaded replica and moves to
    /// `ReadyToSync` before the handle reports done. A replica that
    /// fails to load is not attached: the job itself still succeeds,
    /// a `LoadFailed` error event is emitted and the state stays
    /// `NoLocalReplica`.
    ///
    /// # Errors
    ///
    /// `JobActive` while another job runs, `InvalidStateTransition`
    /// outside `NoLocalReplica`.
    pub fn generate(&self, options: GenerateOptions) -> EngineResult<JobHandle<Arc<Replica>>> {
        drop(self.claim_job(EditAction::Generate)?);
        let inner = Arc::clone(&self.inner);
        let handle = JobHandle::new(move |context: &JobContext| {
            let result = generate::run(&inner.service, &inner.config, &options, context);
            finish_generate(&inner, result)
        });
        self.wire_progress(&handle, JobKind::Generate);
        handle.start();
        Ok(handle)
    }

    /// Starts a sync job over the attached replica.
    ///
    /// Edits made while the job runs stay pending for the next pass.
    /// The sync result and any per-feature rejections are emitted as
    /// events before the handle reports done. The session state does
    /// not change in either direction.
    ///
    /// # Errors
    ///
    /// `JobActive` while another job runs, `InvalidStateTransition`
    /// outside `ReadyToSync`.
    pub fn synchronize(
        &self,
        params: SyncParameters,
    ) -> EngineResult<JobHandle<Vec<FeatureEditResult>>> {
        let replica = {
            // the gate check and the replica capture stay in one
            // critical section; a select cannot move the machine in
            // between
            let editing = self.claim_job(EditAction::Sync)?;
            match editing.replica.clone() {
                Some(replica) => replica,
                // the machine said ReadyToSync, so something must be attached
                None => {
                    let from = editing.machine.state();
                    drop(editing);
                    self.inner.release_job();
                    return Err(EngineError::InvalidStateTransition {
                        from,
                        action: EditAction::Sync,
                    });
                }
            }
        };
        let inner = Arc::clone(&self.inner);
        let handle = JobHandle::new(move |context: &JobContext| {
            let result = sync::run(
                &inner.service,
                &replica,
                &params,
                inner.config.page_size,
                context,
            );
            finish_sync(&inner, result)
        });
        self.wire_progress(&handle, JobKind::Sync);
        handle.start();
        Ok(handle)
    }

    /// Selects movable features near `point`.
    ///
    /// With at least one match the session moves to `IsEditing`; with
    /// none, the state and any prior selection stay unchanged. Returns
    /// the number of features selected.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` outside `ReadyToSync`.
    pub fn select_near(&self, point: Point, tolerance: f64) -> EngineResult<usize> {
        let mut editing = self.inner.editing.lock();
        editing.machine.check(EditAction::Select)?;
        let Some(controller) = editing.controller.as_mut() else {
            return Err(EngineError::InvalidStateTransition {
                from: editing.machine.state(),
                action: EditAction::Select,
            });
        };
        let selected = controller.select_near(point, tolerance)?;
        if selected > 0 {
            let from = editing.machine.set_state(EditState::IsEditing);
            drop(editing);
            self.inner.emit_state_change(from, EditState::IsEditing);
        }
        Ok(selected)
    }

    /// Commits a move of the selection to `point`.
    ///
    /// Marks every moved feature pending and returns to `ReadyToSync`.
    /// Returns the number of features moved.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` outside `IsEditing`.
    pub fn move_selection_to(&self, point: Point) -> EngineResult<usize> {
        self.commit_edit(EditAction::Move, |controller| {
            controller.move_selection_to(point)
        })
    }

    /// Commits an attribute update of the selection.
    ///
    /// Sets `name` to `value` on every selected feature, marks them
    /// pending and returns to `ReadyToSync`. Returns the number of
    /// features updated.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` outside `IsEditing`.
    pub fn update_selection_attribute(
        &self,
        name: &str,
        value: AttributeValue,
    ) -> EngineResult<usize> {
        self.commit_edit(EditAction::UpdateAttribute, |controller| {
            controller.update_selection_attribute(name, value)
        })
    }

    fn commit_edit<F>(&self, action: EditAction, apply: F) -> EngineResult<usize>
    where
        F: FnOnce(&mut EditController) -> EngineResult<usize>,
    {
        let mut editing = self.inner.editing.lock();
        editing.machine.check(action)?;
        let Some(controller) = editing.controller.as_mut() else {
            return Err(EngineError::InvalidStateTransition {
                from: editing.machine.state(),
                action,
            });
        };
        let count = apply(controller)?;
        let from = editing.machine.set_state(EditState::ReadyToSync);
        drop(editing);
        self.inner.emit_state_change(from, EditState::ReadyToSync);
        Ok(count)
    }

    /// Claims the single job slot, then checks the state gate.
    ///
    /// Returns the editing guard so the caller can capture whatever
    /// else it needs while the gate still holds.
    fn claim_job(&self, action: EditAction) -> EngineResult<MutexGuard<'_, EditingState>> {
        if self
            .inner
            .job_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::JobActive);
        }
        let editing = self.inner.editing.lock();
        if let Err(err) = editing.machine.check(action) {
            drop(editing);
            self.inner.release_job();
            return Err(err);
        }
        Ok(editing)
    }

    fn wire_progress<T: Clone + Send + 'static>(&self, handle: &JobHandle<T>, job: JobKind) {
        let inner = Arc::clone(&self.inner);
        handle.on_progress(move |percent| {
            inner.events.emit(SessionEvent::Progress { job, percent });
        });
    }
}

impl std::fmt::Debug for OfflineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineSession")
            .field("state", &self.edit_state())
            .field("job_active", &self.inner.job_active.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

/// Applies a finished generate to the session, inside the job's work
/// so the state and events land before done listeners fire.
fn finish_generate(
    inner: &Arc<SessionInner>,
    result: EngineResult<Arc<Replica>>,
) -> EngineResult<Arc<Replica>> {
    match &result {
        Ok(replica) if replica.status() == LoadStatus::Loaded => {
            let from = {
                let mut editing = inner.editing.lock();
                editing.replica = Some(Arc::clone(replica));
                editing.controller = Some(EditController::new(
                    Arc::clone(replica.store()),
                    replica.layer_ids().to_vec(),
                ));
                editing.machine.set_state(EditState::ReadyToSync)
            };
            inner.emit_state_change(from, EditState::ReadyToSync);
        }
        Ok(replica) => {
            let description = replica
                .load_error()
                .unwrap_or_else(|| "replica did not reach loaded status".to_string());
            warn!(replica = %replica.id(), error = %description, "generated replica not attached");
            inner.events.emit(SessionEvent::Error {
                kind: ErrorKind::LoadFailed,
                message: description,
            });
        }
        Err(err) => {
            inner.events.emit(SessionEvent::Error {
                kind: err.kind(),
                message: err.to_string(),
            });
        }
    }
    inner.release_job();
    result
}

/// Applies a finished sync to the session; see [`finish_generate`].
fn finish_sync(
    inner: &Arc<SessionInner>,
    result: EngineResult<Vec<FeatureEditResult>>,
) -> EngineResult<Vec<FeatureEditResult>> {
    match &result {
        Ok(results) => {
            for failed in results.iter().filter(|entry| !entry.is_success()) {
                let description = failed
                    .error
                    .as_ref()
                    .map_or_else(|| "edit rejected".to_string(), ToString::to_string);
                inner.events.emit(SessionEvent::Error {
                    kind: ErrorKind::FeatureEditFailed,
                    message: format!(
                        "{} {}: {description}",
                        failed.layer_id, failed.feature_id
                    ),
                });
            }
            inner.events.emit(SessionEvent::SyncResult {
                results: results.clone(),
            });
        }
        Err(err) => {
            inner.events.emit(SessionEvent::Error {
                kind: err.kind(),
                message: err.to_string(),
            });
        }
    }
    inner.release_job();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosync_model::{Envelope, Feature, FeatureId, GeometryKind, LayerId, LayerInfo, ReplicaId};
    use geosync_service::MemoryFeatureService;
    use geosync_store::{MemoryBackend, ReplicaBackend, ReplicaManifest};

    const HYDRANTS: LayerId = LayerId::new(0);

    fn seeded_service() -> Arc<MemoryFeatureService> {
        let service = MemoryFeatureService::new();
        service.add_layer(LayerInfo::new(HYDRANTS, "hydrants", GeometryKind::Point));
        for id in 0..3u64 {
            service
                .seed(
                    HYDRANTS,
                    Feature::new(FeatureId::new(id), Point::new(id as f64 * 10.0, 0.0)),
                )
                .unwrap();
        }
        Arc::new(service)
    }

    fn wide_extent() -> Envelope {
        Envelope::new(-100.0, -100.0, 100.0, 100.0)
    }

    #[test]
    fn fresh_session_only_permits_generate() {
        let session = OfflineSession::new(seeded_service(), SessionConfig::new());
        assert_eq!(session.edit_state(), EditState::NoLocalReplica);
        assert!(session.replica().is_none());
        assert!(session.default_sync_parameters().is_none());
        assert!(!session.has_local_edits());
        assert_eq!(session.selection_len(), 0);

        assert!(matches!(
            session.select_near(Point::new(0.0, 0.0), 1.0),
            Err(EngineError::InvalidStateTransition {
                action: EditAction::Select,
                ..
            })
        ));
        assert!(matches!(
            session.synchronize(SyncParameters::new()),
            Err(EngineError::InvalidStateTransition {
                action: EditAction::Sync,
                ..
            })
        ));
        assert!(matches!(
            session.move_selection_to(Point::new(0.0, 0.0)),
            Err(EngineError::InvalidStateTransition {
                action: EditAction::Move,
                ..
            })
        ));
    }

    #[test]
    fn generate_attaches_replica_and_reaches_ready() {
        let session = OfflineSession::new(seeded_service(), SessionConfig::new());
        let handle = session.generate(GenerateOptions::new(wide_extent())).unwrap();
        handle.join();

        let replica = handle.result().unwrap();
        assert_eq!(replica.status(), LoadStatus::Loaded);
        assert_eq!(session.edit_state(), EditState::ReadyToSync);
        assert_eq!(replica.store().feature_count(HYDRANTS).unwrap(), 3);
        assert_eq!(
            session.default_sync_parameters().unwrap().layer_ids(),
            vec![HYDRANTS]
        );

        let history = session.event_history();
        assert_eq!(
            history.last(),
            Some(&SessionEvent::StateChanged {
                from: EditState::NoLocalReplica,
                to: EditState::ReadyToSync,
            })
        );

        // a second generate is now a state violation, not a queue
        assert!(matches!(
            session.generate(GenerateOptions::new(wide_extent())),
            Err(EngineError::InvalidStateTransition {
                action: EditAction::Generate,
                ..
            })
        ));
    }

    #[test]
    fn load_failure_keeps_session_detached() {
        // a manifest naming a layer with no table makes load() fail
        let backend: Arc<dyn ReplicaBackend> = Arc::new(MemoryBackend::new());
        let mut manifest = ReplicaManifest::new(ReplicaId::new(), wide_extent());
        manifest.add_layer(HYDRANTS, 0);
        backend.write_manifest(&manifest).unwrap();
        let replica = Replica::open(backend).unwrap();
        assert!(replica.load().is_err());

        let session = OfflineSession::new(seeded_service(), SessionConfig::new());
        let result = finish_generate(&session.inner, Ok(Arc::new(replica)));

        assert!(result.is_ok());
        assert_eq!(session.edit_state(), EditState::NoLocalReplica);
        assert!(session.replica().is_none());
        assert!(session
            .event_history()
            .iter()
            .any(|event| matches!(
                event,
                SessionEvent::Error {
                    kind: ErrorKind::LoadFailed,
                    ..
                }
            )));
    }
}
