//! Integration tests for the offline session lifecycle.

use std::fs;
use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;

use geosync_engine::{
    EditState, EngineError, ErrorKind, GenerateOptions, JobKind, JobStatus, OfflineSession,
    SessionConfig, SessionEvent,
};
use geosync_model::{
    AttributeValue, Envelope, Feature, FeatureId, GeometryKind, LayerId, LayerInfo, Point,
};
use geosync_service::{
    ChangePage, FeaturePage, FeatureService, GenerateParameters, MemoryFeatureService,
    ServiceResult, SyncDirection,
};
use geosync_store::{DirtyState, FileBackend, LoadStatus, Replica, ReplicaBackend};

const HYDRANTS: LayerId = LayerId::new(0);

/// Four hydrants on the x axis, each carrying a damage attribute.
fn damage_service() -> Arc<MemoryFeatureService> {
    let service = MemoryFeatureService::new();
    service.add_layer(LayerInfo::new(HYDRANTS, "hydrants", GeometryKind::Point));
    for id in 0..4u64 {
        let mut feature = Feature::new(FeatureId::new(id), Point::new(id as f64 * 10.0, 0.0));
        feature.set_attribute("typdamage", "none");
        service.seed(HYDRANTS, feature).unwrap();
    }
    Arc::new(service)
}

fn wide() -> Envelope {
    Envelope::new(-1000.0, -1000.0, 1000.0, 1000.0)
}

/// Generates a replica over the whole service and waits for it.
fn ready_session(service: Arc<MemoryFeatureService>) -> OfflineSession {
    let session = OfflineSession::new(service, SessionConfig::new());
    let handle = session.generate(GenerateOptions::new(wide())).unwrap();
    handle.join();
    assert_eq!(handle.status(), JobStatus::Succeeded);
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
    session
}

/// Moves one feature near `near` to `to` through the selection flow.
fn move_feature(session: &OfflineSession, near: Point, to: Point) {
    assert_eq!(session.select_near(near, 1.0).unwrap(), 1);
    assert_eq!(session.edit_state(), EditState::IsEditing);
    assert_eq!(session.move_selection_to(to).unwrap(), 1);
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
}

/// Blocks the first call of a gated method until the test releases it.
struct Gate {
    entered: mpsc::Sender<()>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl Gate {
    fn new() -> (Self, GateKeys) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        (
            Self {
                entered: entered_tx,
                release: Mutex::new(Some(release_rx)),
            },
            GateKeys {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }

    fn pass(&self) {
        let held = self.release.lock().take();
        if let Some(release) = held {
            let _ = self.entered.send(());
            let _ = release.recv();
        }
    }
}

/// The test's side of a [`Gate`].
struct GateKeys {
    entered: mpsc::Receiver<()>,
    release: mpsc::Sender<()>,
}

impl GateKeys {
    /// Waits until the job is inside the gated call.
    fn wait_entered(&self) {
        self.entered.recv().unwrap();
    }

    fn release(&self) {
        self.release.send(()).unwrap();
    }
}

/// A service wrapper that can hold one extract or one edit upload open
/// while the test observes the session mid-job.
struct GatedService {
    inner: Arc<MemoryFeatureService>,
    extract_gate: Option<Gate>,
    apply_gate: Option<Gate>,
}

impl GatedService {
    fn new(inner: Arc<MemoryFeatureService>) -> Self {
        Self {
            inner,
            extract_gate: None,
            apply_gate: None,
        }
    }

    fn gate_extract(mut self) -> (Self, GateKeys) {
        let (gate, keys) = Gate::new();
        self.extract_gate = Some(gate);
        (self, keys)
    }

    fn gate_apply(mut self) -> (Self, GateKeys) {
        let (gate, keys) = Gate::new();
        self.apply_gate = Some(gate);
        (self, keys)
    }
}

impl FeatureService for GatedService {
    fn layers(&self) -> ServiceResult<Vec<LayerInfo>> {
        self.inner.layers()
    }

    fn default_generate_parameters(&self, extent: Envelope) -> ServiceResult<GenerateParameters> {
        self.inner.default_generate_parameters(extent)
    }

    fn extract(
        &self,
        layer_id: LayerId,
        extent: &Envelope,
        cursor: u64,
        limit: u32,
    ) -> ServiceResult<FeaturePage> {
        if let Some(gate) = &self.extract_gate {
            gate.pass();
        }
        self.inner.extract(layer_id, extent, cursor, limit)
    }

    fn apply_edits(
        &self,
        layer_id: LayerId,
        edits: &[Feature],
        rollback_on_failure: bool,
    ) -> ServiceResult<Vec<geosync_service::FeatureEditResult>> {
        if let Some(gate) = &self.apply_gate {
            gate.pass();
        }
        self.inner.apply_edits(layer_id, edits, rollback_on_failure)
    }

    fn changes_since(
        &self,
        layer_id: LayerId,
        since: u64,
        limit: u32,
    ) -> ServiceResult<ChangePage> {
        self.inner.changes_since(layer_id, since, limit)
    }

    fn query(&self, layer_id: LayerId, filter: &Envelope) -> ServiceResult<Vec<Feature>> {
        self.inner.query(layer_id, filter)
    }
}

#[test]
fn generate_then_empty_sync() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));

    let replica = session.replica().unwrap();
    assert_eq!(replica.store().feature_count(HYDRANTS).unwrap(), 4);
    assert!(!session.has_local_edits());

    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();

    assert_eq!(handle.status(), JobStatus::Succeeded);
    assert!(handle.result().unwrap().is_empty());
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
    assert_eq!(
        session.event_history().last(),
        Some(&SessionEvent::SyncResult { results: vec![] })
    );
}

#[test]
fn edit_cycle_round_trips_to_service() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));

    move_feature(&session, Point::new(10.0, 0.0), Point::new(10.0, 77.0));
    assert!(session.has_local_edits());

    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    let results = handle.result().unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].is_success());
    assert!(!session.has_local_edits());

    let uploaded = service.feature(HYDRANTS, FeatureId::new(1)).unwrap();
    assert_eq!(uploaded.geometry.as_point(), Some(Point::new(10.0, 77.0)));
}

#[test]
fn attribute_edit_round_trips() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));

    assert_eq!(session.select_near(Point::new(20.0, 0.0), 1.0).unwrap(), 1);
    assert_eq!(
        session
            .update_selection_attribute("typdamage", AttributeValue::Text("minor".into()))
            .unwrap(),
        1
    );
    assert_eq!(session.selection_len(), 0);

    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    assert_eq!(handle.status(), JobStatus::Succeeded);

    let uploaded = service.feature(HYDRANTS, FeatureId::new(2)).unwrap();
    assert_eq!(
        uploaded.attribute("typdamage"),
        Some(&AttributeValue::Text("minor".into()))
    );
    // geometry was untouched by the attribute edit
    assert_eq!(uploaded.geometry.as_point(), Some(Point::new(20.0, 0.0)));
}

#[test]
fn empty_selection_leaves_the_session_ready() {
    let service = damage_service();
    let session = ready_session(service);

    let events_before = session.event_history().len();
    assert_eq!(session.select_near(Point::new(500.0, 500.0), 1.0).unwrap(), 0);
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
    assert_eq!(session.selection_len(), 0);
    // no state event for the empty attempt
    assert_eq!(session.event_history().len(), events_before);

    // the machine still accepts a real selection afterwards
    assert_eq!(session.select_near(Point::new(0.0, 0.0), 1.0).unwrap(), 1);
    assert_eq!(session.edit_state(), EditState::IsEditing);

    // a fresh select while editing is rejected and keeps the selection
    let err = session.select_near(Point::new(10.0, 0.0), 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    assert_eq!(session.selection_len(), 1);
}

#[test]
fn rejected_edit_stays_pending() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));

    // one selection catching hydrants 0 and 1, moved together
    assert_eq!(session.select_near(Point::new(5.0, 0.0), 6.0).unwrap(), 2);
    assert_eq!(session.move_selection_to(Point::new(50.0, 50.0)).unwrap(), 2);
    service.reject_edits_for(HYDRANTS, FeatureId::new(1));

    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    let results = handle.result().unwrap();

    // the exchange itself succeeded; one entry reports the rejection
    assert_eq!(handle.status(), JobStatus::Succeeded);
    assert_eq!(results.len(), 2);
    assert_eq!(results.iter().filter(|r| !r.is_success()).count(), 1);

    let store = session.replica().unwrap().store().clone();
    assert_eq!(
        store.dirty_state(HYDRANTS, FeatureId::new(0)).unwrap(),
        Some(DirtyState::Clean)
    );
    assert_eq!(
        store.dirty_state(HYDRANTS, FeatureId::new(1)).unwrap(),
        Some(DirtyState::PendingUpdate)
    );
    assert!(session.has_local_edits());
    assert!(session.event_history().iter().any(|event| matches!(
        event,
        SessionEvent::Error {
            kind: ErrorKind::FeatureEditFailed,
            ..
        }
    )));

    // the next pass re-uploads only the kept edit
    service.clear_rejections();
    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    assert_eq!(handle.result().unwrap().len(), 1);
    assert!(!session.has_local_edits());
}

#[test]
fn rollback_batch_keeps_everything_pending() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));

    assert_eq!(session.select_near(Point::new(5.0, 0.0), 6.0).unwrap(), 2);
    assert_eq!(session.move_selection_to(Point::new(50.0, 50.0)).unwrap(), 2);
    service.reject_edits_for(HYDRANTS, FeatureId::new(1));
    let version_before = service.version();

    let params = session
        .default_sync_parameters()
        .unwrap()
        .with_rollback_on_failure(true);
    let handle = session.synchronize(params).unwrap();
    handle.join();
    let results = handle.result().unwrap();

    assert!(results.iter().all(|r| !r.is_success()));
    assert!(session.has_local_edits());
    // nothing landed on the service
    assert_eq!(service.version(), version_before);
    assert_eq!(
        service
            .feature(HYDRANTS, FeatureId::new(0))
            .unwrap()
            .geometry
            .as_point(),
        Some(Point::new(0.0, 0.0))
    );
}

#[test]
fn remote_changes_download_and_local_edits_win() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));
    let replica = session.replica().unwrap();

    // local pending edit on hydrant 0
    move_feature(&session, Point::new(0.0, 0.0), Point::new(0.0, -40.0));

    // meanwhile the service gains a conflicting write and a new hydrant
    service
        .seed(
            HYDRANTS,
            Feature::new(FeatureId::new(0), Point::new(-5.0, -5.0)),
        )
        .unwrap();
    service
        .seed(
            HYDRANTS,
            Feature::new(FeatureId::new(9), Point::new(5.0, 5.0)),
        )
        .unwrap();

    let params = session
        .default_sync_parameters()
        .unwrap()
        .with_direction(SyncDirection::Download);
    let handle = session.synchronize(params).unwrap();
    handle.join();
    assert!(handle.result().unwrap().is_empty());

    let store = replica.store();
    // the new hydrant arrived
    assert_eq!(store.feature_count(HYDRANTS).unwrap(), 5);
    assert!(store.get(HYDRANTS, FeatureId::new(9)).unwrap().is_some());
    // the conflicting write lost to the pending local edit
    let local = store.get(HYDRANTS, FeatureId::new(0)).unwrap().unwrap();
    assert_eq!(local.geometry.as_point(), Some(Point::new(0.0, -40.0)));
    assert!(session.has_local_edits());
    // nothing was uploaded
    assert_eq!(
        service
            .feature(HYDRANTS, FeatureId::new(0))
            .unwrap()
            .geometry
            .as_point(),
        Some(Point::new(-5.0, -5.0))
    );

    // a later bidirectional pass publishes the local edit
    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    assert_eq!(handle.result().unwrap().len(), 1);
    assert!(!session.has_local_edits());
    assert_eq!(
        service
            .feature(HYDRANTS, FeatureId::new(0))
            .unwrap()
            .geometry
            .as_point(),
        Some(Point::new(0.0, -40.0))
    );
}

#[test]
fn upload_echo_not_reapplied() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));
    let replica = session.replica().unwrap();

    move_feature(&session, Point::new(30.0, 0.0), Point::new(30.0, 11.0));
    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    assert_eq!(handle.result().unwrap().len(), 1);

    // the pass that uploaded also consumed its own echo
    assert_eq!(replica.version_of(HYDRANTS), service.version());
    assert!(!session.has_local_edits());

    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    assert!(handle.result().unwrap().is_empty());

    let kept = replica
        .store()
        .get(HYDRANTS, FeatureId::new(3))
        .unwrap()
        .unwrap();
    assert_eq!(kept.geometry.as_point(), Some(Point::new(30.0, 11.0)));
    assert_eq!(
        replica
            .store()
            .dirty_state(HYDRANTS, FeatureId::new(3))
            .unwrap(),
        Some(DirtyState::Clean)
    );
}

#[test]
fn upload_only_skips_downloads() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));
    let replica = session.replica().unwrap();
    let version_at_generate = replica.version_of(HYDRANTS);

    move_feature(&session, Point::new(0.0, 0.0), Point::new(0.0, 60.0));
    service
        .seed(
            HYDRANTS,
            Feature::new(FeatureId::new(9), Point::new(5.0, 5.0)),
        )
        .unwrap();

    let params = session
        .default_sync_parameters()
        .unwrap()
        .with_direction(SyncDirection::Upload);
    let handle = session.synchronize(params).unwrap();
    handle.join();

    assert_eq!(handle.result().unwrap().len(), 1);
    assert!(!session.has_local_edits());
    // no download leg: no new feature, version untouched
    assert_eq!(replica.store().feature_count(HYDRANTS).unwrap(), 4);
    assert_eq!(replica.version_of(HYDRANTS), version_at_generate);
}

#[test]
fn edits_made_during_sync_survive_to_the_next_pass() {
    let service = damage_service();
    let (gated, keys) = GatedService::new(Arc::clone(&service)).gate_apply();
    let session = OfflineSession::new(Arc::new(gated), SessionConfig::new());
    let handle = session.generate(GenerateOptions::new(wide())).unwrap();
    handle.join();
    assert_eq!(session.edit_state(), EditState::ReadyToSync);

    move_feature(&session, Point::new(0.0, 0.0), Point::new(100.0, 100.0));

    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    keys.wait_entered();

    // the upload is in flight; the user keeps editing the same hydrant
    move_feature(&session, Point::new(100.0, 100.0), Point::new(200.0, 200.0));

    keys.release();
    handle.join();
    let results = handle.result().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_success());

    // the service got the snapshot, the replica kept the newer edit dirty
    assert_eq!(
        service
            .feature(HYDRANTS, FeatureId::new(0))
            .unwrap()
            .geometry
            .as_point(),
        Some(Point::new(100.0, 100.0))
    );
    assert!(session.has_local_edits());
    let store = session.replica().unwrap().store().clone();
    let local = store.get(HYDRANTS, FeatureId::new(0)).unwrap().unwrap();
    assert_eq!(local.geometry.as_point(), Some(Point::new(200.0, 200.0)));

    // the next pass publishes it
    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    assert_eq!(handle.result().unwrap().len(), 1);
    assert!(!session.has_local_edits());
    assert_eq!(
        service
            .feature(HYDRANTS, FeatureId::new(0))
            .unwrap()
            .geometry
            .as_point(),
        Some(Point::new(200.0, 200.0))
    );
}

#[test]
fn select_during_running_sync_keeps_the_editing_state() {
    let service = damage_service();
    let (gated, keys) = GatedService::new(Arc::clone(&service)).gate_apply();
    let session = OfflineSession::new(Arc::new(gated), SessionConfig::new());
    let handle = session.generate(GenerateOptions::new(wide())).unwrap();
    handle.join();
    assert_eq!(session.edit_state(), EditState::ReadyToSync);

    move_feature(&session, Point::new(0.0, 0.0), Point::new(100.0, 100.0));

    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    keys.wait_entered();

    // the upload is in flight; a new selection may still start an edit
    assert_eq!(session.select_near(Point::new(10.0, 0.0), 1.0).unwrap(), 1);
    assert_eq!(session.edit_state(), EditState::IsEditing);

    keys.release();
    handle.join();
    assert_eq!(handle.status(), JobStatus::Succeeded);

    // the finished sync left the machine where the user put it
    assert_eq!(session.edit_state(), EditState::IsEditing);
    assert_eq!(session.selection_len(), 1);

    // the selection commits normally once the sync is done
    assert_eq!(session.move_selection_to(Point::new(10.0, 50.0)).unwrap(), 1);
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
    assert!(session.has_local_edits());
}

#[test]
fn cancelled_generation_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let service = damage_service();
    let (gated, keys) = GatedService::new(service).gate_extract();
    let config = SessionConfig::new()
        .with_directory(dir.path())
        .with_page_size(1);
    let session = OfflineSession::new(Arc::new(gated), config);

    let handle = session.generate(GenerateOptions::new(wide())).unwrap();
    keys.wait_entered();
    handle.cancel();
    keys.release();
    handle.join();

    assert_eq!(handle.status(), JobStatus::Failed);
    assert_eq!(handle.result().unwrap_err(), EngineError::Cancelled);
    assert_eq!(session.edit_state(), EditState::NoLocalReplica);
    assert!(session.replica().is_none());
    // no replica directory was materialized
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(session.event_history().iter().any(|event| matches!(
        event,
        SessionEvent::Error {
            kind: ErrorKind::Cancelled,
            ..
        }
    )));

    // the session is free to try again
    let handle = session.generate(GenerateOptions::new(wide())).unwrap();
    handle.join();
    assert_eq!(handle.status(), JobStatus::Succeeded);
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn second_job_while_running_is_rejected() {
    let service = damage_service();
    let (gated, keys) = GatedService::new(service).gate_extract();
    let session = OfflineSession::new(Arc::new(gated), SessionConfig::new());

    let handle = session.generate(GenerateOptions::new(wide())).unwrap();
    keys.wait_entered();

    assert!(matches!(
        session.generate(GenerateOptions::new(wide())),
        Err(EngineError::JobActive)
    ));

    keys.release();
    handle.join();
    assert_eq!(handle.status(), JobStatus::Succeeded);
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
}

#[test]
fn offline_service_fails_sync_but_keeps_edits() {
    let service = damage_service();
    let session = ready_session(Arc::clone(&service));

    move_feature(&session, Point::new(10.0, 0.0), Point::new(10.0, 33.0));
    service.set_offline(true);

    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();

    assert_eq!(handle.status(), JobStatus::Failed);
    let err = handle.result().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyncTransportFailed);
    assert!(err.is_retryable());
    // the failed pass changed nothing it should not have
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
    assert!(session.has_local_edits());

    service.set_offline(false);
    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();
    assert_eq!(handle.status(), JobStatus::Succeeded);
    assert!(!session.has_local_edits());
    assert_eq!(
        service
            .feature(HYDRANTS, FeatureId::new(1))
            .unwrap()
            .geometry
            .as_point(),
        Some(Point::new(10.0, 33.0))
    );
}

#[test]
fn file_backed_replica_reopens_after_session_drop() {
    let dir = tempfile::tempdir().unwrap();
    let service = damage_service();
    let config = SessionConfig::new().with_directory(dir.path());
    let session = OfflineSession::new(service, config);

    let handle = session.generate(GenerateOptions::new(wide())).unwrap();
    handle.join();
    assert_eq!(handle.status(), JobStatus::Succeeded);
    move_feature(&session, Point::new(20.0, 0.0), Point::new(20.0, 99.0));
    // the handle's result still pins the replica and its backend lock
    drop(handle);
    drop(session);

    let entry = fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
    assert!(entry
        .file_name()
        .to_string_lossy()
        .starts_with("replica-"));

    let backend: Arc<dyn ReplicaBackend> =
        Arc::new(FileBackend::open(&entry.path(), false).unwrap());
    let replica = Replica::open(backend).unwrap();
    replica.load().unwrap();
    assert_eq!(replica.status(), LoadStatus::Loaded);

    let store = replica.store();
    assert_eq!(store.feature_count(HYDRANTS).unwrap(), 4);
    assert!(store.has_local_edits());
    let moved = store.get(HYDRANTS, FeatureId::new(2)).unwrap().unwrap();
    assert_eq!(moved.geometry.as_point(), Some(Point::new(20.0, 99.0)));
    assert_eq!(
        store.dirty_state(HYDRANTS, FeatureId::new(2)).unwrap(),
        Some(DirtyState::PendingUpdate)
    );
}

#[test]
fn event_stream_reports_the_whole_cycle() {
    let service = damage_service();
    let session = OfflineSession::new(service, SessionConfig::new());
    let receiver = session.subscribe();

    let handle = session.generate(GenerateOptions::new(wide())).unwrap();
    handle.join();
    move_feature(&session, Point::new(0.0, 0.0), Point::new(1.0, 1.0));
    let handle = session
        .synchronize(session.default_sync_parameters().unwrap())
        .unwrap();
    handle.join();

    let events: Vec<SessionEvent> = receiver.try_iter().collect();

    let states: Vec<(EditState, EditState)> = events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            (EditState::NoLocalReplica, EditState::ReadyToSync),
            (EditState::ReadyToSync, EditState::IsEditing),
            (EditState::IsEditing, EditState::ReadyToSync),
        ]
    );

    for kind in [JobKind::Generate, JobKind::Sync] {
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Progress { job, percent } if *job == kind => Some(*percent),
                _ => None,
            })
            .collect();
        assert!(!percents.is_empty());
        assert!(percents.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    assert!(matches!(
        events.last(),
        Some(SessionEvent::SyncResult { results }) if results.len() == 1
    ));
}
