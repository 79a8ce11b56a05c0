//! Seeded services and ready-made offline sessions.
//!
//! Provides convenience constructors for the setups most tests start
//! from: a feature service with known data and a session whose replica
//! generation already finished.

use geosync_engine::{EditState, GenerateOptions, OfflineSession, SessionConfig};
use geosync_model::{Envelope, Feature, FeatureId, Geometry, GeometryKind, LayerId, LayerInfo, Point};
use geosync_service::MemoryFeatureService;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// The point layer every fixture service publishes.
pub const HYDRANTS: LayerId = LayerId::new(0);

/// The polygon layer [`mixed_geometry_service`] adds.
pub const ZONES: LayerId = LayerId::new(1);

/// An extent covering every fixture feature.
#[must_use]
pub fn wide_extent() -> Envelope {
    Envelope::new(-1000.0, -1000.0, 1000.0, 1000.0)
}

/// A service with `hydrant_count` point features on the x axis, each
/// carrying a `typdamage` attribute of `"none"`.
#[must_use]
pub fn damage_service(hydrant_count: u64) -> Arc<MemoryFeatureService> {
    let service = MemoryFeatureService::new();
    service.add_layer(LayerInfo::new(HYDRANTS, "hydrants", GeometryKind::Point));
    for id in 0..hydrant_count {
        let feature = Feature::new(FeatureId::new(id), Point::new(id as f64 * 10.0, 0.0))
            .with_attribute("typdamage", "none");
        service.seed(HYDRANTS, feature).expect("seed hydrant");
    }
    Arc::new(service)
}

/// A [`damage_service`] with a second, polygon layer whose features
/// are not movable. Useful for selection filtering tests.
#[must_use]
pub fn mixed_geometry_service(hydrant_count: u64) -> Arc<MemoryFeatureService> {
    let service = damage_service(hydrant_count);
    service.add_layer(LayerInfo::new(ZONES, "zones", GeometryKind::Polygon));
    let ring = vec![
        Point::new(-50.0, -50.0),
        Point::new(50.0, -50.0),
        Point::new(50.0, 50.0),
        Point::new(-50.0, 50.0),
    ];
    let zone = Feature::new(FeatureId::new(0), Geometry::Polygon(ring));
    service.seed(ZONES, zone).expect("seed zone");
    service
}

/// A session whose replica generation already ran, with automatic
/// cleanup of any on-disk replica.
pub struct TestSession {
    /// The ready session.
    pub session: OfflineSession,
    /// The service behind it, for seeding and failure injection.
    pub service: Arc<MemoryFeatureService>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestSession {
    /// Creates a memory-backed session over [`damage_service`] and
    /// waits for its replica.
    #[must_use]
    pub fn memory(hydrant_count: u64) -> Self {
        let service = damage_service(hydrant_count);
        let session = OfflineSession::new(service.clone(), SessionConfig::new());
        generate_and_wait(&session);
        Self {
            session,
            service,
            _temp_dir: None,
        }
    }

    /// Creates a file-backed session in a temporary directory and
    /// waits for its replica.
    #[must_use]
    pub fn file(hydrant_count: u64) -> Self {
        let temp_dir = TempDir::new().expect("create temp directory");
        let service = damage_service(hydrant_count);
        let config = SessionConfig::new().with_directory(temp_dir.path());
        let session = OfflineSession::new(service.clone(), config);
        generate_and_wait(&session);
        Self {
            session,
            service,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the replica base directory if file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }
}

impl std::ops::Deref for TestSession {
    type Target = OfflineSession;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

fn generate_and_wait(session: &OfflineSession) {
    let handle = session
        .generate(GenerateOptions::new(wide_extent()))
        .expect("start generate");
    handle.join();
    handle.result().expect("generate failed");
    assert_eq!(session.edit_state(), EditState::ReadyToSync);
}

/// Runs a test with a ready memory-backed session over four hydrants.
///
/// # Example
///
/// ```rust,ignore
/// use geosync_testkit::with_ready_session;
///
/// #[test]
/// fn my_test() {
///     with_ready_session(|session, service| {
///         session.select_near(Point::new(0.0, 0.0), 1.0).unwrap();
///         // ... edit and sync
///     });
/// }
/// ```
pub fn with_ready_session<F, R>(f: F) -> R
where
    F: FnOnce(&OfflineSession, &MemoryFeatureService) -> R,
{
    let fixture = TestSession::memory(4);
    f(&fixture.session, &fixture.service)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// A memory-backed session with `edit_count` hydrants already
    /// moved and pending upload.
    #[must_use]
    pub fn session_with_pending_edits(edit_count: u64) -> TestSession {
        let fixture = TestSession::memory(edit_count.max(1));
        for id in 0..edit_count {
            let x = id as f64 * 10.0;
            let selected = fixture
                .session
                .select_near(Point::new(x, 0.0), 1.0)
                .expect("select hydrant");
            assert_eq!(selected, 1);
            fixture
                .session
                .move_selection_to(Point::new(x, 50.0))
                .expect("move hydrant");
        }
        assert_eq!(fixture.session.has_local_edits(), edit_count > 0);
        fixture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_session_is_ready() {
        let fixture = TestSession::memory(4);
        assert_eq!(fixture.edit_state(), EditState::ReadyToSync);
        let replica = fixture.replica().expect("replica attached");
        assert_eq!(replica.store().feature_count(HYDRANTS).unwrap(), 4);
        assert!(fixture.path().is_none());
    }

    #[test]
    fn file_session_materializes_on_disk() {
        let fixture = TestSession::file(2);
        let base = fixture.path().expect("file-backed");
        assert_eq!(std::fs::read_dir(base).unwrap().count(), 1);
    }

    #[test]
    fn pending_edits_scenario() {
        let fixture = scenarios::session_with_pending_edits(3);
        assert!(fixture.has_local_edits());
        let store = fixture.replica().unwrap().store().clone();
        let moved = store.get(HYDRANTS, FeatureId::new(2)).unwrap().unwrap();
        assert_eq!(moved.geometry.as_point(), Some(Point::new(20.0, 50.0)));
    }

    #[test]
    fn mixed_service_publishes_both_layers() {
        let service = mixed_geometry_service(2);
        let layers = geosync_service::FeatureService::layers(service.as_ref()).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].geometry_kind, GeometryKind::Polygon);
    }
}
