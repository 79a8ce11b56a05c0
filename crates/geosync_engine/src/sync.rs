//! The synchronization job body.
//!
//! Order within one pass: dirty snapshot, upload leg, download leg,
//! dirty clearing. Clearing runs last so the engine's own uploads stay
//! dirty while their echoes come back down: the store drops a change
//! for a dirty record, and the advanced layer version keeps the echo
//! out of the next pass entirely. A transport failure anywhere leaves
//! every snapshot feature dirty for re-upload; the service applies
//! upserts idempotently.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use geosync_model::{Feature, FeatureId, LayerId};
use geosync_service::{FeatureEditResult, FeatureService, SyncParameters};
use geosync_store::{DirtySnapshot, RemoteApply, Replica};

use crate::error::{EngineError, EngineResult};
use crate::job::JobContext;

/// Runs a full sync pass and returns the per-feature upload results.
///
/// The job fails only when the exchange itself could not run; rejected
/// individual edits come back as failure entries in the result.
pub(crate) fn run(
    service: &Arc<dyn FeatureService>,
    replica: &Arc<Replica>,
    params: &SyncParameters,
    page_size: u32,
    context: &JobContext,
) -> EngineResult<Vec<FeatureEditResult>> {
    context.check_cancelled()?;
    let layers = resolve_layers(replica, params)?;

    let snapshot = replica.store().snapshot_dirty(&layers)?;
    info!(
        direction = %params.direction,
        layers = layers.len(),
        dirty = snapshot.len(),
        "sync started"
    );
    context.set_progress(5);

    let results = if params.direction.uploads() {
        upload(service, params, &layers, &snapshot, context)?
    } else {
        Vec::new()
    };
    context.set_progress(50);

    if params.direction.downloads() {
        download(service, replica, &layers, page_size, context)?;
    }
    context.set_progress(90);

    clear_uploaded(replica, &snapshot, &results)?;
    context.set_progress(100);
    info!(results = results.len(), "sync finished");
    Ok(results)
}

/// Rejects sync parameters naming layers the replica does not hold.
fn resolve_layers(replica: &Replica, params: &SyncParameters) -> EngineResult<Vec<LayerId>> {
    let layers = params.layer_ids();
    for &layer_id in &layers {
        if !replica.layer_ids().contains(&layer_id) {
            return Err(EngineError::sync_transport_fatal(format!(
                "{layer_id} is not part of this replica"
            )));
        }
    }
    Ok(layers)
}

fn upload(
    service: &Arc<dyn FeatureService>,
    params: &SyncParameters,
    layers: &[LayerId],
    snapshot: &[DirtySnapshot],
    context: &JobContext,
) -> EngineResult<Vec<FeatureEditResult>> {
    let mut results = Vec::new();
    for &layer_id in layers {
        context.check_cancelled()?;
        let batch: Vec<Feature> = snapshot
            .iter()
            .filter(|entry| entry.layer_id == layer_id)
            .map(|entry| entry.feature.clone())
            .collect();
        if batch.is_empty() {
            continue;
        }
        debug!(%layer_id, edits = batch.len(), "uploading edits");
        let layer_results = service
            .apply_edits(layer_id, &batch, params.rollback_on_failure)
            .map_err(EngineError::sync_transport)?;
        results.extend(layer_results);
    }
    Ok(results)
}

fn download(
    service: &Arc<dyn FeatureService>,
    replica: &Arc<Replica>,
    layers: &[LayerId],
    page_size: u32,
    context: &JobContext,
) -> EngineResult<()> {
    let store = replica.store();
    for &layer_id in layers {
        let mut since = replica.version_of(layer_id);
        loop {
            context.check_cancelled()?;
            let page = service
                .changes_since(layer_id, since, page_size)
                .map_err(EngineError::sync_transport)?;
            let mut applied = 0usize;
            let mut skipped = 0usize;
            for feature in page.features {
                match store.apply_remote(layer_id, feature)? {
                    RemoteApply::Applied => applied += 1,
                    RemoteApply::SkippedDirty => skipped += 1,
                }
            }
            since = page.version;
            replica.set_version(layer_id, page.version)?;
            debug!(%layer_id, applied, skipped, version = page.version, "change page applied");
            if !page.has_more {
                break;
            }
        }
    }
    Ok(())
}

/// Clears the dirty flag of every successfully uploaded feature whose
/// revision has not moved since the snapshot.
fn clear_uploaded(
    replica: &Arc<Replica>,
    snapshot: &[DirtySnapshot],
    results: &[FeatureEditResult],
) -> EngineResult<()> {
    if results.is_empty() {
        return Ok(());
    }
    let mut revisions: HashMap<(LayerId, FeatureId), u64> = HashMap::new();
    for entry in snapshot {
        revisions.insert((entry.layer_id, entry.feature.id), entry.revision);
    }
    let store = replica.store();
    let mut cleared = 0usize;
    let mut kept = 0usize;
    for result in results.iter().filter(|entry| entry.is_success()) {
        let Some(&revision) = revisions.get(&(result.layer_id, result.feature_id)) else {
            continue;
        };
        if store.clear_dirty(result.layer_id, result.feature_id, revision)? {
            cleared += 1;
        } else {
            kept += 1;
        }
    }
    debug!(cleared, kept, "dirty flags cleared");
    Ok(())
}
