//! The replica generation job body.
//!
//! Generation buffers every transfer page before touching the backend,
//! so a failed or cancelled transfer leaves no partial replica behind;
//! materialization starts only once the whole transfer completed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use geosync_model::{Envelope, Feature, LayerId, ReplicaId};
use geosync_service::{FeatureService, GenerateParameters};
use geosync_store::{FileBackend, MemoryBackend, Replica, ReplicaBackend, ReplicaManifest};

use crate::config::{ReplicaStorage, SessionConfig};
use crate::error::{EngineError, EngineResult};
use crate::job::JobContext;

/// Options for a replica generation job.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Area of interest.
    pub extent: Envelope,
    /// Layers to replicate; `None` takes every negotiated layer.
    pub layer_ids: Option<Vec<LayerId>>,
    /// Whether attachments travel with the features.
    pub include_attachments: bool,
}

impl GenerateOptions {
    /// Creates options covering every negotiated layer.
    #[must_use]
    pub fn new(extent: Envelope) -> Self {
        Self {
            extent,
            layer_ids: None,
            include_attachments: false,
        }
    }

    /// Restricts generation to the given layers.
    #[must_use]
    pub fn with_layers(mut self, layer_ids: Vec<LayerId>) -> Self {
        self.layer_ids = Some(layer_ids);
        self
    }

    /// Includes attachments in the transfer.
    #[must_use]
    pub fn with_attachments(mut self, include: bool) -> Self {
        self.include_attachments = include;
        self
    }
}

/// One layer's buffered transfer.
struct LayerDownload {
    layer_id: LayerId,
    features: Vec<Feature>,
    version: u64,
}

/// Runs a full generation: negotiate, transfer, materialize, load.
///
/// Returns the replica whatever its load status; the session decides
/// whether to attach it.
pub(crate) fn run(
    service: &Arc<dyn FeatureService>,
    config: &SessionConfig,
    options: &GenerateOptions,
    context: &JobContext,
) -> EngineResult<Arc<Replica>> {
    context.check_cancelled()?;

    let params = resolve_parameters(
        service
            .default_generate_parameters(options.extent)
            .map_err(|err| EngineError::negotiation_failed(err.to_string()))?,
        options,
    )?;
    info!(layers = params.layer_ids.len(), "generation parameters negotiated");
    context.set_progress(5);

    let downloads = transfer(service, &params, config.page_size, context)?;
    context.set_progress(90);

    let replica = materialize(config, options.extent, downloads, context)?;
    context.set_progress(95);

    if let Err(err) = replica.load() {
        warn!(replica = %replica.id(), error = %err, "replica failed to load");
    }
    context.set_progress(100);
    Ok(Arc::new(replica))
}

/// Narrows the negotiated parameters to the requested layers.
fn resolve_parameters(
    negotiated: GenerateParameters,
    options: &GenerateOptions,
) -> EngineResult<GenerateParameters> {
    let mut params = negotiated;
    if let Some(requested) = &options.layer_ids {
        for layer_id in requested {
            if !params.layer_ids.contains(layer_id) {
                return Err(EngineError::negotiation_failed(format!(
                    "service does not offer {layer_id}"
                )));
            }
        }
        params.layer_ids.clone_from(requested);
    }
    if params.layer_ids.is_empty() {
        return Err(EngineError::negotiation_failed("no layers to replicate"));
    }
    params.include_attachments = options.include_attachments;
    Ok(params)
}

fn transfer(
    service: &Arc<dyn FeatureService>,
    params: &GenerateParameters,
    page_size: u32,
    context: &JobContext,
) -> EngineResult<Vec<LayerDownload>> {
    let mut downloads = Vec::with_capacity(params.layer_ids.len());
    let layer_count = params.layer_ids.len() as u64;
    for (index, &layer_id) in params.layer_ids.iter().enumerate() {
        let mut features = Vec::new();
        let mut cursor = 0u64;
        let version;
        loop {
            context.check_cancelled()?;
            let page = service
                .extract(layer_id, &params.extent, cursor, page_size)
                .map_err(EngineError::transfer)?;
            cursor = page.cursor;
            features.extend(page.features);
            if !page.has_more {
                version = page.version;
                break;
            }
        }
        debug!(%layer_id, features = features.len(), version, "layer extracted");
        downloads.push(LayerDownload {
            layer_id,
            features,
            version,
        });
        // transfer spans 5..=90 of the progress range
        let done = (index as u64 + 1) * 85 / layer_count;
        context.set_progress(5 + done as u8);
    }
    Ok(downloads)
}

fn materialize(
    config: &SessionConfig,
    extent: Envelope,
    downloads: Vec<LayerDownload>,
    context: &JobContext,
) -> EngineResult<Replica> {
    context.check_cancelled()?;
    let replica_id = ReplicaId::new();
    let backend = make_backend(config, replica_id)?;
    let mut manifest = ReplicaManifest::new(replica_id, extent);
    for download in &downloads {
        manifest.add_layer(download.layer_id, download.version);
    }
    let replica = Replica::create(backend, manifest)?;
    for download in downloads {
        replica.store().put_many(download.layer_id, download.features)?;
    }
    info!(
        replica = %replica.id(),
        layers = replica.layer_ids().len(),
        "replica materialized"
    );
    Ok(replica)
}

fn make_backend(
    config: &SessionConfig,
    replica_id: ReplicaId,
) -> EngineResult<Arc<dyn ReplicaBackend>> {
    match &config.storage {
        ReplicaStorage::Memory => Ok(Arc::new(MemoryBackend::new())),
        ReplicaStorage::Directory(base) => {
            let path = base.join(format!("replica-{replica_id}"));
            Ok(Arc::new(FileBackend::open(&path, true)?))
        }
    }
}
