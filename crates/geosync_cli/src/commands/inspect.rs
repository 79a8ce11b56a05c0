//! Inspect command implementation.

use geosync_model::Envelope;
use geosync_store::{FileBackend, LoadStatus, Replica, ReplicaBackend};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Replica inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Replica directory path.
    pub path: String,
    /// Replica identifier.
    pub replica_id: String,
    /// Area of interest the replica was generated for.
    pub extent: Envelope,
    /// Whether every table loaded cleanly.
    pub loaded: bool,
    /// Load failure description, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
    /// Per-layer statistics (present when loaded).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<LayerStats>>,
}

/// Statistics for a single replicated layer.
#[derive(Debug, Serialize)]
pub struct LayerStats {
    /// Layer ID.
    pub id: u32,
    /// Server change version the layer is synced to.
    pub server_version: u64,
    /// Number of local features.
    pub feature_count: usize,
    /// Number of features with pending local edits.
    pub pending_count: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn ReplicaBackend> = Arc::new(FileBackend::open(path, false)?);
    let replica = Replica::open(backend)?;
    let load_result = replica.load();

    let mut result = InspectResult {
        path: path.display().to_string(),
        replica_id: replica.id().to_string(),
        extent: replica.extent(),
        loaded: replica.status() == LoadStatus::Loaded,
        load_error: replica.load_error(),
        layers: None,
    };

    if load_result.is_ok() {
        let store = replica.store();
        let mut layers = Vec::new();
        for &layer_id in replica.layer_ids() {
            layers.push(LayerStats {
                id: layer_id.as_u32(),
                server_version: replica.version_of(layer_id),
                feature_count: store.feature_count(layer_id)?,
                pending_count: store.snapshot_dirty(&[layer_id])?.len(),
            });
        }
        result.layers = Some(layers);
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("GeoSync Replica Inspection");
    println!("==========================");
    println!();
    println!("Path:    {}", result.path);
    println!("Replica: {}", result.replica_id);
    println!(
        "Extent:  ({}, {}) .. ({}, {})",
        result.extent.xmin, result.extent.ymin, result.extent.xmax, result.extent.ymax
    );
    println!("Loaded:  {}", if result.loaded { "yes" } else { "no" });
    if let Some(error) = &result.load_error {
        println!("Error:   {error}");
    }

    if let Some(layers) = &result.layers {
        println!();
        println!("Layers:");
        for layer in layers {
            println!(
                "  [{}] {} features, {} pending, synced to version {}",
                layer.id, layer.feature_count, layer.pending_count, layer.server_version
            );
        }
    }
}
