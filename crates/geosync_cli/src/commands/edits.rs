//! Edits command implementation.

use geosync_model::Geometry;
use geosync_store::{FileBackend, Replica, ReplicaBackend};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// One feature with a pending local edit.
#[derive(Debug, Serialize)]
pub struct PendingEdit {
    /// Layer the feature belongs to.
    pub layer_id: u32,
    /// The feature identifier.
    pub feature_id: u64,
    /// Record revision of the pending edit.
    pub revision: u64,
    /// Geometry summary.
    pub geometry: String,
    /// Attribute values, rendered as text.
    pub attributes: BTreeMap<String, String>,
}

/// Runs the edits command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn ReplicaBackend> = Arc::new(FileBackend::open(path, false)?);
    let replica = Replica::open(backend)?;
    replica.load()?;

    let layers: Vec<_> = replica.layer_ids().to_vec();
    let snapshot = replica.store().snapshot_dirty(&layers)?;
    let pending: Vec<PendingEdit> = snapshot
        .iter()
        .map(|entry| PendingEdit {
            layer_id: entry.layer_id.as_u32(),
            feature_id: entry.feature.id.as_u64(),
            revision: entry.revision,
            geometry: describe_geometry(&entry.feature.geometry),
            attributes: entry
                .feature
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
        })
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&pending)?);
        }
        _ => {
            print_text_output(&pending);
        }
    }

    Ok(())
}

fn describe_geometry(geometry: &Geometry) -> String {
    match geometry {
        Geometry::Point(p) => format!("point({}, {})", p.x, p.y),
        Geometry::Polyline(points) => format!("polyline[{} vertices]", points.len()),
        Geometry::Polygon(ring) => format!("polygon[{} vertices]", ring.len()),
    }
}

fn print_text_output(pending: &[PendingEdit]) {
    if pending.is_empty() {
        println!("No pending local edits.");
        return;
    }

    println!("Pending Local Edits");
    println!("===================");
    println!();
    for edit in pending {
        println!(
            "  layer {} feature {} (revision {}): {}",
            edit.layer_id, edit.feature_id, edit.revision, edit.geometry
        );
        for (name, value) in &edit.attributes {
            println!("    {name} = {value}");
        }
    }
    println!();
    println!("{} pending edit(s).", pending.len());
}
