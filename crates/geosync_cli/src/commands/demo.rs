//! Demo command implementation.
//!
//! Drives a full offline cycle against an in-memory service: generate
//! a replica, move a feature, update an attribute, receive a remote
//! change, and synchronize.

use geosync_engine::{GenerateOptions, OfflineSession, SessionConfig, SessionEvent};
use geosync_model::{
    AttributeValue, Envelope, Feature, FeatureId, GeometryKind, LayerId, LayerInfo, Point,
};
use geosync_service::MemoryFeatureService;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::info;

const HYDRANTS: LayerId = LayerId::new(0);

/// Runs the demo command.
pub fn run(feature_count: u64, page_size: u32) -> Result<(), Box<dyn std::error::Error>> {
    info!("Seeding demo service with {} features", feature_count);
    let service = seed_service(feature_count)?;
    let config = SessionConfig::new().with_page_size(page_size);
    let session = OfflineSession::new(service.clone(), config);
    let events = session.subscribe();

    println!("GeoSync Demo");
    println!("============");
    println!();
    println!(
        "Service: {feature_count} hydrants, replica page size {page_size}"
    );

    // 1. Take the area offline.
    let extent = Envelope::new(-100.0, -100.0, 1000.0, 1000.0);
    info!("Generating replica for {:?}", extent);
    let handle = session.generate(GenerateOptions::new(extent))?;
    handle.join();
    let replica = handle.result()?;
    print_events("generate", &events);
    println!(
        "Replica {} holds {} features.",
        replica.id(),
        replica.store().feature_count(HYDRANTS)?
    );

    // 2. Edit offline: move the first hydrant, flag the second.
    session.select_near(Point::new(0.0, 0.0), 1.0)?;
    session.move_selection_to(Point::new(0.0, 25.0))?;
    session.select_near(Point::new(10.0, 0.0), 1.0)?;
    session.update_selection_attribute("typdamage", AttributeValue::Text("minor".into()))?;
    print_events("edit", &events);
    println!("Pending local edits: {}", session.has_local_edits());

    // 3. Meanwhile another user adds a hydrant on the service.
    service.seed(
        HYDRANTS,
        Feature::new(
            FeatureId::new(feature_count),
            Point::new(feature_count as f64 * 10.0, 0.0),
        ),
    )?;

    // 4. Synchronize both directions.
    let params = session
        .default_sync_parameters()
        .ok_or("no replica attached")?;
    info!("Synchronizing replica {}", replica.id());
    let handle = session.synchronize(params)?;
    handle.join();
    let results = handle.result()?;
    print_events("sync", &events);

    let failures = results.iter().filter(|r| !r.is_success()).count();
    println!(
        "Uploaded {} edit(s), {} rejected.",
        results.len(),
        failures
    );
    println!(
        "Replica now holds {} features; pending edits: {}.",
        replica.store().feature_count(HYDRANTS)?,
        session.has_local_edits()
    );
    let moved = service
        .feature(HYDRANTS, FeatureId::new(0))
        .ok_or("hydrant missing on service")?;
    println!(
        "Service sees hydrant 0 at {}.",
        describe_point(&moved)
    );

    Ok(())
}

fn seed_service(count: u64) -> Result<Arc<MemoryFeatureService>, Box<dyn std::error::Error>> {
    let service = MemoryFeatureService::new();
    service.add_layer(LayerInfo::new(HYDRANTS, "hydrants", GeometryKind::Point));
    for id in 0..count {
        let feature = Feature::new(FeatureId::new(id), Point::new(id as f64 * 10.0, 0.0))
            .with_attribute("typdamage", "none");
        service.seed(HYDRANTS, feature)?;
    }
    Ok(Arc::new(service))
}

fn print_events(phase: &str, events: &Receiver<SessionEvent>) {
    for event in events.try_iter() {
        println!("  [{phase}] {}", describe_event(&event));
    }
}

fn describe_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::StateChanged { from, to } => format!("state {from:?} -> {to:?}"),
        SessionEvent::Progress { job, percent } => format!("{job:?} {percent}%"),
        SessionEvent::SyncResult { results } => {
            format!("sync finished with {} result(s)", results.len())
        }
        SessionEvent::Error { kind, message } => format!("error {kind:?}: {message}"),
    }
}

fn describe_point(feature: &Feature) -> String {
    match feature.geometry.as_point() {
        Some(point) => format!("({}, {})", point.x, point.y),
        None => "a non-point location".to_string(),
    }
}
