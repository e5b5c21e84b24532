//! `pairbook-inspect <snapshot.json>`
//!
//! Loads a snapshot and prints the load report and per-kind counts. Exits 1
//! if the snapshot cannot be loaded, 2 on usage errors.

use std::env;
use std::process;

use pairbook::storage::{JsonFileStorage, RegistryStorage, StorageConfig};
use pairbook::{telemetry, EntityKind};

fn main() {
    telemetry::init();

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: pairbook-inspect <snapshot.json>");
        process::exit(2);
    };

    // Read-only: do not touch the backup copy.
    let config = StorageConfig {
        keep_backup: false,
        ..StorageConfig::with_path(path)
    };
    let storage = JsonFileStorage::new(config).unwrap_or_else(|err| {
        eprintln!("pairbook-inspect: {err}");
        process::exit(2);
    });

    let (registry, report) = match storage.load() {
        Ok(Some(loaded)) => loaded,
        Ok(None) => {
            eprintln!("pairbook-inspect: no snapshot at {path}");
            process::exit(2);
        }
        Err(err) => {
            eprintln!("pairbook-inspect: {err}");
            process::exit(1);
        }
    };

    println!("snapshot: {path}");
    println!("  loaded:             {}", report.loaded);
    println!("  skipped (invalid):  {}", report.skipped_invalid);
    println!("  skipped (dup):      {}", report.skipped_duplicate);
    println!("  pairings linked:    {}", report.edges_linked);
    println!("  dangling dropped:   {}", report.dangling_dropped);
    println!("  self refs dropped:  {}", report.self_references_dropped);
    println!("  same-kind dropped:  {}", report.same_kind_dropped);
    for kind in [EntityKind::Student, EntityKind::Volunteer] {
        println!("  {kind}s: {}", registry.of_kind(kind).count());
    }
    for (id, entity) in registry.all() {
        let partners = registry.paired_entities(id).unwrap_or_default();
        let names: Vec<_> = partners.iter().map(|(_, p)| p.name().as_str()).collect();
        if names.is_empty() {
            println!("{id} {entity}");
        } else {
            println!("{id} {entity}; Paired with: {}", names.join(", "));
        }
    }
}
