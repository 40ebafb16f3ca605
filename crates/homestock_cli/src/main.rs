//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `homestock_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use homestock_core::db::open_db_in_memory;
use homestock_core::{InventoryService, NeverMerge, SqliteSnapshotRepository};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("homestock_core version={}", homestock_core::core_version());

    // Drive one in-memory add/list cycle to validate core wiring without
    // touching any on-disk or remote state.
    let conn = open_db_in_memory()?;
    let repo = SqliteSnapshotRepository::try_new(&conn)?;
    let mut service = InventoryService::open(repo)?;
    service.add("probe", 1, &NeverMerge)?;
    println!("homestock_core probe items={}", service.items().len());

    Ok(())
}
