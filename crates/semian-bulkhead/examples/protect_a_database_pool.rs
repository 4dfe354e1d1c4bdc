//! Bounds concurrent access to a database across every process that registers
//! the same bulkhead name, using a fixed ticket count.

use semian_bulkhead::{Bulkhead, BulkheadConfigBuilder};
use std::time::Duration;

fn main() -> Result<(), semian_bulkhead::BulkheadError> {
    let config = BulkheadConfigBuilder::new("payments-db")
        .tickets(4)
        .default_timeout(Duration::from_millis(500))
        .on_call_rejected(|_event| eprintln!("bulkhead full, rejecting call"))
        .build()?;

    let bulkhead = Bulkhead::register(config)?;
    println!(
        "registered '{}' with {} tickets across {} worker(s)",
        bulkhead.name(),
        bulkhead.tickets(),
        bulkhead.registered_workers()
    );

    {
        let _ticket = bulkhead.acquire(None)?;
        println!("ticket acquired, calling the database");
    }

    // Dropping `bulkhead` here unregisters this process's worker slot
    // automatically; no explicit `unregister_worker()` call needed.
    Ok(())
}
