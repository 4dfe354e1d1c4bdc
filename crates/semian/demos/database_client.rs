//! A toy database client protected by a bulkhead and a classical breaker,
//! demonstrating the saturation and trip-and-recover paths an adapter sees.

use semian::resource::{ProtectedResource, ResourceConfigBuilder, Scope};
use semian_core::MarksCircuits;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
enum DbError {
    #[error("connection refused")]
    ConnectionRefused,
}

impl MarksCircuits for DbError {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ResourceConfigBuilder::new("orders-db")
        .tickets(2)
        .timeout(Duration::from_millis(50))
        .error_threshold(3)
        .error_timeout(Duration::from_millis(200))
        .success_threshold(1)
        .build()?;
    let resource = ProtectedResource::register(config)?;

    // Trip the breaker with three consecutive failures.
    for attempt in 1..=3 {
        let result = resource.acquire(None, Scope::Query, "postgres", || {
            Err::<(), _>(DbError::ConnectionRefused)
        });
        println!("attempt {attempt}: {result:?}");
    }

    // The breaker is now open; this call is rejected before the bulkhead is touched.
    let rejected = resource.acquire(None, Scope::Query, "postgres", || Ok::<_, DbError>(1));
    assert!(rejected.is_err());
    println!("while open: {rejected:?}");

    std::thread::sleep(Duration::from_millis(250));

    // Half-open: one success closes the breaker again.
    let recovered = resource.acquire(None, Scope::Query, "postgres", || Ok::<_, DbError>(42));
    println!("after recovery: {recovered:?}");
    assert_eq!(recovered.unwrap(), 42);

    Ok(())
}
