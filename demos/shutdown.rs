//! Demonstrates registry shutdown with tracing output
//!
//! Run with: cargo run --example shutdown --features tracing

use std::sync::Arc;

use terminable::prelude::*;

/// Server-side resources: a listener and a cache.
struct ServerModule;

impl TerminableModule for ServerModule {
    fn setup(&self, consumer: &dyn TerminableConsumer) {
        consumer.bind(Arc::new(from_fn(|| {
            tracing::info!("listener stopped");
            Ok::<_, std::io::Error>(())
        })));
        consumer.bind(Arc::new(from_fn(|| {
            Err::<(), _>(std::io::Error::other("cache flush timed out"))
        })));
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    tracing::info!("Starting shutdown demo");

    let registry: CompositeTerminable = CompositeTerminable::new();

    registry.bind(Arc::new(from_fn(|| {
        tracing::info!("database pool drained");
        Ok::<_, std::io::Error>(())
    })));

    let metrics = {
        let inner: CompositeTerminable = CompositeTerminable::new();
        inner.bind(Arc::new(from_fn(|| {
            Err::<(), _>(std::io::Error::other("metrics exporter unreachable"))
        })));
        registry.bind(Arc::new(inner))
    };
    tracing::info!("metrics registry holds {} resource(s)", metrics.len());

    registry.bind_module(ModuleCollection::new().with_module(ServerModule).with_module(
        |consumer: &dyn TerminableConsumer| {
            consumer.bind(Arc::new(from_fn(|| {
                tracing::info!("worker pool joined");
                Ok::<_, std::io::Error>(())
            })));
        },
    ));

    tracing::info!("{} resource(s) registered", registry.len());

    match registry.close_all() {
        Ok(()) => tracing::info!("clean shutdown"),
        Err(errors) => tracing::error!("{}", errors.diagnostic()),
    }

    // A second pass finds nothing left to close.
    registry.close_unchecked();
}
