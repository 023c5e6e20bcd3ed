//! # ASCII Image Server - Entry Point
//! src/main.rs

use std::sync::Arc;

use anyhow::Context;
use ascii_server::config::{Config, StoreKind};
use ascii_server::engine::TaskEngine;
use ascii_server::image::AsciiConverter;
use ascii_server::logging;
use ascii_server::server::Server;
use ascii_server::store::{BlobStore, FileStore, MemoryStore};

fn main() -> anyhow::Result<()> {
    let config = Config::new();

    logging::init(config.log_format).map_err(|e| anyhow::anyhow!("could not install logger: {}", e))?;
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let store: Arc<dyn BlobStore> = match config.store {
        StoreKind::File => Arc::new(
            FileStore::new(&config.store_path)
                .with_context(|| format!("could not open store at {}", config.store_path))?,
        ),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };

    let converter = AsciiConverter::new().with_max_decoded_bytes(config.max_decoded_bytes);
    let engine = Arc::new(TaskEngine::new(Arc::new(converter), store));

    let server = Server::bind(config.clone(), engine)
        .with_context(|| format!("could not bind {}", config.address()))?;
    server.run().context("server stopped")?;

    Ok(())
}
