// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use card_vault::{
    api::router,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    crypto::CipherSuite,
    state::AppState,
    storage::{DocumentStorage, FsObjectStore, StoragePaths},
};
use tracing_subscriber::EnvFilter;

fn init_logging(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() {
    // No key, no server: nothing may be stored unencrypted
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(config.log_format);

    let paths = StoragePaths::new(&config.data_dir);
    let objects = Arc::new(FsObjectStore::new(paths.objects_dir()));
    let mut storage = DocumentStorage::new(paths);
    storage
        .initialize()
        .expect("Failed to initialize data directory");

    let addr = config.bind_addr;
    let state = AppState::new(
        storage,
        objects,
        CipherSuite::new(config.encryption_key),
        config.share,
    );
    let app = router(state);

    tracing::info!(
        %addr,
        data_dir = %config.data_dir.display(),
        "Card vault listening (docs at /docs)"
    );

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
        .expect("HTTP server failed");
}
