//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use spellbook_server::{create_app, store::open_backend, AppState, Config, StoreBackend};
use std::path::Path;
use tempfile::TempDir;

pub(crate) fn test_config_for_dir(backend: StoreBackend, data_dir: &Path) -> Config {
    Config {
        store: backend,
        data_dir: data_dir.to_path_buf(),
        port: 0,
        max_body_size: 64 * 1024,
        cors_origins: Vec::new(),
    }
}

pub(crate) fn test_server_for_config(config: Config) -> TestServer {
    let store = open_backend(config.store, &config.data_dir).expect("open store");
    let app = create_app(AppState::new(config, store), false);
    TestServer::new(app).expect("server")
}

pub(crate) fn setup_test_server(backend: StoreBackend) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_dir(backend, temp_dir.path());
    (test_server_for_config(config), temp_dir)
}
