// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide wiring of the session core.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{ApiClient, HttpTransport, RequestPipeline, Transport};
use crate::config::{ClientConfig, ConfigError};
use crate::editor::{EditorEvent, EntryLifecycleController, EntryTarget};
use crate::session::{SessionDataCache, SessionGuard};
use crate::storage::{StorageError, StoragePaths, TokenStore};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("token store: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP client: {0}")]
    Transport(String),
}

/// Singletons shared by every feature, passed explicitly.
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub tokens: Arc<TokenStore>,
    pub pipeline: Arc<RequestPipeline>,
    pub api: ApiClient,
    pub guard: Arc<SessionGuard>,
    pub cache: Arc<SessionDataCache>,
}

impl AppState {
    /// Durable token store under the data dir, reqwest transport.
    pub fn from_config(config: ClientConfig) -> Result<Self, StartupError> {
        let paths = StoragePaths::new(&config.data_dir);
        let tokens = Arc::new(TokenStore::open(&paths.session_db())?);
        let transport = HttpTransport::new(config.api_url.clone(), config.http_timeout)
            .map_err(|e| StartupError::Transport(e.0))?;
        info!(
            api_url = %config.api_url,
            data_dir = %paths.root().display(),
            "Client state initialized"
        );
        Ok(Self::with_transport(config, tokens, Arc::new(transport)))
    }

    pub fn with_transport(
        config: ClientConfig,
        tokens: Arc<TokenStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let pipeline = Arc::new(RequestPipeline::new(transport, tokens.clone()));
        let api = ApiClient::new(pipeline.clone());
        let guard = Arc::new(SessionGuard::new(pipeline.clone()));
        let cache = Arc::new(SessionDataCache::new(
            api.clone(),
            config.cache_ttl,
            config.cache_capacity,
        ));
        Self {
            config,
            tokens,
            pipeline,
            api,
            guard,
            cache,
        }
    }

    /// Keep the cache in step with the token store until `shutdown`,
    /// re-reading the store every `session_poll`.
    pub fn spawn_cache_watcher(&self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.cache.clone().run(
            self.tokens.subscribe(),
            self.config.session_poll,
            shutdown,
        ))
    }

    /// Open an editor bound to this session's API and cache.
    pub fn open_editor(
        &self,
        target: EntryTarget,
    ) -> (
        EntryLifecycleController,
        tokio::sync::mpsc::UnboundedReceiver<EditorEvent>,
    ) {
        EntryLifecycleController::open(
            self.api.clone(),
            target,
            self.config.autosave_debounce,
            Some(self.cache.clone()),
        )
    }
}
