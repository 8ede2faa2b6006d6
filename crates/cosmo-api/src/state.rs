//! Application state shared across API handlers

use std::sync::Arc;

use amm::PoolService;
use axum::http::HeaderMap;
use cosmo_core::{Address, AppConfig};

use crate::relay::{self, CallerError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: PoolService,
    config: AppConfig,
    trusted_forwarder: Option<Address>,
}

impl AppState {
    /// Create state around a running pool service
    pub fn new(service: PoolService, config: AppConfig) -> cosmo_core::Result<Self> {
        let trusted_forwarder = config.pool.trusted_forwarder()?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                service,
                config,
                trusted_forwarder,
            }),
        })
    }

    pub fn service(&self) -> &PoolService {
        &self.inner.service
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn trusted_forwarder(&self) -> Option<Address> {
        self.inner.trusted_forwarder
    }

    /// Resolve the caller of a request, unwrapping trusted forwarders
    pub fn caller(&self, headers: &HeaderMap) -> Result<Address, CallerError> {
        relay::resolve_caller(headers, self.inner.trusted_forwarder.as_ref())
    }
}
