use std::sync::Arc;

use async_trait::async_trait;
use db::{DBService, DbErr};
use services::services::{
    calendar::CalendarService,
    config::{Config, ConfigError},
    identity::{IdentityError, IdentityService},
    linkage::OrderLinkageService,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] IdentityError),
}

/// Everything a request handler can reach: configuration, the record store
/// and the services built on top of it.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<Config>;

    fn db(&self) -> &DBService;

    fn identity(&self) -> &IdentityService;

    fn linkage(&self) -> &OrderLinkageService;

    fn calendar(&self) -> &CalendarService;
}
