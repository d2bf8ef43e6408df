use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    bootstrap,
    calendar::CalendarService,
    config::Config,
    identity::IdentityService,
    linkage::OrderLinkageService,
};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    identity: IdentityService,
    linkage: OrderLinkageService,
    calendar: CalendarService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Config::from_env()?;
        let db = DBService::new(&config.database_url).await?;
        let deployment = Self::from_parts(config, db);

        let report = bootstrap::seed(
            &deployment.db.pool,
            &deployment.identity,
            &deployment.config.rules,
            deployment.config.admin.as_ref(),
        )
        .await?;
        if report.admin_created || !report.event_types_created.is_empty() {
            tracing::info!(
                admin_created = report.admin_created,
                event_types = report.event_types_created.len(),
                "Bootstrap seeding applied"
            );
        }

        Ok(deployment)
    }

    fn config(&self) -> &Arc<Config> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn identity(&self) -> &IdentityService {
        &self.identity
    }

    fn linkage(&self) -> &OrderLinkageService {
        &self.linkage
    }

    fn calendar(&self) -> &CalendarService {
        &self.calendar
    }
}

impl LocalDeployment {
    /// Wires the services around an already-open store, without seeding.
    pub fn from_parts(config: Config, db: DBService) -> Self {
        let identity = IdentityService::new(config.jwt_secret.clone(), config.token_ttl);
        Self::with_identity(config, db, identity)
    }

    /// Like [`LocalDeployment::from_parts`] with a custom identity service,
    /// e.g. one with a cheaper bcrypt cost.
    pub fn with_identity(config: Config, db: DBService, identity: IdentityService) -> Self {
        let rules = Arc::new(config.rules.clone());
        let linkage = OrderLinkageService::new(rules);
        let calendar = CalendarService::new(linkage.clone());
        Self {
            config: Arc::new(config),
            db,
            identity,
            linkage,
            calendar,
        }
    }
}
