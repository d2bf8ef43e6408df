//! Idempotent seeding run on every start.

use db::{
    ConnectionTrait,
    models::{
        event_type::{CreateEventType, EventType},
        user::User,
    },
    rules::EventTypeRules,
    types::{EventCategory, UserRole},
};
use secrecy::ExposeSecret;

use super::{
    config::AdminSeed,
    identity::{CreateUserRequest, IdentityError, IdentityService},
};

/// Colors the legacy setup assigned to the document types, in order.
pub const DOCUMENT_TYPE_COLORS: [&str; 5] = ["#3b82f6", "#8b5cf6", "#10b981", "#f59e0b", "#ef4444"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub admin_created: bool,
    pub event_types_created: Vec<String>,
}

/// Ensures the configured admin account and the document event types exist.
/// Does nothing without an admin seed.
pub async fn seed<C: ConnectionTrait>(
    db: &C,
    identity: &IdentityService,
    rules: &EventTypeRules,
    admin: Option<&AdminSeed>,
) -> Result<BootstrapReport, IdentityError> {
    let mut report = BootstrapReport::default();
    let Some(admin) = admin else {
        tracing::debug!("No admin seed configured, skipping bootstrap");
        return Ok(report);
    };

    let admin_user = match User::find_by_email(db, &admin.email).await? {
        Some(existing) => existing,
        None => {
            let created = identity
                .create_user(
                    db,
                    &CreateUserRequest {
                        email: admin.email.clone(),
                        password: admin.password.expose_secret().to_string(),
                        name: admin.name.clone(),
                        role: UserRole::Admin,
                    },
                )
                .await?;
            tracing::info!(email = %created.email, "Created admin user");
            report.admin_created = true;
            created
        }
    };

    for (index, name) in rules.document_types.iter().enumerate() {
        if EventType::find_by_name(db, rules, name).await?.is_some() {
            continue;
        }
        let color = DOCUMENT_TYPE_COLORS[index % DOCUMENT_TYPE_COLORS.len()];
        EventType::create(
            db,
            rules,
            &CreateEventType {
                name: name.clone(),
                color: color.to_string(),
                category: Some(EventCategory::Document),
            },
            Some(admin_user.id),
        )
        .await?;
        tracing::info!(name = %name, "Seeded event type");
        report.event_types_created.push(name.clone());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use secrecy::SecretString;

    use super::*;

    fn admin_seed() -> AdminSeed {
        AdminSeed {
            email: "admin@example.com".to_string(),
            password: SecretString::from("changeme"),
            name: "Administrador".to_string(),
        }
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        let identity = IdentityService::new(SecretString::from("s"), Duration::days(7))
            .with_bcrypt_cost(4);
        let rules = EventTypeRules::default();
        let seed_data = admin_seed();

        let first = seed(&db, &identity, &rules, Some(&seed_data)).await.unwrap();
        assert!(first.admin_created);
        assert_eq!(first.event_types_created.len(), 5);

        let second = seed(&db, &identity, &rules, Some(&seed_data)).await.unwrap();
        assert_eq!(second, BootstrapReport::default());

        let admin = identity
            .authenticate(&db, "admin@example.com", "changeme")
            .await
            .unwrap()
            .user;
        assert_eq!(admin.role, UserRole::Admin);

        let types = EventType::find_all(&db, &rules).await.unwrap();
        assert_eq!(types.len(), 5);
        let pedido = types.iter().find(|t| t.name == "Pedido").unwrap();
        assert_eq!(pedido.color, "#3b82f6");
        assert_eq!(pedido.category, EventCategory::Document);
        assert_eq!(pedido.created_by, Some(admin.id));
    }

    #[tokio::test]
    async fn nothing_happens_without_admin() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        let identity = IdentityService::new(SecretString::from("s"), Duration::days(7));
        let rules = EventTypeRules::default();

        let report = seed(&db, &identity, &rules, None).await.unwrap();
        assert_eq!(report, BootstrapReport::default());
        assert!(EventType::find_all(&db, &rules).await.unwrap().is_empty());
    }
}
