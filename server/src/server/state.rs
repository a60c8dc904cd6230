//! Application state shared across HTTP handlers.

use crate::config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use swimdesk_postgres::assessments::AssessmentStore;
use swimdesk_postgres::bookings::BookingStore;
use swimdesk_postgres::invitations::InvitationStore;
use swimdesk_postgres::portal::PortalStore;
use swimdesk_postgres::purchase_orders::PurchaseOrderStore;
use swimdesk_postgres::sessions::SessionStore;
use swimdesk_postgres::swimmers::SwimmerStore;
use swimdesk_postgres::tasks::TaskStore;

/// Shared state cloned (cheaply, everything is pool-backed or `Arc`) into
/// each handler.
#[derive(Clone)]
pub struct AppState {
    /// Swimmer queries.
    pub swimmers: SwimmerStore,
    /// Session queries and batch persistence.
    pub sessions: SessionStore,
    /// Transactional booking service.
    pub bookings: BookingStore,
    /// Purchase-order queries.
    pub purchase_orders: PurchaseOrderStore,
    /// Staff task CRUD.
    pub tasks: TaskStore,
    /// Invitation lifecycle.
    pub invitations: InvitationStore,
    /// Assessment submission.
    pub assessments: AssessmentStore,
    /// Portal session lookup.
    pub portal: PortalStore,
    /// The connection pool, for health checks.
    pub pool: PgPool,
    /// Loaded configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds the state from a connected pool and loaded configuration.
    #[must_use]
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self {
            swimmers: SwimmerStore::new(pool.clone()),
            sessions: SessionStore::new(pool.clone()),
            bookings: BookingStore::new(pool.clone()),
            purchase_orders: PurchaseOrderStore::new(pool.clone()),
            tasks: TaskStore::new(pool.clone()),
            invitations: InvitationStore::new(pool.clone()),
            assessments: AssessmentStore::new(pool.clone()),
            portal: PortalStore::new(pool.clone()),
            pool,
            config: Arc::new(config),
        }
    }
}
