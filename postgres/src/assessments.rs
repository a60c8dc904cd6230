//! Assessment completion.
//!
//! The one path the original system ran through a database-side procedure.
//! Re-expressed here as a native transaction: record the outcome, move the
//! swimmer's enrollment status, create the initial purchase order for an
//! approved funded swimmer, and enqueue the notification, all-or-nothing.

use crate::error::StoreError;
use crate::outbox::{self, NotificationKind};
use crate::rows::{SWIMMER_COLUMNS, SwimmerRow};
use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use swimdesk_core::status::{EnrollmentStatus, PoStatus};
use swimdesk_core::{PurchaseOrderId, Swimmer, SwimmerId};
use uuid::Uuid;

/// The verdict of a completed assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentOutcome {
    /// The swimmer may enroll.
    Approved,
    /// The swimmer was declined.
    Declined,
}

impl AssessmentOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    const fn enrollment_status(self) -> EnrollmentStatus {
        match self {
            Self::Approved => EnrollmentStatus::Approved,
            Self::Declined => EnrollmentStatus::Declined,
        }
    }
}

/// Authorization window opened for an approved funded swimmer.
#[derive(Clone, Debug)]
pub struct InitialAuthorization {
    /// External reference number.
    pub po_number: String,
    /// Sessions the funding source authorized.
    pub sessions_authorized: i32,
    /// First day of the validity window.
    pub start_date: NaiveDate,
    /// Last day of the validity window (inclusive).
    pub end_date: NaiveDate,
}

/// A completed assessment to submit.
#[derive(Clone, Debug)]
pub struct AssessmentSubmission {
    /// The assessed swimmer.
    pub swimmer_id: SwimmerId,
    /// The verdict.
    pub outcome: AssessmentOutcome,
    /// Assigned level, when approved.
    pub level: Option<String>,
    /// Assessor notes.
    pub notes: Option<String>,
    /// Authorization to open alongside an approval, for funded swimmers.
    pub authorization: Option<InitialAuthorization>,
}

/// Store for assessment submission.
#[derive(Clone)]
pub struct AssessmentStore {
    pool: PgPool,
}

impl AssessmentStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submits a completed assessment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the swimmer is unknown and
    /// [`StoreError::Database`] on any write failure; on error nothing is
    /// persisted.
    pub async fn submit(&self, submission: &AssessmentSubmission) -> Result<Swimmer, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<SwimmerRow> = sqlx::query_as(&format!(
            "SELECT {SWIMMER_COLUMNS} FROM swimmers WHERE id = $1 FOR UPDATE"
        ))
        .bind(submission.swimmer_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let swimmer: Swimmer = row.ok_or(StoreError::NotFound("swimmer"))?.try_into()?;

        sqlx::query("INSERT INTO assessments (id, swimmer_id, outcome, level, notes) VALUES ($1, $2, $3, $4, $5)")
            .bind(Uuid::new_v4())
            .bind(swimmer.id.as_uuid())
            .bind(submission.outcome.as_str())
            .bind(submission.level.as_deref())
            .bind(submission.notes.as_deref())
            .execute(&mut *tx)
            .await?;

        let new_status = submission.outcome.enrollment_status();
        sqlx::query(
            "UPDATE swimmers SET enrollment_status = $2, level = COALESCE($3, level) WHERE id = $1",
        )
        .bind(swimmer.id.as_uuid())
        .bind(new_status.as_str())
        .bind(submission.level.as_deref())
        .execute(&mut *tx)
        .await?;

        if submission.outcome == AssessmentOutcome::Approved {
            if let (Some(authorization), Some(funding_source_id)) =
                (&submission.authorization, swimmer.funding_source_id)
            {
                sqlx::query(
                    "INSERT INTO purchase_orders \
                         (id, swimmer_id, funding_source_id, po_number, sessions_authorized, \
                          start_date, end_date, status) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                )
                .bind(PurchaseOrderId::new().as_uuid())
                .bind(swimmer.id.as_uuid())
                .bind(funding_source_id.as_uuid())
                .bind(&authorization.po_number)
                .bind(authorization.sessions_authorized)
                .bind(authorization.start_date)
                .bind(authorization.end_date)
                .bind(PoStatus::Approved.as_str())
                .execute(&mut *tx)
                .await?;
            }
        }

        let parent_email: Option<String> =
            sqlx::query_scalar("SELECT email FROM parents WHERE id = $1")
                .bind(swimmer.parent_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        outbox::enqueue(
            &mut tx,
            NotificationKind::AssessmentCompleted,
            &json!({
                "swimmer_id": swimmer.id,
                "swimmer_name": swimmer.name,
                "parent_email": parent_email,
                "outcome": submission.outcome.as_str(),
                "level": submission.level,
            }),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            swimmer_id = %swimmer.id,
            outcome = submission.outcome.as_str(),
            "assessment submitted"
        );
        Ok(Swimmer {
            enrollment_status: new_status,
            level: submission.level.clone().or(swimmer.level.clone()),
            ..swimmer
        })
    }
}
