//! Lockout-tagout isolation plans and their points.
//!
//! A plan walks `draft → pending_approval → approved → active → completed`
//! (or `cancelled` from any non-terminal state). Points are only editable
//! while the plan is a draft, and only progress
//! `pending → isolated → verified → restored` while it is active.

mod plan;
mod point;
mod workspace;

pub use plan::{
    DEFAULT_MARKER_SIZE, DeleteConfirmation, IsolationPlan, MARKER_SIZE_MAX, MARKER_SIZE_MIN, NewPlan, PlanAction,
    PlanPatch, PlanStatus, clamp_marker_size,
};
pub use point::{
    AuditEntry, AuditStamp, IsolationPoint, NewPoint, PlanProgress, PointAction, PointPatch, PointStatus, PointType,
    audit_trail, next_sequence,
};
pub use workspace::{PlanCommand, PlanWorkspace};

use thiserror::Error;

/// A command that the workflow state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("cannot {action} a plan that is {from}")]
    IllegalPlanTransition { from: PlanStatus, action: PlanAction },
    #[error("cannot {action} a point that is {from}")]
    IllegalPointTransition { from: PointStatus, action: PointAction },
    #[error("points can only be edited while the plan is draft (plan is {0})")]
    PointsFrozen(PlanStatus),
    #[error("point status can only change while the plan is active (plan is {0})")]
    PlanNotActive(PlanStatus),
    #[error("plan is {0} and can no longer be edited")]
    PlanClosed(PlanStatus),
    #[error("deleting a plan that is {0} needs double confirmation")]
    ConfirmationRequired(PlanStatus),
}
