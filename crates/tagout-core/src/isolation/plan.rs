//! Isolation plan workflow.

use super::WorkflowError;
use crate::identity::{DiagramId, PlanId, UserRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MARKER_SIZE: u32 = 24;
pub const MARKER_SIZE_MIN: u32 = 8;
pub const MARKER_SIZE_MAX: u32 = 96;

pub fn clamp_marker_size(size: u32) -> u32 {
    size.clamp(MARKER_SIZE_MIN, MARKER_SIZE_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Draft,
    #[serde(alias = "pendingApproval")]
    PendingApproval,
    Approved,
    Active,
    Completed,
    Cancelled,
}

impl PlanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Point create / move / retype / delete.
    pub fn allows_point_edits(self) -> bool {
        self == Self::Draft
    }

    /// Point isolate / verify / restore.
    pub fn allows_point_actions(self) -> bool {
        self == Self::Active
    }

    /// Status after `action`, or the reason it is not allowed.
    pub fn next(self, action: PlanAction) -> Result<PlanStatus, WorkflowError> {
        use PlanAction::*;
        use PlanStatus::*;
        match (self, action) {
            (Draft, Submit) => Ok(PendingApproval),
            (PendingApproval, Approve) => Ok(Approved),
            (Approved, Activate) => Ok(Active),
            (Active, Complete) => Ok(Completed),
            (from, Cancel) if !from.is_terminal() => Ok(Cancelled),
            (from, action) => Err(WorkflowError::IllegalPlanTransition { from, action }),
        }
    }

    /// Actions that are legal from this status, forward action first.
    pub fn available_actions(self) -> Vec<PlanAction> {
        PlanAction::ALL.into_iter().filter(|a| self.next(*a).is_ok()).collect()
    }

    /// Deleting a plan that is under way is a danger action.
    pub fn deletion_needs_double_confirmation(self) -> bool {
        matches!(self, Self::PendingApproval | Self::Approved | Self::Active)
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Submit,
    Approve,
    Activate,
    Complete,
    Cancel,
}

impl PlanAction {
    pub const ALL: [PlanAction; 5] = [Self::Submit, Self::Approve, Self::Activate, Self::Complete, Self::Cancel];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Activate => "activate",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How firmly the user confirmed a plan delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteConfirmation {
    #[default]
    Single,
    Double,
}

/// A named lockout-tagout work package on one diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationPlan {
    pub id: PlanId,
    #[serde(alias = "diagramId")]
    pub diagram_id: DiagramId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "equipmentTag")]
    pub equipment_tag: String,
    #[serde(default, alias = "workOrder")]
    pub work_order: String,
    #[serde(default)]
    pub status: PlanStatus,
    #[serde(default, alias = "plannedStart")]
    pub planned_start: Option<DateTime<Utc>>,
    #[serde(default, alias = "plannedEnd")]
    pub planned_end: Option<DateTime<Utc>>,
    #[serde(default, alias = "actualStart")]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default, alias = "actualEnd")]
    pub actual_end: Option<DateTime<Utc>>,
    #[serde(alias = "createdBy")]
    pub created_by: UserRef,
    #[serde(default, alias = "approvedBy")]
    pub approved_by: Option<UserRef>,
    #[serde(default = "default_marker_size", alias = "markerSize")]
    pub marker_size: u32,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

fn default_marker_size() -> u32 {
    DEFAULT_MARKER_SIZE
}

impl IsolationPlan {
    /// Run a workflow action. Activation stamps `actual_start`, completion
    /// stamps `actual_end`, approval records the approver.
    pub fn apply_action(&mut self, action: PlanAction, actor: &UserRef, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        let next = self.status.next(action)?;
        match action {
            PlanAction::Approve => self.approved_by = Some(actor.clone()),
            PlanAction::Activate => self.actual_start = Some(now),
            PlanAction::Complete => self.actual_end = Some(now),
            PlanAction::Submit | PlanAction::Cancel => {}
        }
        log::debug!("plan {} {} -> {} by {}", self.id, self.status, next, actor.display_name);
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Apply an edit. Marker size may change in any status; descriptive
    /// fields only until the plan is completed or cancelled.
    pub fn apply(&mut self, patch: PlanPatch, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if !patch.is_presentation_only() && self.status.is_terminal() {
            return Err(WorkflowError::PlanClosed(self.status));
        }
        let PlanPatch {
            name,
            description,
            equipment_tag,
            work_order,
            planned_start,
            planned_end,
            marker_size,
        } = patch;
        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
        if let Some(v) = equipment_tag {
            self.equipment_tag = v;
        }
        if let Some(v) = work_order {
            self.work_order = v;
        }
        if let Some(v) = planned_start {
            self.planned_start = Some(v);
        }
        if let Some(v) = planned_end {
            self.planned_end = Some(v);
        }
        if let Some(v) = marker_size {
            self.marker_size = clamp_marker_size(v);
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn check_delete(&self, confirmation: DeleteConfirmation) -> Result<(), WorkflowError> {
        if self.status.deletion_needs_double_confirmation() && confirmation != DeleteConfirmation::Double {
            return Err(WorkflowError::ConfirmationRequired(self.status));
        }
        Ok(())
    }
}

/// Create payload for a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPlan {
    pub name: String,
    pub description: String,
    #[serde(alias = "equipmentTag")]
    pub equipment_tag: String,
    #[serde(alias = "workOrder")]
    pub work_order: String,
    #[serde(alias = "plannedStart")]
    pub planned_start: Option<DateTime<Utc>>,
    #[serde(alias = "plannedEnd")]
    pub planned_end: Option<DateTime<Utc>>,
    #[serde(alias = "markerSize")]
    pub marker_size: Option<u32>,
}

impl NewPlan {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn into_plan(self, id: PlanId, diagram_id: DiagramId, created_by: UserRef, now: DateTime<Utc>) -> IsolationPlan {
        IsolationPlan {
            id,
            diagram_id,
            name: self.name.trim().to_string(),
            description: self.description,
            equipment_tag: self.equipment_tag,
            work_order: self.work_order,
            status: PlanStatus::Draft,
            planned_start: self.planned_start,
            planned_end: self.planned_end,
            actual_start: None,
            actual_end: None,
            created_by,
            approved_by: None,
            marker_size: clamp_marker_size(self.marker_size.unwrap_or(DEFAULT_MARKER_SIZE)),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial plan update. Status is deliberately absent: it only moves
/// through [`PlanAction`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "equipmentTag")]
    pub equipment_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "workOrder")]
    pub work_order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "plannedStart")]
    pub planned_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "plannedEnd")]
    pub planned_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "markerSize")]
    pub marker_size: Option<u32>,
}

impl PlanPatch {
    pub fn marker_size(size: u32) -> Self {
        Self { marker_size: Some(size), ..Self::default() }
    }

    /// Only touches presentation properties.
    pub fn is_presentation_only(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.equipment_tag.is_none()
            && self.work_order.is_none()
            && self.planned_start.is_none()
            && self.planned_end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn admin() -> UserRef {
        UserRef::new(Uuid::new_v4(), "Ada Admin")
    }

    fn draft() -> IsolationPlan {
        NewPlan::named("Pump P-101 overhaul").into_plan(Uuid::new_v4(), Uuid::new_v4(), admin(), Utc::now())
    }

    #[test]
    fn test_happy_path_stamps() {
        let mut plan = draft();
        let approver = admin();
        let now = Utc::now();
        plan.apply_action(PlanAction::Submit, &approver, now).unwrap();
        plan.apply_action(PlanAction::Approve, &approver, now).unwrap();
        assert_eq!(plan.approved_by.as_ref(), Some(&approver));
        assert!(plan.actual_start.is_none());

        plan.apply_action(PlanAction::Activate, &approver, now).unwrap();
        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.actual_start, Some(now));
        assert!(!plan.status.allows_point_edits());
        assert!(plan.status.allows_point_actions());

        plan.apply_action(PlanAction::Complete, &approver, now).unwrap();
        assert_eq!(plan.status, PlanStatus::Completed);
        assert_eq!(plan.actual_end, Some(now));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut plan = draft();
        let err = plan.apply_action(PlanAction::Activate, &admin(), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::IllegalPlanTransition { from: PlanStatus::Draft, action: PlanAction::Activate }
        );
        assert_eq!(plan.status, PlanStatus::Draft);
        assert!(plan.actual_start.is_none());
    }

    #[test]
    fn test_cancel_from_every_non_terminal() {
        for status in [PlanStatus::Draft, PlanStatus::PendingApproval, PlanStatus::Approved, PlanStatus::Active] {
            assert_eq!(status.next(PlanAction::Cancel), Ok(PlanStatus::Cancelled));
        }
        for status in [PlanStatus::Completed, PlanStatus::Cancelled] {
            assert!(status.next(PlanAction::Cancel).is_err());
            assert!(status.available_actions().is_empty());
        }
        assert_eq!(PlanStatus::Draft.available_actions(), vec![PlanAction::Submit, PlanAction::Cancel]);
    }

    #[test]
    fn test_patch_rules() {
        let mut plan = draft();
        plan.status = PlanStatus::Completed;
        assert_eq!(
            plan.apply(PlanPatch { name: Some("x".into()), ..PlanPatch::default() }, Utc::now()),
            Err(WorkflowError::PlanClosed(PlanStatus::Completed))
        );
        plan.apply(PlanPatch::marker_size(500), Utc::now()).unwrap();
        assert_eq!(plan.marker_size, MARKER_SIZE_MAX);
    }

    #[test]
    fn test_delete_confirmation_policy() {
        let mut plan = draft();
        assert!(plan.check_delete(DeleteConfirmation::Single).is_ok());
        plan.status = PlanStatus::Active;
        assert_eq!(
            plan.check_delete(DeleteConfirmation::Single),
            Err(WorkflowError::ConfirmationRequired(PlanStatus::Active))
        );
        assert!(plan.check_delete(DeleteConfirmation::Double).is_ok());
        plan.status = PlanStatus::Cancelled;
        assert!(plan.check_delete(DeleteConfirmation::Single).is_ok());
    }

    #[test]
    fn test_camel_case_plan_payload() {
        let new: NewPlan = serde_json::from_str(
            r#"{"name": "Drain T-4", "equipmentTag": "T-4", "workOrder": "WO-77", "markerSize": 2}"#,
        )
        .unwrap();
        assert_eq!(new.equipment_tag, "T-4");
        assert_eq!(new.work_order, "WO-77");
        let plan = new.into_plan(Uuid::new_v4(), Uuid::new_v4(), admin(), Utc::now());
        assert_eq!(plan.marker_size, MARKER_SIZE_MIN);
    }
}
