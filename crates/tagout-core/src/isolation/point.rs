//! Isolation points and their per-point lifecycle.

use super::WorkflowError;
use crate::geometry::Polyline;
use crate::identity::{PlanId, PointId, UserRef};
use chrono::{DateTime, Utc};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    #[serde(alias = "workPoint")]
    WorkPoint,
    #[default]
    Valve,
    #[serde(alias = "blind_flange", alias = "blindFlange")]
    Blindflange,
    Electrical,
    Drain,
    Vent,
    Lock,
    Instrument,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointStatus {
    #[default]
    Pending,
    Isolated,
    Verified,
    Restored,
}

impl PointStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Isolated => "isolated",
            Self::Verified => "verified",
            Self::Restored => "restored",
        }
    }

    /// The single legal next action, if any.
    pub fn next_action(self) -> Option<PointAction> {
        match self {
            Self::Pending => Some(PointAction::Isolate),
            Self::Isolated => Some(PointAction::Verify),
            Self::Verified => Some(PointAction::Restore),
            Self::Restored => None,
        }
    }
}

impl fmt::Display for PointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointAction {
    Isolate,
    Verify,
    Restore,
}

impl PointAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Isolate => "isolate",
            Self::Verify => "verify",
            Self::Restore => "restore",
        }
    }

    /// Status the point must be in for this action.
    pub fn requires(self) -> PointStatus {
        match self {
            Self::Isolate => PointStatus::Pending,
            Self::Verify => PointStatus::Isolated,
            Self::Restore => PointStatus::Verified,
        }
    }

    pub fn target(self) -> PointStatus {
        match self {
            Self::Isolate => PointStatus::Isolated,
            Self::Verify => PointStatus::Verified,
            Self::Restore => PointStatus::Restored,
        }
    }
}

impl fmt::Display for PointAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who performed a transition and when. Written once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub by: UserRef,
    pub at: DateTime<Utc>,
}

/// One physical isolation action within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationPoint {
    pub id: PointId,
    #[serde(alias = "planId")]
    pub plan_id: PlanId,
    #[serde(alias = "pointType")]
    pub point_type: PointType,
    #[serde(default)]
    pub status: PointStatus,
    #[serde(alias = "tagNumber")]
    pub tag_number: String,
    pub sequence: u32,
    #[serde(default, alias = "normalPosition")]
    pub normal_position: String,
    #[serde(default, alias = "isolatedPosition")]
    pub isolated_position: String,
    pub position: Point,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub isolated: Option<AuditStamp>,
    #[serde(default)]
    pub verified: Option<AuditStamp>,
    #[serde(default)]
    pub restored: Option<AuditStamp>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl IsolationPoint {
    /// Advance the point one step and stamp the actor.
    ///
    /// Anything but the single legal next action is rejected, so stamps are
    /// never overwritten.
    pub fn apply_action(&mut self, action: PointAction, actor: &UserRef, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if self.status != action.requires() {
            return Err(WorkflowError::IllegalPointTransition { from: self.status, action });
        }
        let stamp = AuditStamp { by: actor.clone(), at: now };
        let slot = match action {
            PointAction::Isolate => &mut self.isolated,
            PointAction::Verify => &mut self.verified,
            PointAction::Restore => &mut self.restored,
        };
        if slot.is_some() {
            return Err(WorkflowError::IllegalPointTransition { from: self.status, action });
        }
        *slot = Some(stamp);
        self.status = action.target();
        self.updated_at = now;
        Ok(())
    }

    pub fn stamp(&self, action: PointAction) -> Option<&AuditStamp> {
        match action {
            PointAction::Isolate => self.isolated.as_ref(),
            PointAction::Verify => self.verified.as_ref(),
            PointAction::Restore => self.restored.as_ref(),
        }
    }

    /// Apply a definition edit. Whether edits are allowed is the plan's call.
    pub fn apply(&mut self, patch: PointPatch, now: DateTime<Utc>) {
        let PointPatch {
            point_type,
            tag_number,
            normal_position,
            isolated_position,
            position,
            notes,
        } = patch;
        if let Some(v) = point_type {
            self.point_type = v;
        }
        if let Some(v) = tag_number {
            self.tag_number = v;
        }
        if let Some(v) = normal_position {
            self.normal_position = v;
        }
        if let Some(v) = isolated_position {
            self.isolated_position = v;
        }
        if let Some(v) = position {
            self.position = v;
        }
        if let Some(v) = notes {
            self.notes = v;
        }
        self.updated_at = now;
    }
}

/// A marker hit-tests as a single vertex.
impl Polyline for IsolationPoint {
    fn points(&self) -> &[Point] {
        std::slice::from_ref(&self.position)
    }
}

/// Create payload for a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPoint {
    #[serde(alias = "pointType")]
    pub point_type: PointType,
    #[serde(alias = "tagNumber")]
    pub tag_number: String,
    #[serde(default, alias = "normalPosition")]
    pub normal_position: String,
    #[serde(default, alias = "isolatedPosition")]
    pub isolated_position: String,
    pub position: Point,
    #[serde(default)]
    pub notes: String,
}

impl NewPoint {
    pub fn new(point_type: PointType, tag_number: impl Into<String>, position: Point) -> Self {
        Self {
            point_type,
            tag_number: tag_number.into(),
            normal_position: String::new(),
            isolated_position: String::new(),
            position,
            notes: String::new(),
        }
    }

    pub fn into_point(self, id: PointId, plan_id: PlanId, sequence: u32, now: DateTime<Utc>) -> IsolationPoint {
        IsolationPoint {
            id,
            plan_id,
            point_type: self.point_type,
            status: PointStatus::Pending,
            tag_number: self.tag_number.trim().to_string(),
            sequence,
            normal_position: self.normal_position,
            isolated_position: self.isolated_position,
            position: self.position,
            notes: self.notes,
            isolated: None,
            verified: None,
            restored: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial point definition update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointPatch {
    #[serde(skip_serializing_if = "Option::is_none", alias = "pointType")]
    pub point_type: Option<PointType>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "tagNumber")]
    pub tag_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "normalPosition")]
    pub normal_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "isolatedPosition")]
    pub isolated_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PointPatch {
    pub fn moved_to(position: Point) -> Self {
        Self { position: Some(position), ..Self::default() }
    }

    pub fn retyped(point_type: PointType) -> Self {
        Self { point_type: Some(point_type), ..Self::default() }
    }
}

/// Sequence number for a new point: one past the highest in use.
/// Existing points are never renumbered, so inner gaps stay open while
/// the number of a deleted last point is handed out again.
pub fn next_sequence<'a, I>(points: I) -> u32
where
    I: IntoIterator<Item = &'a IsolationPoint>,
{
    points.into_iter().map(|p| p.sequence).max().unwrap_or(0) + 1
}

/// One stamped transition, for sign-off sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub point_id: PointId,
    pub sequence: u32,
    pub tag_number: String,
    pub action: PointAction,
    pub stamp: AuditStamp,
}

/// Every recorded stamp, ordered by point sequence then lifecycle order.
pub fn audit_trail(points: &[IsolationPoint]) -> Vec<AuditEntry> {
    let mut ordered: Vec<&IsolationPoint> = points.iter().collect();
    ordered.sort_by_key(|p| p.sequence);
    ordered
        .into_iter()
        .flat_map(|p| {
            [PointAction::Isolate, PointAction::Verify, PointAction::Restore]
                .into_iter()
                .filter_map(move |action| {
                    p.stamp(action).map(|stamp| AuditEntry {
                        point_id: p.id,
                        sequence: p.sequence,
                        tag_number: p.tag_number.clone(),
                        action,
                        stamp: stamp.clone(),
                    })
                })
        })
        .collect()
}

/// Point counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProgress {
    pub pending: usize,
    pub isolated: usize,
    pub verified: usize,
    pub restored: usize,
}

impl PlanProgress {
    pub fn of(points: &[IsolationPoint]) -> Self {
        points.iter().fold(Self::default(), |mut acc, p| {
            match p.status {
                PointStatus::Pending => acc.pending += 1,
                PointStatus::Isolated => acc.isolated += 1,
                PointStatus::Verified => acc.verified += 1,
                PointStatus::Restored => acc.restored += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.pending + self.isolated + self.verified + self.restored
    }

    /// Every point verified or beyond; the work area is safe.
    pub fn all_verified(&self) -> bool {
        self.total() > 0 && self.pending == 0 && self.isolated == 0
    }
}
