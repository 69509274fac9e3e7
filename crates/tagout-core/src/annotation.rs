//! Persisted diagram markings.

use crate::color::SerializableColor;
use crate::geometry::Polyline;
use crate::identity::{AnnotationId, DiagramId};
use chrono::{DateTime, Utc};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Fewest points an annotation may be persisted with.
pub const MIN_POINTS: usize = 2;

/// What a marking outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    #[default]
    Pipe,
    Tank,
    Component,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 3] = [Self::Pipe, Self::Tank, Self::Component];

    /// Prefix of generated labels, e.g. `RØR-001`.
    pub fn label_prefix(self) -> &'static str {
        match self {
            Self::Pipe => "RØR",
            Self::Tank => "TANK",
            Self::Component => "KOMP",
        }
    }

    /// Color new annotations of this kind are drawn with.
    pub fn default_color(self) -> SerializableColor {
        match self {
            Self::Pipe => SerializableColor::rgb(0x25, 0x63, 0xeb),
            Self::Tank => SerializableColor::rgb(0x16, 0xa3, 0x4a),
            Self::Component => SerializableColor::rgb(0xf5, 0x9e, 0x0b),
        }
    }
}

/// Inspection outcome recorded against a marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Ok,
    Warning,
    Critical,
    #[default]
    #[serde(alias = "notInspected")]
    NotInspected,
}

/// A persisted polyline marking over one diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(alias = "diagramId")]
    pub diagram_id: DiagramId,
    pub kind: AnnotationKind,
    pub points: Vec<Point>,
    pub color: SerializableColor,
    #[serde(alias = "strokeWidth")]
    pub stroke_width: f64,
    #[serde(default, alias = "kksNumber", alias = "kks_number")]
    pub label: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub dimension: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "inspectionStatus")]
    pub inspection_status: InspectionStatus,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Annotation {
    /// Apply the fields present in `patch`. Point-count validation is the caller's job.
    pub fn apply(&mut self, patch: AnnotationPatch, now: DateTime<Utc>) {
        let AnnotationPatch {
            kind,
            points,
            color,
            stroke_width,
            label,
            material,
            dimension,
            description,
            inspection_status,
        } = patch;
        if let Some(v) = kind {
            self.kind = v;
        }
        if let Some(v) = points {
            self.points = v;
        }
        if let Some(v) = color {
            self.color = v;
        }
        if let Some(v) = stroke_width {
            self.stroke_width = v;
        }
        if let Some(v) = label {
            self.label = v;
        }
        if let Some(v) = material {
            self.material = v;
        }
        if let Some(v) = dimension {
            self.dimension = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
        if let Some(v) = inspection_status {
            self.inspection_status = v;
        }
        self.updated_at = now;
    }
}

impl Polyline for Annotation {
    fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Create payload for an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub kind: AnnotationKind,
    pub points: Vec<Point>,
    pub color: SerializableColor,
    #[serde(alias = "strokeWidth")]
    pub stroke_width: f64,
    #[serde(default, alias = "kksNumber", alias = "kks_number")]
    pub label: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub dimension: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "inspectionStatus")]
    pub inspection_status: InspectionStatus,
}

impl NewAnnotation {
    pub fn into_annotation(self, id: AnnotationId, diagram_id: DiagramId, now: DateTime<Utc>) -> Annotation {
        Annotation {
            id,
            diagram_id,
            kind: self.kind,
            points: self.points,
            color: self.color,
            stroke_width: self.stroke_width,
            label: self.label,
            material: self.material,
            dimension: self.dimension,
            description: self.description,
            inspection_status: self.inspection_status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnnotationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "strokeWidth")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "kksNumber", alias = "kks_number")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "inspectionStatus")]
    pub inspection_status: Option<InspectionStatus>,
}

impl AnnotationPatch {
    pub fn status(status: InspectionStatus) -> Self {
        Self { inspection_status: Some(status), ..Self::default() }
    }
}

/// Label for the next annotation of `kind`: `{prefix}-{n:03}` where `n`
/// is one more than the number of existing annotations of that kind.
pub fn default_label<'a, I>(kind: AnnotationKind, existing: I) -> String
where
    I: IntoIterator<Item = &'a Annotation>,
{
    let count = existing.into_iter().filter(|a| a.kind == kind).count();
    format!("{}-{:03}", kind.label_prefix(), count + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn annotation(kind: AnnotationKind) -> Annotation {
        NewAnnotation {
            kind,
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
            color: kind.default_color(),
            stroke_width: 3.0,
            label: String::new(),
            material: String::new(),
            dimension: String::new(),
            description: String::new(),
            inspection_status: InspectionStatus::NotInspected,
        }
        .into_annotation(Uuid::new_v4(), Uuid::nil(), Utc::now())
    }

    #[test]
    fn test_default_label_counts_same_kind_only() {
        let existing = vec![
            annotation(AnnotationKind::Pipe),
            annotation(AnnotationKind::Tank),
            annotation(AnnotationKind::Pipe),
            annotation(AnnotationKind::Component),
            annotation(AnnotationKind::Tank),
        ];
        assert_eq!(default_label(AnnotationKind::Pipe, &existing), "RØR-003");
        assert_eq!(default_label(AnnotationKind::Tank, &existing), "TANK-003");
        assert_eq!(default_label(AnnotationKind::Component, &existing), "KOMP-002");
        assert_eq!(default_label(AnnotationKind::Tank, Vec::<Annotation>::new().iter()), "TANK-001");
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut a = annotation(AnnotationKind::Pipe);
        a.label = "RØR-001".into();
        let before = a.clone();
        let later = before.updated_at + chrono::Duration::seconds(5);
        a.apply(AnnotationPatch::status(InspectionStatus::Critical), later);
        assert_eq!(a.inspection_status, InspectionStatus::Critical);
        assert_eq!(a.label, before.label);
        assert_eq!(a.points, before.points);
        assert_eq!(a.updated_at, later);
    }

    #[test]
    fn test_camel_case_payload_is_normalized() {
        let json = r##"{
            "kind": "tank",
            "points": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}],
            "color": "#16a34a",
            "strokeWidth": 3.0,
            "kksNumber": "TANK-007",
            "inspectionStatus": "notInspected"
        }"##;
        let parsed: NewAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.label, "TANK-007");
        assert_eq!(parsed.stroke_width, 3.0);
        assert_eq!(parsed.inspection_status, InspectionStatus::NotInspected);

        let patch: AnnotationPatch = serde_json::from_str(r#"{"inspection_status": "warning"}"#).unwrap();
        assert_eq!(patch, AnnotationPatch::status(InspectionStatus::Warning));
    }
}
