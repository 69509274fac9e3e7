//! Client-side mirror of one diagram's persisted annotations.

use crate::annotation::{Annotation, AnnotationKind, default_label};
use crate::geometry::hit_test;
use crate::identity::{AnnotationId, DiagramId};
use kurbo::{Point, Rect};

/// Annotations of one diagram in list order.
///
/// List order is the order the persistence layer returned them in, with
/// newly created annotations appended. Hit-testing walks this order, so
/// earlier annotations win overlaps.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    diagram_id: DiagramId,
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    /// Empty mirror of `diagram_id`.
    pub fn new(diagram_id: DiagramId) -> Self {
        Self { diagram_id, annotations: Vec::new() }
    }

    pub fn diagram_id(&self) -> DiagramId {
        self.diagram_id
    }

    /// Replace the contents with a fresh listing, dropping foreign records.
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        let diagram_id = self.diagram_id;
        self.annotations = annotations
            .into_iter()
            .filter(|a| a.diagram_id == diagram_id)
            .collect();
    }

    /// Insert a confirmed record, or replace the one with the same id in place.
    pub fn upsert(&mut self, annotation: Annotation) {
        match self.annotations.iter_mut().find(|a| a.id == annotation.id) {
            Some(slot) => *slot = annotation,
            None => self.annotations.push(annotation),
        }
    }

    /// Drop an annotation, returning it if present.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let idx = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(idx))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Annotations in list order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Label the next annotation of `kind` would get.
    pub fn next_label(&self, kind: AnnotationKind) -> String {
        default_label(kind, &self.annotations)
    }

    /// First annotation within `threshold` world units of `point`.
    pub fn hit(&self, point: Point, threshold: f64) -> Option<&Annotation> {
        hit_test(point, &self.annotations, threshold)
    }

    /// Union of all annotation bounds, for fitting the camera to content.
    pub fn bounds(&self) -> Option<Rect> {
        self.annotations
            .iter()
            .filter_map(|a| crate::geometry::polyline_bounds(&a.points))
            .reduce(|acc, r| acc.union(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{InspectionStatus, NewAnnotation};
    use chrono::Utc;
    use uuid::Uuid;

    fn make(diagram: DiagramId, kind: AnnotationKind, points: Vec<Point>) -> Annotation {
        NewAnnotation {
            kind,
            points,
            color: kind.default_color(),
            stroke_width: 3.0,
            label: String::new(),
            material: String::new(),
            dimension: String::new(),
            description: String::new(),
            inspection_status: InspectionStatus::NotInspected,
        }
        .into_annotation(Uuid::new_v4(), diagram, Utc::now())
    }

    #[test]
    fn test_replace_all_filters_other_diagrams() {
        let diagram = Uuid::new_v4();
        let mut store = AnnotationStore::new(diagram);
        let line = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        store.replace_all(vec![
            make(diagram, AnnotationKind::Pipe, line.clone()),
            make(Uuid::new_v4(), AnnotationKind::Pipe, line.clone()),
        ]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let diagram = Uuid::new_v4();
        let mut store = AnnotationStore::new(diagram);
        let line = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let a = make(diagram, AnnotationKind::Pipe, line.clone());
        let b = make(diagram, AnnotationKind::Tank, line.clone());
        store.upsert(a.clone());
        store.upsert(b.clone());

        let mut changed = a.clone();
        changed.inspection_status = InspectionStatus::Ok;
        store.upsert(changed);
        assert_eq!(store.as_slice()[0].id, a.id);
        assert_eq!(store.as_slice()[0].inspection_status, InspectionStatus::Ok);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_hit_prefers_earlier() {
        let diagram = Uuid::new_v4();
        let mut store = AnnotationStore::new(diagram);
        let a = make(diagram, AnnotationKind::Pipe, vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        let b = make(diagram, AnnotationKind::Tank, vec![Point::new(0.0, 4.0), Point::new(100.0, 4.0)]);
        store.upsert(a.clone());
        store.upsert(b.clone());
        assert_eq!(store.hit(Point::new(50.0, 2.0), 5.0).map(|x| x.id), Some(a.id));
        assert_eq!(store.hit(Point::new(50.0, 8.0), 5.0).map(|x| x.id), Some(b.id));
        assert!(store.hit(Point::new(50.0, 50.0), 5.0).is_none());
    }

    #[test]
    fn test_next_label_and_remove() {
        let diagram = Uuid::new_v4();
        let mut store = AnnotationStore::new(diagram);
        let line = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let first = make(diagram, AnnotationKind::Pipe, line.clone());
        store.upsert(first.clone());
        store.upsert(make(diagram, AnnotationKind::Pipe, line.clone()));
        store.upsert(make(diagram, AnnotationKind::Tank, line));
        assert_eq!(store.next_label(AnnotationKind::Pipe), "RØR-003");
        assert_eq!(store.next_label(AnnotationKind::Tank), "TANK-002");

        assert!(store.remove(first.id).is_some());
        assert!(store.remove(first.id).is_none());
        assert_eq!(store.next_label(AnnotationKind::Pipe), "RØR-002");
    }

    #[test]
    fn test_bounds_union() {
        let diagram = Uuid::new_v4();
        let mut store = AnnotationStore::new(diagram);
        assert!(store.bounds().is_none());
        store.upsert(make(diagram, AnnotationKind::Pipe, vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0)]));
        store.upsert(make(diagram, AnnotationKind::Tank, vec![Point::new(-5.0, 2.0), Point::new(3.0, 20.0)]));
        assert_eq!(store.bounds(), Some(Rect::new(-5.0, 0.0, 10.0, 20.0)));
    }
}
