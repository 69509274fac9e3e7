//! Tagout Core Library
//!
//! Platform-agnostic annotation and lockout-tagout logic for process diagrams.

pub mod annotation;
pub mod camera;
pub mod color;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod identity;
pub mod input;
pub mod isolation;
pub mod selection;
pub mod storage;
pub mod store;
pub mod surface;
pub mod tools;

pub use annotation::{Annotation, AnnotationKind, AnnotationPatch, InspectionStatus, NewAnnotation};
pub use camera::Camera;
pub use color::SerializableColor;
pub use config::EditorConfig;
pub use editor::{DiagramEditor, EditorResponse};
pub use identity::{Actor, AnnotationId, DiagramId, PlanId, PointId, Role, UserRef};
pub use input::{ClickTracker, Key, KeyInput, Modifiers, MouseButton, PointerEvent};
pub use isolation::{
    IsolationPlan, IsolationPoint, PlanAction, PlanCommand, PlanStatus, PlanWorkspace, PointAction, PointStatus,
    PointType, WorkflowError,
};
pub use selection::SelectionController;
pub use storage::{MemoryStore, PersistenceApi, PersistenceError, PersistenceResult};
pub use store::AnnotationStore;
pub use surface::{DiagramSurface, SurfaceProvider};
pub use tools::{DrawingSession, ToolKind};
