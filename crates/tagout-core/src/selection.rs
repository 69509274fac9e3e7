//! Active-annotation selection and the review lock.

use crate::identity::AnnotationId;

/// Tracks the single active annotation and the global lock flag.
///
/// While locked, only the selected annotation is visible and pointer
/// interaction is limited to toggling the selection. The editor is
/// responsible for forcing the select tool whenever the lock flips.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    active: Option<AnnotationId>,
    locked: bool,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected annotation, if any.
    pub fn active(&self) -> Option<AnnotationId> {
        self.active
    }

    pub fn is_selected(&self, id: AnnotationId) -> bool {
        self.active == Some(id)
    }

    /// Whether review lock mode is on.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Make `id` the active annotation.
    pub fn select(&mut self, id: AnnotationId) {
        self.active = Some(id);
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Forget `id` if it was the active annotation (after a delete).
    pub fn forget(&mut self, id: AnnotationId) {
        if self.active == Some(id) {
            self.active = None;
        }
    }

    /// Apply a pointer click that hit `hit` (or nothing).
    ///
    /// Unlocked: select the hit, clear on a miss. Locked: clicking the
    /// selected annotation again deselects it, clicking another selects it,
    /// and a miss leaves the selection alone.
    pub fn click(&mut self, hit: Option<AnnotationId>) {
        match (self.locked, hit) {
            (true, Some(id)) if self.active == Some(id) => self.active = None,
            (true, Some(id)) => self.active = Some(id),
            (true, None) => {}
            (false, Some(id)) => self.active = Some(id),
            (false, None) => self.active = None,
        }
    }

    /// Set the lock flag. Any change of the flag clears the selection.
    /// Returns whether the flag changed.
    pub fn set_locked(&mut self, locked: bool) -> bool {
        if self.locked == locked {
            return false;
        }
        self.locked = locked;
        self.active = None;
        true
    }

    /// Whether `id` should be drawn: everything while unlocked, only the
    /// selection while locked.
    pub fn is_visible(&self, id: AnnotationId) -> bool {
        !self.locked || self.active == Some(id)
    }
}
