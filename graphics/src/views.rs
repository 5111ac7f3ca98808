//! Render modes a mesh is shown with, per view.
//!
//! Every view (viewport) sharing the scene picks its own [`RenderMode`] for
//! each mesh. The GPU buffers of the mesh are shared, so they must hold the
//! union of what every view draws.

use std::collections::BTreeMap;
use std::fmt;

use crate::attributes::AttributeRequirementSet;
use crate::render_mode::{self, RenderMode};

/// Identifies one view sharing the scene's GPU data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u32);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view{}", self.0)
    }
}

/// Render mode of one mesh in every view that shows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewModes {
    modes: BTreeMap<ViewId, RenderMode>,
}

impl ViewModes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mode of `view`. Returns the mode it replaces.
    pub fn set(&mut self, view: ViewId, mode: RenderMode) -> Option<RenderMode> {
        self.modes.insert(view, mode)
    }

    pub fn get(&self, view: ViewId) -> Option<RenderMode> {
        self.modes.get(&view).copied()
    }

    pub fn remove(&mut self, view: ViewId) -> Option<RenderMode> {
        self.modes.remove(&view)
    }

    pub fn clear(&mut self) {
        self.modes.clear();
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Views with a mode, in ascending order.
    pub fn views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.modes.keys().copied()
    }

    /// Attributes needed to draw every view. Empty without views.
    pub fn required_attributes(&self) -> AttributeRequirementSet {
        self.modes
            .values()
            .map(render_mode::required_attributes)
            .fold(AttributeRequirementSet::empty(), |acc, rq| acc.union(&rq))
    }
}
