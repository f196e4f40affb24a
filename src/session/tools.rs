//! Per-controller tool selection

use std::collections::HashMap;

use crate::math::Pose;
use crate::voxel::brush::{BrushShape, BrushStroke};
use crate::voxel::modifier::Modifier;

/// Host-side identity of an input device or pointer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub u64);

/// A brush shape paired with the operator it applies
#[derive(Clone, Debug)]
pub struct Tool {
    pub name: String,
    pub shape: BrushShape,
    pub modifier: Modifier,
}

impl Tool {
    pub fn new(name: impl Into<String>, shape: BrushShape, modifier: Modifier) -> Self {
        Self {
            name: name.into(),
            shape,
            modifier,
        }
    }

    /// Place the tool's shape at a controller pose
    pub fn stroke_at(&self, pose: Pose) -> BrushStroke {
        BrushStroke::new(self.shape.clone(), pose)
    }
}

/// Which tool each controller currently holds.
///
/// Owned by the session (or whatever host object needs it) and passed
/// explicitly.
#[derive(Clone, Debug, Default)]
pub struct ToolBox {
    selected: HashMap<ControllerId, Tool>,
}

impl ToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a tool, returning the one it replaces
    pub fn select(&mut self, controller: ControllerId, tool: Tool) -> Option<Tool> {
        log::debug!("Controller {} selected tool {}", controller.0, tool.name);
        self.selected.insert(controller, tool)
    }

    pub fn current(&self, controller: ControllerId) -> Option<&Tool> {
        self.selected.get(&controller)
    }

    pub fn current_mut(&mut self, controller: ControllerId) -> Option<&mut Tool> {
        self.selected.get_mut(&controller)
    }

    /// Forget a controller's selection (device disconnected)
    pub fn release(&mut self, controller: ControllerId) -> Option<Tool> {
        self.selected.remove(&controller)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn sphere_tool(name: &str) -> Tool {
        Tool::new(name, BrushShape::Sphere { radius: 2.0 }, Modifier::union())
    }

    #[test]
    fn test_selection_is_per_controller() {
        crate::core::logging::try_init_for_tests();
        let mut tools = ToolBox::new();
        let left = ControllerId(1);
        let right = ControllerId(2);

        assert!(tools.select(left, sphere_tool("add")).is_none());
        tools.select(right, Tool::new("carve", BrushShape::Box { half_extents: Vec3::ONE }, Modifier::subtract()));

        assert_eq!(tools.current(left).unwrap().name, "add");
        assert_eq!(tools.current(right).unwrap().name, "carve");
        assert_eq!(tools.len(), 2);
    }

    #[test]
    fn test_reselect_and_release() {
        let mut tools = ToolBox::new();
        let id = ControllerId(7);
        tools.select(id, sphere_tool("a"));
        let old = tools.select(id, sphere_tool("b")).unwrap();
        assert_eq!(old.name, "a");
        assert_eq!(tools.release(id).unwrap().name, "b");
        assert!(tools.current(id).is_none());
        assert!(tools.is_empty());
    }

    #[test]
    fn test_stroke_at_pose() {
        let tool = sphere_tool("add");
        let stroke = tool.stroke_at(Pose::at(Vec3::new(1.0, 2.0, 3.0)));
        assert!(stroke.distance_world(Vec3::new(1.0, 2.0, 3.0)) < 0.0);
        assert!(stroke.distance_world(Vec3::new(4.0, 2.0, 3.0)) > 0.0);
    }
}
