//! Hover tracking: per-object hover flags, target scales, and the single tooltip.

use glam::Vec3;

/// Trees on the island; `ObjectId::Tree` indices must stay below this.
pub const TREE_COUNT: usize = 3;
/// Tooltip anchor height above the pointer hit.
pub const TOOLTIP_LIFT: f32 = 0.5;

/// Scene objects that react to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    IslandBase,
    Dwelling,
    Tree(usize),
}

impl ObjectId {
    pub fn label(self) -> &'static str {
        match self {
            ObjectId::IslandBase => "Mystical Island Base",
            ObjectId::Dwelling => "Ancient Dwelling",
            ObjectId::Tree(_) => "Enchanted Tree",
        }
    }

    /// Scale the object grows to while hovered.
    pub fn hover_scale(self) -> f32 {
        match self {
            ObjectId::IslandBase | ObjectId::Dwelling => 1.1,
            ObjectId::Tree(_) => 1.2,
        }
    }

    pub fn all() -> impl Iterator<Item = ObjectId> {
        [ObjectId::IslandBase, ObjectId::Dwelling]
            .into_iter()
            .chain((0..TREE_COUNT).map(ObjectId::Tree))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipPayload {
    pub label: &'static str,
    /// World-space anchor.
    pub position: Vec3,
    /// Object whose hover produced this tooltip.
    pub source: ObjectId,
}

/// Hover flags plus at most one tooltip.
///
/// Only pointer enter/leave calls mutate it. Both are idempotent: repeating an
/// enter or leave for the same object changes nothing and reports `false`.
#[derive(Debug, Default)]
pub struct HoverState {
    island: bool,
    dwelling: bool,
    trees: [bool; TREE_COUNT],
    tooltip: Option<TooltipPayload>,
    /// Bumped on every effective change so consumers can cheaply detect staleness.
    revision: u64,
}

impl HoverState {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag_mut(&mut self, id: ObjectId) -> Option<&mut bool> {
        match id {
            ObjectId::IslandBase => Some(&mut self.island),
            ObjectId::Dwelling => Some(&mut self.dwelling),
            ObjectId::Tree(i) => self.trees.get_mut(i),
        }
    }

    /// Mark `id` hovered and replace whatever tooltip was showing with its label.
    pub fn on_pointer_enter(&mut self, id: ObjectId, hit: Vec3) -> bool {
        let Some(flag) = self.flag_mut(id) else {
            log::warn!("Pointer enter for unknown object {:?}", id);
            return false;
        };
        let was_hovered = std::mem::replace(flag, true);

        let tooltip = TooltipPayload {
            label: id.label(),
            position: hit + Vec3::Y * TOOLTIP_LIFT,
            source: id,
        };
        let changed = !was_hovered || self.tooltip != Some(tooltip);
        self.tooltip = Some(tooltip);
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Clear `id`'s flag, and the tooltip if `id` produced it.
    pub fn on_pointer_leave(&mut self, id: ObjectId) -> bool {
        let Some(flag) = self.flag_mut(id) else {
            log::warn!("Pointer leave for unknown object {:?}", id);
            return false;
        };
        let was_hovered = std::mem::replace(flag, false);

        let owned_tooltip = self.tooltip.is_some_and(|t| t.source == id);
        if owned_tooltip {
            self.tooltip = None;
        }
        let changed = was_hovered || owned_tooltip;
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Drop every flag and the tooltip (pointer left the canvas, scene unmount).
    pub fn clear(&mut self) {
        if self.tooltip.is_some() || self.hovered().next().is_some() {
            self.revision += 1;
        }
        self.island = false;
        self.dwelling = false;
        self.trees = [false; TREE_COUNT];
        self.tooltip = None;
    }

    pub fn is_hovered(&self, id: ObjectId) -> bool {
        match id {
            ObjectId::IslandBase => self.island,
            ObjectId::Dwelling => self.dwelling,
            ObjectId::Tree(i) => self.trees.get(i).copied().unwrap_or(false),
        }
    }

    /// Scale the smoothing layer should animate `id` towards.
    pub fn target_scale(&self, id: ObjectId) -> f32 {
        if self.is_hovered(id) {
            id.hover_scale()
        } else {
            1.0
        }
    }

    pub fn tooltip(&self) -> Option<&TooltipPayload> {
        self.tooltip.as_ref()
    }

    pub fn hovered(&self) -> impl Iterator<Item = ObjectId> + '_ {
        ObjectId::all().filter(move |&id| self.is_hovered(id))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
