// Component and grid position domain models
use super::registry::ComponentKind;
use super::schema::FieldSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Width of the layout grid in columns.
pub const GRID_COLUMNS: u32 = 12;

pub const DEFAULT_MIN_SPAN: u32 = 2;
pub const DEFAULT_MAX_W: u32 = GRID_COLUMNS;
pub const DEFAULT_MAX_H: u32 = 20;

pub type ComponentId = Uuid;

/// A component's position on the grid. Overlapping rects are allowed;
/// the grid is advisory, not a packing solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default = "default_min_span")]
    pub min_w: u32,
    #[serde(default = "default_min_span")]
    pub min_h: u32,
    #[serde(default = "default_max_w")]
    pub max_w: u32,
    #[serde(default = "default_max_h")]
    pub max_h: u32,
    /// Static components are excluded from drag/resize.
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

fn default_min_span() -> u32 {
    DEFAULT_MIN_SPAN
}

fn default_max_w() -> u32 {
    DEFAULT_MAX_W
}

fn default_max_h() -> u32 {
    DEFAULT_MAX_H
}

impl GridRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            min_w: DEFAULT_MIN_SPAN,
            min_h: DEFAULT_MIN_SPAN,
            max_w: DEFAULT_MAX_W,
            max_h: DEFAULT_MAX_H,
            is_static: false,
        }
    }

    /// Clamp spans to the declared bounds and the grid width, then pull x
    /// back so the rect stays inside the columns. y is unbounded (the grid
    /// grows downward).
    pub fn clamped(mut self) -> Self {
        let max_w = self.max_w.min(GRID_COLUMNS);
        self.w = self.w.clamp(self.min_w.min(max_w), max_w);
        self.h = self.h.clamp(self.min_h.min(self.max_h), self.max_h);
        self.x = self.x.min(GRID_COLUMNS - self.w);
        self
    }

    pub fn overlaps(&self, other: &GridRect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub name: String,
    pub position: GridRect,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub schema: FieldSchema,
}

impl Component {
    pub fn new(kind: ComponentKind, name: impl Into<String>, position: GridRect) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            position,
            config: serde_json::Map::new(),
            schema: FieldSchema::empty(),
        }
    }
}
