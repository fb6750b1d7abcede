// Component type registry - closed enumeration of component kinds and their defaults
use super::component::{Component, GridRect};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    MetricCard,
    LineChart,
    BarChart,
    PieChart,
    AreaChart,
    ScatterPlot,
    Gauge,
    Heatmap,
    Treemap,
    FunnelChart,
    Table,
    ProgressBar,
    TextBlock,
    Image,
    Iframe,
    CustomHtml,
    Timeline,
    Calendar,
    Kanban,
    Map,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 20] = [
        ComponentKind::MetricCard,
        ComponentKind::LineChart,
        ComponentKind::BarChart,
        ComponentKind::PieChart,
        ComponentKind::AreaChart,
        ComponentKind::ScatterPlot,
        ComponentKind::Gauge,
        ComponentKind::Heatmap,
        ComponentKind::Treemap,
        ComponentKind::FunnelChart,
        ComponentKind::Table,
        ComponentKind::ProgressBar,
        ComponentKind::TextBlock,
        ComponentKind::Image,
        ComponentKind::Iframe,
        ComponentKind::CustomHtml,
        ComponentKind::Timeline,
        ComponentKind::Calendar,
        ComponentKind::Kanban,
        ComponentKind::Map,
    ];

    pub fn parse(s: &str) -> Result<ComponentKind, RegistryError> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownComponentType {
                kind: s.to_string(),
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::MetricCard => "metric-card",
            ComponentKind::LineChart => "line-chart",
            ComponentKind::BarChart => "bar-chart",
            ComponentKind::PieChart => "pie-chart",
            ComponentKind::AreaChart => "area-chart",
            ComponentKind::ScatterPlot => "scatter-plot",
            ComponentKind::Gauge => "gauge",
            ComponentKind::Heatmap => "heatmap",
            ComponentKind::Treemap => "treemap",
            ComponentKind::FunnelChart => "funnel-chart",
            ComponentKind::Table => "table",
            ComponentKind::ProgressBar => "progress-bar",
            ComponentKind::TextBlock => "text-block",
            ComponentKind::Image => "image",
            ComponentKind::Iframe => "iframe",
            ComponentKind::CustomHtml => "custom-html",
            ComponentKind::Timeline => "timeline",
            ComponentKind::Calendar => "calendar",
            ComponentKind::Kanban => "kanban",
            ComponentKind::Map => "map",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::MetricCard => "Metric Card",
            ComponentKind::LineChart => "Line Chart",
            ComponentKind::BarChart => "Bar Chart",
            ComponentKind::PieChart => "Pie Chart",
            ComponentKind::AreaChart => "Area Chart",
            ComponentKind::ScatterPlot => "Scatter Plot",
            ComponentKind::Gauge => "Gauge",
            ComponentKind::Heatmap => "Heatmap",
            ComponentKind::Treemap => "Treemap",
            ComponentKind::FunnelChart => "Funnel Chart",
            ComponentKind::Table => "Table",
            ComponentKind::ProgressBar => "Progress Bar",
            ComponentKind::TextBlock => "Text Block",
            ComponentKind::Image => "Image",
            ComponentKind::Iframe => "Embedded Frame",
            ComponentKind::CustomHtml => "Custom HTML",
            ComponentKind::Timeline => "Timeline",
            ComponentKind::Calendar => "Calendar",
            ComponentKind::Kanban => "Kanban Board",
            ComponentKind::Map => "Map",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ComponentKind::MetricCard => "hash",
            ComponentKind::LineChart => "trending-up",
            ComponentKind::BarChart => "bar-chart-2",
            ComponentKind::PieChart => "pie-chart",
            ComponentKind::AreaChart => "activity",
            ComponentKind::ScatterPlot => "git-commit",
            ComponentKind::Gauge => "gauge",
            ComponentKind::Heatmap => "grid",
            ComponentKind::Treemap => "layout",
            ComponentKind::FunnelChart => "filter",
            ComponentKind::Table => "table",
            ComponentKind::ProgressBar => "minus",
            ComponentKind::TextBlock => "type",
            ComponentKind::Image => "image",
            ComponentKind::Iframe => "external-link",
            ComponentKind::CustomHtml => "code",
            ComponentKind::Timeline => "clock",
            ComponentKind::Calendar => "calendar",
            ComponentKind::Kanban => "columns",
            ComponentKind::Map => "map-pin",
        }
    }

    /// Default rect when a component of this kind is dropped on the grid.
    pub fn default_rect(&self) -> GridRect {
        let (w, h) = match self {
            ComponentKind::MetricCard | ComponentKind::Gauge | ComponentKind::ProgressBar => (3, 4),
            ComponentKind::LineChart
            | ComponentKind::BarChart
            | ComponentKind::AreaChart
            | ComponentKind::ScatterPlot
            | ComponentKind::Heatmap
            | ComponentKind::Treemap => (6, 8),
            ComponentKind::PieChart | ComponentKind::FunnelChart => (4, 8),
            ComponentKind::Table | ComponentKind::Kanban | ComponentKind::Calendar => (8, 10),
            ComponentKind::TextBlock | ComponentKind::Image => (4, 4),
            ComponentKind::Iframe | ComponentKind::CustomHtml | ComponentKind::Map => (6, 8),
            ComponentKind::Timeline => (8, 6),
        };
        GridRect::new(0, 0, w, h)
    }

    /// Default config bag. Keys are the knobs the renderer for this kind
    /// understands; callers may override or extend them freely.
    pub fn default_config(&self) -> Map<String, Value> {
        let value = match self {
            ComponentKind::MetricCard => json!({"valueField": "value", "label": "", "unit": ""}),
            ComponentKind::LineChart => {
                json!({"xField": "x", "yField": "y", "smooth": false, "showLegend": true})
            }
            ComponentKind::BarChart => {
                json!({"categoryField": "category", "valueField": "value", "horizontal": false})
            }
            ComponentKind::PieChart => {
                json!({"labelField": "label", "valueField": "value", "donut": false})
            }
            ComponentKind::AreaChart => {
                json!({"xField": "x", "yField": "y", "stacked": false})
            }
            ComponentKind::ScatterPlot => json!({"xField": "x", "yField": "y"}),
            ComponentKind::Gauge => {
                json!({"valueField": "value", "min": 0.0, "max": 100.0, "unit": ""})
            }
            ComponentKind::Heatmap => {
                json!({"xField": "x", "yField": "y", "valueField": "value"})
            }
            ComponentKind::Treemap => json!({"labelField": "label", "valueField": "value"}),
            ComponentKind::FunnelChart => json!({"stageField": "stage", "valueField": "value"}),
            ComponentKind::Table => json!({"pageSize": 10, "striped": true}),
            ComponentKind::ProgressBar => {
                json!({"valueField": "value", "min": 0.0, "max": 100.0})
            }
            ComponentKind::TextBlock => json!({"text": "", "align": "left"}),
            ComponentKind::Image => json!({"src": "", "alt": "", "fit": "contain"}),
            ComponentKind::Iframe => json!({"src": "", "allowFullscreen": false}),
            ComponentKind::CustomHtml => json!({"html": ""}),
            ComponentKind::Timeline => json!({"timeField": "time", "titleField": "title"}),
            ComponentKind::Calendar => json!({"dateField": "date", "titleField": "title"}),
            ComponentKind::Kanban => json!({"columnField": "status", "titleField": "title"}),
            ComponentKind::Map => {
                json!({"latField": "lat", "lonField": "lon", "labelField": "label", "zoom": 4})
            }
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Caller-supplied overrides applied on top of a kind's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentOverrides {
    pub name: Option<String>,
    pub position: Option<GridRect>,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Build a component of the given kind, merging defaults with overrides.
/// Override config keys replace default keys; the rest of the default bag
/// is kept.
pub fn instantiate(kind: &str, overrides: ComponentOverrides) -> Result<Component, RegistryError> {
    let kind = ComponentKind::parse(kind)?;
    let name = overrides.name.unwrap_or_else(|| kind.label().to_string());
    let position = overrides.position.unwrap_or_else(|| kind.default_rect());

    let mut config = kind.default_config();
    for (key, value) in overrides.config {
        config.insert(key, value);
    }

    let mut component = Component::new(kind, name, position);
    component.config = config;
    Ok(component)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("unknown component type `{kind}`")]
    UnknownComponentType { kind: String },
}
