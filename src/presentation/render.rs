// Render model dispatch - pure mapping from component data to view models
//
// Renderers never fail: a component whose records don't match its kind's
// expectations degrades to the empty state.
use crate::domain::record::{DataRecord, FieldValue};
use crate::domain::registry::ComponentKind;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventItem {
    pub time: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum RenderModel {
    Empty,
    Metric { label: String, value: f64, unit: String },
    Series { points: Vec<SeriesPoint> },
    Slices { slices: Vec<Slice> },
    Gauge { value: f64, min: f64, max: f64, unit: String },
    Progress { value: f64, min: f64, max: f64 },
    Cells { cells: Vec<Cell> },
    Table { columns: Vec<String>, rows: Vec<Vec<Value>> },
    Text { body: String },
    Media { src: String, alt: String },
    Embed { src: String },
    Html { html: String },
    Events { events: Vec<EventItem> },
    Board { columns: BTreeMap<String, Vec<String>> },
    Markers { markers: Vec<Marker> },
}

fn config_str<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn config_num(config: &Map<String, Value>, key: &str, fallback: f64) -> f64 {
    config.get(key).and_then(Value::as_f64).unwrap_or(fallback)
}

fn number(record: &DataRecord, field: &str) -> Option<f64> {
    match record.value(field)? {
        FieldValue::Number(n) => Some(*n),
        _ => None,
    }
}

fn text(record: &DataRecord, field: &str) -> Option<String> {
    record.value(field).map(|v| match v {
        FieldValue::String(s) => s.clone(),
        other => other.as_json().to_string().trim_matches('"').to_string(),
    })
}

/// Exhaustive dispatch over the closed kind enumeration.
pub fn render_model(
    kind: ComponentKind,
    config: &Map<String, Value>,
    records: &[DataRecord],
) -> RenderModel {
    match kind {
        ComponentKind::MetricCard => {
            let field = config_str(config, "valueField").unwrap_or("value");
            match records.first().and_then(|r| number(r, field)) {
                Some(value) => RenderModel::Metric {
                    label: config_str(config, "label").unwrap_or_default().to_string(),
                    value,
                    unit: config_str(config, "unit").unwrap_or_default().to_string(),
                },
                None => RenderModel::Empty,
            }
        }
        ComponentKind::LineChart | ComponentKind::AreaChart | ComponentKind::ScatterPlot => {
            series(config, records, "xField", "yField")
        }
        ComponentKind::BarChart => series(config, records, "categoryField", "valueField"),
        ComponentKind::PieChart | ComponentKind::Treemap => {
            slices(config, records, "labelField", "valueField")
        }
        ComponentKind::FunnelChart => slices(config, records, "stageField", "valueField"),
        ComponentKind::Gauge => {
            let field = config_str(config, "valueField").unwrap_or("value");
            match records.first().and_then(|r| number(r, field)) {
                Some(value) => RenderModel::Gauge {
                    value,
                    min: config_num(config, "min", 0.0),
                    max: config_num(config, "max", 100.0),
                    unit: config_str(config, "unit").unwrap_or_default().to_string(),
                },
                None => RenderModel::Empty,
            }
        }
        ComponentKind::ProgressBar => {
            let field = config_str(config, "valueField").unwrap_or("value");
            match records.first().and_then(|r| number(r, field)) {
                Some(value) => RenderModel::Progress {
                    value,
                    min: config_num(config, "min", 0.0),
                    max: config_num(config, "max", 100.0),
                },
                None => RenderModel::Empty,
            }
        }
        ComponentKind::Heatmap => {
            let x_field = config_str(config, "xField").unwrap_or("x");
            let y_field = config_str(config, "yField").unwrap_or("y");
            let value_field = config_str(config, "valueField").unwrap_or("value");
            let cells: Vec<Cell> = records
                .iter()
                .filter_map(|r| {
                    Some(Cell {
                        x: number(r, x_field)?,
                        y: number(r, y_field)?,
                        value: number(r, value_field)?,
                    })
                })
                .collect();
            if cells.is_empty() {
                RenderModel::Empty
            } else {
                RenderModel::Cells { cells }
            }
        }
        ComponentKind::Table => {
            let Some(first) = records.first() else {
                return RenderModel::Empty;
            };
            let columns: Vec<String> = first.values.keys().cloned().collect();
            let rows = records
                .iter()
                .map(|r| {
                    columns
                        .iter()
                        .map(|c| r.value(c).map(|v| v.as_json()).unwrap_or(Value::Null))
                        .collect()
                })
                .collect();
            RenderModel::Table { columns, rows }
        }
        ComponentKind::TextBlock => match config_str(config, "text") {
            Some(body) => RenderModel::Text {
                body: body.to_string(),
            },
            None => RenderModel::Empty,
        },
        ComponentKind::Image => match config_str(config, "src") {
            Some(src) => RenderModel::Media {
                src: src.to_string(),
                alt: config_str(config, "alt").unwrap_or_default().to_string(),
            },
            None => RenderModel::Empty,
        },
        ComponentKind::Iframe => match config_str(config, "src") {
            Some(src) => RenderModel::Embed {
                src: src.to_string(),
            },
            None => RenderModel::Empty,
        },
        ComponentKind::CustomHtml => match config_str(config, "html") {
            Some(html) => RenderModel::Html {
                html: html.to_string(),
            },
            None => RenderModel::Empty,
        },
        ComponentKind::Timeline => events(config, records, "timeField", "titleField"),
        ComponentKind::Calendar => events(config, records, "dateField", "titleField"),
        ComponentKind::Kanban => {
            let column_field = config_str(config, "columnField").unwrap_or("status");
            let title_field = config_str(config, "titleField").unwrap_or("title");
            let mut columns: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for record in records {
                let (Some(column), Some(title)) =
                    (text(record, column_field), text(record, title_field))
                else {
                    continue;
                };
                columns.entry(column).or_default().push(title);
            }
            if columns.is_empty() {
                RenderModel::Empty
            } else {
                RenderModel::Board { columns }
            }
        }
        ComponentKind::Map => {
            let lat_field = config_str(config, "latField").unwrap_or("lat");
            let lon_field = config_str(config, "lonField").unwrap_or("lon");
            let label_field = config_str(config, "labelField").unwrap_or("label");
            let markers: Vec<Marker> = records
                .iter()
                .filter_map(|r| {
                    Some(Marker {
                        lat: number(r, lat_field)?,
                        lon: number(r, lon_field)?,
                        label: text(r, label_field).unwrap_or_default(),
                    })
                })
                .collect();
            if markers.is_empty() {
                RenderModel::Empty
            } else {
                RenderModel::Markers { markers }
            }
        }
    }
}

fn series(
    config: &Map<String, Value>,
    records: &[DataRecord],
    x_key: &str,
    y_key: &str,
) -> RenderModel {
    let x_field = config_str(config, x_key).unwrap_or("x").to_string();
    let y_field = config_str(config, y_key).unwrap_or("y").to_string();
    let points: Vec<SeriesPoint> = records
        .iter()
        .filter_map(|r| {
            Some(SeriesPoint {
                x: text(r, &x_field)?,
                y: number(r, &y_field)?,
            })
        })
        .collect();
    if points.is_empty() {
        RenderModel::Empty
    } else {
        RenderModel::Series { points }
    }
}

fn slices(
    config: &Map<String, Value>,
    records: &[DataRecord],
    label_key: &str,
    value_key: &str,
) -> RenderModel {
    let label_field = config_str(config, label_key).unwrap_or("label").to_string();
    let value_field = config_str(config, value_key).unwrap_or("value").to_string();
    let slices: Vec<Slice> = records
        .iter()
        .filter_map(|r| {
            Some(Slice {
                label: text(r, &label_field)?,
                value: number(r, &value_field)?,
            })
        })
        .collect();
    if slices.is_empty() {
        RenderModel::Empty
    } else {
        RenderModel::Slices { slices }
    }
}

fn events(
    config: &Map<String, Value>,
    records: &[DataRecord],
    time_key: &str,
    title_key: &str,
) -> RenderModel {
    let time_field = config_str(config, time_key).unwrap_or("time").to_string();
    let title_field = config_str(config, title_key).unwrap_or("title").to_string();
    let events: Vec<EventItem> = records
        .iter()
        .filter_map(|r| {
            Some(EventItem {
                time: text(r, &time_field)?,
                title: text(r, &title_field)?,
            })
        })
        .collect();
    if events.is_empty() {
        RenderModel::Empty
    } else {
        RenderModel::Events { events }
    }
}
