use crate::reports::html_escape;
use core::fmt::Write;
use serde_json::{Map, Value, json};
use strum::{Display, IntoStaticStr};

/// Script tag pulling the plotting library from its CDN.
pub const PLOTLY_CDN: &str = r#"<script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
    Heatmap,
}

/// One data series of a [`Chart`].
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    kind: TraceKind,
    name: Option<String>,
    x: Vec<Value>,
    y: Vec<Value>,
    z: Vec<Vec<f64>>,
    mode: Option<String>,
    color: Option<String>,
    line_width: Option<f64>,
    colorscale: Option<String>,
}

impl Trace {
    fn new(kind: TraceKind, x: Vec<Value>, y: Vec<Value>) -> Self {
        Self {
            kind,
            name: None,
            x,
            y,
            z: Vec::new(),
            mode: None,
            color: None,
            line_width: None,
            colorscale: None,
        }
    }

    #[must_use]
    pub fn scatter<X: Into<Value>, Y: Into<Value>>(x: impl IntoIterator<Item = X>, y: impl IntoIterator<Item = Y>) -> Self {
        Self::new(
            TraceKind::Scatter,
            x.into_iter().map(Into::into).collect(),
            y.into_iter().map(Into::into).collect(),
        )
    }

    #[must_use]
    pub fn bar<X: Into<Value>, Y: Into<Value>>(x: impl IntoIterator<Item = X>, y: impl IntoIterator<Item = Y>) -> Self {
        Self::new(
            TraceKind::Bar,
            x.into_iter().map(Into::into).collect(),
            y.into_iter().map(Into::into).collect(),
        )
    }

    /// A heatmap over `z[row][column]`, labelled by `x` (columns) and `y` (rows).
    #[must_use]
    pub fn heatmap(z: Vec<Vec<f64>>, x: Vec<String>, y: Vec<String>) -> Self {
        let mut trace = Self::new(
            TraceKind::Heatmap,
            x.into_iter().map(Value::from).collect(),
            y.into_iter().map(Value::from).collect(),
        );
        trace.z = z;
        trace
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Drawing mode of a scatter trace, such as `lines`, `markers` or `lines+markers`.
    #[must_use]
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub const fn line_width(mut self, width: f64) -> Self {
        self.line_width = Some(width);
        self
    }

    #[must_use]
    pub fn colorscale(mut self, scale: impl Into<String>) -> Self {
        self.colorscale = Some(scale.into());
        self
    }

    #[must_use]
    pub const fn kind(&self) -> TraceKind {
        self.kind
    }

    #[expect(unused_results, reason = "Map::insert intentionally overwrites values")]
    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!(<&str>::from(self.kind)));
        if let Some(name) = &self.name {
            obj.insert("name".to_string(), json!(name));
        }

        obj.insert("x".to_string(), Value::Array(self.x.clone()));
        obj.insert("y".to_string(), Value::Array(self.y.clone()));

        if self.kind == TraceKind::Heatmap {
            obj.insert("z".to_string(), json!(self.z));
            if let Some(scale) = &self.colorscale {
                obj.insert("colorscale".to_string(), json!(scale));
            }
        }

        if let Some(mode) = &self.mode {
            obj.insert("mode".to_string(), json!(mode));
        }

        match self.kind {
            TraceKind::Scatter if self.color.is_some() || self.line_width.is_some() => {
                let mut line = Map::new();
                if let Some(color) = &self.color {
                    line.insert("color".to_string(), json!(color));
                }
                if let Some(width) = self.line_width {
                    line.insert("width".to_string(), json!(width));
                }
                obj.insert("line".to_string(), Value::Object(line));
            }
            TraceKind::Bar if self.color.is_some() => {
                obj.insert("marker".to_string(), json!({ "color": self.color }));
            }
            _ => {}
        }

        Value::Object(obj)
    }
}

/// A horizontal reference line across the plotting area.
#[derive(Debug, Clone, PartialEq)]
struct ReferenceLine {
    y: f64,
    color: String,
    dash: String,
    label: Option<String>,
}

/// An interactive chart described in the Plotly JSON format.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chart {
    traces: Vec<Trace>,
    title: Option<String>,
    x_title: Option<String>,
    y_title: Option<String>,
    template: Option<String>,
    height: Option<u32>,
    width: Option<u32>,
    lines: Vec<ReferenceLine>,
}

impl Chart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_axis_titles(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_title = Some(x.into());
        self.y_title = Some(y.into());
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    #[must_use]
    pub const fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Adds a dashed horizontal line at `y`, optionally annotated.
    #[must_use]
    pub fn with_hline(mut self, y: f64, color: impl Into<String>, label: Option<String>) -> Self {
        self.lines.push(ReferenceLine {
            y,
            color: color.into(),
            dash: "dash".to_string(),
            label,
        });
        self
    }

    #[must_use]
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The chart's `{"data": [...], "layout": {...}}` description.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "data": self.traces.iter().map(Trace::to_json).collect::<Vec<_>>(),
            "layout": self.layout(),
        })
    }

    #[expect(unused_results, reason = "Map::insert intentionally overwrites values")]
    fn layout(&self) -> Value {
        let mut layout = Map::new();
        if let Some(title) = &self.title {
            layout.insert("title".to_string(), json!({ "text": title }));
        }
        if let Some(x) = &self.x_title {
            layout.insert("xaxis".to_string(), json!({ "title": { "text": x } }));
        }
        if let Some(y) = &self.y_title {
            layout.insert("yaxis".to_string(), json!({ "title": { "text": y } }));
        }
        if let Some(template) = &self.template {
            layout.insert("template".to_string(), json!(template));
        }
        if let Some(height) = self.height {
            layout.insert("height".to_string(), json!(height));
        }
        if let Some(width) = self.width {
            layout.insert("width".to_string(), json!(width));
        }

        if !self.lines.is_empty() {
            let shapes: Vec<Value> = self
                .lines
                .iter()
                .map(|line| {
                    json!({
                        "type": "line",
                        "xref": "paper",
                        "x0": 0,
                        "x1": 1,
                        "y0": line.y,
                        "y1": line.y,
                        "line": { "color": line.color, "dash": line.dash },
                    })
                })
                .collect();
            layout.insert("shapes".to_string(), Value::Array(shapes));

            let annotations: Vec<Value> = self
                .lines
                .iter()
                .filter_map(|line| {
                    line.label.as_ref().map(|label| {
                        json!({
                            "text": label,
                            "xref": "paper",
                            "x": 1,
                            "y": line.y,
                            "showarrow": false,
                            "xanchor": "right",
                            "yanchor": "bottom",
                        })
                    })
                })
                .collect();
            if !annotations.is_empty() {
                layout.insert("annotations".to_string(), Value::Array(annotations));
            }
        }

        Value::Object(layout)
    }

    /// Renders the chart as HTML.
    ///
    /// `div_id` names the element holding the plot (a generated id is used when absent),
    /// `include_js` adds the plotting library script tag, and `full_html` wraps
    /// everything in a standalone document.
    #[must_use]
    pub fn to_html(&self, div_id: Option<&str>, include_js: bool, full_html: bool) -> String {
        let id = div_id.map_or_else(|| format!("chart-{:08x}", self.fingerprint()), ToString::to_string);
        let height = self.height.map_or_else(|| "100%".to_string(), |h| format!("{h}px"));

        let mut html = String::new();
        if full_html {
            html.push_str("<html>\n<head><meta charset=\"utf-8\" /></head>\n<body>\n");
        }

        html.push_str("<div>\n");
        if include_js {
            html.push_str(PLOTLY_CDN);
            html.push('\n');
        }

        let description = self.to_json();
        let _ = writeln!(
            html,
            "<div id=\"{id}\" class=\"plotly-graph-div\" style=\"height:{height}; width:100%;\"></div>",
            id = html_escape(&id),
        );
        let _ = writeln!(
            html,
            "<script type=\"text/javascript\">Plotly.newPlot({id}, {data}, {layout}, {{\"responsive\": true}});</script>",
            id = script_safe(&Value::String(id.clone())),
            data = script_safe(&description["data"]),
            layout = script_safe(&description["layout"]),
        );
        html.push_str("</div>");

        if full_html {
            html.push_str("\n</body>\n</html>");
        }

        html
    }

    fn fingerprint(&self) -> u32 {
        self.to_json()
            .to_string()
            .bytes()
            .fold(0x811c_9dc5_u32, |hash, b| (hash ^ u32::from(b)).wrapping_mul(0x0100_0193))
    }
}

/// Serializes JSON for embedding inside a `<script>` element.
fn script_safe(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}
