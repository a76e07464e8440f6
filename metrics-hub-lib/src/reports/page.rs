use super::html_escape;
use crate::Result;
use crate::metrics::{MetricConfig, MetricValue, PLOTLY_CDN, Params};
use chrono::{DateTime, Local};
use core::fmt::Write;

const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";

/// Renders a standalone HTML page showing one metric call.
pub fn generate<W: Write>(
    metric_id: &str,
    config: Option<&MetricConfig>,
    params: &Params,
    result: &MetricValue,
    timestamp: DateTime<Local>,
    writer: &mut W,
) -> Result<()> {
    let title = config.map_or(metric_id, MetricConfig::display_name);

    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html>")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "  <meta charset=\"UTF-8\">")?;
    writeln!(writer, "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(writer, "  <title>{}</title>", html_escape(title))?;
    writeln!(writer, "  <link rel=\"stylesheet\" href=\"{BOOTSTRAP_CSS}\">")?;
    writeln!(writer, "  {PLOTLY_CDN}")?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;
    writeln!(writer, "  <div class=\"container my-4\">")?;

    writeln!(writer, "    <h1>{}</h1>", html_escape(title))?;
    writeln!(writer, "    <p class=\"text-muted\">Metric <code>{}</code></p>", html_escape(metric_id))?;
    if let Some(config) = config.filter(|c| !c.description.is_empty()) {
        writeln!(writer, "    <p>{}</p>", html_escape(&config.description))?;
    }

    write_inputs(writer, params)?;

    match result {
        MetricValue::Map(entries) => {
            for (key, value) in entries {
                write_section(writer, key, value)?;
            }
        }
        other => write_section(writer, "result", other)?,
    }

    writeln!(
        writer,
        "    <footer class=\"text-muted small mt-4\">Generated {}</footer>",
        timestamp.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(writer, "  </div>")?;
    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")?;

    Ok(())
}

fn write_inputs<W: Write>(writer: &mut W, params: &Params) -> Result<()> {
    if params.is_empty() {
        return Ok(());
    }

    writeln!(writer, "    <h2>Inputs</h2>")?;
    writeln!(writer, "    <table class=\"table table-sm\">")?;
    for (name, value) in params {
        writeln!(writer, "      <tr><th>{}</th><td>{}</td></tr>", html_escape(name), html_escape(&value.to_string()))?;
    }
    writeln!(writer, "    </table>")?;

    Ok(())
}

fn write_section<W: Write>(writer: &mut W, key: &str, value: &MetricValue) -> Result<()> {
    writeln!(writer, "    <section class=\"mb-4\">")?;
    writeln!(writer, "      <h2>{}</h2>", html_escape(key))?;

    match value {
        MetricValue::Table(table) => writeln!(writer, "{}", table.to_html("table table-striped"))?,
        MetricValue::Chart(chart) => writeln!(writer, "{}", chart.to_html(Some(&format!("plot-{key}")), false, false))?,
        other => writeln!(writer, "      <pre>{}</pre>", html_escape(&other.to_string()))?,
    }

    writeln!(writer, "    </section>")?;
    Ok(())
}
