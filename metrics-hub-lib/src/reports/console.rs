use crate::Result;
use crate::metrics::{MetricConfig, ParameterSpec};
use core::fmt::Write;
use owo_colors::OwoColorize;

/// Renders the metric catalog for a terminal.
///
/// `is_bound` tells whether an implementation serves a metric; unbound metrics are
/// flagged so that a missing binding is visible before a call fails.
pub fn generate_listing<W, F>(configs: &[MetricConfig], is_bound: F, use_colors: bool, writer: &mut W) -> Result<()>
where
    W: Write,
    F: Fn(&str) -> bool,
{
    if configs.is_empty() {
        writeln!(writer, "No metrics found")?;
        return Ok(());
    }

    for (index, config) in configs.iter().enumerate() {
        if index > 0 {
            writeln!(writer)?;
        }

        let category = if config.category.is_empty() { "general" } else { config.category.as_str() };
        if use_colors {
            writeln!(writer, "{} {} [{}]", config.id.cyan().bold(), config.display_name(), category.dimmed())?;
        } else {
            writeln!(writer, "{} {} [{category}]", config.id, config.display_name())?;
        }

        if !config.description.is_empty() {
            writeln!(writer, "  {}", config.description)?;
        }

        if !config.inputs.is_empty() {
            let inputs: Vec<String> = config.inputs.iter().map(format_input).collect();
            writeln!(writer, "  inputs: {}", inputs.join(", "))?;
        }

        if !is_bound(&config.id) {
            if use_colors {
                writeln!(writer, "  {}", "no implementation bound".yellow())?;
            } else {
                writeln!(writer, "  no implementation bound")?;
            }
        }
    }

    Ok(())
}

fn format_input(input: &ParameterSpec) -> String {
    let mut s = format!("{} ({}", input.name, input.value_type);
    if !input.required {
        s.push_str(", optional");
    }
    if let Some(default) = &input.default {
        let _ = write!(s, ", default {default}");
    }
    s.push(')');
    s
}
