//! Normalization and rendering of metric results
//!
//! # Implementation Model
//!
//! [`classify_result`] looks at a [`MetricValue`](crate::metrics::MetricValue) once,
//! decides its [`ResultShape`], and converts it to a JSON value suitable for the
//! requested [`OutputFormat`]. Tables become row records, HTML tables, or CSV text;
//! charts become their description or embeddable HTML; mappings that contain tables
//! or charts are converted entry by entry. Classification never fails.
//!
//! [`MetricResponse`] wraps a classified result (or an error) in the envelope that
//! transports carry, and [`generate_page`] renders a standalone HTML page for one call.
//! [`generate_listing`] renders the metric catalog for a terminal.

mod classify;
mod console;
mod page;
mod response;

pub use classify::{OutputFormat, ResultShape, classify, classify_result};
pub use console::generate_listing;
pub use page::generate as generate_page;
pub use response::MetricResponse;

/// Escapes text for inclusion in HTML content or attribute values.
#[must_use]
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
        assert_eq!(html_escape("plain"), "plain");
    }
}
