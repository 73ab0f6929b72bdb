//! Chart report generation.
//!
//! This module renders a [`ChartReport`] as an HTML page with an embedded
//! ECharts bar chart, or as a JSON document.

use crate::error::PipelineError;
use crate::models::{ChartMetadata, ChartReport, Series};
use anyhow::Result;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;

/// Rendering options for the HTML chart.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Stack the bars of each year instead of grouping them.
    pub stacked: bool,
    /// Show the legend.
    pub show_legend: bool,
    /// Script URL of the ECharts library.
    pub echarts_url: String,
}

impl From<&crate::config::ChartConfig> for ChartOptions {
    fn from(config: &crate::config::ChartConfig) -> Self {
        Self {
            stacked: config.stacked,
            show_legend: config.show_legend,
            echarts_url: config.echarts_url.clone(),
        }
    }
}

/// Generate a complete HTML page.
pub fn generate_html_chart(report: &ChartReport, options: &ChartOptions) -> String {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    output.push_str("<meta charset=\"utf-8\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(&report.title)));
    output.push_str(&format!(
        "<script src=\"{}\"></script>\n",
        escape_html(&options.echarts_url)
    ));
    output.push_str(&generate_style());
    output.push_str("</head>\n<body>\n");

    // Chart container and initialization
    output.push_str("<div class=\"container\">\n");
    output.push_str("<div id=\"orbit-chart\" class=\"chart\"></div>\n");
    output.push_str(&generate_chart_script(report, options));

    // Data table fallback
    output.push_str(&generate_data_table(&report.years, &report.series));

    // Footer
    output.push_str(&generate_footer(&report.metadata));
    output.push_str("</div>\n</body>\n</html>\n");

    output
}

/// Build the ECharts option object for the report.
pub fn chart_option(report: &ChartReport, options: &ChartOptions) -> Value {
    let series: Vec<Value> = report
        .series
        .iter()
        .map(|s| {
            let mut entry = json!({
                "name": s.name,
                "type": "bar",
                "data": s.values,
            });
            if options.stacked {
                entry["stack"] = json!("total");
            }
            entry
        })
        .collect();

    let names: Vec<&str> = report.series.iter().map(|s| s.name.as_str()).collect();

    json!({
        "title": { "text": report.title },
        "tooltip": { "trigger": "axis", "axisPointer": { "type": "shadow" } },
        "legend": { "show": options.show_legend, "data": names, "top": 30 },
        "toolbox": { "feature": { "saveAsImage": {} } },
        "xAxis": { "type": "category", "data": report.years },
        "yAxis": { "type": "value", "name": "Satellites" },
        "series": series,
    })
}

fn generate_style() -> String {
    let mut style = String::new();

    style.push_str("<style>\n");
    style.push_str("body { font-family: sans-serif; margin: 0; }\n");
    style.push_str(".container { margin: 0 auto; max-width: 1200px; padding: 16px; }\n");
    style.push_str(".chart { width: 100%; height: 600px; }\n");
    style.push_str("table { border-collapse: collapse; margin-top: 12px; }\n");
    style.push_str("th, td { border: 1px solid #ccc; padding: 2px 8px; text-align: right; }\n");
    style.push_str("footer { color: #666; font-size: 0.85em; margin-top: 16px; }\n");
    style.push_str("</style>\n");

    style
}

/// Generate the inline script that draws the chart.
fn generate_chart_script(report: &ChartReport, options: &ChartOptions) -> String {
    let option = chart_option(report, options);
    let option_json = script_safe_json(&option);

    let mut script = String::new();

    script.push_str("<script type=\"text/javascript\">\n");
    script.push_str("\"use strict\";\n");
    script.push_str("(function () {\n");
    script.push_str("  var el = document.getElementById(\"orbit-chart\");\n");
    script.push_str("  if (typeof echarts === \"undefined\") {\n");
    script.push_str(
        "    el.textContent = \"Chart library could not be loaded; see the data table below.\";\n",
    );
    script.push_str("    return;\n  }\n");
    script.push_str("  var chart = echarts.init(el);\n");
    script.push_str(&format!("  chart.setOption({});\n", option_json));
    script.push_str("  window.addEventListener(\"resize\", function () { chart.resize(); });\n");
    script.push_str("})();\n");
    script.push_str("</script>\n");

    script
}

/// Generate the collapsible data table.
fn generate_data_table(years: &[String], series: &[Series]) -> String {
    let mut table = String::new();

    table.push_str("<details>\n<summary>Data table</summary>\n<table>\n");

    table.push_str("<thead><tr><th>Year</th>");
    for s in series {
        table.push_str(&format!("<th>{}</th>", escape_html(&s.name)));
    }
    table.push_str("</tr></thead>\n<tbody>\n");

    for (i, year) in years.iter().enumerate() {
        table.push_str(&format!("<tr><th>{}</th>", escape_html(year)));
        for s in series {
            let value = s.values.get(i).copied().unwrap_or(0);
            table.push_str(&format!("<td>{}</td>", value));
        }
        table.push_str("</tr>\n");
    }

    table.push_str("<tr><th>Total</th>");
    for s in series {
        table.push_str(&format!("<td>{}</td>", s.total()));
    }
    table.push_str("</tr>\n");

    table.push_str("</tbody>\n</table>\n</details>\n");

    table
}

/// Generate the page footer.
fn generate_footer(metadata: &ChartMetadata) -> String {
    let mut footer = String::new();

    footer.push_str("<footer>\n");
    footer.push_str(&format!(
        "<p>Source: {}</p>\n",
        escape_html(&metadata.source)
    ));
    footer.push_str(&format!(
        "<p>Generated: {}</p>\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    footer.push_str(&format!(
        "<p>Rows: {} | Included: {} | Skipped: {}</p>\n",
        metadata.stats.rows,
        metadata.stats.observations,
        metadata.stats.skipped()
    ));
    if !metadata.unlisted_classes.is_empty() {
        let names: Vec<String> = metadata
            .unlisted_classes
            .iter()
            .map(|c| escape_html(c))
            .collect();
        footer.push_str(&format!("<p>Not charted: {}</p>\n", names.join(", ")));
    }
    footer.push_str("</footer>\n");

    footer
}

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Serialize JSON so it cannot terminate an inline `<script>` element.
fn script_safe_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ChartReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write report content to a file.
pub fn write_report(path: &Path, content: &str) -> Result<(), PipelineError> {
    let mut file = std::fs::File::create(path).map_err(|e| PipelineError::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| PipelineError::io(path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractStats;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn create_test_report() -> ChartReport {
        let mut table: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        table.insert(
            "2005".to_string(),
            [("LEO".to_string(), 3), ("GEO".to_string(), 1)]
                .into_iter()
                .collect(),
        );
        table.insert(
            "2010".to_string(),
            [("LEO".to_string(), 2), ("Heliocentric".to_string(), 1)]
                .into_iter()
                .collect(),
        );

        ChartReport {
            title: "Satellite orbit usage per year".to_string(),
            metadata: ChartMetadata {
                source: "https://example.com/db.txt".to_string(),
                generated_at: Utc::now(),
                stats: ExtractStats {
                    rows: 9,
                    short_rows: 1,
                    empty_dates: 1,
                    malformed_dates: 0,
                    observations: 7,
                },
                unlisted_classes: vec!["Heliocentric".to_string()],
            },
            years: vec!["2005".to_string(), "2010".to_string()],
            series: vec![
                Series {
                    name: "LEO".to_string(),
                    values: vec![3, 2],
                },
                Series {
                    name: "GEO".to_string(),
                    values: vec![1, 0],
                },
            ],
            table,
        }
    }

    fn default_options() -> ChartOptions {
        ChartOptions::from(&crate::config::ChartConfig::default())
    }

    #[test]
    fn test_generate_html_chart() {
        let report = create_test_report();
        let html = generate_html_chart(&report, &default_options());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Satellite orbit usage per year</title>"));
        assert!(html.contains("echarts.min.js"));
        assert!(html.contains("echarts.init"));
        assert!(html.contains("\"2005\""));
        assert!(html.contains("\"2010\""));
        assert!(html.contains("\"LEO\""));
        assert!(html.contains("\"GEO\""));
        assert!(html.contains("Not charted: Heliocentric"));
        assert!(html.contains("Rows: 9 | Included: 7 | Skipped: 2"));
    }

    #[test]
    fn test_chart_option_grouped_and_stacked() {
        let report = create_test_report();
        let mut options = default_options();

        let grouped = chart_option(&report, &options);
        assert_eq!(grouped["xAxis"]["data"], json!(["2005", "2010"]));
        assert_eq!(grouped["series"][0]["data"], json!([3, 2]));
        assert_eq!(grouped["series"][1]["name"], json!("GEO"));
        assert!(grouped["series"][0].get("stack").is_none());
        assert_eq!(grouped["legend"]["show"], json!(true));

        options.stacked = true;
        options.show_legend = false;
        let stacked = chart_option(&report, &options);
        assert_eq!(stacked["series"][0]["stack"], json!("total"));
        assert_eq!(stacked["series"][1]["stack"], json!("total"));
        assert_eq!(stacked["legend"]["show"], json!(false));
    }

    #[test]
    fn test_data_table() {
        let report = create_test_report();
        let table = generate_data_table(&report.years, &report.series);

        assert!(table.contains("<th>Year</th><th>LEO</th><th>GEO</th>"));
        assert!(table.contains("<tr><th>2005</th><td>3</td><td>1</td></tr>"));
        assert!(table.contains("<tr><th>2010</th><td>2</td><td>0</td></tr>"));
        assert!(table.contains("<tr><th>Total</th><td>5</td><td>1</td></tr>"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut report = create_test_report();
        report.title = "<b>Orbits</b> & \"more\"".to_string();
        report.series[0].name = "</script><script>alert(1)".to_string();

        let html = generate_html_chart(&report, &default_options());

        assert!(html.contains("<title>&lt;b&gt;Orbits&lt;/b&gt; &amp; &quot;more&quot;</title>"));
        assert!(!html.contains("</script><script>alert(1)"));
        assert!(html.contains("<\\/script><script>alert(1)"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("LEO"), "LEO");
        assert_eq!(escape_html("a<b>&'c'"), "a&lt;b&gt;&amp;&#39;c&#39;");
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"years\""));
        assert!(json.contains("\"series\""));
        assert!(json.contains("\"Heliocentric\""));

        let parsed: ChartReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.years, report.years);
        assert_eq!(parsed.series, report.series);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orbit-chart.html");

        write_report(&path, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");

        let bad = dir.path().join("missing-dir").join("chart.html");
        assert!(matches!(
            write_report(&bad, "x"),
            Err(PipelineError::Io { .. })
        ));
    }
}
