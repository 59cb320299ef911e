//! Report narrative input and the non-AI fallback rendering.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::client::IncidentDigest;

/// Aggregated figures for one reporting period, fed either to the model for
/// a drafted narrative or to [`fallback_report`] when the model is
/// unavailable.
#[derive(Debug, Clone)]
pub struct ReportInput {
    /// Bank the report is scoped to, or `None` for all banks.
    pub bank_name: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub total_incidents: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_severity: BTreeMap<String, i64>,
    pub notable_incidents: Vec<IncidentDigest>,
}

impl ReportInput {
    pub(crate) fn to_prompt(&self) -> String {
        let scope = self.bank_name.as_deref().unwrap_or("all banks");
        let mut prompt = format!(
            "Write an incident report for {scope}, period {} to {}.\n\
             Total incidents: {}\n\nBy status:\n",
            self.date_from, self.date_to, self.total_incidents
        );
        for (status, count) in &self.by_status {
            prompt.push_str(&format!("- {status}: {count}\n"));
        }
        prompt.push_str("\nBy severity:\n");
        for (severity, count) in &self.by_severity {
            prompt.push_str(&format!("- {severity}: {count}\n"));
        }
        if !self.notable_incidents.is_empty() {
            prompt.push_str("\nNotable incidents:\n");
            for digest in &self.notable_incidents {
                prompt.push_str(&format!(
                    "- [{} / {}] {} ({})\n",
                    digest.severity, digest.status, digest.title, digest.service_name
                ));
            }
        }
        prompt
    }
}

/// Plain HTML report used whenever the advisory endpoint is disabled or
/// fails. Same figures, no narrative.
pub fn fallback_report(input: &ReportInput) -> String {
    let scope = escape_html(input.bank_name.as_deref().unwrap_or("All banks"));
    let mut html = format!(
        "<h1>Incident Report: {scope}</h1>\n\
         <p>Period: {} to {}</p>\n\
         <p>Total incidents: {}</p>\n",
        input.date_from, input.date_to, input.total_incidents
    );

    html.push_str("<h2>By status</h2>\n<ul>\n");
    for (status, count) in &input.by_status {
        html.push_str(&format!("<li>{}: {count}</li>\n", escape_html(status)));
    }
    html.push_str("</ul>\n<h2>By severity</h2>\n<ul>\n");
    for (severity, count) in &input.by_severity {
        html.push_str(&format!("<li>{}: {count}</li>\n", escape_html(severity)));
    }
    html.push_str("</ul>\n");

    if !input.notable_incidents.is_empty() {
        html.push_str("<h2>Notable incidents</h2>\n<ul>\n");
        for digest in &input.notable_incidents {
            html.push_str(&format!(
                "<li>[{} / {}] {} ({})</li>\n",
                escape_html(&digest.severity),
                escape_html(&digest.status),
                escape_html(&digest.title),
                escape_html(&digest.service_name),
            ));
        }
        html.push_str("</ul>\n");
    }

    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ReportInput {
        ReportInput {
            bank_name: Some("Acme Bank".into()),
            date_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            total_incidents: 2,
            by_status: BTreeMap::from([("OPEN".into(), 1), ("CLOSED".into(), 1)]),
            by_severity: BTreeMap::from([("P1".into(), 2)]),
            notable_incidents: vec![],
        }
    }

    #[test]
    fn fallback_report_contains_figures() {
        let html = fallback_report(&sample_input());
        assert!(html.contains("Acme Bank"));
        assert!(html.contains("Total incidents: 2"));
        assert!(html.contains("<li>OPEN: 1</li>"));
        assert!(html.contains("<li>P1: 2</li>"));
    }

    #[test]
    fn fallback_report_escapes_markup() {
        let mut input = sample_input();
        input.bank_name = Some("<script>".into());
        let html = fallback_report(&input);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
