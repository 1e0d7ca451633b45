use std::fmt::Write;

use serde::Serialize;

use crate::fetch::FetchReport;
use crate::models::{
    sort_by_rank, CanonicalDashboardModel, DailyMetric, Insight, TrendDirection, TrendResult,
};

fn trend_label(trend: &TrendResult) -> String {
    match trend.direction {
        TrendDirection::Stable => "stable".to_string(),
        direction => format!("{} {}%", direction.as_str(), trend.change),
    }
}

fn finding_line(finding: &Insight) -> String {
    let mut line = format!(
        "- [{}] {}: {}",
        finding.severity.as_str(),
        finding.title,
        finding.description
    );
    if let Some(metric) = finding.metric {
        let unit = finding.unit.as_deref().unwrap_or("");
        if unit == "%" {
            let _ = write!(line, " ({metric:.1}%)");
        } else {
            let _ = write!(line, " ({metric} {unit})");
        }
    }
    line
}

pub fn build_report(model: &CanonicalDashboardModel, fetch: Option<&FetchReport>) -> String {
    let mut output = String::new();
    let overview = &model.overview;

    let _ = writeln!(output, "# Portfolio Analytics Report");
    let _ = writeln!(
        output,
        "Generated for {} (compared with {})",
        model.window, model.previous_window
    );
    if model.partial_data {
        let _ = writeln!(output);
        let _ = writeln!(output, "> Partial data: some sources returned nothing.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Health score: {}/100", model.health.value());
    let _ = writeln!(
        output,
        "- Visitors: {} ({})",
        overview.unique_visitors,
        trend_label(&model.trends.visitors)
    );
    let _ = writeln!(
        output,
        "- Sessions: {} ({})",
        overview.sessions,
        trend_label(&model.trends.sessions)
    );
    let _ = writeln!(
        output,
        "- Engagement rate: {:.1}% ({})",
        overview.engagement_rate,
        trend_label(&model.trends.engagement)
    );
    let _ = writeln!(output, "- Bounce rate: {:.1}%", overview.bounce_rate);
    let _ = writeln!(
        output,
        "- Avg session duration: {:.0}s",
        overview.avg_session_duration_sec
    );
    let _ = writeln!(
        output,
        "- Conversions: {} ({})",
        overview.conversions,
        trend_label(&model.trends.conversions)
    );
    let _ = writeln!(output, "- Resume downloads: {}", overview.resume_downloads);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Alerts");
    let alerts: Vec<&Insight> = model.alerts().collect();
    if alerts.is_empty() {
        let _ = writeln!(output, "All systems nominal.");
    } else {
        for alert in alerts {
            let _ = writeln!(output, "{}", finding_line(alert));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Insights");
    let insights: Vec<&Insight> = model.insights().collect();
    if insights.is_empty() {
        let _ = writeln!(output, "No insights for this window.");
    } else {
        for insight in insights {
            let _ = writeln!(output, "{}", finding_line(insight));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Conversion Funnel");
    for stage in &model.funnel.stages {
        let _ = writeln!(
            output,
            "- {}: {} (drop-off {})",
            stage.stage.label(),
            stage.count,
            stage.drop_off
        );
    }

    let mut projects = model.rankings.projects.clone();
    sort_by_rank(&mut projects);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Projects");
    if projects.is_empty() {
        let _ = writeln!(output, "No project data for this window.");
    } else {
        for project in projects.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} {} ({} views, {} clicks)",
                project.rank, project.title, project.total_views, project.total_clicks
            );
        }
    }

    if let Some(fetch) = fetch {
        let failures: Vec<_> = fetch.failures().collect();
        if !failures.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "## Source Issues");
            for (name, outcome) in failures {
                let _ = writeln!(output, "- {}: {}", name, outcome);
            }
        }
    }

    output
}

#[derive(Serialize)]
struct DailyRow {
    date: String,
    visitors: f64,
    sessions: f64,
    engagement_rate: f64,
    bounce_rate: f64,
    avg_session_duration_sec: f64,
    desktop_sessions: f64,
    mobile_sessions: f64,
    tablet_sessions: f64,
}

pub fn write_daily_csv<W: std::io::Write>(writer: W, daily: &[DailyMetric]) -> csv::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for metric in daily {
        csv_writer.serialize(DailyRow {
            date: metric.date.format("%Y-%m-%d").to_string(),
            visitors: metric.visitors,
            sessions: metric.sessions,
            engagement_rate: metric.engagement_rate,
            bounce_rate: metric.bounce_rate,
            avg_session_duration_sec: metric.avg_session_duration_sec,
            desktop_sessions: metric.desktop_sessions,
            mobile_sessions: metric.mobile_sessions,
            tablet_sessions: metric.tablet_sessions,
        })?;
    }
    csv_writer.flush()?;
    Ok(daily.len())
}
