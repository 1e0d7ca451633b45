use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::fetch::{AnalyticsClient, FetchReport, RawSources};
use crate::health::health_score;
use crate::mapper::{self, payload};
use crate::models::{CanonicalDashboardModel, DateWindow};
use crate::rules::{self, RuleContext};
use crate::sources::{SourceDescriptor, SourceName, CURRENT_PERIOD_SOURCES, PREVIOUS_PERIOD_SOURCES};
use crate::trend::{kpi_trends, previous_window};

/// Sources absent from either period, or mapped to `None`, resolve to
/// defaults and mark the model as partial.
pub fn build_dashboard(
    window: &DateWindow,
    current: &RawSources,
    previous: &RawSources,
) -> CanonicalDashboardModel {
    let previous_window = previous_window(window);

    let sessions = payload(current, SourceName::Sessions);
    let funnel_payload = payload(current, SourceName::ConversionFunnel);

    let overview = mapper::map_overview(sessions, funnel_payload);
    let previous_totals = mapper::map_previous_totals(
        payload(previous, SourceName::Sessions),
        payload(previous, SourceName::ConversionFunnel),
    );
    let trends = kpi_trends(window, &previous_window, &overview, &previous_totals);

    let daily = mapper::map_daily_metrics(payload(current, SourceName::DailyMetrics));
    let traffic_sources = mapper::map_traffic_sources(
        payload(current, SourceName::TrafficDailyStats),
        sessions,
    );
    let top_countries = mapper::map_top_countries(sessions);
    let segments = mapper::map_visitor_segments(payload(current, SourceName::VisitorInsights));
    let funnel = mapper::map_conversion_funnel(funnel_payload);
    let recommendations =
        mapper::map_recommendations(payload(current, SourceName::RecommendationPerformance));
    let rankings = mapper::map_rankings(current);

    let health = health_score(&overview, trends.visitors.direction);
    let findings = rules::evaluate(&RuleContext {
        window,
        overview: &overview,
        trends: &trends,
        traffic_sources: &traffic_sources,
        rankings: &rankings,
        funnel: &funnel,
    });

    let missing_sources = sources_without_data(CURRENT_PERIOD_SOURCES, current);
    let missing_previous_sources = sources_without_data(PREVIOUS_PERIOD_SOURCES, previous);
    let partial_data = !missing_sources.is_empty() || !missing_previous_sources.is_empty();
    if partial_data {
        debug!(
            ?missing_sources,
            ?missing_previous_sources,
            "building dashboard with missing sources"
        );
    }

    CanonicalDashboardModel {
        window: *window,
        previous_window,
        overview,
        trends,
        daily,
        traffic_sources,
        top_countries,
        segments,
        funnel,
        recommendations,
        rankings,
        health,
        findings,
        missing_sources,
        missing_previous_sources,
        partial_data,
    }
}

fn sources_without_data(expected: &[SourceDescriptor], sources: &RawSources) -> Vec<SourceName> {
    expected
        .iter()
        .map(|descriptor| descriptor.name)
        .filter(|name| payload(sources, *name).is_none())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadedDashboard {
    pub model: CanonicalDashboardModel,
    pub current: FetchReport,
    pub previous: FetchReport,
}

impl LoadedDashboard {
    pub fn is_partial(&self) -> bool {
        self.current.is_partial() || self.previous.is_partial()
    }
}

pub async fn load_dashboard(client: &AnalyticsClient, window: &DateWindow) -> LoadedDashboard {
    let current = client.fetch_sources(window, CURRENT_PERIOD_SOURCES).await;
    let comparison = previous_window(window);
    let previous = client
        .fetch_sources(&comparison, PREVIOUS_PERIOD_SOURCES)
        .await;

    let model = build_dashboard(window, &current.payloads, &previous.payloads);
    let loaded = LoadedDashboard {
        model,
        current: current.report,
        previous: previous.report,
    };

    info!(
        window = %window,
        previous_window = %comparison,
        partial = loaded.is_partial(),
        health = loaded.model.health.value(),
        "dashboard assembled"
    );
    loaded
}

// Layout: `<dir>/<source>.json` and `<dir>/previous/<source>.json`. Missing
// or malformed files count as no data.
pub fn read_fixture_sources(dir: &Path) -> PipelineResult<(RawSources, RawSources)> {
    let current = read_fixture_set(dir, CURRENT_PERIOD_SOURCES)?;
    let previous = read_fixture_set(&dir.join("previous"), PREVIOUS_PERIOD_SOURCES)?;
    Ok((current, previous))
}

fn read_fixture_set(dir: &Path, descriptors: &[SourceDescriptor]) -> PipelineResult<RawSources> {
    let mut sources = RawSources::new();
    for descriptor in descriptors {
        let path = dir.join(format!("{}.json", descriptor.name));
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                sources.insert(descriptor.name, None);
                continue;
            }
            Err(source) => {
                return Err(PipelineError::Fixture {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let parsed = match serde_json::from_str::<Value>(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), "ignoring malformed fixture: {}", e);
                None
            }
        };
        sources.insert(descriptor.name, parsed);
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, TrendDirection};
    use chrono::NaiveDate;
    use serde_json::json;

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn empty_input_yields_default_model() {
        let model = build_dashboard(&window(), &RawSources::new(), &RawSources::new());
        assert!(model.partial_data);
        assert_eq!(model.missing_sources.len(), CURRENT_PERIOD_SOURCES.len());
        assert_eq!(
            model.missing_previous_sources.len(),
            PREVIOUS_PERIOD_SOURCES.len()
        );
        assert!(model.daily.is_empty());
        assert!(model.rankings.projects.is_empty());
        assert_eq!(model.trends.visitors.direction, TrendDirection::Stable);
        assert_eq!(model.health.value(), 36);
        // Zero engagement still reads as low engagement.
        let alerts: Vec<&str> = model.alerts().map(|a| a.id.as_str()).collect();
        assert_eq!(alerts, vec!["alert-low-engagement"]);
    }

    #[test]
    fn failed_comparison_period_marks_model_partial() {
        let mut current = RawSources::new();
        for descriptor in CURRENT_PERIOD_SOURCES {
            current.insert(descriptor.name, Some(json!({})));
        }
        current.insert(
            SourceName::Sessions,
            Some(json!({"overview": {"unique_visitors": 140}})),
        );
        let mut previous = RawSources::new();
        previous.insert(SourceName::Sessions, None);
        previous.insert(SourceName::ConversionFunnel, None);

        let model = build_dashboard(&window(), &current, &previous);
        assert!(model.missing_sources.is_empty());
        assert_eq!(
            model.missing_previous_sources,
            vec![SourceName::Sessions, SourceName::ConversionFunnel]
        );
        assert!(model.partial_data);
        assert_eq!(model.trends.visitors.direction, TrendDirection::Stable);
    }

    #[test]
    fn complete_input_is_not_partial() {
        let mut current = RawSources::new();
        for descriptor in CURRENT_PERIOD_SOURCES {
            current.insert(descriptor.name, Some(json!({})));
        }
        let mut previous = RawSources::new();
        for descriptor in PREVIOUS_PERIOD_SOURCES {
            previous.insert(descriptor.name, Some(json!({})));
        }

        let model = build_dashboard(&window(), &current, &previous);
        assert!(model.missing_sources.is_empty());
        assert!(model.missing_previous_sources.is_empty());
        assert!(!model.partial_data);
    }

    #[test]
    fn previous_window_is_attached() {
        let model = build_dashboard(&window(), &RawSources::new(), &RawSources::new());
        assert_eq!(
            model.previous_window.start(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(model.trends.sessions.previous, model.previous_window);
        assert_eq!(model.trends.sessions.current, model.window);
    }

    #[test]
    fn trend_alerts_reach_the_model() {
        let mut current = RawSources::new();
        current.insert(
            SourceName::Sessions,
            Some(json!({"overview": {"unique_visitors": 50, "engagement_rate": 60}})),
        );
        let mut previous = RawSources::new();
        previous.insert(
            SourceName::Sessions,
            Some(json!({"overview": {"unique_visitors": 100, "engagement_rate": 40}})),
        );

        let model = build_dashboard(&window(), &current, &previous);
        assert_eq!(model.trends.visitors.direction, TrendDirection::Down);
        assert_eq!(model.trends.visitors.change, 50.0);
        let alerts: Vec<&str> = model.alerts().map(|a| a.id.as_str()).collect();
        assert_eq!(alerts, vec!["alert-visitor-drop", "alert-engagement-rise"]);
        assert!(model.insights().all(|i| i.channel == Channel::Insight));
    }

    #[test]
    fn fixtures_read_missing_and_malformed_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sessions.json"),
            r#"{"overview": {"unique_visitors": 3}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("skill_rankings.json"), "{not json").unwrap();

        let (current, previous) = read_fixture_sources(dir.path()).unwrap();
        assert!(current[&SourceName::Sessions].is_some());
        assert!(current[&SourceName::SkillRankings].is_none());
        assert!(current[&SourceName::DailyMetrics].is_none());
        assert_eq!(previous.len(), PREVIOUS_PERIOD_SOURCES.len());
        assert!(previous.values().all(Option::is_none));
    }
}
