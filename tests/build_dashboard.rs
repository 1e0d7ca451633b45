use chrono::NaiveDate;
use serde_json::json;

use portfolio_analytics::models::{Channel, TrendDirection};
use portfolio_analytics::{build_dashboard, DateWindow, RawSources, SourceName};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn week() -> DateWindow {
    DateWindow::new(date(2024, 1, 8), date(2024, 1, 14)).unwrap()
}

fn current_sources() -> RawSources {
    let mut sources = RawSources::new();
    sources.insert(
        SourceName::Sessions,
        Some(json!({
            "overview": {
                "unique_visitors": 140,
                "total_sessions": 200,
                "engagement_rate": 55,
                "bounce_rate": 25,
                "avg_session_duration": 96
            }
        })),
    );
    sources.insert(
        SourceName::ConversionFunnel,
        Some(json!({"summary": {"form_submissions": 0, "resume_downloads": 2}})),
    );
    sources.insert(
        SourceName::ProjectRankings,
        Some(json!({"rankings": [
            {"project_id": "p1", "project_title": "Tracker", "overall_rank": 1, "total_clicks": 12}
        ]})),
    );
    sources.insert(
        SourceName::DailyMetrics,
        Some(json!({"data": [
            {"date": "2024-01-09", "visitors": 22},
            {"date": "2024-01-08", "visitors": 18}
        ]})),
    );
    sources
}

fn previous_sources() -> RawSources {
    let mut sources = RawSources::new();
    sources.insert(
        SourceName::Sessions,
        Some(json!({"overview": {"unique_visitors": 100}})),
    );
    sources
}

#[test]
fn scores_a_growing_week() {
    let mut current = current_sources();
    current.remove(&SourceName::ProjectRankings);
    let model = build_dashboard(&week(), &current, &previous_sources());

    assert_eq!(model.overview.unique_visitors, 140.0);
    assert_eq!(model.overview.sessions, 200.0);
    assert_eq!(model.trends.visitors.direction, TrendDirection::Up);
    assert_eq!(model.trends.visitors.change, 40.0);
    assert_eq!(model.trends.sessions.direction, TrendDirection::Stable);
    assert_eq!(model.trends.conversions.change, 0.0);
    assert_eq!(model.health.value(), 60);

    let insights: Vec<&str> = model.insights().map(|i| i.id.as_str()).collect();
    assert_eq!(insights, vec!["high-traffic", "high-engagement"]);
    assert_eq!(model.alerts().count(), 0);
}

#[test]
fn same_input_builds_identical_models() {
    let first = build_dashboard(&week(), &current_sources(), &previous_sources());
    let second = build_dashboard(&week(), &current_sources(), &previous_sources());

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn empty_source_only_costs_its_own_fields() {
    let mut current = current_sources();
    current.insert(SourceName::SkillRankings, None);
    let model = build_dashboard(&week(), &current, &previous_sources());

    assert!(model.rankings.skills.is_empty());
    assert_eq!(model.rankings.projects.len(), 1);
    assert_eq!(model.rankings.projects[0].title, "Tracker");
    assert_eq!(model.overview.engagement_rate, 55.0);

    assert!(model.partial_data);
    assert!(model.missing_sources.contains(&SourceName::SkillRankings));
    assert!(!model.missing_sources.contains(&SourceName::Sessions));
    assert!(!model.missing_sources.contains(&SourceName::ProjectRankings));
    assert!(model
        .findings
        .iter()
        .any(|f| f.id == "top-project" && f.channel == Channel::Insight));
}

#[test]
fn daily_series_is_ordered_and_windows_line_up() {
    let model = build_dashboard(&week(), &current_sources(), &previous_sources());

    let days: Vec<NaiveDate> = model.daily.iter().map(|d| d.date).collect();
    assert_eq!(days, vec![date(2024, 1, 8), date(2024, 1, 9)]);
    assert_eq!(model.previous_window.start(), date(2024, 1, 1));
    assert_eq!(model.previous_window.end(), date(2024, 1, 7));
    assert_eq!(model.previous_window.len_days(), model.window.len_days());
}
