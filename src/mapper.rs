use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::fetch::RawSources;
use crate::models::{
    ClientRanking, ConversionFunnelSnapshot, CountryVisitors, DailyMetric, DomainRanking,
    DomainTier, ExperienceRanking, OverviewSnapshot, ProjectRanking, Rank, Rankings,
    RecommendationPerformance, SectionRanking, SectionTier, SkillRanking, SkillTier,
    SystemHealth, TrafficSource, VisitorSegments, UNRANKED_SENTINEL,
};
use crate::normalize::{array_field, number_field, number_field_opt, object_field, text_field};
use crate::sources::SourceName;

mod keys {
    pub const OVERVIEW: &str = "overview";
    pub const SUMMARY: &str = "summary";
    pub const DAILY_ROWS: &str = "data";
    pub const TRAFFIC_ROWS: &str = "trafficSources";
    pub const COUNTRY_ROWS: &str = "topCountries";
    pub const SEGMENT_TOTALS: &str = "segmentTotals";
    pub const PERFORMANCE_ROWS: &str = "performance";
    pub const RANKING_ROWS: &str = "rankings";

    pub const VISITORS: &[&str] = &["unique_visitors", "uniqueVisitors"];
    pub const SESSIONS: &[&str] = &["total_sessions", "totalSessions"];
    pub const ENGAGEMENT_RATE: &[&str] = &["engagement_rate", "engagementRate"];
    pub const BOUNCE_RATE: &[&str] = &["bounce_rate", "bounceRate"];
    pub const AVG_DURATION: &[&str] = &["avg_session_duration", "avgSessionDuration"];
    pub const CONVERSIONS: &[&str] = &["form_submissions"];
    pub const RESUME_DOWNLOADS: &[&str] = &["resume_downloads"];

    pub const DAY_DATE: &[&str] = &["date"];
    pub const DAY_VISITORS: &[&str] = &["visitors"];
    pub const DAY_SESSIONS: &[&str] = &["sessions"];
    pub const DAY_ENGAGEMENT: &[&str] = &["engagement_rate"];
    pub const DAY_BOUNCE: &[&str] = &["bounce_rate"];
    pub const DAY_DURATION: &[&str] = &["avg_session_duration_sec", "avg_duration"];
    pub const DAY_DESKTOP: &[&str] = &["desktop_sessions"];
    pub const DAY_MOBILE: &[&str] = &["mobile_sessions"];
    pub const DAY_TABLET: &[&str] = &["tablet_sessions"];

    pub const TRAFFIC_SOURCE: &[&str] = &["traffic_source", "source"];
    pub const TRAFFIC_MEDIUM: &[&str] = &["traffic_medium", "medium"];
    pub const TRAFFIC_SESSIONS: &[&str] = &["total_sessions", "sessions"];
    pub const TRAFFIC_ENGAGEMENT: &[&str] = &["avg_engagement_rate", "avg_engagement"];

    pub const COUNTRY: &[&str] = &["country"];
    pub const COUNTRY_VISITORS: &[&str] = &["visitors"];

    pub const SEG_CONVERTERS: &[&str] = &["converter"];
    pub const SEG_HIGH_INTENT: &[&str] = &["high_intent"];
    pub const SEG_EXPLORERS: &[&str] = &["engaged_explorer"];
    pub const SEG_RETURNING: &[&str] = &["returning"];
    pub const SEG_CASUAL: &[&str] = &["casual_browser"];

    pub const CTA_VIEWS: &[&str] = &["cta_views"];
    pub const CTA_CLICKS: &[&str] = &["cta_clicks"];
    pub const FORM_STARTS: &[&str] = &["form_starts"];
    pub const FORM_SUBMISSIONS: &[&str] = &["form_submissions"];
    pub const SOCIAL_CLICKS: &[&str] = &["social_clicks"];

    pub const METRIC_TYPE: &[&str] = &["metric_type"];
    pub const METRIC_NAME: &[&str] = &["metric_name"];
    pub const CTR: &[&str] = &["ctr"];
    pub const TIMES_SHOWN: &[&str] = &["times_shown"];
    pub const TIMES_CLICKED: &[&str] = &["times_clicked"];

    pub const PROJECT_ID: &[&str] = &["project_id"];
    pub const PROJECT_TITLE: &[&str] = &["project_title"];
    pub const PROJECT_RANK: &[&str] = &["overall_rank"];
    pub const TOTAL_VIEWS: &[&str] = &["total_views"];
    pub const TOTAL_CLICKS: &[&str] = &["total_clicks"];
    pub const ENGAGEMENT_SCORE: &[&str] = &["engagement_score"];
    pub const RECOMMENDED_POSITION: &[&str] = &["recommended_position"];

    pub const SKILL_NAME: &[&str] = &["skill_name"];
    pub const SKILL_CATEGORY: &[&str] = &["skill_category"];
    pub const SKILL_CLICKS: &[&str] = &["total_clicks", "total_interest_signals"];
    pub const SKILL_RANK: &[&str] = &["skill_rank", "demand_rank"];
    pub const DEMAND_TIER: &[&str] = &["demand_tier"];
    pub const LEARNING_PRIORITY: &[&str] = &["learning_priority"];

    pub const DOMAIN: &[&str] = &["domain"];
    pub const DOMAIN_RANK: &[&str] = &["interest_rank"];
    pub const DOMAIN_SCORE: &[&str] = &["total_interest_score"];
    pub const PORTFOLIO_RECOMMENDATION: &[&str] = &["portfolio_recommendation"];

    pub const EXPERIENCE_ID: &[&str] = &["experience_id"];
    pub const EXPERIENCE_RANK: &[&str] = &["experience_rank"];
    pub const EXPERIENCE_INTERACTIONS: &[&str] = &["total_interactions"];

    pub const SECTION_ID: &[&str] = &["section_id"];
    pub const SECTION_HEALTH: &[&str] = &["health_score"];
    pub const ENGAGEMENT_RANK: &[&str] = &["engagement_rank"];
    pub const HEALTH_TIER: &[&str] = &["health_tier"];
    pub const OPTIMIZATION_HINT: &[&str] = &["optimization_priority"];

    pub const CLIENT_ID: &[&str] = &["client_id"];
    pub const CLIENT_NAME: &[&str] = &["client_name"];
}

pub const DEFAULT_SECTION_HEALTH: f64 = 50.0;

pub fn payload(sources: &RawSources, name: SourceName) -> Option<&Value> {
    sources.get(&name).and_then(|value| value.as_ref())
}

pub fn map_overview(sessions: Option<&Value>, funnel: Option<&Value>) -> OverviewSnapshot {
    let overview = object_field(sessions, keys::OVERVIEW);
    let summary = object_field(funnel, keys::SUMMARY);

    OverviewSnapshot {
        unique_visitors: number_field(overview, keys::VISITORS, 0.0),
        sessions: number_field(overview, keys::SESSIONS, 0.0),
        engagement_rate: number_field(overview, keys::ENGAGEMENT_RATE, 0.0),
        bounce_rate: number_field(overview, keys::BOUNCE_RATE, 0.0),
        avg_session_duration_sec: number_field(overview, keys::AVG_DURATION, 0.0),
        conversions: number_field(summary, keys::CONVERSIONS, 0.0),
        resume_downloads: number_field(summary, keys::RESUME_DOWNLOADS, 0.0),
    }
}

/// Comparison-period values. Unlike the overview, absence is kept so the
/// trend calculation can tell "zero" from "no data".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreviousTotals {
    pub visitors: Option<f64>,
    pub sessions: Option<f64>,
    pub engagement_rate: Option<f64>,
    pub conversions: Option<f64>,
}

pub fn map_previous_totals(sessions: Option<&Value>, funnel: Option<&Value>) -> PreviousTotals {
    let overview = object_field(sessions, keys::OVERVIEW);
    let summary = object_field(funnel, keys::SUMMARY);

    PreviousTotals {
        visitors: number_field_opt(overview, keys::VISITORS),
        sessions: number_field_opt(overview, keys::SESSIONS),
        engagement_rate: number_field_opt(overview, keys::ENGAGEMENT_RATE),
        conversions: number_field_opt(summary, keys::CONVERSIONS),
    }
}

pub fn map_daily_metrics(daily: Option<&Value>) -> Vec<DailyMetric> {
    let mut metrics: Vec<DailyMetric> = array_field(daily, keys::DAILY_ROWS)
        .iter()
        .filter_map(|row| {
            let row = Some(row);
            let raw_date = text_field(row, keys::DAY_DATE, "");
            let date = match NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d") {
                Ok(date) => date,
                Err(_) => {
                    debug!(date = %raw_date, "dropping daily row with unreadable date");
                    return None;
                }
            };
            Some(DailyMetric {
                date,
                visitors: number_field(row, keys::DAY_VISITORS, 0.0),
                sessions: number_field(row, keys::DAY_SESSIONS, 0.0),
                engagement_rate: number_field(row, keys::DAY_ENGAGEMENT, 0.0),
                bounce_rate: number_field(row, keys::DAY_BOUNCE, 0.0),
                avg_session_duration_sec: number_field(row, keys::DAY_DURATION, 0.0),
                desktop_sessions: number_field(row, keys::DAY_DESKTOP, 0.0),
                mobile_sessions: number_field(row, keys::DAY_MOBILE, 0.0),
                tablet_sessions: number_field(row, keys::DAY_TABLET, 0.0),
            })
        })
        .collect();

    metrics.sort_by_key(|metric| metric.date);
    metrics
}

pub fn map_traffic_sources(
    traffic_stats: Option<&Value>,
    sessions: Option<&Value>,
) -> Vec<TrafficSource> {
    let rows = match traffic_stats
        .and_then(|value| value.get(keys::TRAFFIC_ROWS))
        .and_then(Value::as_array)
    {
        Some(rows) => rows.as_slice(),
        None => array_field(sessions, keys::TRAFFIC_ROWS),
    };

    rows.iter()
        .map(|row| {
            let row = Some(row);
            TrafficSource {
                source: text_field(row, keys::TRAFFIC_SOURCE, "direct"),
                medium: text_field(row, keys::TRAFFIC_MEDIUM, "none"),
                sessions: number_field(row, keys::TRAFFIC_SESSIONS, 0.0),
                engagement_rate: number_field(row, keys::TRAFFIC_ENGAGEMENT, 0.0),
            }
        })
        .collect()
}

pub fn map_top_countries(sessions: Option<&Value>) -> Vec<CountryVisitors> {
    array_field(sessions, keys::COUNTRY_ROWS)
        .iter()
        .map(|row| CountryVisitors {
            country: text_field(Some(row), keys::COUNTRY, "Unknown"),
            visitors: number_field(Some(row), keys::COUNTRY_VISITORS, 0.0),
        })
        .collect()
}

pub fn map_visitor_segments(visitor_insights: Option<&Value>) -> VisitorSegments {
    let totals = object_field(visitor_insights, keys::SEGMENT_TOTALS);
    VisitorSegments {
        converters: number_field(totals, keys::SEG_CONVERTERS, 0.0),
        high_intent: number_field(totals, keys::SEG_HIGH_INTENT, 0.0),
        engaged_explorers: number_field(totals, keys::SEG_EXPLORERS, 0.0),
        returning_visitors: number_field(totals, keys::SEG_RETURNING, 0.0),
        casual_browsers: number_field(totals, keys::SEG_CASUAL, 0.0),
    }
}

pub fn map_conversion_funnel(funnel: Option<&Value>) -> ConversionFunnelSnapshot {
    let summary = object_field(funnel, keys::SUMMARY);
    ConversionFunnelSnapshot::from_counts(
        [
            number_field(summary, keys::CTA_VIEWS, 0.0),
            number_field(summary, keys::CTA_CLICKS, 0.0),
            number_field(summary, keys::FORM_STARTS, 0.0),
            number_field(summary, keys::FORM_SUBMISSIONS, 0.0),
        ],
        number_field(summary, keys::RESUME_DOWNLOADS, 0.0),
        number_field(summary, keys::SOCIAL_CLICKS, 0.0),
    )
}

pub fn map_recommendations(performance: Option<&Value>) -> RecommendationPerformance {
    let rows = array_field(performance, keys::PERFORMANCE_ROWS);
    let overall = find_row(rows, keys::METRIC_TYPE, "overall");
    let position_ctr =
        |name: &str| number_field(find_row(rows, keys::METRIC_NAME, name), keys::CTR, 0.0);
    let overall_ctr = number_field(overall, keys::CTR, 0.0);

    RecommendationPerformance {
        system_health: SystemHealth::from_ctr(overall_ctr),
        overall_ctr,
        position_1_ctr: position_ctr("position_1"),
        position_2_ctr: position_ctr("position_2"),
        position_3_ctr: position_ctr("position_3"),
        total_impressions: number_field(overall, keys::TIMES_SHOWN, 0.0),
        total_clicks: number_field(overall, keys::TIMES_CLICKED, 0.0),
    }
}

fn find_row<'a>(rows: &'a [Value], fields: &[&str], wanted: &str) -> Option<&'a Value> {
    rows.iter()
        .find(|row| text_field(Some(*row), fields, "") == wanted)
}

fn rank_field(row: Option<&Value>, keys: &[&str]) -> Rank {
    Rank::from_value(number_field(row, keys, UNRANKED_SENTINEL as f64))
}

pub fn map_projects(payload: Option<&Value>) -> Vec<ProjectRanking> {
    array_field(payload, keys::RANKING_ROWS)
        .iter()
        .map(|row| {
            let row = Some(row);
            ProjectRanking {
                project_id: text_field(row, keys::PROJECT_ID, "unknown"),
                title: text_field(row, keys::PROJECT_TITLE, "Unknown Project"),
                rank: rank_field(row, keys::PROJECT_RANK),
                total_views: number_field(row, keys::TOTAL_VIEWS, 0.0),
                total_clicks: number_field(row, keys::TOTAL_CLICKS, 0.0),
                engagement_score: number_field(row, keys::ENGAGEMENT_SCORE, 0.0),
                recommended_position: text_field(row, keys::RECOMMENDED_POSITION, "primary"),
            }
        })
        .collect()
}

pub fn map_skills(payload: Option<&Value>) -> Vec<SkillRanking> {
    array_field(payload, keys::RANKING_ROWS)
        .iter()
        .map(|row| {
            let row = Some(row);
            SkillRanking {
                name: text_field(row, keys::SKILL_NAME, "Unknown"),
                category: text_field(row, keys::SKILL_CATEGORY, "Other"),
                clicks: number_field(row, keys::SKILL_CLICKS, 0.0),
                rank: rank_field(row, keys::SKILL_RANK),
                tier: SkillTier::from_label(&text_field(row, keys::DEMAND_TIER, ""))
                    .unwrap_or(SkillTier::Niche),
                learning_priority: text_field(row, keys::LEARNING_PRIORITY, "maintain_expertise"),
            }
        })
        .collect()
}

pub fn map_domains(payload: Option<&Value>) -> Vec<DomainRanking> {
    array_field(payload, keys::RANKING_ROWS)
        .iter()
        .map(|row| {
            let row = Some(row);
            DomainRanking {
                domain: text_field(row, keys::DOMAIN, "Unknown"),
                rank: rank_field(row, keys::DOMAIN_RANK),
                interest_score: number_field(row, keys::DOMAIN_SCORE, 0.0),
                tier: DomainTier::from_label(&text_field(row, keys::DEMAND_TIER, ""))
                    .unwrap_or(DomainTier::NicheInterest),
                recommendation: text_field(row, keys::PORTFOLIO_RECOMMENDATION, "maintain"),
            }
        })
        .collect()
}

pub fn map_experiences(payload: Option<&Value>) -> Vec<ExperienceRanking> {
    array_field(payload, keys::RANKING_ROWS)
        .iter()
        .map(|row| {
            let row = Some(row);
            ExperienceRanking {
                experience_id: text_field(row, keys::EXPERIENCE_ID, "Unknown"),
                rank: rank_field(row, keys::EXPERIENCE_RANK),
                interactions: number_field(row, keys::EXPERIENCE_INTERACTIONS, 0.0),
            }
        })
        .collect()
}

pub fn map_sections(payload: Option<&Value>) -> Vec<SectionRanking> {
    array_field(payload, keys::RANKING_ROWS)
        .iter()
        .map(|row| {
            let row = Some(row);
            SectionRanking {
                section_id: text_field(row, keys::SECTION_ID, "unknown"),
                health_score: number_field(row, keys::SECTION_HEALTH, DEFAULT_SECTION_HEALTH),
                rank: rank_field(row, keys::ENGAGEMENT_RANK),
                tier: SectionTier::from_label(&text_field(row, keys::HEALTH_TIER, ""))
                    .unwrap_or(SectionTier::NeedsAttention),
                optimization_hint: text_field(row, keys::OPTIMIZATION_HINT, "review_content"),
                total_views: number_field(row, keys::TOTAL_VIEWS, 0.0),
            }
        })
        .collect()
}

pub fn map_clients(payload: Option<&Value>) -> Vec<ClientRanking> {
    array_field(payload, keys::RANKING_ROWS)
        .iter()
        .map(|row| {
            let row = Some(row);
            ClientRanking {
                client_id: text_field(row, keys::CLIENT_ID, "unknown"),
                client_name: text_field(row, keys::CLIENT_NAME, "Unknown Client"),
                experience_id: text_field(row, keys::EXPERIENCE_ID, "exp1"),
                domain: text_field(row, keys::DOMAIN, "Other"),
                rank: rank_field(row, keys::ENGAGEMENT_RANK),
                total_views: number_field(row, keys::TOTAL_VIEWS, 0.0),
                total_clicks: number_field(row, keys::TOTAL_CLICKS, 0.0),
            }
        })
        .collect()
}

pub fn map_rankings(sources: &RawSources) -> Rankings {
    Rankings {
        projects: map_projects(payload(sources, SourceName::ProjectRankings)),
        skills: map_skills(payload(sources, SourceName::SkillRankings)),
        sections: map_sections(payload(sources, SourceName::SectionRankings)),
        domains: map_domains(payload(sources, SourceName::DomainRankings)),
        experiences: map_experiences(payload(sources, SourceName::ExperienceRankings)),
        clients: map_clients(payload(sources, SourceName::ClientRankings)),
    }
}
