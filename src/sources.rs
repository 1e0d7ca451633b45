use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    Sessions,
    DailyMetrics,
    ConversionFunnel,
    TrafficDailyStats,
    ProjectRankings,
    SkillRankings,
    SectionRankings,
    ClientRankings,
    DomainRankings,
    ExperienceRankings,
    RecommendationPerformance,
    VisitorInsights,
}

impl SourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::Sessions => "sessions",
            SourceName::DailyMetrics => "daily_metrics",
            SourceName::ConversionFunnel => "conversion_funnel",
            SourceName::TrafficDailyStats => "traffic_daily_stats",
            SourceName::ProjectRankings => "project_rankings",
            SourceName::SkillRankings => "skill_rankings",
            SourceName::SectionRankings => "section_rankings",
            SourceName::ClientRankings => "client_rankings",
            SourceName::DomainRankings => "domain_rankings",
            SourceName::ExperienceRankings => "experience_rankings",
            SourceName::RecommendationPerformance => "recommendation_performance",
            SourceName::VisitorInsights => "visitor_insights",
        }
    }
}

impl std::fmt::Display for SourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: SourceName,
    pub path: &'static str,
    /// Whether the endpoint takes `start_date`/`end_date` query parameters.
    pub dated: bool,
}

const fn source(name: SourceName, path: &'static str, dated: bool) -> SourceDescriptor {
    SourceDescriptor { name, path, dated }
}

pub const CURRENT_PERIOD_SOURCES: &[SourceDescriptor] = &[
    source(SourceName::Sessions, "/api/sessions", true),
    source(SourceName::DailyMetrics, "/api/daily-metrics", true),
    source(SourceName::ConversionFunnel, "/api/conversion-funnel", true),
    source(SourceName::TrafficDailyStats, "/api/traffic-daily-stats", true),
    source(SourceName::ProjectRankings, "/api/project-rankings", false),
    source(SourceName::SkillRankings, "/api/skill-rankings", false),
    source(SourceName::SectionRankings, "/api/section-rankings", false),
    source(SourceName::ClientRankings, "/api/client-rankings", false),
    source(SourceName::DomainRankings, "/api/domain-rankings", false),
    source(SourceName::ExperienceRankings, "/api/experience-rankings", false),
    source(
        SourceName::RecommendationPerformance,
        "/api/recommendation-performance",
        false,
    ),
    source(SourceName::VisitorInsights, "/api/visitor-insights", false),
];

/// Reduced fan-out for the comparison period: only what the tracked KPI
/// trends are computed from.
pub const PREVIOUS_PERIOD_SOURCES: &[SourceDescriptor] = &[
    source(SourceName::Sessions, "/api/sessions", true),
    source(SourceName::ConversionFunnel, "/api/conversion-funnel", true),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_period_sources_are_dated_subset() {
        for previous in PREVIOUS_PERIOD_SOURCES {
            assert!(previous.dated);
            assert!(CURRENT_PERIOD_SOURCES.contains(previous));
        }
    }

    #[test]
    fn source_names_are_unique() {
        let mut names: Vec<SourceName> =
            CURRENT_PERIOD_SOURCES.iter().map(|d| d.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CURRENT_PERIOD_SOURCES.len());
    }
}
