use crate::models::{
    Channel, ConversionFunnelSnapshot, DateWindow, Insight, KpiTrends, OverviewSnapshot,
    Rankings, Severity, SkillTier, TrafficSource, TrendDirection, TrendResult,
};

pub const STRONG_DAILY_VISITORS: f64 = 10.0;
pub const HIGH_ENGAGEMENT_RATE: f64 = 50.0;
pub const INSIGHT_LOW_ENGAGEMENT_RATE: f64 = 30.0;
pub const INSIGHT_HIGH_BOUNCE_RATE: f64 = 40.0;
pub const WEAK_CTA_CLICK_RATE: f64 = 10.0;
pub const RESUME_INTEREST_DOWNLOADS: f64 = 5.0;
pub const HOT_SKILLS_LISTED: usize = 3;

pub const ALERT_HIGH_BOUNCE_RATE: f64 = 70.0;
pub const ALERT_LOW_ENGAGEMENT_RATE: f64 = 30.0;
pub const CONVERSION_SURGE_PERCENT: f64 = 20.0;
pub const VISITOR_DROP_PERCENT: f64 = 20.0;
pub const ENGAGEMENT_RISE_PERCENT: f64 = 15.0;

#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub window: &'a DateWindow,
    pub overview: &'a OverviewSnapshot,
    pub trends: &'a KpiTrends,
    pub traffic_sources: &'a [TrafficSource],
    pub rankings: &'a Rankings,
    pub funnel: &'a ConversionFunnelSnapshot,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Observation {
    pub value: f64,
    pub direction: Option<TrendDirection>,
    pub subject: Option<String>,
    pub secondary: Option<f64>,
    pub items: Vec<String>,
}

impl Observation {
    fn value(value: f64) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    fn trend(trend: &TrendResult) -> Self {
        Self {
            value: trend.change,
            direction: Some(trend.direction),
            ..Self::default()
        }
    }

    fn items(items: Vec<String>) -> Self {
        Self {
            value: items.len() as f64,
            items,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    AvgDailyVisitors,
    EngagementRate,
    BounceRate,
    TopTrafficSource,
    TopProject,
    HighDemandSkills,
    SectionsNeedingWork,
    CtaClickRate,
    ResumeDownloads,
    VisitorsTrend,
    ConversionsTrend,
    EngagementTrend,
}

impl Metric {
    /// Reads the metric. `None` means there is nothing to judge, for example
    /// an empty collection or a rate with a zero denominator.
    pub fn observe(&self, ctx: &RuleContext<'_>) -> Option<Observation> {
        match self {
            Metric::AvgDailyVisitors => Some(Observation::value(
                ctx.overview.unique_visitors / ctx.window.len_days() as f64,
            )),
            Metric::EngagementRate => Some(Observation::value(ctx.overview.engagement_rate)),
            Metric::BounceRate => Some(Observation::value(ctx.overview.bounce_rate)),
            Metric::TopTrafficSource => top_traffic_source(ctx),
            Metric::TopProject => ctx
                .rankings
                .projects
                .iter()
                .find(|project| project.rank.is_top())
                .map(|project| Observation {
                    value: project.total_clicks,
                    subject: Some(project.title.clone()),
                    ..Observation::default()
                }),
            Metric::HighDemandSkills => Some(Observation::items(
                ctx.rankings
                    .skills
                    .iter()
                    .filter(|skill| skill.tier == SkillTier::HighDemand)
                    .map(|skill| skill.name.clone())
                    .collect(),
            )),
            Metric::SectionsNeedingWork => Some(Observation::items(
                ctx.rankings
                    .sections
                    .iter()
                    .filter(|section| section.tier.needs_work())
                    .map(|section| section.section_id.clone())
                    .collect(),
            )),
            Metric::CtaClickRate => ctx.funnel.cta_click_rate().map(Observation::value),
            Metric::ResumeDownloads => Some(Observation::value(ctx.overview.resume_downloads)),
            Metric::VisitorsTrend => Some(Observation::trend(&ctx.trends.visitors)),
            Metric::ConversionsTrend => Some(Observation::trend(&ctx.trends.conversions)),
            Metric::EngagementTrend => Some(Observation::trend(&ctx.trends.engagement)),
        }
    }
}

fn top_traffic_source(ctx: &RuleContext<'_>) -> Option<Observation> {
    // First source wins ties.
    let top = ctx
        .traffic_sources
        .iter()
        .fold(None::<&TrafficSource>, |best, source| match best {
            Some(best) if source.sessions <= best.sessions => Some(best),
            _ => Some(source),
        })?;

    let total = if ctx.overview.sessions > 0.0 {
        ctx.overview.sessions
    } else {
        ctx.traffic_sources.iter().map(|source| source.sessions).sum()
    };
    let share = if total > 0.0 {
        top.sessions / total * 100.0
    } else {
        0.0
    };

    Some(Observation {
        value: share,
        subject: Some(top.source.clone()),
        secondary: Some(top.sessions),
        ..Observation::default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    Above(f64),
    Below(f64),
    /// Holds whenever the metric could be observed at all.
    Present,
    Rising(f64),
    Falling(f64),
}

impl Predicate {
    pub fn holds(&self, observation: &Observation) -> bool {
        match *self {
            Predicate::Above(threshold) => observation.value > threshold,
            Predicate::Below(threshold) => observation.value < threshold,
            Predicate::Present => true,
            Predicate::Rising(threshold) => {
                observation.direction == Some(TrendDirection::Up) && observation.value > threshold
            }
            Predicate::Falling(threshold) => {
                observation.direction == Some(TrendDirection::Down)
                    && observation.value > threshold
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub title: String,
    pub description: String,
    pub metric: Option<f64>,
    pub unit: Option<&'static str>,
}

impl Message {
    fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            metric: None,
            unit: None,
        }
    }

    fn with_metric(mut self, metric: f64, unit: &'static str) -> Self {
        self.metric = Some(metric);
        self.unit = Some(unit);
        self
    }
}

pub type MessageTemplate = fn(&Observation, &RuleContext<'_>) -> Message;

pub struct Rule {
    pub id: &'static str,
    pub channel: Channel,
    pub severity: Severity,
    pub metric: Metric,
    pub predicate: Predicate,
    pub message: MessageTemplate,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("severity", &self.severity)
            .field("metric", &self.metric)
            .field("predicate", &self.predicate)
            .finish()
    }
}

impl Rule {
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<Insight> {
        let observation = self.metric.observe(ctx)?;
        if !self.predicate.holds(&observation) {
            return None;
        }
        let message = (self.message)(&observation, ctx);
        Some(Insight {
            id: self.id.to_string(),
            channel: self.channel,
            severity: self.severity,
            title: message.title,
            description: message.description,
            metric: message.metric,
            unit: message.unit.map(str::to_string),
        })
    }
}

pub const RULES: &[Rule] = &[
    Rule {
        id: "high-traffic",
        channel: Channel::Insight,
        severity: Severity::Success,
        metric: Metric::AvgDailyVisitors,
        predicate: Predicate::Above(STRONG_DAILY_VISITORS),
        message: strong_traffic,
    },
    Rule {
        id: "high-engagement",
        channel: Channel::Insight,
        severity: Severity::Success,
        metric: Metric::EngagementRate,
        predicate: Predicate::Above(HIGH_ENGAGEMENT_RATE),
        message: excellent_engagement,
    },
    Rule {
        id: "low-engagement",
        channel: Channel::Insight,
        severity: Severity::Warning,
        metric: Metric::EngagementRate,
        predicate: Predicate::Below(INSIGHT_LOW_ENGAGEMENT_RATE),
        message: low_engagement,
    },
    Rule {
        id: "high-bounce",
        channel: Channel::Insight,
        severity: Severity::Warning,
        metric: Metric::BounceRate,
        predicate: Predicate::Above(INSIGHT_HIGH_BOUNCE_RATE),
        message: high_bounce,
    },
    Rule {
        id: "top-source",
        channel: Channel::Insight,
        severity: Severity::Info,
        metric: Metric::TopTrafficSource,
        predicate: Predicate::Present,
        message: top_source,
    },
    Rule {
        id: "top-project",
        channel: Channel::Insight,
        severity: Severity::Success,
        metric: Metric::TopProject,
        predicate: Predicate::Present,
        message: top_project,
    },
    Rule {
        id: "hot-skills",
        channel: Channel::Insight,
        severity: Severity::Opportunity,
        metric: Metric::HighDemandSkills,
        predicate: Predicate::Above(0.0),
        message: hot_skills,
    },
    Rule {
        id: "section-health",
        channel: Channel::Insight,
        severity: Severity::Warning,
        metric: Metric::SectionsNeedingWork,
        predicate: Predicate::Above(0.0),
        message: sections_need_work,
    },
    Rule {
        id: "weak-cta",
        channel: Channel::Insight,
        severity: Severity::Opportunity,
        metric: Metric::CtaClickRate,
        predicate: Predicate::Below(WEAK_CTA_CLICK_RATE),
        message: weak_cta,
    },
    Rule {
        id: "resume-downloads",
        channel: Channel::Insight,
        severity: Severity::Success,
        metric: Metric::ResumeDownloads,
        predicate: Predicate::Above(RESUME_INTEREST_DOWNLOADS),
        message: resume_interest,
    },
    Rule {
        id: "alert-high-bounce",
        channel: Channel::Alert,
        severity: Severity::Warning,
        metric: Metric::BounceRate,
        predicate: Predicate::Above(ALERT_HIGH_BOUNCE_RATE),
        message: bounce_alert,
    },
    Rule {
        id: "alert-low-engagement",
        channel: Channel::Alert,
        severity: Severity::Warning,
        metric: Metric::EngagementRate,
        predicate: Predicate::Below(ALERT_LOW_ENGAGEMENT_RATE),
        message: engagement_alert,
    },
    Rule {
        id: "alert-conversion-surge",
        channel: Channel::Alert,
        severity: Severity::Success,
        metric: Metric::ConversionsTrend,
        predicate: Predicate::Rising(CONVERSION_SURGE_PERCENT),
        message: conversion_surge,
    },
    Rule {
        id: "alert-visitor-drop",
        channel: Channel::Alert,
        severity: Severity::Critical,
        metric: Metric::VisitorsTrend,
        predicate: Predicate::Falling(VISITOR_DROP_PERCENT),
        message: visitor_drop,
    },
    Rule {
        id: "alert-engagement-rise",
        channel: Channel::Alert,
        severity: Severity::Success,
        metric: Metric::EngagementTrend,
        predicate: Predicate::Rising(ENGAGEMENT_RISE_PERCENT),
        message: engagement_rise,
    },
];

pub fn evaluate(ctx: &RuleContext<'_>) -> Vec<Insight> {
    evaluate_rules(RULES, ctx)
}

pub fn evaluate_rules(rules: &[Rule], ctx: &RuleContext<'_>) -> Vec<Insight> {
    rules.iter().filter_map(|rule| rule.evaluate(ctx)).collect()
}

fn strong_traffic(observation: &Observation, ctx: &RuleContext<'_>) -> Message {
    Message::new(
        "Strong Traffic",
        format!("Averaging {:.1} visitors/day", observation.value),
    )
    .with_metric(ctx.overview.unique_visitors, "total")
}

fn excellent_engagement(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        "Excellent Engagement",
        "Over half of visitors engage with content",
    )
    .with_metric(observation.value, "%")
}

fn low_engagement(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        "Low Engagement",
        "Consider adding more interactive elements",
    )
    .with_metric(observation.value, "%")
}

fn high_bounce(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new("High Bounce Rate", "Many visitors leave after one page")
        .with_metric(observation.value, "%")
}

fn top_source(observation: &Observation, _: &RuleContext<'_>) -> Message {
    let name = observation.subject.as_deref().unwrap_or("direct");
    let label = if name == "direct" { "Direct" } else { name };
    Message::new(
        format!("Top Source: {label}"),
        format!("{:.0}% of all sessions", observation.value),
    )
    .with_metric(observation.secondary.unwrap_or(0.0), "sessions")
}

fn top_project(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        "Top Project",
        observation.subject.clone().unwrap_or_default(),
    )
    .with_metric(observation.value, "clicks")
}

fn hot_skills(observation: &Observation, _: &RuleContext<'_>) -> Message {
    let listed: Vec<&str> = observation
        .items
        .iter()
        .take(HOT_SKILLS_LISTED)
        .map(String::as_str)
        .collect();
    Message::new(
        format!("{} High-Demand Skills", observation.items.len()),
        listed.join(", "),
    )
}

fn sections_need_work(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        format!("{} Section(s) Need Work", observation.items.len()),
        observation.items.join(", "),
    )
}

fn weak_cta(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new("CTA Optimization", "Click rate below average").with_metric(observation.value, "%")
}

fn resume_interest(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new("Resume Interest", "Strong download activity")
        .with_metric(observation.value, "downloads")
}

fn bounce_alert(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        "High Bounce Rate",
        format!(
            "{:.1}% of visitors leave without engaging.",
            observation.value
        ),
    )
    .with_metric(observation.value, "%")
}

fn engagement_alert(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        "Low Engagement",
        format!(
            "Only {:.1}% of sessions are engaged.",
            observation.value
        ),
    )
    .with_metric(observation.value, "%")
}

fn conversion_surge(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        "Conversions Surging",
        format!(
            "Conversions are up {:.0}% on the previous period.",
            observation.value
        ),
    )
    .with_metric(observation.value, "%")
}

fn visitor_drop(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        "Visitor Drop",
        format!(
            "Visitors fell {:.0}% compared with the previous period.",
            observation.value
        ),
    )
    .with_metric(observation.value, "%")
}

fn engagement_rise(observation: &Observation, _: &RuleContext<'_>) -> Message {
    Message::new(
        "Engagement Rising",
        format!(
            "Engagement rate is up {:.0}% on the previous period.",
            observation.value
        ),
    )
    .with_metric(observation.value, "%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectRanking, Rank, SectionRanking, SectionTier, SkillRanking};
    use chrono::NaiveDate;

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
        )
        .unwrap()
    }

    fn flat_trends(window: &DateWindow) -> KpiTrends {
        let flat = TrendResult {
            current: *window,
            previous: *window,
            change: 0.0,
            direction: TrendDirection::Stable,
        };
        KpiTrends {
            visitors: flat,
            sessions: flat,
            engagement: flat,
            conversions: flat,
        }
    }

    struct Fixture {
        window: DateWindow,
        overview: OverviewSnapshot,
        trends: KpiTrends,
        traffic: Vec<TrafficSource>,
        rankings: Rankings,
        funnel: ConversionFunnelSnapshot,
    }

    impl Fixture {
        fn new() -> Self {
            let window = window();
            Self {
                window,
                overview: OverviewSnapshot {
                    engagement_rate: 40.0,
                    bounce_rate: 20.0,
                    ..OverviewSnapshot::default()
                },
                trends: flat_trends(&window),
                traffic: Vec::new(),
                rankings: Rankings::default(),
                funnel: ConversionFunnelSnapshot::default(),
            }
        }

        fn findings(&self) -> Vec<Insight> {
            evaluate(&RuleContext {
                window: &self.window,
                overview: &self.overview,
                trends: &self.trends,
                traffic_sources: &self.traffic,
                rankings: &self.rankings,
                funnel: &self.funnel,
            })
        }

        fn ids(&self) -> Vec<String> {
            self.findings().into_iter().map(|insight| insight.id).collect()
        }
    }

    #[test]
    fn quiet_model_produces_nothing() {
        assert!(Fixture::new().ids().is_empty());
    }

    #[test]
    fn rule_ids_are_unique() {
        let mut ids: Vec<&str> = RULES.iter().map(|rule| rule.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), RULES.len());
    }

    #[test]
    fn daily_visitors_use_window_length() {
        let mut fixture = Fixture::new();
        fixture.overview.unique_visitors = 70.0;
        assert!(!fixture.ids().contains(&"high-traffic".to_string()));

        fixture.overview.unique_visitors = 77.0;
        let findings = fixture.findings();
        let traffic = findings.iter().find(|f| f.id == "high-traffic").unwrap();
        assert_eq!(traffic.severity, Severity::Success);
        assert_eq!(traffic.description, "Averaging 11.0 visitors/day");
        assert_eq!(traffic.metric, Some(77.0));
    }

    #[test]
    fn engagement_bands() {
        let mut fixture = Fixture::new();
        fixture.overview.engagement_rate = 55.0;
        assert_eq!(fixture.ids(), vec!["high-engagement"]);

        fixture.overview.engagement_rate = 25.0;
        assert_eq!(fixture.ids(), vec!["low-engagement", "alert-low-engagement"]);
    }

    #[test]
    fn bounce_thresholds_stay_distinct() {
        let mut fixture = Fixture::new();
        fixture.overview.bounce_rate = 50.0;
        assert_eq!(fixture.ids(), vec!["high-bounce"]);

        fixture.overview.bounce_rate = 75.0;
        assert_eq!(fixture.ids(), vec!["high-bounce", "alert-high-bounce"]);
    }

    #[test]
    fn top_source_reports_share() {
        let mut fixture = Fixture::new();
        fixture.overview.sessions = 100.0;
        fixture.traffic = vec![
            TrafficSource {
                source: "direct".to_string(),
                medium: "none".to_string(),
                sessions: 65.0,
                engagement_rate: 48.5,
            },
            TrafficSource {
                source: "linkedin.com".to_string(),
                medium: "referral".to_string(),
                sessions: 12.0,
                engagement_rate: 72.1,
            },
        ];
        let findings = fixture.findings();
        let top = findings.iter().find(|f| f.id == "top-source").unwrap();
        assert_eq!(top.title, "Top Source: Direct");
        assert_eq!(top.description, "65% of all sessions");
        assert_eq!(top.metric, Some(65.0));
        assert_eq!(top.unit.as_deref(), Some("sessions"));
    }

    #[test]
    fn top_source_with_no_sessions_does_not_divide_by_zero() {
        let mut fixture = Fixture::new();
        fixture.traffic = vec![TrafficSource {
            source: "google".to_string(),
            medium: "organic".to_string(),
            sessions: 0.0,
            engagement_rate: 0.0,
        }];
        let findings = fixture.findings();
        assert_eq!(findings[0].description, "0% of all sessions");
    }

    #[test]
    fn ranking_rules() {
        let mut fixture = Fixture::new();
        fixture.rankings.projects = vec![ProjectRanking {
            project_id: "virtual-try-on".to_string(),
            title: "Virtual Try-On Bot".to_string(),
            rank: Rank::Ranked(1),
            total_views: 39.0,
            total_clicks: 15.0,
            engagement_score: 85.2,
            recommended_position: "featured".to_string(),
        }];
        fixture.rankings.skills = ["Python", "TensorFlow", "React", "LangChain"]
            .iter()
            .map(|name| SkillRanking {
                name: name.to_string(),
                category: "Other".to_string(),
                clicks: 1.0,
                rank: Rank::Unranked,
                tier: SkillTier::HighDemand,
                learning_priority: "maintain_expertise".to_string(),
            })
            .collect();
        fixture.rankings.sections = vec![
            SectionRanking {
                section_id: "skills".to_string(),
                health_score: 58.0,
                rank: Rank::Ranked(5),
                tier: SectionTier::NeedsAttention,
                optimization_hint: "make_more_engaging".to_string(),
                total_views: 38.0,
            },
            SectionRanking {
                section_id: "hero".to_string(),
                health_score: 95.0,
                rank: Rank::Ranked(1),
                tier: SectionTier::Excellent,
                optimization_hint: "performing_well".to_string(),
                total_views: 65.0,
            },
            SectionRanking {
                section_id: "contact".to_string(),
                health_score: 20.0,
                rank: Rank::Ranked(6),
                tier: SectionTier::Critical,
                optimization_hint: "improve_content".to_string(),
                total_views: 25.0,
            },
        ];

        let findings = fixture.findings();
        let ids: Vec<&str> = findings.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["top-project", "hot-skills", "section-health"]);
        assert_eq!(findings[0].description, "Virtual Try-On Bot");
        assert_eq!(findings[1].title, "4 High-Demand Skills");
        assert_eq!(findings[1].description, "Python, TensorFlow, React");
        assert_eq!(findings[2].description, "skills, contact");
    }

    #[test]
    fn unranked_project_is_not_top() {
        let mut fixture = Fixture::new();
        fixture.rankings.projects = vec![ProjectRanking {
            project_id: "x".to_string(),
            title: "X".to_string(),
            rank: Rank::Unranked,
            total_views: 0.0,
            total_clicks: 0.0,
            engagement_score: 0.0,
            recommended_position: "primary".to_string(),
        }];
        assert!(fixture.ids().is_empty());
    }

    #[test]
    fn weak_cta_needs_views() {
        let mut fixture = Fixture::new();
        fixture.funnel = ConversionFunnelSnapshot::from_counts([0.0, 0.0, 0.0, 0.0], 0.0, 0.0);
        assert!(fixture.ids().is_empty());

        fixture.funnel = ConversionFunnelSnapshot::from_counts([200.0, 10.0, 2.0, 1.0], 0.0, 0.0);
        assert_eq!(fixture.ids(), vec!["weak-cta"]);
    }

    #[test]
    fn resume_downloads_threshold() {
        let mut fixture = Fixture::new();
        fixture.overview.resume_downloads = 5.0;
        assert!(fixture.ids().is_empty());
        fixture.overview.resume_downloads = 6.0;
        assert_eq!(fixture.ids(), vec!["resume-downloads"]);
    }

    #[test]
    fn trend_alerts_need_direction_and_size() {
        let mut fixture = Fixture::new();
        fixture.trends.conversions.change = 25.0;
        fixture.trends.conversions.direction = TrendDirection::Down;
        fixture.trends.visitors.change = 30.0;
        fixture.trends.visitors.direction = TrendDirection::Down;
        fixture.trends.engagement.change = 15.0;
        fixture.trends.engagement.direction = TrendDirection::Up;
        assert_eq!(fixture.ids(), vec!["alert-visitor-drop"]);

        fixture.trends.conversions.direction = TrendDirection::Up;
        fixture.trends.engagement.change = 16.0;
        let findings = fixture.findings();
        let ids: Vec<&str> = findings.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["alert-conversion-surge", "alert-visitor-drop", "alert-engagement-rise"]
        );
        assert_eq!(findings[1].severity, Severity::Critical);
        assert!(findings.iter().all(|f| f.channel == Channel::Alert));
    }
}
