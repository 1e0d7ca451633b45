use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::sources::SourceName;

/// Rank value upstream uses for "present in the data but not ranked".
pub const UNRANKED_SENTINEL: u32 = 999;

/// Inclusive reporting period. `start <= end` always holds, and the equal
/// length window right before it is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> PipelineResult<Self> {
        if start > end || preceding_bounds(start, end).is_none() {
            return Err(PipelineError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending yesterday, relative to the caller's `today`.
    pub fn trailing(days: i64, today: NaiveDate) -> PipelineResult<Self> {
        let days = days.max(1);
        let start = Duration::try_days(days).and_then(|span| today.checked_sub_signed(span));
        let end = today.checked_sub_signed(Duration::days(1));
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end),
            _ => Err(PipelineError::WindowOutOfRange { days, today }),
        }
    }

    pub fn preceding(&self) -> Option<DateWindow> {
        preceding_bounds(self.start, self.end).map(|(start, end)| DateWindow { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

fn preceding_bounds(start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let length = (end - start).num_days() + 1;
    let previous_start = start.checked_sub_signed(Duration::days(length))?;
    let previous_end = start.checked_sub_signed(Duration::days(1))?;
    Some((previous_start, previous_end))
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendChange {
    pub change: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendResult {
    pub current: DateWindow,
    pub previous: DateWindow,
    pub change: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiTrends {
    pub visitors: TrendResult,
    pub sessions: TrendResult,
    pub engagement: TrendResult,
    pub conversions: TrendResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OverviewSnapshot {
    pub unique_visitors: f64,
    pub sessions: f64,
    pub engagement_rate: f64,
    pub bounce_rate: f64,
    pub avg_session_duration_sec: f64,
    pub conversions: f64,
    pub resume_downloads: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub visitors: f64,
    pub sessions: f64,
    pub engagement_rate: f64,
    pub bounce_rate: f64,
    pub avg_session_duration_sec: f64,
    pub desktop_sessions: f64,
    pub mobile_sessions: f64,
    pub tablet_sessions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficSource {
    pub source: String,
    pub medium: String,
    pub sessions: f64,
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryVisitors {
    pub country: String,
    pub visitors: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VisitorSegments {
    pub converters: f64,
    pub high_intent: f64,
    pub engaged_explorers: f64,
    pub returning_visitors: f64,
    pub casual_browsers: f64,
}

/// Upstream rank. `Unranked` orders after every real rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Ranked(u32),
    Unranked,
}

impl Rank {
    /// Interprets a normalized upstream rank. Values below 1 and the 999
    /// sentinel mean unranked; fractional ranks round to the nearest integer.
    pub fn from_value(value: f64) -> Self {
        if !value.is_finite() || value < 1.0 {
            return Rank::Unranked;
        }
        let rounded = value.round();
        if rounded >= UNRANKED_SENTINEL as f64 {
            Rank::Unranked
        } else {
            Rank::Ranked(rounded as u32)
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Rank::Ranked(1))
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Ranked(n) => write!(f, "#{n}"),
            Rank::Unranked => write!(f, "unranked"),
        }
    }
}

pub trait Ranked {
    fn rank(&self) -> Rank;
}

/// Orders a ranking collection by rank, unranked entries last. Ties keep
/// their upstream order.
pub fn sort_by_rank<T: Ranked>(items: &mut [T]) {
    items.sort_by_key(|item| item.rank());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    HighDemand,
    ModerateDemand,
    Emerging,
    Niche,
}

impl SkillTier {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "high_demand" => Some(SkillTier::HighDemand),
            "moderate_demand" => Some(SkillTier::ModerateDemand),
            "emerging" => Some(SkillTier::Emerging),
            "niche" => Some(SkillTier::Niche),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainTier {
    HighDemand,
    ModerateDemand,
    NicheInterest,
}

impl DomainTier {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "high_demand" => Some(DomainTier::HighDemand),
            "moderate_demand" => Some(DomainTier::ModerateDemand),
            "niche_interest" => Some(DomainTier::NicheInterest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTier {
    Excellent,
    Good,
    NeedsAttention,
    Critical,
}

impl SectionTier {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "excellent" => Some(SectionTier::Excellent),
            "good" => Some(SectionTier::Good),
            "needs_attention" => Some(SectionTier::NeedsAttention),
            "critical" => Some(SectionTier::Critical),
            _ => None,
        }
    }

    pub fn needs_work(&self) -> bool {
        matches!(self, SectionTier::NeedsAttention | SectionTier::Critical)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRanking {
    pub project_id: String,
    pub title: String,
    pub rank: Rank,
    pub total_views: f64,
    pub total_clicks: f64,
    pub engagement_score: f64,
    pub recommended_position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRanking {
    pub name: String,
    pub category: String,
    pub clicks: f64,
    pub rank: Rank,
    pub tier: SkillTier,
    pub learning_priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRanking {
    pub domain: String,
    pub rank: Rank,
    pub interest_score: f64,
    pub tier: DomainTier,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperienceRanking {
    pub experience_id: String,
    pub rank: Rank,
    pub interactions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRanking {
    pub section_id: String,
    pub health_score: f64,
    pub rank: Rank,
    pub tier: SectionTier,
    pub optimization_hint: String,
    pub total_views: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRanking {
    pub client_id: String,
    pub client_name: String,
    pub experience_id: String,
    pub domain: String,
    pub rank: Rank,
    pub total_views: f64,
    pub total_clicks: f64,
}

macro_rules! impl_ranked {
    ($($ty:ty),+ $(,)?) => {
        $(impl Ranked for $ty {
            fn rank(&self) -> Rank {
                self.rank
            }
        })+
    };
}

impl_ranked!(
    ProjectRanking,
    SkillRanking,
    DomainRanking,
    ExperienceRanking,
    SectionRanking,
    ClientRanking,
);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rankings {
    pub projects: Vec<ProjectRanking>,
    pub skills: Vec<SkillRanking>,
    pub sections: Vec<SectionRanking>,
    pub domains: Vec<DomainRanking>,
    pub experiences: Vec<ExperienceRanking>,
    pub clients: Vec<ClientRanking>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStageKind {
    CtaViews,
    CtaClicks,
    FormStarts,
    FormSubmissions,
}

impl FunnelStageKind {
    pub const ORDER: [FunnelStageKind; 4] = [
        FunnelStageKind::CtaViews,
        FunnelStageKind::CtaClicks,
        FunnelStageKind::FormStarts,
        FunnelStageKind::FormSubmissions,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FunnelStageKind::CtaViews => "CTA views",
            FunnelStageKind::CtaClicks => "CTA clicks",
            FunnelStageKind::FormStarts => "Form starts",
            FunnelStageKind::FormSubmissions => "Form submissions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FunnelStage {
    pub stage: FunnelStageKind,
    pub count: f64,
    /// Loss from the preceding stage, never negative.
    pub drop_off: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionFunnelSnapshot {
    pub stages: Vec<FunnelStage>,
    pub resume_downloads: f64,
    pub social_clicks: f64,
}

impl ConversionFunnelSnapshot {
    pub fn from_counts(counts: [f64; 4], resume_downloads: f64, social_clicks: f64) -> Self {
        let mut stages = Vec::with_capacity(counts.len());
        let mut previous: Option<f64> = None;
        for (stage, count) in FunnelStageKind::ORDER.into_iter().zip(counts) {
            let drop_off = previous.map(|prev| (prev - count).max(0.0)).unwrap_or(0.0);
            stages.push(FunnelStage {
                stage,
                count,
                drop_off,
            });
            previous = Some(count);
        }
        Self {
            stages,
            resume_downloads,
            social_clicks,
        }
    }

    pub fn count(&self, kind: FunnelStageKind) -> f64 {
        self.stages
            .iter()
            .find(|stage| stage.stage == kind)
            .map(|stage| stage.count)
            .unwrap_or(0.0)
    }

    /// CTA clicks per hundred CTA views; `None` when nothing was viewed.
    pub fn cta_click_rate(&self) -> Option<f64> {
        let views = self.count(FunnelStageKind::CtaViews);
        if views > 0.0 {
            Some(self.count(FunnelStageKind::CtaClicks) / views * 100.0)
        } else {
            None
        }
    }
}

impl Default for ConversionFunnelSnapshot {
    fn default() -> Self {
        Self::from_counts([0.0; 4], 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemHealth {
    Excellent,
    Good,
    NeedsImprovement,
    Underperforming,
}

impl SystemHealth {
    pub fn from_ctr(ctr: f64) -> Self {
        if ctr >= 10.0 {
            SystemHealth::Excellent
        } else if ctr >= 5.0 {
            SystemHealth::Good
        } else if ctr >= 2.0 {
            SystemHealth::NeedsImprovement
        } else {
            SystemHealth::Underperforming
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendationPerformance {
    pub system_health: SystemHealth,
    pub overall_ctr: f64,
    pub position_1_ctr: f64,
    pub position_2_ctr: f64,
    pub position_3_ctr: f64,
    pub total_impressions: f64,
    pub total_clicks: f64,
}

impl Default for RecommendationPerformance {
    fn default() -> Self {
        Self {
            system_health: SystemHealth::from_ctr(0.0),
            overall_ctr: 0.0,
            position_1_ctr: 0.0,
            position_2_ctr: 0.0,
            position_3_ctr: 0.0,
            total_impressions: 0.0,
            total_clicks: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HealthScore(u8);

impl HealthScore {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 100.0).round() as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Opportunity,
    Info,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Opportunity => "opportunity",
            Severity::Info => "info",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Insight,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub id: String,
    pub channel: Channel,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalDashboardModel {
    pub window: DateWindow,
    pub previous_window: DateWindow,
    pub overview: OverviewSnapshot,
    pub trends: KpiTrends,
    pub daily: Vec<DailyMetric>,
    pub traffic_sources: Vec<TrafficSource>,
    pub top_countries: Vec<CountryVisitors>,
    pub segments: VisitorSegments,
    pub funnel: ConversionFunnelSnapshot,
    pub recommendations: RecommendationPerformance,
    pub rankings: Rankings,
    pub health: HealthScore,
    pub findings: Vec<Insight>,
    pub missing_sources: Vec<SourceName>,
    pub missing_previous_sources: Vec<SourceName>,
    pub partial_data: bool,
}

impl CanonicalDashboardModel {
    pub fn insights(&self) -> impl Iterator<Item = &Insight> {
        self.findings
            .iter()
            .filter(|finding| finding.channel == Channel::Insight)
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Insight> {
        self.findings
            .iter()
            .filter(|finding| finding.channel == Channel::Alert)
    }
}
