use crate::models::{HealthScore, OverviewSnapshot, TrendDirection};

pub const ENGAGEMENT_FACTOR: f64 = 1.5;
pub const BOUNCE_FACTOR: f64 = 1.5;
pub const CONVERSION_FACTOR: f64 = 10.0;

pub const ENGAGEMENT_WEIGHT: f64 = 0.4;
pub const BOUNCE_WEIGHT: f64 = 0.3;
pub const CONVERSION_WEIGHT: f64 = 0.2;
pub const GROWTH_WEIGHT: f64 = 0.1;

pub fn growth_score(direction: TrendDirection) -> f64 {
    match direction {
        TrendDirection::Up => 80.0,
        TrendDirection::Stable => 60.0,
        TrendDirection::Down => 40.0,
    }
}

pub fn health_score(overview: &OverviewSnapshot, visitors_trend: TrendDirection) -> HealthScore {
    let engagement = (overview.engagement_rate * ENGAGEMENT_FACTOR).min(100.0);
    let bounce = (100.0 - overview.bounce_rate * BOUNCE_FACTOR).max(0.0);
    let conversion = (overview.conversions * CONVERSION_FACTOR).min(100.0);
    let growth = growth_score(visitors_trend);

    HealthScore::new(
        engagement * ENGAGEMENT_WEIGHT
            + bounce * BOUNCE_WEIGHT
            + conversion * CONVERSION_WEIGHT
            + growth * GROWTH_WEIGHT,
    )
}
