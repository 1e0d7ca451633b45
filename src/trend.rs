use crate::mapper::PreviousTotals;
use crate::models::{
    DateWindow, KpiTrends, OverviewSnapshot, TrendChange, TrendDirection, TrendResult,
};

/// Relative movement (as a fraction) that still counts as stable.
pub const STABLE_BAND: f64 = 0.05;

/// The window of equal length that ends the day before `window` starts.
pub fn previous_window(window: &DateWindow) -> DateWindow {
    window.preceding().unwrap_or(*window)
}

/// Percent change from `previous` to `current`. A missing or zero baseline
/// yields no change rather than a division by zero.
pub fn calc_trend(current: f64, previous: Option<f64>) -> TrendChange {
    let previous = match previous {
        Some(value) if value != 0.0 && value.is_finite() => value,
        _ => {
            return TrendChange {
                change: 0.0,
                direction: TrendDirection::Stable,
            }
        }
    };

    let ratio = (current - previous) / previous;
    let direction = if ratio > STABLE_BAND {
        TrendDirection::Up
    } else if ratio < -STABLE_BAND {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    TrendChange {
        change: (ratio.abs() * 100.0).round(),
        direction,
    }
}

pub fn trend_result(
    window: &DateWindow,
    previous_window: &DateWindow,
    current: f64,
    previous: Option<f64>,
) -> TrendResult {
    let TrendChange { change, direction } = calc_trend(current, previous);
    TrendResult {
        current: *window,
        previous: *previous_window,
        change,
        direction,
    }
}

pub fn kpi_trends(
    window: &DateWindow,
    previous_window: &DateWindow,
    overview: &OverviewSnapshot,
    previous: &PreviousTotals,
) -> KpiTrends {
    let trend = |current: f64, prior: Option<f64>| {
        trend_result(window, previous_window, current, prior)
    };

    KpiTrends {
        visitors: trend(overview.unique_visitors, previous.visitors),
        sessions: trend(overview.sessions, previous.sessions),
        engagement: trend(overview.engagement_rate, previous.engagement_rate),
        conversions: trend(overview.conversions, previous.conversions),
    }
}
