//! Business metrics computed from the star schema.
//!
//! Everything here reads the dimensional tables only and is a pure function
//! of them plus [`AnalyticsConfig`].

pub mod projections;
pub mod summaries;

pub use projections::{Projections, RevenueProjection, SessionProjection, UserProjection};
pub use summaries::{
    ChannelSessions, FrequencyChoice, MonthlyRevenue, PlatformPerformance, QuarterlyRevenue,
    Segment, UserEngagement,
};

use serde::Serialize;

use crate::config::AnalyticsConfig;
use crate::warehouse::facts::round2;
use crate::warehouse::StarSchema;

/// Arithmetic mean rounded to two decimals; `None` for no values
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

/// Median rounded to two decimals; `None` for no values
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let value = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    Some(round2(value))
}

/// Headline numbers for the current period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_users: usize,
    pub registered_users: usize,
    pub registration_rate: f64,
    pub total_sessions: usize,
    pub avg_sessions_per_user: f64,
    pub total_revenue: f64,
    pub avg_revenue_per_user: f64,
}

impl Kpis {
    pub fn compute(schema: &StarSchema) -> Self {
        let total_users = schema.users.len();
        let registered_users = schema.users.iter().filter(|u| u.is_registered).count();
        let total_sessions = schema.play_sessions.len();
        let total_revenue = round2(schema.payment_facts.iter().map(|p| p.amount).sum());

        let per_user = |value: f64| {
            if total_users == 0 {
                0.0
            } else {
                value / total_users as f64
            }
        };

        Self {
            total_users,
            registered_users,
            registration_rate: per_user(registered_users as f64),
            total_sessions,
            avg_sessions_per_user: round2(per_user(total_sessions as f64)),
            total_revenue,
            avg_revenue_per_user: round2(per_user(total_revenue)),
        }
    }

    /// Text block in the style of the planning summary
    pub fn summary(&self) -> String {
        format!(
            "  total_users: {}\n  registered_users: {}\n  registration_rate: {:.1}%\n  total_sessions: {}\n  avg_sessions_per_user: {:.1}\n  total_revenue: ${:.2}\n  avg_revenue_per_user: ${:.2}\n",
            self.total_users,
            self.registered_users,
            self.registration_rate * 100.0,
            self.total_sessions,
            self.avg_sessions_per_user,
            self.total_revenue,
            self.avg_revenue_per_user,
        )
    }
}

/// Every analytics dataset produced by one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub sessions_by_channel: Vec<ChannelSessions>,
    pub payment_by_frequency: Vec<FrequencyChoice>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub quarterly_revenue: Vec<QuarterlyRevenue>,
    pub user_engagement: Vec<UserEngagement>,
    pub platform_performance: Vec<PlatformPerformance>,
    pub kpis: Kpis,
    pub projections: Projections,
}

impl Analytics {
    pub fn compute(schema: &StarSchema, config: &AnalyticsConfig) -> Self {
        let kpis = Kpis::compute(schema);
        let monthly_revenue = summaries::monthly_revenue(schema);
        let projections = projections::projections(schema, &kpis, &monthly_revenue, config);

        Self {
            sessions_by_channel: summaries::sessions_by_channel(schema),
            payment_by_frequency: summaries::payment_by_frequency(schema),
            quarterly_revenue: summaries::quarterly_revenue(schema),
            user_engagement: summaries::user_engagement(schema),
            platform_performance: summaries::platform_performance(schema),
            monthly_revenue,
            kpis,
            projections,
        }
    }
}
