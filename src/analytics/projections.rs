//! Growth projections for the planning year.

use serde::Serialize;

use super::mean;
use super::summaries::MonthlyRevenue;
use super::Kpis;
use crate::config::AnalyticsConfig;
use crate::warehouse::facts::round2;
use crate::warehouse::StarSchema;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProjection {
    pub year: i32,
    pub total_users: usize,
    pub registered_users: usize,
    pub registration_rate: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueProjection {
    pub year: i32,
    pub month: u32,
    pub projected_revenue: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProjection {
    pub year: i32,
    pub month: u32,
    pub projected_sessions: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projections {
    pub users: Vec<UserProjection>,
    pub revenue: Vec<RevenueProjection>,
    pub sessions: Vec<SessionProjection>,
    pub projected_total_revenue: f64,
    pub projected_transactions: usize,
    pub projected_total_sessions: usize,
}

pub fn user_projection(kpis: &Kpis, config: &AnalyticsConfig) -> Vec<UserProjection> {
    let current_rate = kpis.registration_rate;
    let next_users = (kpis.total_users as f64 * (1.0 + config.user_growth_rate)) as usize;
    let next_rate = (current_rate + config.registration_improvement).min(config.max_registration_rate);

    vec![
        UserProjection {
            year: config.projection_year - 1,
            total_users: kpis.total_users,
            registered_users: kpis.registered_users,
            registration_rate: current_rate,
            growth_rate: 0.0,
        },
        UserProjection {
            year: config.projection_year,
            total_users: next_users,
            registered_users: (next_users as f64 * next_rate) as usize,
            registration_rate: next_rate,
            growth_rate: config.user_growth_rate,
        },
    ]
}

/// Every month of the planning year gets the observed monthly mean plus growth
pub fn revenue_projection(
    monthly: &[MonthlyRevenue],
    config: &AnalyticsConfig,
) -> Vec<RevenueProjection> {
    let totals: Vec<f64> = monthly.iter().map(|m| m.total_revenue).collect();
    let base = mean(&totals).unwrap_or(0.0);
    let projected = round2(base * (1.0 + config.revenue_growth_rate));

    (1..=12)
        .map(|month| RevenueProjection {
            year: config.projection_year,
            month,
            projected_revenue: projected,
            growth_rate: config.revenue_growth_rate,
        })
        .collect()
}

pub fn session_projection(schema: &StarSchema, config: &AnalyticsConfig) -> Vec<SessionProjection> {
    let mut per_month = std::collections::BTreeMap::new();
    for fact in &schema.play_sessions {
        if let Some(date) = schema.date(fact.date_key) {
            *per_month.entry((date.year, date.month)).or_insert(0usize) += 1;
        }
    }
    let counts: Vec<f64> = per_month.values().map(|c| *c as f64).collect();
    let base = mean(&counts).unwrap_or(0.0);
    let projected = round2(base * (1.0 + config.session_growth_rate));

    (1..=12)
        .map(|month| SessionProjection {
            year: config.projection_year,
            month,
            projected_sessions: projected,
            growth_rate: config.session_growth_rate,
        })
        .collect()
}

pub fn projections(
    schema: &StarSchema,
    kpis: &Kpis,
    monthly: &[MonthlyRevenue],
    config: &AnalyticsConfig,
) -> Projections {
    Projections {
        users: user_projection(kpis, config),
        revenue: revenue_projection(monthly, config),
        sessions: session_projection(schema, config),
        projected_total_revenue: round2(kpis.total_revenue * (1.0 + config.revenue_growth_rate)),
        projected_transactions: (schema.payment_facts.len() as f64
            * (1.0 + config.transaction_growth_rate)) as usize,
        projected_total_sessions: (kpis.total_sessions as f64 * (1.0 + config.session_growth_rate))
            as usize,
    }
}
