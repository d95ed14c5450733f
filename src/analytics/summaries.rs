//! Aggregates over the star schema, one function per exported dataset.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::{mean, median};
use crate::warehouse::facts::round2;
use crate::warehouse::StarSchema;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSessions {
    pub channel_name: String,
    pub total_sessions: usize,
    pub total_score: i64,
    pub avg_score: Option<f64>,
    pub median_score: Option<f64>,
    pub total_duration_minutes: f64,
    pub avg_duration_minutes: Option<f64>,
    pub median_duration_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyChoice {
    pub frequency_name: String,
    pub enrollments: usize,
    pub total_revenue: f64,
    pub avg_cost: Option<f64>,
    pub avg_duration_days: Option<f64>,
    pub median_duration_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub total_revenue: f64,
    pub avg_transaction: Option<f64>,
    pub total_transactions: usize,
    pub unique_users: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterlyRevenue {
    pub year: i32,
    pub quarter: u32,
    pub total_revenue: f64,
    pub total_transactions: usize,
    pub unique_users: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Segment {
    Light,
    Casual,
    Regular,
    Heavy,
}

impl Segment {
    pub fn for_sessions(sessions: usize) -> Self {
        match sessions {
            0..=1 => Segment::Light,
            2..=5 => Segment::Casual,
            6..=10 => Segment::Regular,
            _ => Segment::Heavy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserEngagement {
    pub user_id: i64,
    pub total_sessions: usize,
    pub total_score: i64,
    pub avg_score: Option<f64>,
    pub total_duration_minutes: f64,
    pub avg_duration_minutes: Option<f64>,
    pub user_segment: Segment,
    pub is_registered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformPerformance {
    pub year: i32,
    pub month: u32,
    pub channel_name: String,
    pub total_sessions: usize,
    pub total_score: i64,
    pub avg_score: Option<f64>,
    pub total_duration_minutes: f64,
    pub avg_duration_minutes: Option<f64>,
}

/// Scores and durations collected for one group of sessions
#[derive(Default)]
struct SessionGroup {
    sessions: usize,
    scores: Vec<f64>,
    durations: Vec<f64>,
}

impl SessionGroup {
    fn add(&mut self, score: Option<i64>, duration: Option<f64>) {
        self.sessions += 1;
        self.scores.extend(score.map(|s| s as f64));
        self.durations.extend(duration);
    }

    fn total_score(&self) -> i64 {
        self.scores.iter().sum::<f64>() as i64
    }

    fn total_duration(&self) -> f64 {
        round2(self.durations.iter().sum())
    }
}

pub fn sessions_by_channel(schema: &StarSchema) -> Vec<ChannelSessions> {
    let mut groups: BTreeMap<String, SessionGroup> = BTreeMap::new();
    for fact in &schema.play_sessions {
        let Some(channel) = schema.channel(fact.channel_key) else { continue };
        groups
            .entry(channel.channel_name.clone())
            .or_default()
            .add(fact.total_score, fact.duration_minutes);
    }

    groups
        .into_iter()
        .map(|(channel_name, group)| ChannelSessions {
            channel_name,
            total_sessions: group.sessions,
            total_score: group.total_score(),
            avg_score: mean(&group.scores),
            median_score: median(&group.scores),
            total_duration_minutes: group.total_duration(),
            avg_duration_minutes: mean(&group.durations),
            median_duration_minutes: median(&group.durations),
        })
        .collect()
}

pub fn payment_by_frequency(schema: &StarSchema) -> Vec<FrequencyChoice> {
    #[derive(Default)]
    struct Group {
        enrollments: usize,
        costs: Vec<f64>,
        durations: Vec<f64>,
    }

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for fact in &schema.user_plans {
        // Undescribed frequencies are reported under their code
        let Some(name) = schema
            .plan(fact.plan_key)
            .filter(|p| p.has_frequency)
            .and_then(|p| p.frequency_name.clone().or_else(|| p.payment_frequency_code.clone()))
        else {
            continue;
        };
        let group = groups.entry(name).or_default();
        group.enrollments += 1;
        group.costs.extend(fact.cost_amount);
        group.durations.extend(fact.duration_days.map(|d| d as f64));
    }

    groups
        .into_iter()
        .map(|(frequency_name, group)| FrequencyChoice {
            frequency_name,
            enrollments: group.enrollments,
            total_revenue: round2(group.costs.iter().sum()),
            avg_cost: mean(&group.costs),
            avg_duration_days: mean(&group.durations),
            median_duration_days: median(&group.durations),
        })
        .collect()
}

#[derive(Default)]
struct RevenueGroup {
    amounts: Vec<f64>,
    users: BTreeSet<u32>,
}

fn revenue_groups<K: Ord>(
    schema: &StarSchema,
    key: impl Fn(&crate::warehouse::TimeDim) -> K,
) -> BTreeMap<K, RevenueGroup> {
    let mut groups: BTreeMap<K, RevenueGroup> = BTreeMap::new();
    for fact in &schema.payment_facts {
        let Some(date) = schema.date(fact.date_key) else { continue };
        let group = groups.entry(key(date)).or_default();
        group.amounts.push(fact.amount);
        group.users.insert(fact.user_key);
    }
    groups
}

pub fn monthly_revenue(schema: &StarSchema) -> Vec<MonthlyRevenue> {
    revenue_groups(schema, |d| (d.year, d.month))
        .into_iter()
        .map(|((year, month), group)| MonthlyRevenue {
            year,
            month,
            total_revenue: round2(group.amounts.iter().sum()),
            avg_transaction: mean(&group.amounts),
            total_transactions: group.amounts.len(),
            unique_users: group.users.len(),
        })
        .collect()
}

pub fn quarterly_revenue(schema: &StarSchema) -> Vec<QuarterlyRevenue> {
    revenue_groups(schema, |d| (d.year, d.quarter))
        .into_iter()
        .map(|((year, quarter), group)| QuarterlyRevenue {
            year,
            quarter,
            total_revenue: round2(group.amounts.iter().sum()),
            total_transactions: group.amounts.len(),
            unique_users: group.users.len(),
        })
        .collect()
}

/// Per-user activity, only for users with at least one session
pub fn user_engagement(schema: &StarSchema) -> Vec<UserEngagement> {
    let mut groups: BTreeMap<i64, (bool, SessionGroup)> = BTreeMap::new();
    for fact in &schema.play_sessions {
        let Some(user) = schema.user(fact.user_key) else { continue };
        groups
            .entry(user.user_id)
            .or_insert_with(|| (user.is_registered, SessionGroup::default()))
            .1
            .add(fact.total_score, fact.duration_minutes);
    }

    groups
        .into_iter()
        .map(|(user_id, (is_registered, group))| UserEngagement {
            user_id,
            total_sessions: group.sessions,
            total_score: group.total_score(),
            avg_score: mean(&group.scores),
            total_duration_minutes: group.total_duration(),
            avg_duration_minutes: mean(&group.durations),
            user_segment: Segment::for_sessions(group.sessions),
            is_registered,
        })
        .collect()
}

pub fn platform_performance(schema: &StarSchema) -> Vec<PlatformPerformance> {
    let mut groups: BTreeMap<(i32, u32, String), SessionGroup> = BTreeMap::new();
    for fact in &schema.play_sessions {
        let (Some(date), Some(channel)) = (schema.date(fact.date_key), schema.channel(fact.channel_key))
        else {
            continue;
        };
        groups
            .entry((date.year, date.month, channel.channel_name.clone()))
            .or_default()
            .add(fact.total_score, fact.duration_minutes);
    }

    groups
        .into_iter()
        .map(|((year, month, channel_name), group)| PlatformPerformance {
            year,
            month,
            channel_name,
            total_sessions: group.sessions,
            total_score: group.total_score(),
            avg_score: mean(&group.scores),
            total_duration_minutes: group.total_duration(),
            avg_duration_minutes: mean(&group.durations),
        })
        .collect()
}
