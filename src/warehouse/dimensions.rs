//! Dimension records and the builders that assign their surrogate keys.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::keys::{SurrogateKey, SurrogateKeys};
use crate::loader::SourceTables;
use crate::row::{IntoRow, Row};
use crate::schema::{
    TableSchema, CHANNEL_DIMENSION, PAYMENT_DIMENSION, PLAN_DIMENSION, STATUS_DIMENSION,
    TIME_DIMENSION, USER_DIMENSION,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDim {
    pub user_key: SurrogateKey,
    pub user_id: i64,
    pub ip_address: Option<String>,
    pub social_media_handle: Option<String>,
    pub email: Option<String>,
    pub user_registration_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_registered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDim {
    pub date_key: SurrogateKey,
    /// `yyyymmdd`
    pub date_id: u32,
    pub date: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    pub day: u32,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    pub is_weekend: bool,
}

impl TimeDim {
    pub fn new(date_key: SurrogateKey, date: NaiveDate) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            date_key,
            date_id: date.year() as u32 * 10_000 + date.month() * 100 + date.day(),
            date,
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            day: date.day(),
            day_of_week,
            is_weekend: day_of_week >= 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDim {
    pub channel_key: SurrogateKey,
    pub channel_code: String,
    pub channel_name: String,
    pub channel_name_fr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDim {
    pub status_key: SurrogateKey,
    pub status_code: String,
    pub status_name: String,
    pub status_name_fr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDim {
    pub plan_key: SurrogateKey,
    pub plan_id: i64,
    pub payment_frequency_code: Option<String>,
    pub cost_amount: Option<f64>,
    pub frequency_name: Option<String>,
    pub frequency_name_fr: Option<String>,
    /// The frequency code matched a `plan_payment_frequency` row
    #[serde(skip)]
    pub has_frequency: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentDim {
    pub payment_key: SurrogateKey,
    pub payment_detail_id: i64,
    pub payment_method_code: Option<String>,
    pub payment_method_value: Option<String>,
    pub payment_method_expiry: Option<String>,
}

/// All dimensions plus the natural-key maps the fact builders resolve through
#[derive(Debug, Clone, Default)]
pub struct Dimensions {
    pub users: Vec<UserDim>,
    pub dates: Vec<TimeDim>,
    pub channels: Vec<ChannelDim>,
    pub statuses: Vec<StatusDim>,
    pub plans: Vec<PlanDim>,
    pub payments: Vec<PaymentDim>,

    pub user_keys: SurrogateKeys<i64>,
    pub date_keys: SurrogateKeys<NaiveDate>,
    pub channel_keys: SurrogateKeys<String>,
    pub status_keys: SurrogateKeys<String>,
    pub plan_keys: SurrogateKeys<i64>,
    pub payment_keys: SurrogateKeys<i64>,
}

impl Dimensions {
    /// Plan dimension row for a plan key
    pub fn plan(&self, key: SurrogateKey) -> Option<&PlanDim> {
        // Keys are dense from 1 and assigned in push order
        self.plans.get(key.checked_sub(1)? as usize)
    }
}

pub fn build_user_dimension(sources: &SourceTables, dims: &mut Dimensions) {
    // First registration per user wins
    let mut registrations = BTreeMap::new();
    for reg in &sources.registrations {
        if let Some(user_id) = reg.user_id {
            registrations.entry(user_id).or_insert(reg);
        }
    }

    for user in &sources.users {
        let (user_key, is_new) = dims.user_keys.assign(user.user_id);
        if !is_new {
            continue;
        }

        let reg = registrations.get(&user.user_id);
        dims.users.push(UserDim {
            user_key,
            user_id: user.user_id,
            ip_address: user.ip_address.clone(),
            social_media_handle: user.social_media_handle.clone(),
            email: reg
                .and_then(|r| r.email.clone())
                .or_else(|| user.email.clone()),
            user_registration_id: reg.map(|r| r.user_registration_id),
            username: reg.and_then(|r| r.username.clone()),
            first_name: reg.and_then(|r| r.first_name.clone()),
            last_name: reg.and_then(|r| r.last_name.clone()),
            is_registered: reg.is_some(),
        });
    }
}

/// Build the calendar from every observed date.
///
/// `is_open` filters out plan end dates that mean "still active".
pub fn build_time_dimension(
    sources: &SourceTables,
    fill_gaps: bool,
    is_open: impl Fn(NaiveDate) -> bool,
    dims: &mut Dimensions,
) {
    let mut observed = BTreeSet::new();

    for session in &sources.play_sessions {
        observed.extend(session.start_datetime.map(|dt| dt.date()));
        observed.extend(session.end_datetime.map(|dt| dt.date()));
    }
    for plan in &sources.user_plans {
        observed.extend(plan.start_date);
        observed.extend(plan.end_date.filter(|d| !is_open(*d)));
    }

    let dates: Vec<NaiveDate> = match (fill_gaps, observed.first(), observed.last()) {
        (true, Some(&first), Some(&last)) => first.iter_days().take_while(|d| *d <= last).collect(),
        _ => observed.into_iter().collect(),
    };

    for date in dates {
        let (date_key, _) = dims.date_keys.assign(date);
        dims.dates.push(TimeDim::new(date_key, date));
    }
}

pub fn build_channel_dimension(sources: &SourceTables, dims: &mut Dimensions) {
    for code in &sources.channel_codes {
        let (channel_key, is_new) = dims.channel_keys.assign(code.play_session_channel_code.clone());
        if is_new {
            dims.channels.push(ChannelDim {
                channel_key,
                channel_code: code.play_session_channel_code.clone(),
                channel_name: code
                    .english_description
                    .clone()
                    .unwrap_or_else(|| code.play_session_channel_code.clone()),
                channel_name_fr: code.french_description.clone(),
            });
        }
    }
}

pub fn build_status_dimension(sources: &SourceTables, dims: &mut Dimensions) {
    for code in &sources.status_codes {
        let (status_key, is_new) = dims.status_keys.assign(code.play_session_status_code.clone());
        if is_new {
            dims.statuses.push(StatusDim {
                status_key,
                status_code: code.play_session_status_code.clone(),
                status_name: code
                    .english_description
                    .clone()
                    .unwrap_or_else(|| code.play_session_status_code.clone()),
                status_name_fr: code.french_description.clone(),
            });
        }
    }
}

pub fn build_plan_dimension(sources: &SourceTables, dims: &mut Dimensions) {
    let mut frequencies = BTreeMap::new();
    for freq in &sources.payment_frequencies {
        frequencies
            .entry(freq.payment_frequency_code.as_str())
            .or_insert(freq);
    }

    for plan in &sources.plans {
        let (plan_key, is_new) = dims.plan_keys.assign(plan.plan_id);
        if !is_new {
            continue;
        }

        let freq = plan
            .payment_frequency_code
            .as_deref()
            .and_then(|code| frequencies.get(code));
        dims.plans.push(PlanDim {
            plan_key,
            plan_id: plan.plan_id,
            payment_frequency_code: plan.payment_frequency_code.clone(),
            cost_amount: plan.cost_amount,
            frequency_name: freq.and_then(|f| f.english_description.clone()),
            frequency_name_fr: freq.and_then(|f| f.french_description.clone()),
            has_frequency: freq.is_some(),
        });
    }
}

pub fn build_payment_dimension(sources: &SourceTables, dims: &mut Dimensions) {
    for detail in &sources.payment_details {
        let (payment_key, is_new) = dims.payment_keys.assign(detail.payment_detail_id);
        if is_new {
            dims.payments.push(PaymentDim {
                payment_key,
                payment_detail_id: detail.payment_detail_id,
                payment_method_code: detail.payment_method_code.clone(),
                payment_method_value: detail.payment_method_value.clone(),
                payment_method_expiry: detail.payment_method_expiry.clone(),
            });
        }
    }
}

impl IntoRow for UserDim {
    fn schema() -> &'static TableSchema {
        &USER_DIMENSION
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.user_key,
            self.user_id,
            self.ip_address.as_ref(),
            self.social_media_handle.as_ref(),
            self.email.as_ref(),
            self.user_registration_id,
            self.username.as_ref(),
            self.first_name.as_ref(),
            self.last_name.as_ref(),
            self.is_registered,
        ]
    }
}

impl IntoRow for TimeDim {
    fn schema() -> &'static TableSchema {
        &TIME_DIMENSION
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.date_key,
            self.date_id,
            self.date,
            self.year,
            self.quarter,
            self.month,
            self.day,
            self.day_of_week,
            self.is_weekend,
        ]
    }
}

impl IntoRow for ChannelDim {
    fn schema() -> &'static TableSchema {
        &CHANNEL_DIMENSION
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.channel_key,
            &self.channel_code,
            &self.channel_name,
            self.channel_name_fr.as_ref(),
        ]
    }
}

impl IntoRow for StatusDim {
    fn schema() -> &'static TableSchema {
        &STATUS_DIMENSION
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.status_key,
            &self.status_code,
            &self.status_name,
            self.status_name_fr.as_ref(),
        ]
    }
}

impl IntoRow for PlanDim {
    fn schema() -> &'static TableSchema {
        &PLAN_DIMENSION
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.plan_key,
            self.plan_id,
            self.payment_frequency_code.as_ref(),
            self.cost_amount,
            self.frequency_name.as_ref(),
            self.frequency_name_fr.as_ref(),
        ]
    }
}

impl IntoRow for PaymentDim {
    fn schema() -> &'static TableSchema {
        &PAYMENT_DIMENSION
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.payment_key,
            self.payment_detail_id,
            self.payment_method_code.as_ref(),
            self.payment_method_value.as_ref(),
            self.payment_method_expiry.as_ref(),
        ]
    }
}
