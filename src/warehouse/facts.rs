//! Fact records and their construction from resolved source rows.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::dimensions::Dimensions;
use super::exclusions::{ExclusionReason, ExclusionTally, FactKind};
use super::keys::SurrogateKey;
use crate::config::TransformConfig;
use crate::loader::{PlaySession, SourceTables, UserPlan, UserRegistration};
use crate::row::{IntoRow, Row};
use crate::schema::{TableSchema, PAYMENT_FACT, PLAY_SESSION_FACT, USER_PLAN_FACT};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaySessionFact {
    pub play_session_key: SurrogateKey,
    pub session_id: i64,
    pub user_key: SurrogateKey,
    pub date_key: SurrogateKey,
    pub channel_key: SurrogateKey,
    pub status_key: SurrogateKey,
    pub total_score: Option<i64>,
    pub duration_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPlanFact {
    pub user_plan_key: SurrogateKey,
    pub user_registration_id: i64,
    pub user_key: SurrogateKey,
    pub plan_key: SurrogateKey,
    pub payment_key: SurrogateKey,
    pub date_key: SurrogateKey,
    /// Null while the plan is still active
    pub end_date_key: Option<SurrogateKey>,
    pub cost_amount: Option<f64>,
    pub duration_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentFact {
    pub payment_fact_key: SurrogateKey,
    pub user_key: SurrogateKey,
    pub plan_key: SurrogateKey,
    pub payment_key: SurrogateKey,
    pub date_key: SurrogateKey,
    pub amount: f64,
    pub payment_frequency_code: String,
}

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn session_minutes(session: &PlaySession) -> Option<f64> {
    let start = session.start_datetime?;
    let end = session.end_datetime?;
    let seconds = (end - start).num_seconds();
    (seconds >= 0).then(|| round2(seconds as f64 / 60.0))
}

fn resolve_session(
    play_session_key: SurrogateKey,
    session: &PlaySession,
    dims: &Dimensions,
) -> Result<PlaySessionFact, ExclusionReason> {
    let user_key = session
        .user_id
        .and_then(|id| dims.user_keys.get(&id))
        .ok_or(ExclusionReason::UnresolvedUserId)?;
    let channel_key = session
        .channel_code
        .as_deref()
        .and_then(|code| dims.channel_keys.get(code))
        .ok_or(ExclusionReason::UnresolvedChannelCode)?;
    let status_key = session
        .status_code
        .as_deref()
        .and_then(|code| dims.status_keys.get(code))
        .ok_or(ExclusionReason::UnresolvedStatusCode)?;
    let date_key = session
        .start_datetime
        .and_then(|dt| dims.date_keys.get(&dt.date()))
        .ok_or(ExclusionReason::MissingStartDate)?;

    Ok(PlaySessionFact {
        play_session_key,
        session_id: session.play_session_id,
        user_key,
        date_key,
        channel_key,
        status_key,
        total_score: session.total_score,
        duration_minutes: session_minutes(session),
    })
}

pub fn build_play_session_facts(
    sources: &SourceTables,
    dims: &Dimensions,
    tally: &mut ExclusionTally,
) -> Vec<PlaySessionFact> {
    let kind = FactKind::PlaySession;
    let mut facts = Vec::with_capacity(sources.play_sessions.len());

    for session in &sources.play_sessions {
        tally.record_eligible(kind);
        match resolve_session(facts.len() as SurrogateKey + 1, session, dims) {
            Ok(fact) => {
                tally.record_produced(kind);
                facts.push(fact);
            }
            Err(reason) => tally.exclude(kind, reason),
        }
    }

    facts
}

/// Surrogate keys of one resolved UserPlan row
struct ResolvedPlan {
    user_registration_id: i64,
    user_key: SurrogateKey,
    plan_key: SurrogateKey,
    payment_key: SurrogateKey,
    date_key: SurrogateKey,
    start: NaiveDate,
}

fn resolve_user_plan(
    plan: &UserPlan,
    registrations: &BTreeMap<i64, &UserRegistration>,
    dims: &Dimensions,
) -> Result<ResolvedPlan, ExclusionReason> {
    let registration = plan
        .user_registration_id
        .and_then(|id| registrations.get(&id).copied())
        .ok_or(ExclusionReason::UnresolvedRegistrationId)?;
    let user_key = registration
        .user_id
        .and_then(|id| dims.user_keys.get(&id))
        .ok_or(ExclusionReason::UnresolvedUserId)?;
    let plan_key = plan
        .plan_id
        .and_then(|id| dims.plan_keys.get(&id))
        .ok_or(ExclusionReason::UnresolvedPlanId)?;
    let payment_key = plan
        .payment_detail_id
        .and_then(|id| dims.payment_keys.get(&id))
        .ok_or(ExclusionReason::UnresolvedPaymentDetailId)?;
    let start = plan.start_date.ok_or(ExclusionReason::MissingStartDate)?;
    let date_key = dims
        .date_keys
        .get(&start)
        .ok_or(ExclusionReason::MissingStartDate)?;

    Ok(ResolvedPlan {
        user_registration_id: registration.user_registration_id,
        user_key,
        plan_key,
        payment_key,
        date_key,
        start,
    })
}

/// Build UserPlanFact and PaymentFact from the same pass over `user_plan`.
pub fn build_plan_facts(
    sources: &SourceTables,
    dims: &Dimensions,
    config: &TransformConfig,
    tally: &mut ExclusionTally,
) -> (Vec<UserPlanFact>, Vec<PaymentFact>) {
    let mut registrations = BTreeMap::new();
    for reg in &sources.registrations {
        registrations.entry(reg.user_registration_id).or_insert(reg);
    }

    let mut user_plans = Vec::new();
    let mut payments = Vec::new();

    for plan in &sources.user_plans {
        tally.record_eligible(FactKind::UserPlan);
        tally.record_eligible(FactKind::Payment);

        let resolved = match resolve_user_plan(plan, &registrations, dims) {
            Ok(resolved) => resolved,
            Err(reason) => {
                tally.exclude(FactKind::UserPlan, reason);
                tally.exclude(FactKind::Payment, reason);
                continue;
            }
        };

        let plan_dim = dims.plan(resolved.plan_key);
        let cost_amount = plan_dim.and_then(|p| p.cost_amount);

        let end = plan.end_date;
        let is_open = end.is_some_and(|d| config.is_open_end(d));
        let end_date_key = end
            .filter(|_| !is_open)
            .and_then(|d| dims.date_keys.get(&d));
        let measured_end = if is_open {
            Some(config.open_plan_horizon)
        } else {
            end
        };
        let duration_days = measured_end
            .map(|e| (e - resolved.start).num_days())
            .filter(|days| *days >= 0);

        user_plans.push(UserPlanFact {
            user_plan_key: user_plans.len() as SurrogateKey + 1,
            user_registration_id: resolved.user_registration_id,
            user_key: resolved.user_key,
            plan_key: resolved.plan_key,
            payment_key: resolved.payment_key,
            date_key: resolved.date_key,
            end_date_key,
            cost_amount,
            duration_days,
        });
        tally.record_produced(FactKind::UserPlan);

        let frequency = plan_dim
            .filter(|p| p.has_frequency)
            .and_then(|p| p.payment_frequency_code.clone());
        let Some(payment_frequency_code) = frequency else {
            tally.exclude(FactKind::Payment, ExclusionReason::PlanWithoutFrequency);
            continue;
        };
        let Some(amount) = cost_amount else {
            tally.exclude(FactKind::Payment, ExclusionReason::PlanWithoutCost);
            continue;
        };

        payments.push(PaymentFact {
            payment_fact_key: payments.len() as SurrogateKey + 1,
            user_key: resolved.user_key,
            plan_key: resolved.plan_key,
            payment_key: resolved.payment_key,
            date_key: resolved.date_key,
            amount,
            payment_frequency_code,
        });
        tally.record_produced(FactKind::Payment);
    }

    (user_plans, payments)
}

impl IntoRow for PlaySessionFact {
    fn schema() -> &'static TableSchema {
        &PLAY_SESSION_FACT
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.play_session_key,
            self.session_id,
            self.user_key,
            self.date_key,
            self.channel_key,
            self.status_key,
            self.total_score,
            self.duration_minutes,
        ]
    }
}

impl IntoRow for UserPlanFact {
    fn schema() -> &'static TableSchema {
        &USER_PLAN_FACT
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.user_plan_key,
            self.user_registration_id,
            self.user_key,
            self.plan_key,
            self.payment_key,
            self.date_key,
            self.end_date_key,
            self.cost_amount,
            self.duration_days,
        ]
    }
}

impl IntoRow for PaymentFact {
    fn schema() -> &'static TableSchema {
        &PAYMENT_FACT
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.payment_fact_key,
            self.user_key,
            self.plan_key,
            self.payment_key,
            self.date_key,
            self.amount,
            &self.payment_frequency_code,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_minutes() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut session = PlaySession {
            play_session_id: 1,
            user_id: Some(1),
            start_datetime: Some(start),
            end_datetime: Some(start + chrono::Duration::seconds(90)),
            channel_code: None,
            status_code: None,
            total_score: None,
        };
        assert_eq!(session_minutes(&session), Some(1.5));

        session.end_datetime = Some(start - chrono::Duration::minutes(5));
        assert_eq!(session_minutes(&session), None);

        session.end_datetime = None;
        assert_eq!(session_minutes(&session), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(-0.004), -0.0);
    }
}
