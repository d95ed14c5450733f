//! Star-schema transformation.
//!
//! [`SchemaTransformer`] maps the nine source tables onto six dimensions and
//! three facts. Rows whose natural keys do not resolve are left out and
//! counted in the [`ExclusionTally`]; only a missing or empty required table
//! stops the transformation.

pub mod dimensions;
pub mod exclusions;
pub mod facts;
pub mod keys;

pub use dimensions::{ChannelDim, Dimensions, PaymentDim, PlanDim, StatusDim, TimeDim, UserDim};
pub use exclusions::{ExclusionReason, ExclusionTally, FactKind, FactTally};
pub use facts::{PaymentFact, PlaySessionFact, UserPlanFact};
pub use keys::{SurrogateKey, SurrogateKeys};

use chrono::NaiveDate;

use crate::config::TransformConfig;
use crate::error::TransformError;
use crate::loader::SourceTables;
use crate::row::Table;
use crate::schema::{SOURCE_TABLES, USER_REGISTRATION};
use crate::ui::Ui;

/// The dimensional model produced by one transformation
#[derive(Debug, Clone, Default)]
pub struct StarSchema {
    pub users: Vec<UserDim>,
    pub dates: Vec<TimeDim>,
    pub channels: Vec<ChannelDim>,
    pub statuses: Vec<StatusDim>,
    pub plans: Vec<PlanDim>,
    pub payments: Vec<PaymentDim>,
    pub play_sessions: Vec<PlaySessionFact>,
    pub user_plans: Vec<UserPlanFact>,
    pub payment_facts: Vec<PaymentFact>,
}

impl StarSchema {
    /// Materialize every table, dimensions before facts
    pub fn tables(&self) -> Vec<Table> {
        vec![
            Table::from_records(&self.users),
            Table::from_records(&self.dates),
            Table::from_records(&self.channels),
            Table::from_records(&self.statuses),
            Table::from_records(&self.plans),
            Table::from_records(&self.payments),
            Table::from_records(&self.play_sessions),
            Table::from_records(&self.user_plans),
            Table::from_records(&self.payment_facts),
        ]
    }

    /// Row count per fact type
    pub fn fact_rows(&self, kind: FactKind) -> usize {
        match kind {
            FactKind::PlaySession => self.play_sessions.len(),
            FactKind::UserPlan => self.user_plans.len(),
            FactKind::Payment => self.payment_facts.len(),
        }
    }

    pub fn date(&self, key: SurrogateKey) -> Option<&TimeDim> {
        self.dates.get(key.checked_sub(1)? as usize)
    }

    pub fn user(&self, key: SurrogateKey) -> Option<&UserDim> {
        self.users.get(key.checked_sub(1)? as usize)
    }

    pub fn channel(&self, key: SurrogateKey) -> Option<&ChannelDim> {
        self.channels.get(key.checked_sub(1)? as usize)
    }

    pub fn plan(&self, key: SurrogateKey) -> Option<&PlanDim> {
        self.plans.get(key.checked_sub(1)? as usize)
    }
}

/// Transformation output: the star schema and what was left out of it
#[derive(Debug, Clone, Default)]
pub struct Transformed {
    pub schema: StarSchema,
    pub tally: ExclusionTally,
}

pub struct SchemaTransformer<'a> {
    config: &'a TransformConfig,
}

impl<'a> SchemaTransformer<'a> {
    pub fn new(config: &'a TransformConfig) -> Self {
        Self { config }
    }

    /// Build the star schema from `sources`.
    ///
    /// Deterministic: identical input yields identical keys and row order.
    pub fn transform(
        &self,
        sources: &SourceTables,
        ui: &mut impl Ui,
    ) -> Result<Transformed, TransformError> {
        check_required_tables(sources)?;

        let mut dims = Dimensions::default();
        let is_open = |d: NaiveDate| self.config.is_open_end(d);

        let out_of_range = sources
            .user_plans
            .iter()
            .filter_map(|p| p.end_date)
            .filter(|d| self.config.is_out_of_range(*d))
            .count();
        if out_of_range > 0 {
            ui.log(format!(
                "WARNING user_plan: {} end dates after {} treated as open",
                out_of_range, self.config.max_end_year
            ));
        }

        dimensions::build_user_dimension(sources, &mut dims);
        ui.log(format!("user_dimension: {} rows", dims.users.len()));
        dimensions::build_time_dimension(sources, self.config.fill_date_gaps, is_open, &mut dims);
        ui.log(format!("time_dimension: {} rows", dims.dates.len()));
        dimensions::build_channel_dimension(sources, &mut dims);
        dimensions::build_status_dimension(sources, &mut dims);
        dimensions::build_plan_dimension(sources, &mut dims);
        dimensions::build_payment_dimension(sources, &mut dims);
        ui.log(format!(
            "lookup dimensions: {} channels, {} statuses, {} plans, {} payment methods",
            dims.channels.len(),
            dims.statuses.len(),
            dims.plans.len(),
            dims.payments.len()
        ));

        let mut tally = ExclusionTally::new();
        let play_sessions = facts::build_play_session_facts(sources, &dims, &mut tally);
        let (user_plans, payment_facts) =
            facts::build_plan_facts(sources, &dims, self.config, &mut tally);

        for (kind, counts) in tally.iter() {
            ui.set_fact_counts(kind, counts.produced, counts.excluded_total());
            ui.log(format!(
                "{}: {} rows from {} source rows ({} excluded)",
                kind,
                counts.produced,
                counts.eligible,
                counts.excluded_total()
            ));
            for (reason, count) in &counts.excluded {
                ui.log(format!("WARNING {}: {} rows excluded, {}", kind, count, reason));
            }
        }

        let Dimensions {
            users,
            dates,
            channels,
            statuses,
            plans,
            payments,
            ..
        } = dims;

        Ok(Transformed {
            schema: StarSchema {
                users,
                dates,
                channels,
                statuses,
                plans,
                payments,
                play_sessions,
                user_plans,
                payment_facts,
            },
            tally,
        })
    }
}

/// Every source table except `user_registration` must have rows
fn check_required_tables(sources: &SourceTables) -> Result<(), TransformError> {
    for table in SOURCE_TABLES {
        if table.name == USER_REGISTRATION.name {
            continue;
        }
        if sources.row_count(table.name).unwrap_or(0) == 0 {
            return Err(TransformError::EmptyTable(table.name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::*;
    use crate::ui::{RecordingUi, SilentUi};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session(id: i64, user_id: i64, day: u32, channel: &str) -> PlaySession {
        let start = date(2024, 4, day).and_hms_opt(18, 0, 0).unwrap();
        PlaySession {
            play_session_id: id,
            user_id: Some(user_id),
            start_datetime: Some(start),
            end_datetime: Some(start + chrono::Duration::minutes(30)),
            channel_code: Some(channel.into()),
            status_code: Some("COMPLETED".into()),
            total_score: Some(id * 10),
        }
    }

    fn user_plan(registration: i64, payment: i64, plan: i64, start: NaiveDate) -> UserPlan {
        UserPlan {
            user_registration_id: Some(registration),
            payment_detail_id: Some(payment),
            plan_id: Some(plan),
            start_date: Some(start),
            end_date: Some(date(9999, 12, 31)),
        }
    }

    /// Five users, two registered, eight sessions of which one has an unknown user
    fn sample() -> SourceTables {
        let users = (1..=5)
            .map(|id| User {
                user_id: id,
                ip_address: Some(format!("10.0.0.{}", id)),
                social_media_handle: None,
                email: Some(format!("user{}@example.com", id)),
            })
            .collect();
        let registrations = vec![
            UserRegistration {
                user_registration_id: 100,
                user_id: Some(1),
                username: Some("one".into()),
                email: None,
                first_name: Some("Ada".into()),
                last_name: None,
            },
            UserRegistration {
                user_registration_id: 200,
                user_id: Some(2),
                username: Some("two".into()),
                email: None,
                first_name: None,
                last_name: None,
            },
        ];
        let mut play_sessions: Vec<_> = (1..=7)
            .map(|i| session(i, (i - 1) % 5 + 1, i as u32, if i % 2 == 0 { "web" } else { "mobile" }))
            .collect();
        play_sessions.push(session(8, 99, 8, "web"));

        SourceTables {
            users,
            registrations,
            user_plans: vec![user_plan(100, 1, 10, date(2024, 4, 1))],
            payment_details: vec![PaymentDetail {
                payment_detail_id: 1,
                payment_method_code: Some("CC".into()),
                payment_method_value: Some("4111".into()),
                payment_method_expiry: None,
            }],
            plans: vec![Plan {
                plan_id: 10,
                payment_frequency_code: Some("MONTHLY".into()),
                cost_amount: Some(9.99),
            }],
            payment_frequencies: vec![PaymentFrequency {
                payment_frequency_code: "MONTHLY".into(),
                english_description: Some("Monthly".into()),
                french_description: Some("Mensuel".into()),
            }],
            play_sessions,
            channel_codes: vec![
                ChannelCode {
                    play_session_channel_code: "mobile".into(),
                    english_description: Some("Mobile".into()),
                    french_description: None,
                },
                ChannelCode {
                    play_session_channel_code: "web".into(),
                    english_description: Some("Browser".into()),
                    french_description: None,
                },
            ],
            status_codes: vec![StatusCode {
                play_session_status_code: "COMPLETED".into(),
                english_description: Some("Completed".into()),
                french_description: None,
            }],
        }
    }

    fn transform(sources: &SourceTables) -> Transformed {
        let config = TransformConfig::default();
        SchemaTransformer::new(&config)
            .transform(sources, &mut SilentUi::new())
            .unwrap()
    }

    #[test]
    fn test_unknown_user_session_is_excluded() {
        let out = transform(&sample());

        assert_eq!(out.schema.users.len(), 5);
        assert_eq!(out.schema.play_sessions.len(), 7);
        assert_eq!(out.tally.excluded(FactKind::PlaySession), 1);
        assert_eq!(
            out.tally
                .excluded_for(FactKind::PlaySession, ExclusionReason::UnresolvedUserId),
            1
        );
        assert_eq!(out.schema.users.iter().filter(|u| u.is_registered).count(), 2);
    }

    #[test]
    fn test_lookup_dimensions_follow_source_order() {
        let out = transform(&sample());
        let codes: Vec<_> = out.schema.channels.iter().map(|c| c.channel_code.as_str()).collect();
        assert_eq!(codes, vec!["mobile", "web"]);
        assert_eq!(out.schema.channels[1].channel_key, 2);
        assert_eq!(out.schema.play_sessions[1].channel_key, 2);
    }

    #[test]
    fn test_open_plan_uses_horizon() {
        let out = transform(&sample());
        let fact = &out.schema.user_plans[0];

        assert_eq!(fact.end_date_key, None);
        assert_eq!(fact.duration_days, Some((date(2024, 12, 31) - date(2024, 4, 1)).num_days()));
        assert!(out.schema.dates.iter().all(|d| d.year < 9999));

        let payment = &out.schema.payment_facts[0];
        assert_eq!(payment.amount, 9.99);
        assert_eq!(payment.payment_frequency_code, "MONTHLY");
        assert_eq!(out.schema.date(payment.date_key).map(|d| d.date), Some(date(2024, 4, 1)));
    }

    #[test]
    fn test_duplicate_enrollments_produce_distinct_facts() {
        let mut sources = sample();
        sources.payment_details.push(PaymentDetail {
            payment_detail_id: 2,
            payment_method_code: Some("PP".into()),
            payment_method_value: None,
            payment_method_expiry: None,
        });
        sources.user_plans.push(user_plan(100, 2, 10, date(2024, 4, 1)));

        let out = transform(&sources);
        assert_eq!(out.schema.user_plans.len(), 2);
        assert_eq!(out.schema.payment_facts.len(), 2);
        assert_ne!(out.schema.user_plans[0].user_plan_key, out.schema.user_plans[1].user_plan_key);
        assert_ne!(out.schema.user_plans[0].payment_key, out.schema.user_plans[1].payment_key);
    }

    #[test]
    fn test_plan_without_frequency_skips_payment_only() {
        let mut sources = sample();
        sources.plans.push(Plan {
            plan_id: 11,
            payment_frequency_code: Some("WEEKLY".into()),
            cost_amount: Some(1.0),
        });
        sources.user_plans.push(user_plan(200, 1, 11, date(2024, 4, 2)));

        let out = transform(&sources);
        assert_eq!(out.schema.user_plans.len(), 2);
        assert_eq!(out.schema.payment_facts.len(), 1);
        assert_eq!(
            out.tally
                .excluded_for(FactKind::Payment, ExclusionReason::PlanWithoutFrequency),
            1
        );
        assert_eq!(out.tally.excluded(FactKind::UserPlan), 0);
    }

    fn assert_conserved(out: &Transformed) {
        for kind in FactKind::ALL {
            let counts = out.tally.get(kind).unwrap();
            assert_eq!(counts.produced, out.schema.fact_rows(kind), "{}", kind);
            assert_eq!(counts.produced + counts.excluded_total(), counts.eligible, "{}", kind);
        }
    }

    #[test]
    fn test_frequency_resolves_without_description() {
        let mut sources = sample();
        sources.payment_frequencies[0].english_description = None;
        sources.payment_frequencies[0].french_description = None;

        let out = transform(&sources);
        assert_eq!(out.schema.plans[0].frequency_name, None);
        assert_eq!(out.schema.payment_facts.len(), 1);
        assert_eq!(out.schema.payment_facts[0].payment_frequency_code, "MONTHLY");
        assert_eq!(
            out.tally
                .excluded_for(FactKind::Payment, ExclusionReason::PlanWithoutFrequency),
            0
        );
        assert_conserved(&out);
    }

    #[test]
    fn test_far_future_end_date_is_open() {
        let mut sources = sample();
        sources.user_plans[0].end_date = Some(date(9998, 12, 31));

        let config = TransformConfig::default();
        let mut ui = RecordingUi::default();
        let out = SchemaTransformer::new(&config)
            .transform(&sources, &mut ui)
            .unwrap();

        // Calendar spans only the April 2024 activity
        assert_eq!(out.schema.dates.len(), 8);
        let fact = &out.schema.user_plans[0];
        assert_eq!(fact.end_date_key, None);
        assert_eq!(fact.duration_days, Some((date(2024, 12, 31) - date(2024, 4, 1)).num_days()));
        assert!(ui
            .messages
            .iter()
            .any(|m| m == "WARNING user_plan: 1 end dates after 2262 treated as open"));
        assert_conserved(&out);
    }

    #[test]
    fn test_negative_plan_duration_is_null() {
        let mut sources = sample();
        sources.user_plans[0].end_date = Some(date(2024, 3, 1));

        let out = transform(&sources);
        let fact = &out.schema.user_plans[0];
        assert_eq!(fact.duration_days, None);
        assert_eq!(
            fact.end_date_key.and_then(|k| out.schema.date(k)).map(|d| d.date),
            Some(date(2024, 3, 1))
        );
        assert_eq!(out.schema.payment_facts.len(), 1);
        assert_conserved(&out);
    }

    #[test]
    fn test_plan_without_cost_skips_payment_only() {
        let mut sources = sample();
        sources.plans[0].cost_amount = None;

        let out = transform(&sources);
        assert_eq!(out.schema.user_plans.len(), 1);
        assert_eq!(out.schema.user_plans[0].cost_amount, None);
        assert!(out.schema.payment_facts.is_empty());
        assert_eq!(
            out.tally
                .excluded_for(FactKind::Payment, ExclusionReason::PlanWithoutCost),
            1
        );
        assert_conserved(&out);
    }

    #[test]
    fn test_unresolved_lookup_codes_are_excluded() {
        let mut sources = sample();
        sources.play_sessions[0].channel_code = Some("fax".into());
        sources.play_sessions[1].status_code = Some("PAUSED".into());
        sources.play_sessions[2].status_code = None;

        let out = transform(&sources);
        assert_eq!(out.schema.play_sessions.len(), 4);
        assert_eq!(
            out.tally
                .excluded_for(FactKind::PlaySession, ExclusionReason::UnresolvedChannelCode),
            1
        );
        assert_eq!(
            out.tally
                .excluded_for(FactKind::PlaySession, ExclusionReason::UnresolvedStatusCode),
            2
        );
        assert!(out.schema.play_sessions.iter().all(|f| f.session_id > 3));
        assert_conserved(&out);
    }

    #[test]
    fn test_missing_start_dates_are_excluded() {
        let mut sources = sample();
        sources.play_sessions[0].start_datetime = None;
        let mut undated = user_plan(200, 1, 10, date(2024, 4, 2));
        undated.start_date = None;
        sources.user_plans.push(undated);

        let out = transform(&sources);
        assert_eq!(out.schema.play_sessions.len(), 6);
        assert_eq!(out.schema.user_plans.len(), 1);
        assert_eq!(out.schema.payment_facts.len(), 1);
        for kind in FactKind::ALL {
            assert_eq!(
                out.tally.excluded_for(kind, ExclusionReason::MissingStartDate),
                1,
                "{}",
                kind
            );
        }
        assert_conserved(&out);
    }

    #[test]
    fn test_conservation_holds_per_fact() {
        let mut sources = sample();
        sources.user_plans.push(user_plan(999, 1, 10, date(2024, 4, 3)));
        let out = transform(&sources);

        for kind in FactKind::ALL {
            let counts = out.tally.get(kind).unwrap();
            assert_eq!(counts.produced, out.schema.fact_rows(kind));
            assert_eq!(counts.produced + counts.excluded_total(), counts.eligible);
        }
    }

    #[test]
    fn test_empty_required_table_is_structural_error() {
        let mut sources = sample();
        sources.status_codes.clear();

        let config = TransformConfig::default();
        let err = SchemaTransformer::new(&config)
            .transform(&sources, &mut SilentUi::new())
            .unwrap_err();
        assert_eq!(err, TransformError::EmptyTable("status_code"));

        // Registrations are optional
        let mut sources = sample();
        sources.registrations.clear();
        sources.user_plans.clear();
        sources.user_plans.push(user_plan(100, 1, 10, date(2024, 4, 1)));
        let out = SchemaTransformer::new(&config)
            .transform(&sources, &mut SilentUi::new())
            .unwrap();
        assert!(out.schema.users.iter().all(|u| !u.is_registered));
        assert_eq!(
            out.tally
                .excluded_for(FactKind::UserPlan, ExclusionReason::UnresolvedRegistrationId),
            1
        );
    }

    #[test]
    fn test_transform_is_deterministic() {
        let sources = sample();
        let a = transform(&sources);
        let b = transform(&sources);
        assert_eq!(a.schema.tables().len(), 9);
        assert_eq!(a.tally, b.tally);
        assert_eq!(a.schema.play_sessions, b.schema.play_sessions);
        assert_eq!(a.schema.dates, b.schema.dates);
        assert_eq!(a.schema.user_plans, b.schema.user_plans);
    }
}
