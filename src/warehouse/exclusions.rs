//! Bookkeeping for source rows that could not become fact rows.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{PAYMENT_FACT, PLAY_SESSION_FACT, USER_PLAN, USER_PLAN_FACT, USER_PLAY_SESSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    PlaySession,
    UserPlan,
    Payment,
}

impl FactKind {
    pub const ALL: [FactKind; 3] = [FactKind::PlaySession, FactKind::UserPlan, FactKind::Payment];

    /// Warehouse table the facts land in
    pub fn table_name(self) -> &'static str {
        match self {
            FactKind::PlaySession => PLAY_SESSION_FACT.name,
            FactKind::UserPlan => USER_PLAN_FACT.name,
            FactKind::Payment => PAYMENT_FACT.name,
        }
    }

    /// Source table whose rows are eligible for this fact
    pub fn source_table(self) -> &'static str {
        match self {
            FactKind::PlaySession => USER_PLAY_SESSION.name,
            FactKind::UserPlan | FactKind::Payment => USER_PLAN.name,
        }
    }
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Why a source row was left out of its fact table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExclusionReason {
    UnresolvedUserId,
    UnresolvedRegistrationId,
    UnresolvedPlanId,
    UnresolvedPaymentDetailId,
    UnresolvedChannelCode,
    UnresolvedStatusCode,
    MissingStartDate,
    PlanWithoutFrequency,
    PlanWithoutCost,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExclusionReason::UnresolvedUserId => "unresolved user_id",
            ExclusionReason::UnresolvedRegistrationId => "unresolved user_registration_id",
            ExclusionReason::UnresolvedPlanId => "unresolved plan_id",
            ExclusionReason::UnresolvedPaymentDetailId => "unresolved payment_detail_id",
            ExclusionReason::UnresolvedChannelCode => "unresolved channel_code",
            ExclusionReason::UnresolvedStatusCode => "unresolved status_code",
            ExclusionReason::MissingStartDate => "missing or unparseable start date",
            ExclusionReason::PlanWithoutFrequency => "plan has no resolvable payment frequency",
            ExclusionReason::PlanWithoutCost => "plan has no cost amount",
        };
        f.write_str(text)
    }
}

impl Serialize for ExclusionReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counts for one fact type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FactTally {
    /// Source rows considered
    pub eligible: usize,
    /// Fact rows emitted
    pub produced: usize,
    pub excluded: BTreeMap<ExclusionReason, usize>,
}

impl FactTally {
    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }
}

/// Per-fact exclusion tally returned alongside the star schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionTally {
    facts: BTreeMap<FactKind, FactTally>,
}

impl ExclusionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_eligible(&mut self, kind: FactKind) {
        self.facts.entry(kind).or_default().eligible += 1;
    }

    pub fn record_produced(&mut self, kind: FactKind) {
        self.facts.entry(kind).or_default().produced += 1;
    }

    pub fn exclude(&mut self, kind: FactKind, reason: ExclusionReason) {
        *self
            .facts
            .entry(kind)
            .or_default()
            .excluded
            .entry(reason)
            .or_insert(0) += 1;
    }

    pub fn get(&self, kind: FactKind) -> Option<&FactTally> {
        self.facts.get(&kind)
    }

    /// Rows excluded from `kind` for any reason
    pub fn excluded(&self, kind: FactKind) -> usize {
        self.get(kind).map_or(0, FactTally::excluded_total)
    }

    pub fn excluded_for(&self, kind: FactKind, reason: ExclusionReason) -> usize {
        self.get(kind)
            .and_then(|t| t.excluded.get(&reason).copied())
            .unwrap_or(0)
    }

    pub fn total_excluded(&self) -> usize {
        self.facts.values().map(FactTally::excluded_total).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FactKind, &FactTally)> {
        self.facts.iter().map(|(kind, tally)| (*kind, tally))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_by_reason() {
        let mut tally = ExclusionTally::new();
        tally.record_eligible(FactKind::PlaySession);
        tally.record_eligible(FactKind::PlaySession);
        tally.record_produced(FactKind::PlaySession);
        tally.exclude(FactKind::PlaySession, ExclusionReason::UnresolvedUserId);
        tally.exclude(FactKind::Payment, ExclusionReason::PlanWithoutCost);

        assert_eq!(tally.excluded(FactKind::PlaySession), 1);
        assert_eq!(
            tally.excluded_for(FactKind::PlaySession, ExclusionReason::UnresolvedUserId),
            1
        );
        assert_eq!(tally.excluded(FactKind::UserPlan), 0);
        assert_eq!(tally.total_excluded(), 2);
    }

    #[test]
    fn test_reasons_serialize_as_text() {
        let mut tally = ExclusionTally::new();
        tally.exclude(FactKind::PlaySession, ExclusionReason::UnresolvedUserId);

        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(
            json["facts"]["play_session"]["excluded"]["unresolved user_id"],
            serde_json::json!(1)
        );
    }
}
