//! Deterministic calculation engine
//!
//! Pure, side-effect-free functions over an ordered entry log. Views are
//! recomputed on every evaluation and never written back here; persisting
//! and sealing a snapshot is the store's job.
//!
//! All sums use exact `Decimal` arithmetic. Human-facing rounding lives in
//! the `format` module and never feeds back into stored or compared values.

use crate::types::{AnnualView, CurrentYearSummary, LedgerEntry, LifetimeSummary, LifetimeView, Status};
use crate::REPAIR_WINDOW_ENTRIES;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Amplified harm and raw surplus accumulated over some entry subset
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    harm_ly: Decimal,
    harm_ecy: Decimal,
    surplus_ly: Decimal,
    surplus_ecy: Decimal,
}

fn accumulate<'a>(entries: impl Iterator<Item = &'a LedgerEntry>) -> Totals {
    let mut t = Totals::default();
    for e in entries {
        let (a_ly, a_ecy) = e.amplified_harm();
        t.harm_ly += a_ly;
        t.harm_ecy += a_ecy;
        t.surplus_ly += e.surplus_ly;
        t.surplus_ecy += e.surplus_ecy;
    }
    t
}

/// Derive the repair status from aggregate balances.
///
/// The ordering is a tie-break: full offset beats partial offset beats pure
/// accrual. REPAIRED requires both outstandings to clear; a single unit in
/// surplus is enough for STABILIZED.
pub fn derive_status(
    outstanding_ly: Decimal,
    outstanding_ecy: Decimal,
    surplus_ly: Decimal,
    surplus_ecy: Decimal,
) -> Status {
    if outstanding_ly >= Decimal::ZERO && outstanding_ecy >= Decimal::ZERO {
        Status::Repaired
    } else if surplus_ly > Decimal::ZERO || surplus_ecy > Decimal::ZERO {
        Status::Stabilized
    } else {
        Status::Accruing
    }
}

/// Aggregate the entries of a single occurrence year.
pub fn annual_view(entries: &[LedgerEntry], year: i32) -> AnnualView {
    let t = accumulate(entries.iter().filter(|e| e.year == year));
    let outstanding_ly = t.harm_ly + t.surplus_ly;
    let outstanding_ecy = t.harm_ecy + t.surplus_ecy;
    AnnualView {
        year,
        harm_ly: t.harm_ly,
        harm_ecy: t.harm_ecy,
        surplus_ly: t.surplus_ly,
        surplus_ecy: t.surplus_ecy,
        outstanding_ly,
        outstanding_ecy,
        status: derive_status(outstanding_ly, outstanding_ecy, t.surplus_ly, t.surplus_ecy),
    }
}

/// Aggregate the full entry log and project time-to-repair.
pub fn lifetime_view(entries: &[LedgerEntry]) -> LifetimeView {
    let t = accumulate(entries.iter());
    let outstanding_ly = t.harm_ly + t.surplus_ly;
    let outstanding_ecy = t.harm_ecy + t.surplus_ecy;
    LifetimeView {
        harm_ly: t.harm_ly,
        harm_ecy: t.harm_ecy,
        surplus_ly: t.surplus_ly,
        surplus_ecy: t.surplus_ecy,
        outstanding_ly,
        outstanding_ecy,
        status: derive_status(outstanding_ly, outstanding_ecy, t.surplus_ly, t.surplus_ecy),
        years_to_repair: years_to_repair(entries, outstanding_ly, t.surplus_ly),
    }
}

/// Project years until the LY debt clears at the recent repair rate.
///
/// Defined only while there is LY debt and some lifetime LY surplus. The
/// rate is taken from the most recent `REPAIR_WINDOW_ENTRIES` entries by
/// occurrence year: positive surplus in the window divided by the distinct
/// years the window spans. Absent a usable rate the projection is `None`,
/// signaling "cannot currently project repair".
fn years_to_repair(
    entries: &[LedgerEntry],
    outstanding_ly: Decimal,
    surplus_ly: Decimal,
) -> Option<Decimal> {
    if outstanding_ly >= Decimal::ZERO || surplus_ly <= Decimal::ZERO {
        return None;
    }

    let mut recent: Vec<&LedgerEntry> = entries.iter().collect();
    recent.sort_by(|a, b| b.year.cmp(&a.year));
    recent.truncate(REPAIR_WINDOW_ENTRIES);

    let distinct_years: BTreeSet<i32> = recent.iter().map(|e| e.year).collect();
    let recent_surplus: Decimal = recent
        .iter()
        .filter(|e| e.surplus_ly > Decimal::ZERO)
        .map(|e| e.surplus_ly)
        .sum();

    if distinct_years.is_empty() || recent_surplus <= Decimal::ZERO {
        return None;
    }

    let per_year = recent_surplus / Decimal::from(distinct_years.len() as u64);
    Some(outstanding_ly.abs() / per_year)
}

/// Amplified harm accumulated for one culpability tag
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarmBucket {
    /// Amplified harm, life-years
    pub ly: Decimal,
    /// Amplified harm, ecosystem-capacity-years
    pub ecy: Decimal,
    /// Number of harm entries in this bucket
    pub count: u64,
}

/// Group harm-bearing entries by culpability tag.
///
/// Only entries with negative harm participate. Reporting layers usually sort
/// by amplified LY descending; the map itself is keyed alphabetically.
pub fn harm_breakdown(entries: &[LedgerEntry]) -> BTreeMap<String, HarmBucket> {
    let mut breakdown: BTreeMap<String, HarmBucket> = BTreeMap::new();
    for e in entries {
        if e.harm_ly < Decimal::ZERO || e.harm_ecy < Decimal::ZERO {
            let (a_ly, a_ecy) = e.amplified_harm();
            let bucket = breakdown.entry(e.harm_type.clone()).or_default();
            bucket.ly += a_ly;
            bucket.ecy += a_ecy;
            bucket.count += 1;
        }
    }
    breakdown
}

/// All entries responding to `entry_id`, in log order.
///
/// Single hop only; response chains are not followed transitively.
pub fn response_chain<'a>(entries: &'a [LedgerEntry], entry_id: &str) -> Vec<&'a LedgerEntry> {
    entries
        .iter()
        .filter(|e| e.response_to_entry_id.as_deref() == Some(entry_id))
        .collect()
}

/// Distinct occurrence years present in the log, ascending.
pub fn distinct_years(entries: &[LedgerEntry]) -> Vec<i32> {
    let years: BTreeSet<i32> = entries.iter().map(|e| e.year).collect();
    years.into_iter().collect()
}

impl AnnualView {
    /// Persisted current-year block for this view
    pub fn into_current_year(self) -> CurrentYearSummary {
        CurrentYearSummary {
            year: self.year,
            harm_ly: self.harm_ly,
            harm_ecy: self.harm_ecy,
            surplus_ly: self.surplus_ly,
            surplus_ecy: self.surplus_ecy,
            status: self.status,
        }
    }
}

impl LifetimeView {
    /// Persisted lifetime block for this view. The projection is derived
    /// state and is never persisted alongside the seal.
    pub fn into_summary(self) -> LifetimeSummary {
        LifetimeSummary {
            harm_ly: self.harm_ly,
            harm_ecy: self.harm_ecy,
            surplus_ly: self.surplus_ly,
            surplus_ecy: self.surplus_ecy,
            outstanding_ly: self.outstanding_ly,
            outstanding_ecy: self.outstanding_ecy,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, EntityId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn entry(year: i32, harm_ly: Decimal, surplus_ly: Decimal, harm_type: &str) -> LedgerEntry {
        LedgerEntry {
            entry_id: format!("acme_entry_{}_{}", year, harm_type),
            entity_id: EntityId::new("acme"),
            year,
            date_logged: Utc::now(),
            harm_ly,
            harm_ecy: Decimal::ZERO,
            surplus_ly,
            surplus_ecy: Decimal::ZERO,
            description: String::new(),
            harm_type: harm_type.into(),
            incident_type: None,
            confidence: Confidence::Medium,
            source_hash: None,
            response_to_entry_id: None,
        }
    }

    #[test]
    fn test_lifetime_amplification_example() {
        // -53 * 5 + -53 * 10 = -795, surplus 5, outstanding -790
        let entries = vec![
            entry(2024, dec!(-53), dec!(0), "DELIBERATE"),
            entry(2024, dec!(-53), dec!(0), "COVER_UP"),
            entry(2024, dec!(0), dec!(5), "NEGLIGENCE"),
        ];
        let view = lifetime_view(&entries);
        assert_eq!(view.harm_ly, dec!(-795));
        assert_eq!(view.surplus_ly, dec!(5));
        assert_eq!(view.outstanding_ly, dec!(-790));
        assert_eq!(view.status, Status::Stabilized);
    }

    #[test]
    fn test_pure_accrual_is_accruing() {
        let entries = vec![
            entry(2024, dec!(-53), dec!(0), "DELIBERATE"),
            entry(2024, dec!(-53), dec!(0), "COVER_UP"),
        ];
        assert_eq!(lifetime_view(&entries).status, Status::Accruing);
    }

    #[test]
    fn test_annual_view_filters_by_year() {
        let entries = vec![
            entry(2023, dec!(-100), dec!(0), "NEGLIGENCE"),
            entry(2024, dec!(-10), dec!(0), "NEGLIGENCE"),
            entry(2024, dec!(0), dec!(4), "NEGLIGENCE"),
        ];
        let view = annual_view(&entries, 2024);
        assert_eq!(view.harm_ly, dec!(-10));
        assert_eq!(view.surplus_ly, dec!(4));
        assert_eq!(view.outstanding_ly, dec!(-6));
        assert_eq!(view.status, Status::Stabilized);

        let empty = annual_view(&entries, 1999);
        assert_eq!(empty.harm_ly, dec!(0));
        assert_eq!(empty.status, Status::Repaired);
    }

    #[test]
    fn test_status_precedence() {
        // Full offset beats partial offset
        assert_eq!(
            derive_status(dec!(0), dec!(0), dec!(5), dec!(0)),
            Status::Repaired
        );
        // Partial offset beats pure accrual
        assert_eq!(
            derive_status(dec!(-1), dec!(0), dec!(5), dec!(0)),
            Status::Stabilized
        );
        // Surplus in either unit is enough for STABILIZED
        assert_eq!(
            derive_status(dec!(-1), dec!(0), dec!(0), dec!(3)),
            Status::Stabilized
        );
        assert_eq!(
            derive_status(dec!(-1), dec!(0), dec!(0), dec!(0)),
            Status::Accruing
        );
        // One unit still in debt blocks REPAIRED
        assert_eq!(
            derive_status(dec!(5), dec!(-1), dec!(5), dec!(5)),
            Status::Stabilized
        );
    }

    #[test]
    fn test_years_to_repair_example() {
        // outstanding -790, one distinct recent year, recent surplus 5
        let entries = vec![
            entry(2024, dec!(-53), dec!(0), "DELIBERATE"),
            entry(2024, dec!(-53), dec!(0), "COVER_UP"),
            entry(2024, dec!(0), dec!(5), "NEGLIGENCE"),
        ];
        let view = lifetime_view(&entries);
        assert_eq!(view.years_to_repair, Some(dec!(158)));
    }

    #[test]
    fn test_years_to_repair_undefined_without_surplus() {
        let entries = vec![entry(2024, dec!(-53), dec!(0), "DELIBERATE")];
        assert_eq!(lifetime_view(&entries).years_to_repair, None);
    }

    #[test]
    fn test_years_to_repair_undefined_when_repaired() {
        let entries = vec![entry(2024, dec!(-5), dec!(5), "NEGLIGENCE")];
        assert_eq!(lifetime_view(&entries).years_to_repair, None);
    }

    #[test]
    fn test_years_to_repair_rate_spans_distinct_years() {
        let entries = vec![
            entry(2020, dec!(-105), dec!(0), "NEGLIGENCE"),
            entry(2023, dec!(0), dec!(4), "NEGLIGENCE"),
            entry(2024, dec!(0), dec!(6), "NEGLIGENCE"),
        ];
        let view = lifetime_view(&entries);
        assert_eq!(view.outstanding_ly, dec!(-95));
        // 3 distinct years in window (2020, 2023, 2024), surplus 10 -> rate 10/3
        assert_eq!(view.years_to_repair, Some(dec!(95) / (dec!(10) / dec!(3))));
    }

    #[test]
    fn test_years_to_repair_window_excludes_old_entries() {
        // 100 recent harm-only entries in 2024 push the lone 2020 surplus
        // entry out of the window; no positive surplus remains in it.
        let mut entries = vec![entry(2020, dec!(0), dec!(50), "NEGLIGENCE")];
        for _ in 0..100 {
            entries.push(entry(2024, dec!(-10), dec!(0), "NEGLIGENCE"));
        }
        let view = lifetime_view(&entries);
        assert!(view.outstanding_ly < Decimal::ZERO);
        assert!(view.surplus_ly > Decimal::ZERO);
        assert_eq!(view.years_to_repair, None);
    }

    #[test]
    fn test_harm_breakdown_groups_and_amplifies() {
        let entries = vec![
            entry(2024, dec!(-10), dec!(0), "DELIBERATE"),
            entry(2024, dec!(-10), dec!(0), "DELIBERATE"),
            entry(2024, dec!(-1), dec!(0), "NEGLIGENCE"),
            entry(2024, dec!(0), dec!(5), "NEGLIGENCE"), // no harm, excluded
        ];
        let breakdown = harm_breakdown(&entries);
        assert_eq!(breakdown.len(), 2);
        let deliberate = &breakdown["DELIBERATE"];
        assert_eq!(deliberate.ly, dec!(-100));
        assert_eq!(deliberate.count, 2);
        assert_eq!(breakdown["NEGLIGENCE"].ly, dec!(-1));
    }

    #[test]
    fn test_response_chain_single_hop() {
        let mut a = entry(2024, dec!(-10), dec!(0), "NEGLIGENCE");
        a.entry_id = "a".into();
        let mut b = entry(2024, dec!(0), dec!(5), "NEGLIGENCE");
        b.entry_id = "b".into();
        b.response_to_entry_id = Some("a".into());
        let mut c = entry(2024, dec!(0), dec!(2), "NEGLIGENCE");
        c.entry_id = "c".into();
        c.response_to_entry_id = Some("b".into());

        let entries = vec![a, b, c];
        let chain = response_chain(&entries, "a");
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].entry_id, "b");
    }

    #[test]
    fn test_distinct_years_sorted() {
        let entries = vec![
            entry(2024, dec!(-1), dec!(0), "NEGLIGENCE"),
            entry(-500, dec!(-1), dec!(0), "NEGLIGENCE"),
            entry(2024, dec!(-1), dec!(0), "NEGLIGENCE"),
            entry(1950, dec!(-1), dec!(0), "NEGLIGENCE"),
        ];
        assert_eq!(distinct_years(&entries), vec![-500, 1950, 2024]);
    }
}
