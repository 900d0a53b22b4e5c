//! Period release gate.
//!
//! Pure frontier computation over an employee's period groups: a group is
//! accessible only when every chronologically earlier group is fully signed.
//! Groups sharing `(year, month)` across liquidation types share a rank and
//! are gated together. Viewing and signing share the same gate.

use std::collections::HashSet;

use recibos_core::models::{PeriodGroupAccess, PeriodGroupKey};
use uuid::Uuid;

/// Signing state of one period group: which legajos must sign it and which
/// already have. Always computed fresh from the signature set, never cached.
#[derive(Debug, Clone)]
pub struct GroupSigningState {
    pub key: PeriodGroupKey,
    /// Every active legajo owning payroll lines in this group.
    pub required_legajos: Vec<Uuid>,
    pub signed_legajos: HashSet<Uuid>,
}

impl GroupSigningState {
    pub fn new(key: PeriodGroupKey, required_legajos: Vec<Uuid>) -> Self {
        Self {
            key,
            required_legajos,
            signed_legajos: HashSet::new(),
        }
    }

    /// A group counts as signed only when all of its legajos have signed.
    pub fn fully_signed(&self) -> bool {
        self.required_legajos
            .iter()
            .all(|l| self.signed_legajos.contains(l))
    }
}

/// Compute the accessible frontier for a set of period groups, returned in
/// ascending `(year, month)` order. Everything after the first
/// not-fully-signed rank is inaccessible, even if signatures exist for it.
pub fn evaluate(mut groups: Vec<GroupSigningState>) -> Vec<PeriodGroupAccess> {
    groups.sort_by_key(|g| g.key.rank());

    let mut result = Vec::with_capacity(groups.len());
    let mut all_prior_signed = true;
    let mut i = 0;
    while i < groups.len() {
        let rank = groups[i].key.rank();
        let mut j = i;
        let mut rank_fully_signed = true;
        while j < groups.len() && groups[j].key.rank() == rank {
            let g = &groups[j];
            let signed = g.fully_signed();
            rank_fully_signed = rank_fully_signed && signed;
            result.push(PeriodGroupAccess {
                period: g.key.period,
                liquidation_type: g.key.liquidation_type,
                signed,
                accessible: all_prior_signed,
            });
            j += 1;
        }
        all_prior_signed = all_prior_signed && rank_fully_signed;
        i = j;
    }

    result
}

/// Whether one specific group is within the accessible frontier. `None` when
/// the group does not exist for this employee.
pub fn is_accessible(groups: Vec<GroupSigningState>, key: PeriodGroupKey) -> Option<bool> {
    evaluate(groups)
        .into_iter()
        .find(|a| a.period == key.period && a.liquidation_type == key.liquidation_type)
        .map(|a| a.accessible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recibos_core::models::{LiquidationType, Period};

    fn key(month: u32, year: i32, lt: LiquidationType) -> PeriodGroupKey {
        PeriodGroupKey::new(Period::new(month, year).unwrap(), lt)
    }

    fn legajo(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn group(month: u32, year: i32, lt: LiquidationType, signed: bool) -> GroupSigningState {
        let mut g = GroupSigningState::new(key(month, year, lt), vec![legajo(1)]);
        if signed {
            g.signed_legajos.insert(legajo(1));
        }
        g
    }

    #[test]
    fn test_empty_input_yields_empty_frontier() {
        assert!(evaluate(Vec::new()).is_empty());
    }

    #[test]
    fn test_earliest_group_is_always_accessible() {
        let result = evaluate(vec![group(3, 2024, LiquidationType::Monthly, false)]);
        assert_eq!(result.len(), 1);
        assert!(result[0].accessible);
        assert!(!result[0].signed);
    }

    #[test]
    fn test_unsigned_earlier_period_blocks_later_ones() {
        // 03/2024, 04/2024, 05/2024 all unsigned: only 03 accessible.
        let result = evaluate(vec![
            group(4, 2024, LiquidationType::Monthly, false),
            group(3, 2024, LiquidationType::Monthly, false),
            group(5, 2024, LiquidationType::Monthly, false),
        ]);
        let accessible: Vec<_> = result.iter().map(|a| a.accessible).collect();
        assert_eq!(accessible, vec![true, false, false]);
        assert_eq!(result[0].period, Period::new(3, 2024).unwrap());
    }

    #[test]
    fn test_signing_extends_frontier_by_one() {
        // Sign 03/2024 only: 04 opens, 05 stays closed.
        let result = evaluate(vec![
            group(3, 2024, LiquidationType::Monthly, true),
            group(4, 2024, LiquidationType::Monthly, false),
            group(5, 2024, LiquidationType::Monthly, false),
        ]);
        let accessible: Vec<_> = result.iter().map(|a| a.accessible).collect();
        assert_eq!(accessible, vec![true, true, false]);
    }

    #[test]
    fn test_later_signatures_cannot_skip_ahead_of_a_gap() {
        // 04/2024 signed but 03/2024 is not: 04 and 05 stay inaccessible.
        let result = evaluate(vec![
            group(3, 2024, LiquidationType::Monthly, false),
            group(4, 2024, LiquidationType::Monthly, true),
            group(5, 2024, LiquidationType::Monthly, false),
        ]);
        let accessible: Vec<_> = result.iter().map(|a| a.accessible).collect();
        assert_eq!(accessible, vec![true, false, false]);
        assert!(result[1].signed);
    }

    #[test]
    fn test_same_period_liquidation_types_share_a_rank() {
        // Monthly and aguinaldo in 06/2024 are gated together: both become
        // accessible at once, and the next rank needs both signed.
        let result = evaluate(vec![
            group(6, 2024, LiquidationType::Monthly, true),
            group(6, 2024, LiquidationType::Aguinaldo, false),
            group(7, 2024, LiquidationType::Monthly, false),
        ]);
        assert!(result[0].accessible);
        assert!(result[1].accessible);
        assert!(!result[2].accessible);
    }

    #[test]
    fn test_year_boundary_ordering() {
        let result = evaluate(vec![
            group(1, 2024, LiquidationType::Monthly, false),
            group(12, 2023, LiquidationType::Monthly, true),
        ]);
        assert_eq!(result[0].period, Period::new(12, 2023).unwrap());
        assert!(result[0].accessible);
        assert!(result[1].accessible);
    }

    #[test]
    fn test_multi_legajo_group_needs_every_signature() {
        let mut g04 = GroupSigningState::new(
            key(4, 2024, LiquidationType::Monthly),
            vec![legajo(1), legajo(2)],
        );
        g04.signed_legajos.insert(legajo(1));
        let g05 = GroupSigningState::new(key(5, 2024, LiquidationType::Monthly), vec![legajo(1)]);

        let result = evaluate(vec![g04.clone(), g05.clone()]);
        assert!(!result[0].signed);
        assert!(!result[1].accessible);

        // Second legajo signs: the group completes and 05/2024 opens.
        g04.signed_legajos.insert(legajo(2));
        let result = evaluate(vec![g04, g05]);
        assert!(result[0].signed);
        assert!(result[1].accessible);
    }

    #[test]
    fn test_signing_only_ever_extends_the_frontier() {
        let mk = |signed: [bool; 4]| {
            vec![
                group(1, 2024, LiquidationType::Monthly, signed[0]),
                group(2, 2024, LiquidationType::Monthly, signed[1]),
                group(3, 2024, LiquidationType::Monthly, signed[2]),
                group(4, 2024, LiquidationType::Monthly, signed[3]),
            ]
        };
        let before = evaluate(mk([true, false, false, false]));
        let after = evaluate(mk([true, true, false, false]));
        for (b, a) in before.iter().zip(after.iter()) {
            // Flipping unsigned -> signed never closes anything.
            assert!(!b.accessible || a.accessible);
        }
    }

    #[test]
    fn test_is_accessible_for_unknown_group_is_none() {
        let groups = vec![group(3, 2024, LiquidationType::Monthly, false)];
        assert_eq!(
            is_accessible(groups, key(4, 2024, LiquidationType::Monthly)),
            None
        );
    }
}
