use util::rounding::round_to_decimals;

use crate::Db;

/// Loss of a single fusion splice.
pub const SPLICE_LOSS: Db = 0.1;
/// Loss of a single mated connector pair.
pub const CONNECTOR_LOSS: Db = 0.3;

/// Split ratios for which insertion loss is tabulated, in ascending order.
pub const STANDARD_SPLIT_RATIOS: [u32; 6] = [2, 4, 8, 16, 32, 64];

const STANDARD_SPLITTER_LOSSES: [Db; 6] = [3.5, 7.0, 10.5, 13.5, 16.5, 19.0];

/// Approximate loss per doubling of the split ratio, used for ratios outside the table.
const LOSS_PER_SPLIT_STAGE: Db = 3.5;

/// Insertion loss of a 1:`ratio` splitter.
///
/// Tabulated ratios return datasheet-typical values, any other ratio is approximated as `3.5 * log2(ratio)`
/// rounded to one decimal.  A ratio of 0 or 1 has no loss.
pub fn splitter_loss(ratio: u32) -> Db {
    if let Some(index) = STANDARD_SPLIT_RATIOS
        .iter()
        .position(|candidate| *candidate == ratio)
    {
        return STANDARD_SPLITTER_LOSSES[index];
    }

    if ratio <= 1 {
        return 0.0;
    }

    round_to_decimals(LOSS_PER_SPLIT_STAGE * (ratio as f64).log2(), 1)
}

/// The elements of an ad-hoc link budget, outside of any tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LossBudget {
    /// Split ratio of each splitter on the path
    #[serde(default)]
    pub splitters: Vec<u32>,
    #[serde(default)]
    pub splices: u32,
    #[serde(default)]
    pub connectors: u32,
}

/// Sum of all element losses, rounded to 2 decimals.
pub fn total_loss(budget: &LossBudget) -> Db {
    let splitters: Db = budget
        .splitters
        .iter()
        .map(|ratio| splitter_loss(*ratio))
        .sum();

    let total = splitters + budget.splices as f64 * SPLICE_LOSS + budget.connectors as f64 * CONNECTOR_LOSS;

    round_to_decimals(total, 2)
}


#[cfg(test)]
mod total_loss_tests {
    use util::assert_approx_eq;

    use super::*;

    #[test]
    fn empty_budget_has_no_loss() {
        assert_eq!(total_loss(&LossBudget::default()), 0.0);
    }

    #[test]
    fn sums_splitters_splices_and_connectors() {
        // given
        let budget = LossBudget {
            splitters: vec![8, 4],
            splices: 3,
            connectors: 2,
        };

        // when
        let result = total_loss(&budget);

        // then
        // 10.5 + 7.0 + 0.3 + 0.6
        assert_approx_eq!(result, 18.4);
    }

    #[test]
    fn rounds_to_two_decimals() {
        // given
        let budget = LossBudget {
            splitters: vec![3],
            splices: 7,
            connectors: 0,
        };

        // when
        let result = total_loss(&budget);

        // then
        // 5.5 + 0.7000000000000001
        assert_eq!(result, 6.2);
    }
}
