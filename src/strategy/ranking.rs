//! Candidate ranking shared by every neighborhood policy.
//!
//! Offsets are ordered by:
//!
//! ```text
//! key(offset) = (
//!     Σ |offset[i]| × step_weight(priority[i]),   // weighted distance
//!     number of non-zero components,              // singles before combinations
//!     Σ rank(i, offset[i]),                       // single-axis rank sum
//!     [rank(0, offset[0]), rank(1, offset[1]), ...]
//! )
//! ```
//!
//! where `rank(i, d)` is the position of the single-axis step `d` along axis
//! `i` in the global single-step table (zero for `d == 0`).

use std::cmp::Reverse;
use std::collections::HashMap;

use super::axis::{Order, Priority};
use super::Neighborhood;

/// A relative position delta, one component per axis.
pub type Offset = Vec<isize>;

/// Borrowed view of a strategy's per-axis configuration.
pub(crate) struct AxisSpace<'a> {
    pub lengths: &'a [usize],
    pub priorities: &'a [Priority],
    pub orders: &'a [Order],
    pub ranges: &'a [usize],
}

impl AxisSpace<'_> {
    fn dimensions(&self) -> usize {
        self.lengths.len()
    }

    /// Reachable single-axis steps along `axis`, by ascending magnitude,
    /// forward before backward.
    pub(crate) fn axis_steps(&self, axis: usize) -> Vec<isize> {
        // Steps at or beyond the axis length can never land inside it.
        let reach = self.ranges[axis].min(self.lengths[axis].saturating_sub(1)) as isize;
        let order = self.orders[axis];
        (1..=reach)
            .flat_map(|m| [m, -m])
            .filter(|&d| order.admits(d))
            .collect()
    }
}

/// Global ordering of every single-axis step.
pub(crate) struct RankTable {
    ranks: HashMap<(usize, isize), usize>,
}

impl RankTable {
    pub(crate) fn build(space: &AxisSpace<'_>) -> Self {
        let mut steps: Vec<(usize, isize)> = (0..space.dimensions())
            .flat_map(|axis| space.axis_steps(axis).into_iter().map(move |d| (axis, d)))
            .collect();

        steps.sort_by_key(|&(axis, d)| {
            let priority = space.priorities[axis];
            (
                d.unsigned_abs() * priority.step_weight(),
                Reverse(priority.clamped()),
                axis,
                d < 0,
            )
        });

        let ranks = steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| (step, i + 1))
            .collect();

        Self { ranks }
    }

    /// Rank of a single-axis step; zero for no movement.
    pub(crate) fn rank(&self, axis: usize, delta: isize) -> usize {
        if delta == 0 {
            return 0;
        }
        self.ranks.get(&(axis, delta)).copied().unwrap_or(usize::MAX)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct CandidateKey {
    distance: usize,
    spread: usize,
    rank_sum: usize,
    ranks: Vec<usize>,
}

fn candidate_key(space: &AxisSpace<'_>, table: &RankTable, offset: &[isize]) -> CandidateKey {
    let distance = offset
        .iter()
        .zip(space.priorities)
        .map(|(d, p)| d.unsigned_abs() * p.step_weight())
        .sum();
    let spread = offset.iter().filter(|&&d| d != 0).count();
    let ranks: Vec<usize> = offset
        .iter()
        .enumerate()
        .map(|(axis, &d)| table.rank(axis, d))
        .collect();
    let rank_sum = ranks.iter().fold(0usize, |acc, &r| acc.saturating_add(r));

    CandidateKey {
        distance,
        spread,
        rank_sum,
        ranks,
    }
}

/// Enumerate the offsets a policy may ever request, unsorted.
fn enumerate(neighborhood: Neighborhood, space: &AxisSpace<'_>) -> Vec<Offset> {
    let dims = space.dimensions();
    let zero: Offset = vec![0; dims];

    match neighborhood {
        Neighborhood::Crosshair => {
            let mut offsets = vec![zero.clone()];
            for axis in 0..dims {
                for d in space.axis_steps(axis) {
                    let mut offset = zero.clone();
                    offset[axis] = d;
                    offsets.push(offset);
                }
            }
            offsets
        }
        Neighborhood::Rectangle => {
            let mut offsets: Vec<Offset> = vec![Vec::with_capacity(dims)];
            for axis in 0..dims {
                let choices: Vec<isize> = std::iter::once(0).chain(space.axis_steps(axis)).collect();
                offsets = offsets
                    .into_iter()
                    .flat_map(|prefix| {
                        choices.iter().map(move |&d| {
                            let mut next = prefix.clone();
                            next.push(d);
                            next
                        })
                    })
                    .collect();
            }
            offsets
        }
    }
}

/// Every candidate offset for `neighborhood`, nearest first.
pub(crate) fn ranked_offsets(neighborhood: Neighborhood, space: &AxisSpace<'_>) -> Vec<Offset> {
    let table = RankTable::build(space);
    let mut offsets = enumerate(neighborhood, space);
    offsets.sort_by_cached_key(|offset| candidate_key(space, &table, offset));
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Axes {
        lengths: Vec<usize>,
        priorities: Vec<Priority>,
        orders: Vec<Order>,
        ranges: Vec<usize>,
    }

    impl Axes {
        fn uniform(lengths: &[usize], range: usize) -> Self {
            Self {
                lengths: lengths.to_vec(),
                priorities: vec![Priority::NORMAL; lengths.len()],
                orders: vec![Order::Centered; lengths.len()],
                ranges: vec![range; lengths.len()],
            }
        }

        fn space(&self) -> AxisSpace<'_> {
            AxisSpace {
                lengths: &self.lengths,
                priorities: &self.priorities,
                orders: &self.orders,
                ranges: &self.ranges,
            }
        }
    }

    #[test]
    fn test_axis_steps_interleave_directions() {
        let axes = Axes::uniform(&[9], 3);
        assert_eq!(axes.space().axis_steps(0), vec![1, -1, 2, -2, 3, -3]);
    }

    #[test]
    fn test_axis_steps_respect_order_and_length() {
        let mut axes = Axes::uniform(&[3, 10, 10], 4);
        axes.orders[1] = Order::Forward;
        axes.orders[2] = Order::Backward;
        let space = axes.space();

        // Length 3 allows at most two steps either way.
        assert_eq!(space.axis_steps(0), vec![1, -1, 2, -2]);
        assert_eq!(space.axis_steps(1), vec![1, 2, 3, 4]);
        assert_eq!(space.axis_steps(2), vec![-1, -2, -3, -4]);
    }

    #[test]
    fn test_rank_table_uniform_priorities() {
        let axes = Axes::uniform(&[5, 7], 2);
        let table = RankTable::build(&axes.space());

        assert_eq!(table.rank(0, 0), 0);
        assert_eq!(table.rank(0, 1), 1);
        assert_eq!(table.rank(0, -1), 2);
        assert_eq!(table.rank(1, 1), 3);
        assert_eq!(table.rank(1, -1), 4);
        assert_eq!(table.rank(0, 2), 5);
        assert_eq!(table.rank(0, -2), 6);
        assert_eq!(table.rank(1, 2), 7);
        assert_eq!(table.rank(1, -2), 8);
    }

    #[test]
    fn test_rank_table_prefers_high_priority_axis() {
        let mut axes = Axes::uniform(&[5, 7], 2);
        axes.priorities[1] = Priority::HIGH;
        let table = RankTable::build(&axes.space());

        assert_eq!(table.rank(1, 1), 1);
        assert_eq!(table.rank(1, -1), 2);
        assert_eq!(table.rank(0, 1), 3);
        assert_eq!(table.rank(1, 2), 5);
    }

    #[test]
    fn test_rectangle_enumerates_full_product() {
        let axes = Axes::uniform(&[5, 7, 4], 1);
        let offsets = enumerate(Neighborhood::Rectangle, &axes.space());
        assert_eq!(offsets.len(), 27);
        assert!(offsets.contains(&vec![-1, 1, -1]));
    }

    #[test]
    fn test_ranked_offsets_zero_first() {
        let axes = Axes::uniform(&[5, 7], 2);
        for neighborhood in [Neighborhood::Crosshair, Neighborhood::Rectangle] {
            let offsets = ranked_offsets(neighborhood, &axes.space());
            assert_eq!(offsets[0], vec![0, 0]);
        }
    }
}
