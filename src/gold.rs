//! Gold piles: creation, lookup by cell, and the one-shot collect operation.

/// A gold deposit at one cell. Nugget count is fixed at creation;
/// `collected` transitions false -> true exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pile {
    pub row: i64,
    pub col: i64,
    pub nuggets: i32,
    pub collected: bool,
}

/// The set of all piles in the world, keyed by cell.
#[derive(Clone, Debug, Default)]
pub struct GoldSet {
    piles: Vec<Pile>,
}

impl GoldSet {
    pub fn new() -> GoldSet {
        GoldSet { piles: Vec::new() }
    }

    /// Registers a new pile. `nuggets` must be positive; callers are
    /// responsible for keeping the total nuggets across all piles constant.
    pub fn add_pile(&mut self, row: i64, col: i64, nuggets: i32) {
        debug_assert!(nuggets > 0, "piles must hold at least one nugget");
        self.piles.push(Pile {
            row,
            col,
            nuggets,
            collected: false,
        });
    }

    /// True if any pile (collected or not) already occupies this cell.
    pub fn occupied(&self, row: i64, col: i64) -> bool {
        self.piles.iter().any(|p| p.row == row && p.col == col)
    }

    /// Marks the pile at (row, col) collected and returns its nugget count.
    /// Returns `None` if there is no pile there, or it was already collected.
    pub fn find_and_collect(&mut self, row: i64, col: i64) -> Option<i32> {
        let pile = self
            .piles
            .iter_mut()
            .find(|p| p.row == row && p.col == col && !p.collected)?;
        pile.collected = true;
        Some(pile.nuggets)
    }

    /// True if there is an uncollected pile at (row, col).
    pub fn has_uncollected(&self, row: i64, col: i64) -> bool {
        self.piles
            .iter()
            .any(|p| p.row == row && p.col == col && !p.collected)
    }

    pub fn len(&self) -> usize {
        self.piles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.piles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pile> {
        self.piles.iter()
    }

    /// Sum of nuggets across piles already collected.
    pub fn collected_nuggets(&self) -> i32 {
        self.piles
            .iter()
            .filter(|p| p.collected)
            .map(|p| p.nuggets)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_is_one_shot() {
        let mut gold = GoldSet::new();
        gold.add_pile(1, 1, 10);
        assert_eq!(gold.find_and_collect(1, 1), Some(10));
        assert_eq!(gold.find_and_collect(1, 1), None);
    }

    #[test]
    fn collect_on_absent_cell_is_none() {
        let mut gold = GoldSet::new();
        gold.add_pile(1, 1, 10);
        assert_eq!(gold.find_and_collect(2, 2), None);
    }

    #[test]
    fn occupied_checks_both_collected_and_live_piles() {
        let mut gold = GoldSet::new();
        gold.add_pile(3, 4, 5);
        assert!(gold.occupied(3, 4));
        gold.find_and_collect(3, 4);
        assert!(gold.occupied(3, 4));
        assert!(!gold.has_uncollected(3, 4));
    }
}
