//! Prize ladder
//!
//! Fifteen levels, three of them fireproof checkpoints. Failing after a
//! checkpoint still pays out that checkpoint's prize.

use serde::Serialize;

/// Prizes for levels 0..=14
pub const DEFAULT_PRIZES: [u64; 15] = [
    100, 200, 300, 500, 1_000, 2_000, 4_000, 8_000, 16_000, 32_000, 64_000, 125_000, 250_000,
    500_000, 1_000_000,
];

/// Levels whose prize is kept even after a later wrong answer
pub const DEFAULT_FIREPROOF_LEVELS: [usize; 3] = [4, 9, 14];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeTable {
    prizes: Vec<u64>,
    fireproof: Vec<usize>,
}

impl Default for PrizeTable {
    fn default() -> Self {
        Self {
            prizes: DEFAULT_PRIZES.to_vec(),
            fireproof: DEFAULT_FIREPROOF_LEVELS.to_vec(),
        }
    }
}

impl PrizeTable {
    /// Build a custom ladder. Prizes must be strictly increasing and every
    /// fireproof level must exist in the ladder.
    pub fn new(prizes: Vec<u64>, mut fireproof: Vec<usize>) -> Result<Self, String> {
        if prizes.is_empty() {
            return Err("Prize table needs at least one level".to_string());
        }
        if prizes.windows(2).any(|w| w[0] >= w[1]) {
            return Err("Prizes must be strictly increasing by level".to_string());
        }
        if let Some(level) = fireproof.iter().find(|l| **l >= prizes.len()) {
            return Err(format!(
                "Fireproof level {} is outside the {}-level table",
                level,
                prizes.len()
            ));
        }
        fireproof.sort_unstable();
        fireproof.dedup();
        Ok(Self { prizes, fireproof })
    }

    /// Prize for clearing `level`, 0 for levels outside the ladder
    pub fn prize_at(&self, level: usize) -> u64 {
        self.prizes.get(level).copied().unwrap_or(0)
    }

    pub fn is_fireproof(&self, level: usize) -> bool {
        self.fireproof.binary_search(&level).is_ok()
    }

    pub fn max_level(&self) -> usize {
        self.prizes.len() - 1
    }

    pub fn grand_prize(&self) -> u64 {
        self.prize_at(self.max_level())
    }

    /// Guaranteed prize after failing. `answered` is the highest cleared
    /// level, `None` if nothing was cleared.
    pub fn fireproof_floor(&self, answered: Option<usize>) -> u64 {
        let Some(answered) = answered else {
            return 0;
        };
        self.fireproof
            .iter()
            .rev()
            .find(|level| **level <= answered)
            .map(|level| self.prize_at(*level))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ladder() {
        let table = PrizeTable::default();
        assert_eq!(table.max_level(), 14);
        assert_eq!(table.prize_at(0), 100);
        assert_eq!(table.prize_at(9), 32_000);
        assert_eq!(table.grand_prize(), 1_000_000);
        assert_eq!(table.prize_at(15), 0);
    }

    #[test]
    fn test_fireproof_levels() {
        let table = PrizeTable::default();
        assert!(table.is_fireproof(4));
        assert!(table.is_fireproof(9));
        assert!(table.is_fireproof(14));
        assert!(!table.is_fireproof(0));
        assert!(!table.is_fireproof(10));
    }

    #[test]
    fn test_fireproof_floor() {
        let table = PrizeTable::default();
        assert_eq!(table.fireproof_floor(None), 0);
        assert_eq!(table.fireproof_floor(Some(3)), 0);
        assert_eq!(table.fireproof_floor(Some(4)), 1_000);
        assert_eq!(table.fireproof_floor(Some(8)), 1_000);
        assert_eq!(table.fireproof_floor(Some(9)), 32_000);
        assert_eq!(table.fireproof_floor(Some(13)), 32_000);
    }

    #[test]
    fn test_custom_table_validation() {
        assert!(PrizeTable::new(vec![], vec![]).is_err());
        assert!(PrizeTable::new(vec![10, 10], vec![]).is_err());
        assert!(PrizeTable::new(vec![10, 20], vec![2]).is_err());

        let table = PrizeTable::new(vec![10, 20, 30], vec![2, 1, 1]).unwrap();
        assert_eq!(table.max_level(), 2);
        assert_eq!(table.fireproof_floor(Some(1)), 20);
        assert_eq!(table.grand_prize(), 30);
    }
}
