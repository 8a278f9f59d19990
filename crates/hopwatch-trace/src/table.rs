use hopwatch_model::{HopRow, HopSample};
use std::collections::HashMap;

/// Hop rows keyed by hop number, kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct HopTable {
    rows: Vec<HopRow>,
    positions: HashMap<u32, usize>,
}

impl HopTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new row for an unseen hop number, otherwise overwrites the
    /// existing row in place. The host string plays no part in identity.
    pub fn merge(&mut self, sample: HopSample) {
        match self.positions.get(&sample.hop) {
            Some(&position) => self.rows[position].sample = sample,
            None => {
                let position = self.rows.len();
                self.positions.insert(sample.hop, position);
                self.rows.push(HopRow { position, sample });
            }
        }
    }

    pub fn reset(&mut self) {
        self.rows.clear();
        self.positions.clear();
    }

    pub fn snapshot(&self) -> Vec<HopRow> {
        self.rows.clone()
    }

    pub fn rows(&self) -> &[HopRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(hop: u32, host: &str, avg_ms: f64) -> HopSample {
        HopSample {
            hop,
            host: host.to_string(),
            loss_pct: 0.0,
            sent: 1,
            last_ms: avg_ms,
            avg_ms,
            best_ms: avg_ms,
            worst_ms: avg_ms,
            stdev_ms: 0.0,
        }
    }

    #[test]
    fn update_keeps_first_seen_position() {
        let mut table = HopTable::new();
        table.merge(sample(3, "10.0.0.3", 9.0));
        table.merge(sample(1, "10.0.0.1", 1.0));
        table.merge(sample(3, "10.0.0.33", 12.5));

        let rows = table.snapshot();
        let order: Vec<u32> = rows.iter().map(|row| row.sample.hop).collect();
        assert_eq!(order, vec![3, 1]);
        assert_eq!(rows[0].position, 0);
        assert_eq!(rows[0].sample.host, "10.0.0.33");
        assert_eq!(rows[0].sample.avg_ms, 12.5);
        assert_eq!(rows[1].position, 1);
    }

    #[test]
    fn reset_forgets_positions() {
        let mut table = HopTable::new();
        table.merge(sample(1, "10.0.0.1", 1.0));
        table.merge(sample(2, "10.0.0.2", 2.0));
        table.reset();
        assert!(table.is_empty());

        table.merge(sample(2, "10.0.0.2", 2.0));
        assert_eq!(table.rows()[0].sample.hop, 2);
        assert_eq!(table.rows()[0].position, 0);
    }

    proptest! {
        #[test]
        fn one_row_per_distinct_hop(hops in prop::collection::vec(1u32..30, 0..200)) {
            let mut table = HopTable::new();
            for (i, hop) in hops.iter().enumerate() {
                table.merge(sample(*hop, "???", i as f64));
            }

            let mut distinct = hops.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(table.len(), distinct.len());

            let mut first_seen = Vec::new();
            for hop in &hops {
                if !first_seen.contains(hop) {
                    first_seen.push(*hop);
                }
            }
            let order: Vec<u32> = table.rows().iter().map(|row| row.sample.hop).collect();
            prop_assert_eq!(order, first_seen);
        }
    }
}
