//! Console chart model fed by poller updates.
//!
//! `ChartSeries` keeps the last few `(seconds since start, price)` points, enough
//! for a small live chart, and renders them as a one-line sparkline. It lives on
//! the display thread and only ever sees `SampleUpdate`s, never the buffer itself.
use std::collections::VecDeque;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::poller::SampleUpdate;

/// Points kept when none is configured.
pub const DEFAULT_CHART_POINTS: usize = 50;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartPoint {
    /// Whole seconds since the poller started.
    pub elapsed_secs: u64,
    /// Price at that time.
    pub price: Decimal,
}

/// Sliding window of chart points.
#[derive(Debug, Clone)]
pub struct ChartSeries {
    max_points: usize,
    points: VecDeque<ChartPoint>,
}

impl Default for ChartSeries {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_POINTS)
    }
}

impl ChartSeries {
    /// Series holding at most `max_points` points (at least one).
    pub fn new(max_points: usize) -> Self {
        let max_points = max_points.max(1);
        Self {
            max_points,
            points: VecDeque::with_capacity(max_points),
        }
    }

    /// Adds the point for `update`, dropping the oldest past the limit.
    pub fn push(&mut self, update: &SampleUpdate) -> ChartPoint {
        let point = ChartPoint {
            elapsed_secs: update.elapsed.as_secs(),
            price: update.sample.price(),
        };
        if self.points.len() >= self.max_points {
            self.points.pop_front();
        }
        self.points.push_back(point);
        point
    }

    /// Points, oldest first.
    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    /// Number of points held.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` before the first point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lowest and highest price in the window.
    pub fn range(&self) -> Option<(Decimal, Decimal)> {
        let mut prices = self.points.iter().map(|p| p.price);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Block-character sparkline scaled to the window's range.
    pub fn sparkline(&self) -> String {
        let Some((lo, hi)) = self.range() else {
            return String::new();
        };
        let span = hi - lo;
        let top = (BARS.len() - 1) as u32;
        self.points
            .iter()
            .map(|p| {
                if span.is_zero() {
                    return BARS[BARS.len() / 2];
                }
                let level = ((p.price - lo) / span * Decimal::from(top))
                    .round()
                    .to_u32()
                    .unwrap_or(0)
                    .min(top);
                BARS[level as usize]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sampler_common::Sample;
    use std::time::Duration;

    fn update(secs: u64, price: i64) -> SampleUpdate {
        SampleUpdate {
            sample: Sample::new(Utc.timestamp_opt(secs as i64, 0).unwrap(), Decimal::from(price)).unwrap(),
            elapsed: Duration::from_millis(secs * 1000 + 400),
        }
    }

    #[test]
    fn keeps_only_the_newest_points() {
        let mut series = ChartSeries::new(3);
        for (secs, price) in [(0, 10), (5, 11), (10, 12), (15, 13)] {
            series.push(&update(secs, price));
        }
        let elapsed: Vec<u64> = series.points().map(|p| p.elapsed_secs).collect();
        assert_eq!(elapsed, vec![5, 10, 15]);
        assert_eq!(series.range(), Some((Decimal::from(11), Decimal::from(13))));
    }

    #[test]
    fn sparkline_spans_lowest_to_highest() {
        let mut series = ChartSeries::default();
        for (i, price) in [100, 107, 103].into_iter().enumerate() {
            series.push(&update(i as u64, price));
        }
        assert_eq!(series.sparkline(), "▁█▄");
    }

    #[test]
    fn flat_series_renders_mid_bars() {
        let mut series = ChartSeries::new(4);
        series.push(&update(0, 5));
        series.push(&update(1, 5));
        assert_eq!(series.sparkline(), "▅▅");
        assert!(ChartSeries::new(0).sparkline().is_empty());
    }
}
