use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{Rating, MAX_RATING, MIN_RATING};

/// 评分直方图，固定 5 个桶 (1..=5)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingDistribution([u64; 5]);

impl RatingDistribution {
    pub fn record(&mut self, rating: Rating, count: u64) {
        self.0[(rating.value() - MIN_RATING) as usize] += count;
    }

    pub fn get(&self, rating: u8) -> u64 {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return 0;
        }
        self.0[(rating - MIN_RATING) as usize]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

// JSON 形如 {"1":0,"2":0,"3":1,"4":1,"5":2}
impl Serialize for RatingDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, count) in self.0.iter().enumerate() {
            map.serialize_entry(&(i as u8 + MIN_RATING).to_string(), count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RatingSummary {
    pub average: f64,
    pub total: u64,
    pub distribution: RatingDistribution,
}

impl RatingSummary {
    /// Builds the summary from `(rating, count)` buckets as grouped by the store.
    ///
    /// Returns `None` when there is nothing to aggregate. Buckets outside 1..=5
    /// are dropped from every figure.
    pub fn from_counts<I>(buckets: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        let mut distribution = RatingDistribution::default();
        let mut sum: u64 = 0;
        for (rating, count) in buckets {
            let Ok(rating) = Rating::new(rating) else {
                continue;
            };
            let count = u64::try_from(count).unwrap_or(0);
            distribution.record(rating, count);
            sum += rating.value() as u64 * count;
        }

        let total = distribution.total();
        if total == 0 {
            return None;
        }

        Some(Self {
            average: round2(sum as f64 / total as f64),
            total,
            distribution,
        })
    }

    pub fn from_ratings<I>(ratings: I) -> Option<Self>
    where
        I: IntoIterator<Item = Rating>,
    {
        Self::from_counts(ratings.into_iter().map(|r| (r.value() as i64, 1)))
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(values: &[i64]) -> Vec<Rating> {
        values.iter().map(|v| Rating::new(*v).unwrap()).collect()
    }

    #[test]
    fn test_summary_of_mixed_ratings() {
        let s = RatingSummary::from_ratings(ratings(&[5, 5, 4, 3, 1])).unwrap();
        assert_eq!(s.average, 3.6);
        assert_eq!(s.total, 5);
        assert_eq!(s.distribution.get(1), 1);
        assert_eq!(s.distribution.get(2), 0);
        assert_eq!(s.distribution.get(3), 1);
        assert_eq!(s.distribution.get(4), 1);
        assert_eq!(s.distribution.get(5), 2);
    }

    #[test]
    fn test_empty_is_none() {
        assert!(RatingSummary::from_ratings(Vec::new()).is_none());
        assert!(RatingSummary::from_counts(vec![(3, 0)]).is_none());
    }

    #[test]
    fn test_average_rounds_to_two_places() {
        let s = RatingSummary::from_ratings(ratings(&[5, 4, 4])).unwrap();
        assert_eq!(s.average, 4.33);
        let s = RatingSummary::from_ratings(ratings(&[1, 2])).unwrap();
        assert_eq!(s.average, 1.5);
    }

    #[test]
    fn test_from_grouped_counts_skips_out_of_range() {
        let s = RatingSummary::from_counts(vec![(5, 2), (1, 1), (9, 4), (0, 3)]).unwrap();
        assert_eq!(s.total, 3);
        assert_eq!(s.average, 3.67);
    }

    #[test]
    fn test_distribution_serializes_all_buckets() {
        let s = RatingSummary::from_ratings(ratings(&[5, 5, 4, 3, 1])).unwrap();
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(
            v["distribution"],
            serde_json::json!({"1": 1, "2": 0, "3": 1, "4": 1, "5": 2})
        );
        assert_eq!(v["average"], 3.6);
        assert_eq!(v["total"], 5);
    }
}
