use itertools::{Itertools, MinMaxResult};

/// Smallest and largest value, or `None` for empty input.
pub fn min_max(values: impl IntoIterator<Item = usize>) -> Option<(usize, usize)> {
    match values.into_iter().minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

/// Maps `count` from `[min, max]` onto the visual weight range `[1, 5]`.
///
/// When every count is equal there is no range to scale over and the weight
/// is 1.
pub fn scale_weight(count: usize, min: usize, max: usize) -> f64 {
    if max <= min {
        return 1.0;
    }
    1.0 + 4.0 * (count - min) as f64 / (max - min) as f64
}
