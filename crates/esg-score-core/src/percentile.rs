/// Share of `population` strictly below `score`, as a rounded percentage.
///
/// Ties are not counted as below. Non-finite entries are ignored; an empty
/// population ranks every score at the median, 50.
pub fn percentile(score: f64, population: &[f64]) -> f64 {
    let (below, total) = population
        .iter()
        .filter(|p| p.is_finite())
        .fold((0_usize, 0_usize), |(below, total), p| {
            (below + usize::from(*p < score), total + 1)
        });

    if total == 0 {
        return 50.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let share = below as f64 / total as f64;
    (share * 100.0).round()
}
