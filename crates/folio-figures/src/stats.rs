//! Statistics behind the chart kinds: binning, kernel density, box summaries,
//! classifier evaluation and autocorrelation.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Arithmetic mean; `None` for empty input
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); `None` below two values
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Finite minimum and maximum of the input
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Equal-width bins over the data range
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` edges
    pub edges: Vec<f64>,
    /// Count per bin
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Width of each bin
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 1.0,
        }
    }

    /// Largest bin count
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Bin values into `bins` equal-width bins. The last bin is closed on the
/// right; a zero-width range is widened by 0.5 on each side.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    let bins = bins.max(1);
    let (mut lo, mut hi) = extent(values.iter().copied())?;
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for v in values.iter().filter(|v| v.is_finite()) {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Some(Histogram { edges, counts })
}

/// Gaussian kernel density estimate
#[derive(Debug, Clone)]
pub struct Kde {
    samples: Vec<f64>,
    bandwidth: f64,
}

/// Extra support beyond the data, in bandwidths
const KDE_CUT: f64 = 3.0;

impl Kde {
    /// Fit with Scott's rule scaled by `bw_adjust`. Returns `None` when the
    /// data has fewer than two points or no spread.
    pub fn fit(values: &[f64], bw_adjust: f64) -> Option<Self> {
        let samples: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let sd = std_dev(&samples)?;
        let scott = (samples.len() as f64).powf(-0.2);
        let bandwidth = sd * scott * bw_adjust;
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return None;
        }
        Some(Self { samples, bandwidth })
    }

    /// Kernel bandwidth
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Density at `x`; integrates to one
    pub fn density(&self, x: f64) -> f64 {
        let norm = 1.0 / ((2.0 * PI).sqrt() * self.bandwidth * self.samples.len() as f64);
        self.samples
            .iter()
            .map(|s| {
                let z = (x - s) / self.bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum::<f64>()
            * norm
    }

    /// Evaluation range: data extent padded by three bandwidths
    pub fn support(&self) -> (f64, f64) {
        let (lo, hi) = extent(self.samples.iter().copied()).unwrap_or((0.0, 0.0));
        (lo - KDE_CUT * self.bandwidth, hi + KDE_CUT * self.bandwidth)
    }

    /// Density sampled on `points` evenly spaced x values over `range`
    pub fn curve(&self, range: (f64, f64), points: usize) -> Vec<(f64, f64)> {
        let points = points.max(2);
        let step = (range.1 - range.0) / (points - 1) as f64;
        (0..points)
            .map(|i| {
                let x = range.0 + step * i as f64;
                (x, self.density(x))
            })
            .collect()
    }
}

/// Linear-interpolated quantile of sorted data, `q` in `[0, 1]`
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Tukey box summary
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    /// First quartile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    /// Smallest value within 1.5 IQR of `q1`
    pub whisker_low: f64,
    /// Largest value within 1.5 IQR of `q3`
    pub whisker_high: f64,
    /// Values outside the whiskers
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    /// Summarise finite values; `None` when there are none
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = || sorted.iter().copied().filter(|v| (low_fence..=high_fence).contains(v));
        let whisker_low = inside().next().unwrap_or(q1);
        let whisker_high = inside().last().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| !(low_fence..=high_fence).contains(v))
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Lowest and highest drawn value
    pub fn span(&self) -> (f64, f64) {
        let lo = self.outliers.iter().copied().fold(self.whisker_low, f64::min);
        let hi = self.outliers.iter().copied().fold(self.whisker_high, f64::max);
        (lo, hi)
    }
}

/// Receiver operating characteristic
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    /// False positive rates, starting at 0
    pub fpr: Vec<f64>,
    /// True positive rates, starting at 0
    pub tpr: Vec<f64>,
    /// Area under the curve
    pub auc: f64,
}

/// Why a ROC curve could not be computed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RocInputError {
    /// Labels and scores differ in length
    #[error("{labels} labels but {scores} scores")]
    LengthMismatch {
        /// Label count
        labels: usize,
        /// Score count
        scores: usize,
    },
    /// Nothing to evaluate
    #[error("no labels or scores")]
    Empty,
    /// Labels must contain exactly two classes
    #[error("expected two classes, found {0}")]
    NotBinary(usize),
}

/// ROC curve over binary labels; the larger label is the positive class.
///
/// Thresholds are the distinct scores in descending order. Collinear
/// intermediate points are dropped and `(0, 0)` is prepended.
pub fn roc_curve(labels: &[i64], scores: &[f64]) -> Result<RocCurve, RocInputError> {
    if labels.len() != scores.len() {
        return Err(RocInputError::LengthMismatch {
            labels: labels.len(),
            scores: scores.len(),
        });
    }
    if labels.is_empty() {
        return Err(RocInputError::Empty);
    }

    let mut classes: Vec<i64> = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    if classes.len() != 2 {
        return Err(RocInputError::NotBinary(classes.len()));
    }
    let positive = classes[1];

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // Cumulative counts at each distinct threshold.
    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);
    for (k, &i) in order.iter().enumerate() {
        if labels[i] == positive {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_threshold = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_threshold {
            tps.push(tp);
            fps.push(fp);
        }
    }

    let keep: Vec<usize> = if tps.len() > 2 {
        (0..tps.len())
            .filter(|&k| {
                k == 0
                    || k == tps.len() - 1
                    || fps[k - 1] - 2.0 * fps[k] + fps[k + 1] != 0.0
                    || tps[k - 1] - 2.0 * tps[k] + tps[k + 1] != 0.0
            })
            .collect()
    } else {
        (0..tps.len()).collect()
    };

    let total_fp = fp;
    let total_tp = tp;
    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    for k in keep {
        fpr.push(fps[k] / total_fp);
        tpr.push(tps[k] / total_tp);
    }

    let auc = trapezoid(&fpr, &tpr);
    Ok(RocCurve { fpr, tpr, auc })
}

/// Trapezoidal integral of `y` over `x`
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Class label for confusion matrices. Integers sort before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    /// Integer class
    Int(i64),
    /// Named class
    Text(String),
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ClassLabel {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ClassLabel {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Counts of (true, predicted) pairs over the sorted union of labels
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionCounts {
    /// Row and column labels
    pub labels: Vec<ClassLabel>,
    /// `counts[true][predicted]`
    pub counts: Vec<Vec<u64>>,
}

/// Count label pairs. Callers check that the inputs are non-empty and of
/// equal length.
pub fn confusion_counts(truth: &[ClassLabel], predicted: &[ClassLabel]) -> ConfusionCounts {
    let mut labels: Vec<ClassLabel> = truth.iter().chain(predicted).cloned().collect();
    labels.sort();
    labels.dedup();

    let mut counts = vec![vec![0u64; labels.len()]; labels.len()];
    for (t, p) in truth.iter().zip(predicted) {
        if let (Ok(i), Ok(j)) = (labels.binary_search(t), labels.binary_search(p)) {
            counts[i][j] += 1;
        }
    }

    ConfusionCounts { labels, counts }
}

/// Sample autocorrelation for lags `0..=nlags` (biased estimator).
///
/// `None` when the series is shorter than two values or constant.
pub fn acf(values: &[f64], nlags: usize) -> Option<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let centred: Vec<f64> = values.iter().map(|v| v - m).collect();
    let c0: f64 = centred.iter().map(|v| v * v).sum();
    if c0 <= f64::EPSILON {
        return None;
    }

    let nlags = nlags.min(n - 1);
    Some(
        (0..=nlags)
            .map(|k| {
                centred[..n - k]
                    .iter()
                    .zip(&centred[k..])
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
                    / c0
            })
            .collect(),
    )
}

/// 95% half-widths of the Bartlett band for each ACF lag (lag 0 is zero)
pub fn bartlett_band(acf: &[f64], n: usize) -> Vec<f64> {
    let n = n.max(1) as f64;
    let mut band = Vec::with_capacity(acf.len());
    let mut cumulative = 0.0;
    for (k, r) in acf.iter().enumerate() {
        if k == 0 {
            band.push(0.0);
            continue;
        }
        band.push(1.96 * ((1.0 + 2.0 * cumulative) / n).sqrt());
        cumulative += r * r;
    }
    band
}

/// Partial autocorrelation via Levinson–Durbin on the biased ACF.
///
/// Lags are capped below `n / 2`; lag 0 is always 1.
pub fn pacf(values: &[f64], nlags: usize) -> Option<Vec<f64>> {
    let cap = (values.len() / 2).saturating_sub(1);
    let nlags = nlags.min(cap);
    let r = acf(values, nlags)?;
    Some(levinson_durbin(&r))
}

/// Partial autocorrelations from autocorrelations `r` (with `r[0] == 1`)
fn levinson_durbin(r: &[f64]) -> Vec<f64> {
    let mut out = vec![1.0];
    let mut phi: Vec<f64> = Vec::new();
    for k in 1..r.len() {
        let num = r[k] - (1..k).map(|j| phi[j - 1] * r[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi[j - 1] * r[j]).sum::<f64>();
        let kk = if den.abs() < f64::EPSILON { 0.0 } else { num / den };

        let mut next: Vec<f64> = (1..k).map(|j| phi[j - 1] - kk * phi[k - j - 1]).collect();
        next.push(kk);
        phi = next;
        out.push(kk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_common::test_utils::assert_approx_eq;

    #[test]
    fn test_histogram_bins() {
        let h = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(h.edges.len(), 5);
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
        assert_approx_eq(h.bin_width(), 1.0, 1e-12);

        let flat = histogram(&[2.0, 2.0], 10).unwrap();
        assert_eq!(flat.counts.iter().sum::<usize>(), 2);
        assert!(histogram(&[], 10).is_none());
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 7.0];
        let kde = Kde::fit(&values, 1.0).unwrap();
        let (lo, hi) = kde.support();
        let curve = kde.curve((lo, hi), 400);
        let xs: Vec<f64> = curve.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = curve.iter().map(|p| p.1).collect();
        assert_approx_eq(trapezoid(&xs, &ys), 1.0, 1e-2);

        assert!(Kde::fit(&[3.0, 3.0, 3.0], 1.0).is_none());
        let narrow = Kde::fit(&values, 0.5).unwrap();
        assert_approx_eq(narrow.bandwidth() * 2.0, kde.bandwidth(), 1e-12);
    }

    #[test]
    fn test_box_summary() {
        let s = BoxSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_approx_eq(s.median, 3.5, 1e-12);
        assert_approx_eq(s.q1, 2.25, 1e-12);
        assert_approx_eq(s.q3, 4.75, 1e-12);
        assert_eq!(s.outliers, vec![100.0]);
        assert_eq!(s.whisker_high, 5.0);
        assert_eq!(s.span(), (1.0, 100.0));
    }

    #[test]
    fn test_roc_perfect_separation() {
        let roc = roc_curve(&[0, 1, 1, 0], &[0.1, 0.9, 0.8, 0.2]).unwrap();
        assert_approx_eq(roc.auc, 1.0, 1e-12);
        assert_eq!(roc.fpr.first(), Some(&0.0));
        assert_eq!(roc.fpr.last(), Some(&1.0));
        assert_eq!(roc.tpr.last(), Some(&1.0));
    }

    #[test]
    fn test_roc_partial_overlap() {
        // Matches the classic four-sample example: AUC 0.75.
        let roc = roc_curve(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert_approx_eq(roc.auc, 0.75, 1e-12);
    }

    #[test]
    fn test_roc_rejects_bad_input() {
        assert_eq!(
            roc_curve(&[0, 1], &[0.5]),
            Err(RocInputError::LengthMismatch { labels: 2, scores: 1 })
        );
        assert_eq!(roc_curve(&[], &[]), Err(RocInputError::Empty));
        assert_eq!(roc_curve(&[1, 1], &[0.2, 0.4]), Err(RocInputError::NotBinary(1)));
    }

    #[test]
    fn test_confusion_counts() {
        let t: Vec<ClassLabel> = [0, 1, 2, 2, 1].into_iter().map(ClassLabel::from).collect();
        let p: Vec<ClassLabel> = [0, 2, 2, 1, 1].into_iter().map(ClassLabel::from).collect();
        let cm = confusion_counts(&t, &p);
        assert_eq!(cm.labels.len(), 3);
        assert_eq!(cm.counts, vec![vec![1, 0, 0], vec![0, 1, 1], vec![0, 1, 1]]);
    }

    #[test]
    fn test_acf_and_band() {
        let values: Vec<f64> = (0..50).map(|i| (i as f64 * 0.5).sin()).collect();
        let r = acf(&values, 10).unwrap();
        assert_eq!(r.len(), 11);
        assert_approx_eq(r[0], 1.0, 1e-12);
        assert!(r.iter().all(|v| v.abs() <= 1.0 + 1e-12));

        let band = bartlett_band(&r, values.len());
        assert_eq!(band[0], 0.0);
        assert_approx_eq(band[1], 1.96 / (50f64).sqrt(), 1e-12);
        assert!(band.windows(2).skip(1).all(|w| w[1] >= w[0]));

        assert!(acf(&[1.0, 1.0, 1.0], 2).is_none());
        assert!(acf(&[1.0], 2).is_none());
    }

    #[test]
    fn test_levinson_durbin_reference() {
        let p = levinson_durbin(&[1.0, 0.5, 0.25]);
        assert_eq!(p.len(), 3);
        assert_approx_eq(p[0], 1.0, 1e-12);
        assert_approx_eq(p[1], 0.5, 1e-12);
        assert_approx_eq(p[2], 0.0, 1e-12);
    }

    /// Uniform noise in [-0.5, 0.5) from a fixed-seed LCG
    fn white_noise(n: usize) -> Vec<f64> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
            })
            .collect()
    }

    #[test]
    fn test_pacf_ar1() {
        // AR(1) with phi = 0.8: PACF at lag 1 near 0.8, later lags near zero.
        let noise = white_noise(600);
        let mut values = vec![0.0f64];
        for e in &noise[1..] {
            let prev = values[values.len() - 1];
            values.push(0.8 * prev + e);
        }
        let values = &values[100..];

        let p = pacf(values, 5).unwrap();
        assert_eq!(p.len(), 6);
        assert!((p[1] - 0.8).abs() < 0.1, "lag 1 was {}", p[1]);
        assert!(p[3].abs() < 0.2, "lag 3 was {}", p[3]);

        let capped = pacf(&values[..10], 50).unwrap();
        assert_eq!(capped.len(), 5);
    }
}
