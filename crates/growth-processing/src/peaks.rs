//! Peak detection and peak-based row filtering

use crate::transform::{TableTransform, TransformKind, TransformTimer};
use growth_core::{empty_input, invalid_parameter, PrepError, PrepResult, RowKey, Table};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Suffix of peak indicator columns
pub const PEAK_SUFFIX: &str = "_pks";

/// Inclusive bounds; a missing side is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn validate(&self, parameter: &'static str) -> PrepResult<()> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(PrepError::InvalidParameter {
                    parameter,
                    reason: format!("bounds must be finite, got {}", bound),
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(PrepError::InvalidParameter {
                    parameter,
                    reason: format!("min {} exceeds max {}", min, max),
                });
            }
        }
        Ok(())
    }
}

/// Peak detection criteria, applied in field order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Bounds on the number of samples in a peak's flat top
    pub plateau_size: Option<ValueRange>,
    /// Bounds on the peak value
    pub height: Option<ValueRange>,
    /// Bounds on the vertical distance to both neighbouring samples
    pub threshold: Option<ValueRange>,
    /// Minimal horizontal distance between kept peaks, in samples
    pub distance: Option<usize>,
    /// Bounds on the peak prominence
    pub prominence: Option<ValueRange>,
    /// Window length limiting the prominence search
    pub wlen: Option<usize>,
}

impl PeakConfig {
    pub fn with_plateau_size(mut self, range: ValueRange) -> Self {
        self.plateau_size = Some(range);
        self
    }

    pub fn with_height(mut self, range: ValueRange) -> Self {
        self.height = Some(range);
        self
    }

    pub fn with_threshold(mut self, range: ValueRange) -> Self {
        self.threshold = Some(range);
        self
    }

    pub fn with_distance(mut self, distance: usize) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_prominence(mut self, range: ValueRange) -> Self {
        self.prominence = Some(range);
        self
    }

    pub fn with_wlen(mut self, wlen: usize) -> Self {
        self.wlen = Some(wlen);
        self
    }

    pub fn validate(&self) -> PrepResult<()> {
        if let Some(range) = &self.plateau_size {
            range.validate("plateau_size")?;
        }
        if let Some(range) = &self.height {
            range.validate("height")?;
        }
        if let Some(range) = &self.threshold {
            range.validate("threshold")?;
        }
        if let Some(range) = &self.prominence {
            range.validate("prominence")?;
        }
        if self.distance == Some(0) {
            return Err(invalid_parameter!("distance", "must be at least 1"));
        }
        if let Some(wlen) = self.wlen {
            if wlen < 3 {
                return Err(invalid_parameter!("wlen", "must be at least 3, got {}", wlen));
            }
        }
        Ok(())
    }
}

/// Positions of local maxima; flat tops report their middle sample
///
/// The first and last samples are never maxima.
pub fn local_maxima(series: &[f64]) -> Vec<usize> {
    local_plateaus(series).iter().map(Plateau::midpoint).collect()
}

/// Flat top of a local maximum, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plateau {
    left: usize,
    right: usize,
}

impl Plateau {
    fn midpoint(&self) -> usize {
        (self.left + self.right) / 2
    }

    fn size(&self) -> usize {
        self.right - self.left + 1
    }
}

fn local_plateaus(series: &[f64]) -> Vec<Plateau> {
    let n = series.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let last = n - 1;
    let mut i = 1;
    while i < last {
        if series[i - 1] < series[i] {
            let mut ahead = i + 1;
            while ahead < last && series[ahead] == series[i] {
                ahead += 1;
            }
            if series[ahead] < series[i] {
                peaks.push(Plateau {
                    left: i,
                    right: ahead - 1,
                });
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// Find peaks in one series, returning their positions in ascending order
pub fn find_peaks(series: &[f64], config: &PeakConfig) -> PrepResult<Vec<usize>> {
    config.validate()?;

    let mut plateaus = local_plateaus(series);
    if let Some(range) = &config.plateau_size {
        plateaus.retain(|p| range.contains(p.size() as f64));
    }
    let mut peaks: Vec<usize> = plateaus.iter().map(Plateau::midpoint).collect();

    if let Some(range) = &config.height {
        peaks.retain(|&p| range.contains(series[p]));
    }

    if let Some(range) = &config.threshold {
        peaks.retain(|&p| {
            let left = series[p] - series[p - 1];
            let right = series[p] - series[p + 1];
            range.contains(left.min(right)) && range.contains(left.max(right))
        });
    }

    if let Some(distance) = config.distance {
        peaks = select_by_distance(&peaks, series, distance);
    }

    if let Some(range) = &config.prominence {
        let prominences = peak_prominences(series, &peaks, config.wlen)?;
        peaks = peaks
            .into_iter()
            .zip(prominences)
            .filter(|(_, prominence)| range.contains(*prominence))
            .map(|(p, _)| p)
            .collect();
    }

    Ok(peaks)
}

/// Drop peaks closer than `distance` to a higher peak
fn select_by_distance(peaks: &[usize], series: &[f64], distance: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| series[peaks[a]].total_cmp(&series[peaks[b]]));

    let mut keep = vec![true; peaks.len()];
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if peaks[k] - peaks[j] >= distance {
                break;
            }
            keep[k] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter(|(_, kept)| *kept)
        .map(|(&p, _)| p)
        .collect()
}

/// Prominence of each peak
///
/// From the peak, the search extends to each side until a strictly higher
/// sample or the `wlen` window bound; the base is the higher of the two side
/// minima.
pub fn peak_prominences(series: &[f64], peaks: &[usize], wlen: Option<usize>) -> PrepResult<Vec<f64>> {
    let n = series.len();
    if let Some(&peak) = peaks.iter().find(|&&p| p >= n) {
        return Err(invalid_parameter!(
            "peaks",
            "position {} out of range for series of length {}",
            peak,
            n
        ));
    }

    Ok(peaks
        .iter()
        .map(|&peak| {
            let height = series[peak];
            let (lo, hi) = match wlen {
                Some(w) => (peak.saturating_sub(w / 2), (peak + w / 2).min(n - 1)),
                None => (0, n - 1),
            };

            let left_min = series[lo..=peak]
                .iter()
                .rev()
                .take_while(|&&v| v <= height)
                .fold(height, |acc, &v| acc.min(v));
            let right_min = series[peak..=hi]
                .iter()
                .take_while(|&&v| v <= height)
                .fold(height, |acc, &v| acc.min(v));

            height - left_min.max(right_min)
        })
        .collect())
}

/// Per-column peak flags aligned to a table's rows
#[derive(Debug, Clone, PartialEq)]
pub struct PeakIndicators {
    row_keys: Vec<RowKey>,
    columns: Vec<(String, Vec<bool>)>,
}

impl PeakIndicators {
    pub fn row_keys(&self) -> &[RowKey] {
        &self.row_keys
    }

    /// Indicator column names (`<name>_pks`)
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[bool]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, flags)| flags.as_slice())
    }

    /// Rows flagged by at least one column
    pub fn any_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.row_keys.len()];
        for (_, flags) in &self.columns {
            for (m, &flag) in mask.iter_mut().zip(flags) {
                *m |= flag;
            }
        }
        mask
    }

    /// Total number of flagged (column, row) pairs
    pub fn peak_count(&self) -> usize {
        self.columns
            .iter()
            .map(|(_, flags)| flags.iter().filter(|&&f| f).count())
            .sum()
    }
}

/// Detect peaks in every column
///
/// Peaks are keyed by position from the first row, never by row-key value,
/// so tables with label or non-contiguous keys align the same way.
pub fn peak_indicators(table: &Table, config: &PeakConfig) -> PrepResult<PeakIndicators> {
    if table.n_columns() == 0 {
        return Err(empty_input!("table has no columns to search for peaks"));
    }
    config.validate()?;

    let mut columns = Vec::with_capacity(table.n_columns());
    for column in table.columns() {
        let peaks = find_peaks(&column.values, config)?;
        trace!(column = %column.name, peaks = peaks.len(), "detected peaks");

        let mut flags = vec![false; table.n_rows()];
        for p in peaks {
            flags[p] = true;
        }
        columns.push((format!("{}{}", column.name, PEAK_SUFFIX), flags));
    }

    Ok(PeakIndicators {
        row_keys: table.row_keys().to_vec(),
        columns,
    })
}

/// Keep the rows where at least one column has a peak
///
/// Output columns and values are the input's, unmodified. No peaks anywhere
/// gives a table with zero rows.
pub fn filter_peaks(table: &Table, config: &PeakConfig) -> PrepResult<Table> {
    let timer = TransformTimer::start("filter_peaks");

    debug!(
        rows = table.n_rows(),
        columns = table.n_columns(),
        ?config,
        "filtering rows by peaks"
    );

    let indicators = peak_indicators(table, config)?;
    let mask = indicators.any_mask();
    if !mask.iter().any(|&m| m) {
        warn!("no peaks detected in any column");
    }

    let output = table.filter_rows(&mask)?;
    timer.finish(&output);
    Ok(output)
}

/// [`TableTransform`] wrapper around [`filter_peaks`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakFilter {
    config: PeakConfig,
}

impl PeakFilter {
    pub fn new(config: PeakConfig) -> PrepResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PeakConfig {
        &self.config
    }
}

impl TableTransform for PeakFilter {
    fn apply(&self, input: &Table) -> PrepResult<Table> {
        filter_peaks(input, &self.config)
    }

    fn name(&self) -> &str {
        "Peak Row Filter"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::PeakFilter
    }
}
