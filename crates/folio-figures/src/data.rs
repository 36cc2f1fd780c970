//! Input data model: tables, indexed series, matrices and training records.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use folio_common::{bail, FolioError, Result};
use serde::{Deserialize, Serialize};

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value; NaN counts as missing
    Number(f64),
    /// Free text
    Text(String),
    /// No value
    Missing,
}

impl Cell {
    /// Numeric coercion: numbers pass through, text is parsed after trimming,
    /// everything else (including NaN) is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if !v.is_nan() => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            _ => None,
        }
    }

    /// Text form used for category labels; `None` for missing cells.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Cell::Number(v) if v.is_nan() => None,
            Cell::Number(v) => Some(format_number(*v)),
            Cell::Text(s) => Some(s.clone()),
            Cell::Missing => None,
        }
    }

    /// True for [`Cell::Missing`] and NaN numbers
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Number(v) => v.is_nan(),
            Cell::Text(_) => false,
        }
    }

    fn from_field(field: &str) -> Self {
        if field.trim().is_empty() {
            Cell::Missing
        } else if let Ok(v) = field.trim().parse::<f64>() {
            Cell::Number(v)
        } else {
            Cell::Text(field.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Missing)
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column header
    pub name: String,
    /// Cells, one per row
    pub cells: Vec<Cell>,
}

/// Ordered collection of named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Columns in insertion order
    pub columns: Vec<Column>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column (builder style)
    pub fn with_column<C: Into<Cell>>(
        mut self,
        name: impl Into<String>,
        cells: impl IntoIterator<Item = C>,
    ) -> Self {
        self.columns.push(Column {
            name: name.into(),
            cells: cells.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// True when a column with this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Names of the requested columns that are not present
    pub fn missing_columns<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        names
            .iter()
            .copied()
            .filter(|n| !self.has_column(n))
            .collect()
    }

    /// Number of rows (length of the longest column)
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    /// Numerically coerced values of a column with missing entries dropped
    pub fn numeric(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)
            .map(|c| c.cells.iter().filter_map(Cell::as_number).collect())
    }

    /// Read a table from CSV with a header row.
    ///
    /// Empty fields become missing cells, parseable numbers become numbers
    /// and everything else is kept as text. Repeated header names are an
    /// error since only the first could be looked up.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|h| Column {
                name: h.trim().to_string(),
                cells: Vec::new(),
            })
            .collect();
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                bail!(FolioError::data(format!(
                    "duplicate CSV column '{}'",
                    column.name
                )));
            }
        }

        for record in rdr.records() {
            let record = record?;
            for (i, column) in columns.iter_mut().enumerate() {
                column
                    .cells
                    .push(record.get(i).map_or(Cell::Missing, Cell::from_field));
            }
        }

        tracing::debug!(
            "Read CSV table with {} columns and {} rows",
            columns.len(),
            columns.first().map_or(0, |c| c.cells.len())
        );
        Ok(Self { columns })
    }

    /// Read a table from a CSV file on disk
    pub fn from_csv_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            FolioError::data_with_source(format!("Cannot open {}", path.display()), e)
        })?;
        Self::from_csv_reader(file)
    }
}

/// Index attached to a [`Series`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesIndex {
    /// 0, 1, 2, ...
    #[default]
    Positional,
    /// Calendar dates
    Dates(Vec<NaiveDate>),
    /// Category labels
    Labels(Vec<String>),
}

/// Values with an index. NaN marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Index entries, parallel to `values`
    #[serde(default)]
    pub index: SeriesIndex,
    /// Values; `null` in serialized form
    #[serde(with = "nan_as_null")]
    pub values: Vec<f64>,
}

impl Series {
    /// Positionally indexed series
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            index: SeriesIndex::Positional,
            values,
        }
    }

    /// Date indexed series
    pub fn dated(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        Self {
            index: SeriesIndex::Dates(dates),
            values,
        }
    }

    /// Label indexed series
    pub fn labelled<S: Into<String>>(labels: impl IntoIterator<Item = S>, values: Vec<f64>) -> Self {
        Self {
            index: SeriesIndex::Labels(labels.into_iter().map(Into::into).collect()),
            values,
        }
    }

    /// Number of entries, missing ones included
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no entries at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values with missing entries dropped
    pub fn present(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| !v.is_nan()).collect()
    }

    /// x coordinate of entry `i`: the position, or days since the common
    /// era for date indexes.
    pub fn x_at(&self, i: usize) -> f64 {
        match &self.index {
            SeriesIndex::Dates(dates) => dates
                .get(i)
                .map_or(i as f64, |d| f64::from(chrono::Datelike::num_days_from_ce(d))),
            _ => i as f64,
        }
    }

    /// `(x, y)` for every entry; missing values yield `None` so callers can
    /// break lines there.
    pub fn points(&self) -> Vec<Option<(f64, f64)>> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (!v.is_nan()).then(|| (self.x_at(i), v)))
            .collect()
    }

    /// `(x, y)` for present entries only
    pub fn present_points(&self) -> Vec<(f64, f64)> {
        self.points().into_iter().flatten().collect()
    }

    /// Label of entry `i` for label indexes, else its position
    pub fn label_at(&self, i: usize) -> String {
        match &self.index {
            SeriesIndex::Labels(labels) => labels.get(i).cloned().unwrap_or_else(|| i.to_string()),
            SeriesIndex::Dates(dates) => dates
                .get(i)
                .map_or_else(|| i.to_string(), |d| d.format("%Y-%m-%d").to_string()),
            SeriesIndex::Positional => i.to_string(),
        }
    }

    /// True when the index holds dates
    pub fn is_dated(&self) -> bool {
        matches!(self.index, SeriesIndex::Dates(_))
    }
}

/// A series with a display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    /// Legend or panel name
    pub label: String,
    /// Data
    pub series: Series,
}

impl NamedSeries {
    /// Pair a label with a series
    pub fn new(label: impl Into<String>, series: Series) -> Self {
        Self {
            label: label.into(),
            series,
        }
    }
}

/// Labelled row-major matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    /// Row labels
    #[serde(default)]
    pub rows: Vec<String>,
    /// Column labels
    #[serde(default)]
    pub columns: Vec<String>,
    /// Values, one vector per row
    pub values: Vec<Vec<f64>>,
}

impl Matrix {
    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() || self.values.iter().all(Vec::is_empty)
    }

    /// `(rows, cols)` when every row has the same non-zero width
    pub fn shape(&self) -> Option<(usize, usize)> {
        let width = self.values.first()?.len();
        (width > 0 && self.values.iter().all(|r| r.len() == width))
            .then_some((self.values.len(), width))
    }

    /// Row label, falling back to the row number
    pub fn row_label(&self, i: usize) -> String {
        self.rows.get(i).cloned().unwrap_or_else(|| i.to_string())
    }

    /// Column label, falling back to the column number
    pub fn column_label(&self, j: usize) -> String {
        self.columns.get(j).cloned().unwrap_or_else(|| j.to_string())
    }

    /// Finite minimum and maximum
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let finite = self.values.iter().flatten().copied().filter(|v| v.is_finite());
        finite.fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Per-epoch metric record of a model fit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Metric name to per-epoch values
    pub metrics: BTreeMap<String, Vec<f64>>,
}

impl TrainingHistory {
    /// Build from `(name, values)` pairs
    pub fn from_metrics<S: Into<String>>(metrics: impl IntoIterator<Item = (S, Vec<f64>)>) -> Self {
        Self {
            metrics: metrics.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Training loss, if recorded
    pub fn loss(&self) -> Option<&[f64]> {
        self.metrics.get("loss").map(Vec::as_slice)
    }

    /// Validation loss, if recorded
    pub fn val_loss(&self) -> Option<&[f64]> {
        self.metrics.get("val_loss").map(Vec::as_slice)
    }
}

/// Components of a seasonal decomposition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Input series
    pub observed: Series,
    /// Trend component
    pub trend: Series,
    /// Seasonal component
    pub seasonal: Series,
    /// Remainder
    pub residual: Series,
}

/// Serializes NaN as `null` and reads `null` back as NaN.
pub(crate) mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let opts: Vec<Option<f64>> = values
            .iter()
            .map(|v| (!v.is_nan()).then_some(*v))
            .collect();
        opts.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let opts = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(opts.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
