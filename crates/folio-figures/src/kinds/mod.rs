//! One handler per chart kind

pub mod categorical;
pub mod distribution;
pub mod evaluation;
pub mod matrix;
pub mod series;

use folio_common::{layout, Result};

use crate::figure::{Area, Figure, FigureSize};
use crate::theme::Theme;
use crate::types::ChartRequest;

/// Title, axis descriptions and file stem for one figure
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Labels {
    pub title: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
    /// Name the figure is saved under when it differs from the title
    pub file_stem: Option<String>,
}

impl Labels {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn untitled() -> Self {
        Self::default()
    }

    pub fn x(mut self, x: impl Into<String>) -> Self {
        self.x = Some(x.into());
        self
    }

    pub fn y(mut self, y: impl Into<String>) -> Self {
        self.y = Some(y.into());
        self
    }

    pub fn saved_as(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = Some(stem.into());
        self
    }

    /// Apply the caller's overrides. An explicit title also names the file.
    pub fn resolve(self, request: &ChartRequest) -> Self {
        let non_empty = |s: &Option<String>| s.clone().filter(|s| !s.is_empty());
        let title = non_empty(&request.title).or(self.title.filter(|t| !t.is_empty()));
        let file_stem = non_empty(&request.title)
            .or(self.file_stem)
            .or_else(|| title.clone());

        Self {
            title,
            x: request.x_label.clone().or(self.x),
            y: request.y_label.clone().or(self.y),
            file_stem,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn x_label(&self) -> Option<&str> {
        self.x.as_deref()
    }

    pub fn y_label(&self) -> Option<&str> {
        self.y.as_deref()
    }
}

/// Result of a handler's draw step
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Drawn {
    Complete,
    Skipped(String),
}

/// The figure a handler draws on, with its theme and resolved labels
pub(crate) struct Canvas<'f> {
    figure: &'f mut Figure,
    theme: &'f Theme,
    labels: &'f Labels,
}

impl<'f> Canvas<'f> {
    pub fn new(figure: &'f mut Figure, theme: &'f Theme, labels: &'f Labels) -> Self {
        Self {
            figure,
            theme,
            labels,
        }
    }

    pub fn labels(&self) -> &Labels {
        self.labels
    }

    /// Report unusable input without drawing anything
    pub fn skip(self, reason: impl Into<String>) -> Result<Drawn> {
        Ok(Drawn::Skipped(reason.into()))
    }

    /// Record sub-panel captions for display sinks
    pub fn panel_titles(self, titles: Vec<String>) -> Self {
        self.figure.set_panel_titles(titles);
        self
    }

    /// Draw onto the figure
    pub fn paint<F>(self, paint: F) -> Result<Drawn>
    where
        F: FnOnce(&Area<'_>, &Theme, &Labels) -> Result<()>,
    {
        let (theme, labels) = (self.theme, self.labels);
        self.figure
            .draw(theme.background, |root| paint(root, theme, labels))?;
        Ok(Drawn::Complete)
    }
}

/// Validates input for one chart kind and draws it
pub(crate) trait ChartHandler {
    /// Default title and axis descriptions
    fn labels(&self) -> Labels;

    /// Figure size in inches
    fn figure_size(&self, default: FigureSize) -> FigureSize {
        default
    }

    /// Draw, or explain why nothing can be drawn
    fn draw(&self, canvas: Canvas<'_>) -> Result<Drawn>;
}

/// Split `root` into a captioned grid of `n` panels, `cols` wide.
///
/// Cells past `n` in the last row are returned too; callers ignore them.
pub(crate) fn panel_grid<'b>(
    root: &Area<'b>,
    theme: &Theme,
    caption: Option<&str>,
    n: usize,
    cols: usize,
) -> Result<Vec<Area<'b>>> {
    let body = match caption.filter(|_| theme.text) {
        Some(caption) => root.titled(caption, theme.font(16.0))?,
        None => root.clone(),
    };
    let (rows, cols) = layout(n, cols);
    tracing::debug!("Panel grid of {} rows x {} cols for {} panels", rows, cols, n);
    Ok(body.split_evenly((rows.max(1), cols)))
}
