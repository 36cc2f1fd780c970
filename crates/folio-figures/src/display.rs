//! Display sinks that receive every finished figure

use tracing::info;

use crate::figure::FigureView;

/// Receives each finished figure once, whether or not it was saved
pub trait FigureDisplay: Send + Sync {
    /// Show the figure
    fn show(&self, view: &FigureView<'_>);
}

/// Logs a one-line summary of each figure
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

impl FigureDisplay for LogDisplay {
    fn show(&self, view: &FigureView<'_>) {
        let title = view.title.unwrap_or("(untitled)");
        match view.saved {
            Some(path) => info!(
                "Figure '{}' ({}x{} px, {} panels) saved to {}",
                title,
                view.width,
                view.height,
                view.panel_titles.len().max(1),
                path.display()
            ),
            None => info!(
                "Figure '{}' ({}x{} px, {} panels) displayed without saving",
                title,
                view.width,
                view.height,
                view.panel_titles.len().max(1)
            ),
        }
    }
}

/// Discards figures
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl FigureDisplay for NullDisplay {
    fn show(&self, _view: &FigureView<'_>) {}
}
