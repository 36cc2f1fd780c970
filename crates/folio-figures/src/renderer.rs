//! FigureRenderer: draws chart requests, saves titled figures under a
//! slug of their title and hands every figure to a display sink.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_common::{ensure, slugify, FolioError, Result};
use folio_config::Config;
use plotters::style::RGBColor;
use tracing::{debug, error, info, warn};

use crate::display::{FigureDisplay, LogDisplay};
use crate::figure::{Figure, FigureLedger, FigureSize};
use crate::kinds::{Canvas, Drawn, Labels};
use crate::palette::{parse_color, ColorScheme};
use crate::theme::Theme;
use crate::types::{ChartRequest, RenderOutcome};

/// Resolution, default size and colours used for every figure
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Dots per inch of saved images
    pub dpi: u32,
    /// Size of kinds without a fixed size
    pub figure_size: FigureSize,
    /// Series colour cycle
    pub palette: ColorScheme,
    /// Figure background
    pub background: RGBColor,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            dpi: 300,
            figure_size: FigureSize::default(),
            palette: ColorScheme::default(),
            background: RGBColor(255, 255, 255),
        }
    }
}

impl RenderSettings {
    /// Plotting section of `config` as render settings
    pub fn from_config(config: &Config) -> Self {
        let plotting = &config.plotting;
        Self {
            dpi: plotting.dpi,
            figure_size: FigureSize::new(plotting.figure_width, plotting.figure_height),
            palette: ColorScheme::from_name(&plotting.palette, &plotting.custom_colors),
            background: parse_color(&plotting.background_color).unwrap_or(RGBColor(255, 255, 255)),
        }
    }

    /// Reject settings no figure can be drawn with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.dpi > 0,
            FolioError::validation_field("DPI must be positive", "dpi")
        );
        self.figure_size.validate()
    }
}

/// Renders charts into a fixed figures directory
pub struct FigureRenderer {
    figures_dir: PathBuf,
    settings: RenderSettings,
    theme: Theme,
    display: Box<dyn FigureDisplay>,
    ledger: Arc<FigureLedger>,
}

impl std::fmt::Debug for FigureRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FigureRenderer")
            .field("figures_dir", &self.figures_dir)
            .field("settings", &self.settings)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl FigureRenderer {
    /// Renderer writing to `figures_dir`, or to the configured figures
    /// directory when `None`. The directory is created if needed.
    pub fn new(figures_dir: Option<PathBuf>) -> Result<Self> {
        let config = folio_config::settings();
        let dir = figures_dir.unwrap_or_else(|| config.paths.figures_dir());
        Self::with_settings(Some(dir), RenderSettings::from_config(config), Box::new(LogDisplay))
    }

    /// Renderer with explicit settings and display sink
    pub fn with_settings(
        figures_dir: Option<PathBuf>,
        settings: RenderSettings,
        display: Box<dyn FigureDisplay>,
    ) -> Result<Self> {
        settings.validate()?;
        let figures_dir =
            figures_dir.unwrap_or_else(|| folio_config::settings().paths.figures_dir());

        if let Err(e) = std::fs::create_dir_all(&figures_dir) {
            error!(
                "Failed to create figures directory {}: {}",
                figures_dir.display(),
                e
            );
            return Err(FolioError::Io(e));
        }
        debug!("Figures directory ready at {}", figures_dir.display());

        let theme = Theme::new(settings.dpi, &settings.palette, settings.background);
        Ok(Self {
            figures_dir,
            settings,
            theme,
            display,
            ledger: Arc::new(FigureLedger::default()),
        })
    }

    /// Directory figures are saved to
    pub fn figures_dir(&self) -> &Path {
        &self.figures_dir
    }

    /// Active settings
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Figure acquisition counters
    pub fn ledger(&self) -> &FigureLedger {
        &self.ledger
    }

    /// Where a figure titled `title` is saved
    pub fn output_path(&self, title: &str) -> PathBuf {
        self.figures_dir.join(format!("{}.png", slugify(title)))
    }

    /// Draw `request`, save it when it has a title and display it.
    ///
    /// Unusable input is reported as [`RenderOutcome::Skipped`] and logged;
    /// only drawing, encoding and filesystem failures are errors. Exactly
    /// one figure is acquired and released per call.
    pub fn render(&self, request: &ChartRequest) -> Result<RenderOutcome> {
        let kind = request.chart.kind_name();
        let handler = request.chart.handler();
        let labels = handler.labels().resolve(request);
        let size = handler.figure_size(self.settings.figure_size);

        let mut figure = Figure::acquire(Arc::clone(&self.ledger), size, self.settings.dpi);
        figure.set_title(labels.title.clone());
        debug!(
            "Rendering {} chart on figure {} ({}x{} px)",
            kind,
            figure.id(),
            figure.pixel_size().0,
            figure.pixel_size().1
        );

        match handler.draw(Canvas::new(&mut figure, &self.theme, &labels))? {
            Drawn::Skipped(reason) => {
                warn!("Skipping {} chart: {}", kind, reason);
                Ok(RenderOutcome::Skipped { reason })
            }
            Drawn::Complete => self.finalize(&figure, &labels),
        }
    }

    /// Save when a file name is known, then display
    fn finalize(&self, figure: &Figure, labels: &Labels) -> Result<RenderOutcome> {
        let saved = match labels.file_stem.as_deref() {
            Some(stem) => {
                let path = self.output_path(stem);
                figure.save_png(&path, self.settings.dpi)?;
                info!("Figure saved to {}", path.display());
                Some(path)
            }
            None => None,
        };

        self.display.show(&figure.view(saved.as_deref()));
        Ok(RenderOutcome::Rendered { saved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;
    use folio_common::test_utils::create_temp_dir;

    #[test]
    fn test_output_path_uses_slug() {
        let dir = create_temp_dir();
        let renderer = FigureRenderer::with_settings(
            Some(dir.path().to_path_buf()),
            RenderSettings::default(),
            Box::new(NullDisplay),
        )
        .unwrap();
        assert_eq!(
            renderer.output_path("Revenue Growth (%)"),
            dir.path().join("revenue_growth.png")
        );
        assert_eq!(renderer.output_path("@@@"), dir.path().join("figure.png"));
    }

    #[test]
    fn test_creates_nested_directory() {
        let dir = create_temp_dir();
        let nested = dir.path().join("outputs").join("figures");
        let renderer = FigureRenderer::with_settings(
            Some(nested.clone()),
            RenderSettings::default(),
            Box::new(NullDisplay),
        )
        .unwrap();
        assert!(nested.is_dir());
        assert_eq!(renderer.figures_dir(), nested.as_path());
    }

    #[test]
    fn test_unwritable_directory_is_an_error() {
        let dir = create_temp_dir();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let result = FigureRenderer::with_settings(
            Some(blocker.join("figures")),
            RenderSettings::default(),
            Box::new(NullDisplay),
        );
        assert!(matches!(result, Err(FolioError::Io(_))));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let dir = create_temp_dir();
        let zero_dpi = RenderSettings {
            dpi: 0,
            ..RenderSettings::default()
        };
        let result =
            FigureRenderer::with_settings(Some(dir.path().join("a")), zero_dpi, Box::new(NullDisplay));
        assert!(matches!(
            result,
            Err(FolioError::Validation { field: Some(ref f), .. }) if f == "dpi"
        ));
        assert!(!dir.path().join("a").exists());

        let flat = RenderSettings {
            figure_size: FigureSize::new(10.0, f64::NAN),
            ..RenderSettings::default()
        };
        assert!(matches!(
            flat.validate(),
            Err(FolioError::Validation { field: Some(ref f), .. }) if f == "figure_height"
        ));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.plotting.dpi = 150;
        config.plotting.background_color = "#000000".into();
        let settings = RenderSettings::from_config(&config);
        assert_eq!(settings.dpi, 150);
        assert_eq!(settings.background, RGBColor(0, 0, 0));
        assert_eq!(settings.figure_size, FigureSize::new(10.0, 6.0));
    }
}
