use crate::error::DrawingError;
use crate::layout::{DrawingLayout, SignBox, compute_layout, place_way_signs};
use crate::render::{composite_onto_saved, render_svg, write_output_svg};
use crate::settings::DrawSettings;
use crate::tagging::Example;
use crate::traffic_sign::IconLibrary;
use crate::way::{CrossSection, Way};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_SVG_DIR: &str = "svg";

/// Hands out `default<N>.svg` names for drawings that have no example name.
/// One namer lives for one batch run.
#[derive(Debug, Clone)]
pub struct FileNamer {
    dir: String,
    counter: usize,
}

impl FileNamer {
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            counter: 0,
        }
    }

    pub fn next_default(&mut self) -> String {
        let name = format!("default{}.svg", self.counter);
        self.counter += 1;
        name
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }
}

impl Default for FileNamer {
    fn default() -> Self {
        Self::new(DEFAULT_SVG_DIR)
    }
}

/// File name for an example: spaces become underscores, path separators too.
pub fn example_file_name(example_name: &str) -> String {
    let stem: String = example_name
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    format!("{stem}.svg")
}

#[derive(Debug)]
enum DrawingState {
    Empty,
    Populated,
    Rendered { layout: DrawingLayout, svg: String },
    Saved { layout: DrawingLayout },
}

impl DrawingState {
    fn label(&self) -> &'static str {
        match self {
            DrawingState::Empty => "empty",
            DrawingState::Populated => "populated",
            DrawingState::Rendered { .. } => "rendered",
            DrawingState::Saved { .. } => "saved",
        }
    }
}

/// Collects ways, lays them out, and writes them as one svg file.
///
/// Goes empty -> populated -> rendered -> saved; calling a step out of order
/// returns [`DrawingError::InvalidState`].
#[derive(Debug)]
pub struct Drawing {
    ways: Vec<Way>,
    dir: String,
    file_name: String,
    example_name: Option<String>,
    state: DrawingState,
}

impl Drawing {
    pub fn new(namer: &mut FileNamer) -> Self {
        let file_name = namer.next_default();
        Self::with_file_name(namer.dir(), file_name)
    }

    pub fn with_file_name(dir: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            ways: Vec::new(),
            dir: dir.into(),
            file_name: file_name.into(),
            example_name: None,
            state: DrawingState::Empty,
        }
    }

    /// Adds every way of `example`; the drawing takes the example's name.
    /// An example without ways still draws, as a title over an empty canvas.
    pub fn add_group(&mut self, example: &Example, settings: &DrawSettings) -> Result<(), DrawingError> {
        self.ensure_open("add ways")?;
        self.example_name = Some(example.name.clone());
        self.file_name = example_file_name(&example.name);
        let count = example.len();
        for (index, group) in example.iter().enumerate() {
            self.ways.push(Way::from_group(group, index, count, settings));
        }
        self.state = DrawingState::Populated;
        Ok(())
    }

    pub fn add_way(&mut self, way: Way) -> Result<(), DrawingError> {
        self.ensure_open("add ways")?;
        self.ways.push(way);
        self.state = DrawingState::Populated;
        Ok(())
    }

    pub fn draw(&mut self, settings: &DrawSettings) -> Result<(), DrawingError> {
        if !matches!(self.state, DrawingState::Populated) {
            return Err(self.invalid("draw"));
        }
        let layout = compute_layout(&self.ways, self.example_name.as_deref(), settings)?;
        let svg = render_svg(&layout);
        self.state = DrawingState::Rendered { layout, svg };
        Ok(())
    }

    /// Writes the drawing below `root` and returns the written path. Sign
    /// icons are composited onto the saved file afterwards.
    pub fn save(
        &mut self,
        root: &Path,
        icons: &mut IconLibrary,
        settings: &DrawSettings,
    ) -> Result<PathBuf, DrawingError> {
        let DrawingState::Rendered { layout, svg } = &self.state else {
            return Err(self.invalid("save"));
        };
        let path = root.join(&self.dir).join(&self.file_name);
        write_output_svg(svg, &path)?;

        let has_traffic_signs = self.ways.iter().any(|way| !way.traffic_signs().is_empty());
        if has_traffic_signs {
            let elements = self.sign_elements(layout, icons, settings)?;
            composite_onto_saved(&path, &elements)?;
        }
        debug!(path = %path.display(), ways = self.ways.len(), "drawing saved");

        let state = std::mem::replace(&mut self.state, DrawingState::Empty);
        if let DrawingState::Rendered { layout, .. } = state {
            self.state = DrawingState::Saved { layout };
        }
        Ok(path)
    }

    fn sign_elements(
        &self,
        layout: &DrawingLayout,
        icons: &mut IconLibrary,
        settings: &DrawSettings,
    ) -> Result<Vec<String>, DrawingError> {
        let mut elements = Vec::new();
        for (way, span) in self.ways.iter().zip(&layout.way_spans) {
            let mut boxes = Vec::with_capacity(way.traffic_signs().len());
            for sign in way.traffic_signs() {
                let icon = icons.icon(sign, settings)?;
                boxes.push(SignBox {
                    side_weight: sign.side_weight,
                    width: icon.width,
                    height: icon.height,
                });
            }
            let placements =
                place_way_signs(*span, &boxes, layout.labels_height_offset, settings.padding());
            for (sign, (x, y)) in way.traffic_signs().iter().zip(placements) {
                elements.push(icons.icon(sign, settings)?.svg_element(x, y));
            }
        }
        Ok(elements)
    }

    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    pub fn example_name(&self) -> Option<&str> {
        self.example_name.as_deref()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path of the svg relative to the report, always with `/` separators.
    pub fn image_src(&self) -> String {
        if self.dir.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.dir.trim_end_matches('/'), self.file_name)
        }
    }

    /// Layout of a drawn drawing.
    pub fn layout(&self) -> Option<&DrawingLayout> {
        match &self.state {
            DrawingState::Rendered { layout, .. } | DrawingState::Saved { layout } => Some(layout),
            DrawingState::Empty | DrawingState::Populated => None,
        }
    }

    /// Rendered svg before sign icons are added.
    pub fn svg(&self) -> Option<&str> {
        match &self.state {
            DrawingState::Rendered { svg, .. } => Some(svg),
            _ => None,
        }
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), DrawingError> {
        match self.state {
            DrawingState::Empty | DrawingState::Populated => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    fn invalid(&self, action: &'static str) -> DrawingError {
        DrawingError::InvalidState {
            file: self.file_name.clone(),
            action,
            state: self.state.label(),
        }
    }
}
