use crate::error::DrawingError;
use crate::settings::DrawSettings;
use crate::way::CrossSection;

/// Drawn past each strip's edges so neighbouring strips overlap and no seam
/// shows through when the browser zooms.
pub const OVERLAP: f64 = 3.14;

pub const LABEL_COVER_FILL: &str = "#0f0f0f";
pub const LABEL_COVER_OPACITY: f64 = 2.0 / 3.0;
pub const LABEL_TEXT_FILL: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq)]
pub struct RectShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFont {
    /// Value of a way's `name` tag.
    StreetName,
    /// Way name from the example definition.
    WayName,
    /// Example title across the whole drawing.
    Title,
}

impl LabelFont {
    pub fn family(self) -> &'static str {
        match self {
            LabelFont::StreetName => "sans-serif",
            LabelFont::WayName | LabelFont::Title => "serif",
        }
    }

    pub fn italic(self) -> bool {
        matches!(self, LabelFont::StreetName)
    }

    pub fn weight(self) -> &'static str {
        match self {
            LabelFont::StreetName => "normal",
            LabelFont::WayName | LabelFont::Title => "bold",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub text: String,
    pub font: LabelFont,
    pub font_size: f64,
    pub cover: RectShape,
    pub text_x: f64,
    pub text_y: f64,
}

/// Horizontal pixel span a way occupies on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaySpan {
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawingLayout {
    pub width: u32,
    pub height: u32,
    pub strips: Vec<RectShape>,
    pub labels: Vec<LabelLayout>,
    pub way_spans: Vec<WaySpan>,
    /// Lowest label edge; sign icons are placed below it.
    pub labels_height_offset: f64,
}

pub fn compute_layout<W: CrossSection>(
    ways: &[W],
    example_name: Option<&str>,
    settings: &DrawSettings,
) -> Result<DrawingLayout, DrawingError> {
    validate(ways)?;
    let ppm = settings.pixel_pro_meter;
    let draw_height = settings.draw_height_px();
    let total_width: f64 = ways
        .iter()
        .flat_map(|way| way.elements())
        .map(|elem| elem.width * ppm)
        .sum();
    let max_extent = f64::from(u32::MAX);
    if total_width > max_extent || draw_height > max_extent {
        return Err(DrawingError::CanvasTooLarge {
            width: total_width,
            height: draw_height,
        });
    }

    let mut layout = DrawingLayout {
        width: total_width.floor() as u32,
        height: draw_height.floor() as u32,
        strips: Vec::new(),
        labels: Vec::new(),
        way_spans: Vec::with_capacity(ways.len()),
        labels_height_offset: 0.0,
    };

    let label_y = if example_name.is_some() {
        settings.label_height()
    } else {
        0.0
    };

    let mut element_x_offset = 0.0;
    for way in ways {
        let way_x_offset = element_x_offset;
        let mut way_width = 0.0;
        for elem in way.elements() {
            let width = elem.width * ppm;
            match elem.distance {
                Some(distance) => push_dashes(
                    &mut layout.strips,
                    element_x_offset,
                    width,
                    elem.height,
                    distance,
                    draw_height,
                    &elem.colour,
                    &elem.background_colour,
                ),
                None => layout.strips.push(RectShape {
                    x: element_x_offset,
                    y: 0.0,
                    width: width + OVERLAP,
                    height: elem.height + OVERLAP,
                    fill: elem.colour.clone(),
                }),
            }
            element_x_offset += width;
            way_width += width;
        }
        layout.way_spans.push(WaySpan {
            x: way_x_offset,
            width: way_width,
        });

        let (text, font) = match way.tags().get("name") {
            Some(name) => (name, LabelFont::StreetName),
            None => (way.name(), LabelFont::WayName),
        };
        push_label(&mut layout, text, font, way_width, way_x_offset, label_y, settings);
    }

    if let Some(name) = example_name {
        push_label(&mut layout, name, LabelFont::Title, total_width, 0.0, 0.0, settings);
    }

    Ok(layout)
}

fn validate<W: CrossSection>(ways: &[W]) -> Result<(), DrawingError> {
    for way in ways {
        for (index, elem) in way.elements().iter().enumerate() {
            if !(elem.width.is_finite() && elem.width > 0.0) {
                return Err(DrawingError::invalid_element(
                    way.name(),
                    index,
                    format!("width must be positive, got {}", elem.width),
                ));
            }
            if !(elem.height.is_finite() && elem.height > 0.0) {
                return Err(DrawingError::invalid_element(
                    way.name(),
                    index,
                    format!("height must be positive, got {}", elem.height),
                ));
            }
            if let Some(distance) = elem.distance {
                if !(distance.is_finite() && distance >= 0.0) {
                    return Err(DrawingError::invalid_element(
                        way.name(),
                        index,
                        format!("dash distance must not be negative, got {distance}"),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Half a segment at the top, then gap/segment pairs until the canvas is
/// filled. The pattern starts and ends with a painted segment.
#[allow(clippy::too_many_arguments)]
fn push_dashes(
    strips: &mut Vec<RectShape>,
    x: f64,
    width: f64,
    segment: f64,
    gap: f64,
    draw_height: f64,
    colour: &str,
    background: &str,
) {
    let mut y_offset = 0.0;
    strips.push(RectShape {
        x,
        y: y_offset,
        width: width + OVERLAP,
        height: segment / 2.0 + OVERLAP,
        fill: colour.to_string(),
    });
    y_offset += segment / 2.0;
    while y_offset < draw_height {
        strips.push(RectShape {
            x,
            y: y_offset,
            width: width + OVERLAP,
            height: gap + OVERLAP,
            fill: background.to_string(),
        });
        y_offset += gap;
        strips.push(RectShape {
            x,
            y: y_offset,
            width: width + OVERLAP,
            height: segment + OVERLAP,
            fill: colour.to_string(),
        });
        y_offset += segment;
    }
}

fn push_label(
    layout: &mut DrawingLayout,
    text: &str,
    font: LabelFont,
    width: f64,
    x_offset: f64,
    y_offset: f64,
    settings: &DrawSettings,
) {
    let padding = settings.padding();
    let cover_height = settings.label_height() - padding;
    let cover = RectShape {
        x: x_offset + padding,
        y: y_offset + padding,
        width: (width - 2.0 * padding).max(0.0),
        height: cover_height,
        fill: LABEL_COVER_FILL.to_string(),
    };
    layout.labels_height_offset = layout
        .labels_height_offset
        .max(y_offset + padding + cover_height);
    layout.labels.push(LabelLayout {
        text: text.to_string(),
        font,
        font_size: settings.label_font_size(),
        cover,
        text_x: x_offset + width / 2.0,
        text_y: y_offset + cover_height / 2.0 + padding,
    });
}

/// Icon size and placement weight of one sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignBox {
    pub side_weight: f64,
    pub width: f64,
    pub height: f64,
}

/// Icon centers for the signs of one way, in declaration order.
///
/// Horizontally each sign sits at its side weight of the way span, pulled
/// inward so the icon plus padding stays inside the span. A span too narrow
/// for the icon plus padding gets the sign centred in it. Vertically the first
/// sign hangs below the labels and each further sign moves down by the
/// previous icon height plus padding plus the offset reached so far.
pub fn place_way_signs(
    span: WaySpan,
    signs: &[SignBox],
    labels_height_offset: f64,
    padding: f64,
) -> Vec<(f64, f64)> {
    let mut placements = Vec::with_capacity(signs.len());
    let mut stack_offset = 0.0;
    for sign in signs {
        let half = sign.width / 2.0 + padding;
        let right = span.x + span.width;
        let mut x = span.x + span.width * sign.side_weight;
        if 2.0 * half > span.width {
            x = span.x + span.width / 2.0;
        } else if x + half > right {
            x = right - half;
        } else if x - half < span.x {
            x = span.x + half;
        }
        let y = labels_height_offset + sign.height / 2.0 + padding + stack_offset;
        placements.push((x, y));
        stack_offset += sign.height + padding + stack_offset;
    }
    placements
}
