use crate::error::DrawingError;
use crate::layout::{
    DrawingLayout, LABEL_COVER_OPACITY, LABEL_TEXT_FILL, LabelLayout, RectShape,
};
use std::path::Path;

pub fn render_svg(layout: &DrawingLayout) -> String {
    let mut svg = String::new();
    let width = layout.width;
    let height = layout.height;

    svg.push_str("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n");
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" version=\"1.1\" width=\"{width}\" height=\"{height}\">",
    ));

    for strip in &layout.strips {
        svg.push_str(&rect_svg(strip, None));
    }

    for label in &layout.labels {
        svg.push_str(&label_svg(label));
    }

    svg.push_str("</svg>\n");
    svg
}

fn rect_svg(rect: &RectShape, opacity: Option<f64>) -> String {
    let opacity = opacity
        .map(|value| format!(" opacity=\"{value:.4}\""))
        .unwrap_or_default();
    format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"{opacity}/>",
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        escape_xml(&rect.fill)
    )
}

fn label_svg(label: &LabelLayout) -> String {
    let mut out = rect_svg(&label.cover, Some(LABEL_COVER_OPACITY));
    let font_style = if label.font.italic() {
        ";font-style:italic"
    } else {
        ""
    };
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" fill=\"{LABEL_TEXT_FILL}\" style=\"font-size:{}px;font-family:{}{font_style};font-weight:{};text-anchor:middle;dominant-baseline:central\">{}</text>",
        label.text_x,
        label.text_y,
        label.font_size,
        label.font.family(),
        label.font.weight(),
        escape_xml(&label.text)
    ));
    out
}

pub fn write_output_svg(svg: &str, output: &Path) -> Result<(), DrawingError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DrawingError::Write {
            path: output.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(output, svg).map_err(|source| DrawingError::Write {
        path: output.to_path_buf(),
        source,
    })
}

/// Re-opens a saved drawing and adds `elements` on top of everything in it.
pub fn composite_onto_saved(output: &Path, elements: &[String]) -> Result<(), DrawingError> {
    let saved = std::fs::read_to_string(output).map_err(|source| DrawingError::Reopen {
        path: output.to_path_buf(),
        source,
    })?;
    let Some(end) = saved.rfind("</svg>") else {
        return Err(DrawingError::Malformed {
            path: output.to_path_buf(),
        });
    };
    let mut svg = String::with_capacity(saved.len() + elements.iter().map(String::len).sum::<usize>());
    svg.push_str(&saved[..end]);
    svg.push_str("<g class=\"traffic-signs\">");
    for element in elements {
        svg.push_str(element);
    }
    svg.push_str("</g>");
    svg.push_str(&saved[end..]);
    write_output_svg(&svg, output)
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path) -> anyhow::Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use crate::settings::DrawSettings;
    use crate::tagging::{TagGroup, Tags};
    use crate::way::Way;

    fn layout_for(pairs: &[(&str, &str)], example: Option<&str>) -> DrawingLayout {
        let settings = DrawSettings::default();
        let tags: Tags = pairs.iter().copied().collect();
        let way = Way::from_group(&TagGroup::new(None, tags), 0, 1, &settings);
        compute_layout(&[way], example, &settings).unwrap()
    }

    #[test]
    fn render_svg_basic() {
        let svg = render_svg(&layout_for(&[("highway", "road")], Some("Demo")));
        assert!(svg.contains("<svg"));
        assert!(svg.contains("width=\"200\" height=\"400\""));
        assert!(svg.contains("fill=\"#4d4d4d\""));
        assert!(svg.contains(">Demo</text>"));
        assert!(svg.contains(">Way 1</text>"));
        assert!(svg.contains("opacity=\"0.6667\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn street_names_are_italic_and_escaped() {
        let svg = render_svg(&layout_for(&[("highway", "road"), ("name", "A & B")], None));
        assert!(svg.contains("font-family:sans-serif;font-style:italic;font-weight:normal"));
        assert!(svg.contains(">A &amp; B</text>"));
    }

    #[test]
    fn composite_inserts_before_closing_tag() {
        let dir = std::env::temp_dir().join("way_section_render_composite");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("out.svg");
        write_output_svg("<svg><rect/></svg>\n", &path).unwrap();
        composite_onto_saved(&path, &["<image/>".to_string()]).unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved, "<svg><rect/><g class=\"traffic-signs\"><image/></g></svg>\n");
    }

    #[test]
    fn composite_rejects_truncated_output() {
        let dir = std::env::temp_dir().join("way_section_render_truncated");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("out.svg");
        write_output_svg("<svg><rect/>", &path).unwrap();
        let err = composite_onto_saved(&path, &[]).unwrap_err();
        assert!(matches!(err, DrawingError::Malformed { .. }));
    }
}
