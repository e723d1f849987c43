use crate::drawing::Drawing;
use crate::render::escape_xml;
use crate::way::{IGNORED_TAGS, RECOGNIZED_TAGS, RECOGNIZED_TAGS_ANY_VALUE, is_ignored, is_recognized};
use std::path::Path;

pub const DEFAULT_COMPANION_FILE: &str = "tagging.html";
pub const DEFAULT_REPORT_FILE: &str = "tagging_generated.html";
pub const IMAGE_HEIGHT: u32 = 300;
const MIN_WAY_COLUMNS: usize = 3;

fn recognized_key(key: &str) -> bool {
    RECOGNIZED_TAGS.contains_key(key)
}

fn any_value_key(key: &str) -> bool {
    RECOGNIZED_TAGS_ANY_VALUE.contains(&key)
}

fn ignored_key(key: &str) -> bool {
    IGNORED_TAGS.contains_key(key)
}

/// Cell backgrounds of a tag the way declares itself.
pub fn tag_colours(key: &str, value: &str) -> (Option<&'static str>, Option<&'static str>) {
    let mut key_colour = None;
    if !recognized_key(key) && !any_value_key(key) {
        key_colour = Some(if ignored_key(key) { "lightgrey" } else { "red" });
    }
    let mut value_colour = None;
    if !is_recognized(key, value) {
        if is_ignored(key, value) {
            value_colour = Some("lightgray");
        } else if !any_value_key(key) {
            value_colour = Some("yellow");
        }
    }
    (key_colour, value_colour)
}

/// Cell backgrounds of a tag only present in the normalized listing.
pub fn filtered_tag_colours(key: &str, value: &str) -> (&'static str, &'static str) {
    let mut key_colour = "grey";
    if !recognized_key(key) {
        key_colour = if ignored_key(key) { "darkgrey" } else { "orange" };
    }
    let mut value_colour = "grey";
    if !is_recognized(key, value) {
        value_colour = if is_ignored(key, value) { "darkgray" } else { "orange" };
    }
    (key_colour, value_colour)
}

pub fn html_row(
    key: &str,
    value: &str,
    background_key: Option<&str>,
    background_value: Option<&str>,
) -> String {
    let mut res = String::from("\n                <tr>\n                    <td style=\"text-align: right;");
    if let Some(colour) = background_key {
        res.push_str(&format!("background:{colour};"));
    }
    res.push_str("\"><code>");
    res.push_str(&escape_xml(key));
    res.push_str("</code></td>\n                    <td");
    if let Some(colour) = background_value {
        res.push_str(&format!(" style=\"background:{colour};\""));
    }
    res.push_str("><code>");
    res.push_str(&escape_xml(value));
    res.push_str("</code></td>\n                </tr>");
    res
}

/// One table row: the drawing image and a tag table per way.
pub fn drawing_row(drawing: &Drawing) -> String {
    let mut res = String::from("\n    <tr>\n        <td><img src=\"");
    res.push_str(&escape_xml(&drawing.image_src()));
    res.push_str(&format!("\" height=\"{IMAGE_HEIGHT}px\"></td>\n"));
    for way in drawing.ways() {
        res.push_str("        <td>\n            <table border=1 frame=void>");
        for (key, value) in way.tags.iter() {
            let (background_key, background_value) = tag_colours(key, value);
            res.push_str(&html_row(key, value, background_key, background_value));
        }
        for (key, value) in way.filtered_tags.iter() {
            if way.tags.contains_key(key) {
                continue;
            }
            let (background_key, background_value) = filtered_tag_colours(key, value);
            res.push_str(&html_row(key, value, Some(background_key), Some(background_value)));
        }
        res.push_str("\n            </table>\n        </td>\n");
    }
    res.push_str("    </tr>");
    res
}

/// Accumulates drawing rows for the combined report.
#[derive(Debug, Default)]
pub struct Report {
    rows: Vec<String>,
    way_columns: usize,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, drawing: &Drawing) {
        self.way_columns = self.way_columns.max(drawing.ways().len());
        self.rows.push(drawing_row(drawing));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whole report page; `companion` is embedded verbatim next to the table.
    pub fn to_html(&self, companion: &str) -> String {
        let mut html = String::from("<table><td style=\"    vertical-align: top;\">");
        html.push_str("<table border=1 frame=void>\n");
        html.push_str("    <tr>\n        <th>svg</th>");
        for column in 1..=self.way_columns.max(MIN_WAY_COLUMNS) {
            html.push_str(&format!("\n        <th>Way {column}</th>"));
        }
        html.push_str("\n    </tr>");
        for row in &self.rows {
            html.push_str(row);
        }
        html.push_str("</table>\n");
        html.push_str("<td></td>");
        html.push_str("<td style=\"vertical-align: top;\">");
        html.push_str(companion);
        html.push_str("</td>");
        html.push_str("</td></table>\n");
        html
    }

    pub fn write(&self, companion: &str, output: &Path) -> std::io::Result<()> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, self.to_html(companion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::FileNamer;
    use crate::settings::DrawSettings;
    use crate::tagging::{Example, TagGroup, Tags};

    fn drawing(name: &str, groups: Vec<Tags>) -> Drawing {
        let groups = groups.into_iter().map(|tags| TagGroup::new(None, tags)).collect();
        let mut drawing = Drawing::new(&mut FileNamer::default());
        drawing
            .add_group(&Example::new(name, 0.0, groups), &DrawSettings::default())
            .unwrap();
        drawing
    }

    #[test]
    fn recognized_tag_is_uncoloured() {
        assert_eq!(tag_colours("highway", "road"), (None, None));
        assert_eq!(tag_colours("name", "Main Street"), (None, None));
    }

    #[test]
    fn unknown_key_and_value() {
        assert_eq!(tag_colours("horse", "designated"), (Some("red"), Some("yellow")));
        assert_eq!(tag_colours("highway", "motorway"), (None, Some("yellow")));
    }

    #[test]
    fn ignored_tags_are_grey() {
        assert_eq!(tag_colours("maxspeed:bicycle", "walk"), (Some("lightgrey"), Some("lightgray")));
        assert_eq!(tag_colours("surface", "gravel"), (Some("lightgrey"), Some("yellow")));
    }

    #[test]
    fn filtered_tags_use_darker_tier() {
        assert_eq!(filtered_tag_colours("sidewalk:left", "no"), ("grey", "grey"));
        assert_eq!(filtered_tag_colours("lit", "yes"), ("darkgrey", "darkgray"));
        assert_eq!(filtered_tag_colours("horse", "yes"), ("orange", "orange"));
    }

    #[test]
    fn row_has_image_and_tag_table() {
        let tags: Tags = [("highway", "road")].into_iter().collect();
        let row = drawing_row(&drawing("Test", vec![tags]));
        assert!(row.contains("<img src=\"svg/Test.svg\" height=\"300px\">"));
        assert_eq!(row.matches("<table").count(), 1);
        assert_eq!(row.matches("<tr>").count(), 2);
        assert!(row.contains("<td style=\"text-align: right;\"><code>highway</code></td>"));
        assert!(row.contains("<td><code>road</code></td>"));
    }

    #[test]
    fn filtered_entries_follow_declared_ones() {
        let tags: Tags = [("highway", "road"), ("sidewalk:both", "no")].into_iter().collect();
        let row = drawing_row(&drawing("Sides", vec![tags]));
        let declared = row.find("<code>sidewalk:both</code>").unwrap();
        let left = row.find("<code>sidewalk:left</code>").unwrap();
        assert!(declared < left);
        assert!(row.contains("background:grey;\"><code>sidewalk:right</code>"));
    }

    #[test]
    fn report_columns_and_companion() {
        let road: Tags = [("highway", "road")].into_iter().collect();
        let mut report = Report::new();
        report.push(&drawing("One", vec![road.clone(); 4]));
        let html = report.to_html("<p>legend</p>");
        assert!(html.contains("<th>Way 4</th>"));
        assert!(!html.contains("<th>Way 5</th>"));
        assert!(html.contains("<td style=\"vertical-align: top;\"><p>legend</p></td>"));
        assert_eq!(report.len(), 1);

        let empty = Report::new().to_html("");
        assert!(empty.contains("<th>Way 3</th>"));
    }
}
