use crate::settings::DrawSettings;
use crate::tagging::{Direction, TagGroup, Tags};
use crate::traffic_sign::{TrafficSign, signs_from_tags};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

pub const ASPHALT: &str = "#4d4d4d";
pub const MARKING: &str = "#ffffff";
pub const SIDEWALK: &str = "#bdbdbd";
pub const FOOTWAY: &str = "#c8c0b0";
pub const CYCLE_TRACK: &str = "#b05a4a";
pub const CYCLE_LANE_EXCLUSIVE: &str = "#c0392b";
pub const SHARED_PATH: &str = "#a89080";
pub const UNKNOWN_SURFACE: &str = "#7f7f7f";

const ROAD_HIGHWAYS: [&str; 7] = [
    "road",
    "primary",
    "secondary",
    "tertiary",
    "residential",
    "unclassified",
    "service",
];

const UNMARKED_CARRIAGEWAY_WIDTH: f64 = 4.0;
const LANE_WIDTH: f64 = 3.0;
const LANE_MARKING_WIDTH: f64 = 0.15;
const LANE_MARKING_DASH: f64 = 3.0;
const LANE_MARKING_GAP: f64 = 6.0;
const CYCLE_LANE_WIDTH: f64 = 1.5;
const CYCLE_LANE_LINE_WIDTH: f64 = 0.25;
const ADVISORY_DASH: f64 = 1.0;
const ADVISORY_GAP: f64 = 1.0;
const SIDEWALK_WIDTH: f64 = 2.0;
const FOOTWAY_WIDTH: f64 = 2.5;
const CYCLE_TRACK_WIDTH: f64 = 2.0;
const TWO_WAY_CYCLE_TRACK_WIDTH: f64 = 2.5;
const PATH_HALF_WIDTH: f64 = 1.5;
const PATH_LINE_WIDTH: f64 = 0.12;
const SHARED_PATH_WIDTH: f64 = 2.5;
const UNKNOWN_WIDTH: f64 = 3.0;

/// Larger `lanes` values are drawn as an unmarked carriageway.
pub const MAX_LANES: u32 = 16;
/// Larger `width` values are ignored.
pub const MAX_WAY_WIDTH: f64 = 100.0;

/// Keys whose listed values change how a way is drawn.
pub static RECOGNIZED_TAGS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let cycleway: &[&str] = &["no", "lane", "separate"];
    let cycle_lane: &[&str] = &["advisory", "exclusive"];
    let cycle_lane_bicycle: &[&str] = &["yes", "designated"];
    let sidewalk: &[&str] = &["yes", "no", "separate"];
    let sidepath: &[&str] = &["no", "use_sidepath", "optional_sidepath"];
    let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    map.insert(
        "highway",
        &[
            "road",
            "primary",
            "secondary",
            "tertiary",
            "residential",
            "unclassified",
            "service",
            "footway",
            "cycleway",
            "path",
        ],
    );
    for side in ["cycleway", "cycleway:left", "cycleway:right", "cycleway:both"] {
        map.insert(side, cycleway);
    }
    for key in ["cycleway:left:lane", "cycleway:right:lane", "cycleway:both:lane"] {
        map.insert(key, cycle_lane);
    }
    for key in [
        "cycleway:left:lane:bicycle",
        "cycleway:right:lane:bicycle",
        "cycleway:both:lane:bicycle",
    ] {
        map.insert(key, cycle_lane_bicycle);
    }
    map.insert("sidewalk", &["both", "left", "right", "no", "none", "separate"]);
    for key in ["sidewalk:left", "sidewalk:right", "sidewalk:both"] {
        map.insert(key, sidewalk);
    }
    for key in ["bicycle:left", "bicycle:right", "bicycle:both"] {
        map.insert(key, sidepath);
    }
    map.insert("bicycle", &["yes", "designated", "no"]);
    map.insert("bicycle:oneway", &["yes", "no"]);
    map.insert("foot", &["yes", "designated", "no"]);
    map.insert("footway", &["sidewalk", "crossing"]);
    map.insert("segregated", &["yes", "no"]);
    map
});

/// Keys drawn from any value they carry.
pub static RECOGNIZED_TAGS_ANY_VALUE: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "name",
        "lanes",
        "width",
        "traffic_sign",
        "traffic_sign:forward",
        "traffic_sign:backward",
    ]
});

/// Keys (and values) known not to affect the drawing.
pub static IGNORED_TAGS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    map.insert("surface", &["asphalt", "paving_stones", "concrete", "sett"]);
    map.insert("smoothness", &["excellent", "good", "intermediate"]);
    map.insert("lit", &["yes", "no"]);
    map.insert("maxspeed", &["30", "50", "70"]);
    map.insert("maxspeed:bicycle", &["walk"]);
    map.insert("oneway", &["yes", "no"]);
    map
});

pub fn is_recognized(key: &str, value: &str) -> bool {
    RECOGNIZED_TAGS
        .get(key)
        .map(|values| values.contains(&value))
        .unwrap_or(false)
}

pub fn is_ignored(key: &str, value: &str) -> bool {
    IGNORED_TAGS
        .get(key)
        .map(|values| values.contains(&value))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Surface,
    Marking,
}

/// One drawable strip of a way.
#[derive(Debug, Clone, PartialEq)]
pub struct WayElement {
    pub kind: ElementKind,
    /// Meters across the way.
    pub width: f64,
    /// Pixels along the way: the full drawing height for solid strips, one
    /// painted segment for dashed ones.
    pub height: f64,
    pub colour: String,
    /// Shows through the gaps of a dashed strip.
    pub background_colour: String,
    /// Gap between painted segments in pixels; `None` draws a solid strip.
    pub distance: Option<f64>,
}

impl WayElement {
    pub fn solid(kind: ElementKind, width: f64, colour: &str, settings: &DrawSettings) -> Self {
        Self {
            kind,
            width,
            height: settings.draw_height_px(),
            colour: colour.to_string(),
            background_colour: colour.to_string(),
            distance: None,
        }
    }

    /// Dashed marking; `dash` and `gap` are meters along the way.
    pub fn dashed(
        width: f64,
        colour: &str,
        background_colour: &str,
        dash: f64,
        gap: f64,
        settings: &DrawSettings,
    ) -> Self {
        Self {
            kind: ElementKind::Marking,
            width,
            height: dash * settings.pixel_pro_meter,
            colour: colour.to_string(),
            background_colour: background_colour.to_string(),
            distance: Some(gap * settings.pixel_pro_meter),
        }
    }

    pub fn is_dashed(&self) -> bool {
        self.distance.is_some()
    }

    pub fn pixel_width(&self, settings: &DrawSettings) -> f64 {
        self.width * settings.pixel_pro_meter
    }
}

/// What layout and rendering need to know about a way.
pub trait CrossSection {
    fn name(&self) -> &str;
    fn tags(&self) -> &Tags;
    fn elements(&self) -> &[WayElement];
    fn traffic_signs(&self) -> &[TrafficSign];

    /// Total width in meters.
    fn width(&self) -> f64 {
        self.elements().iter().map(|elem| elem.width).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Way {
    pub name: String,
    pub direction: Direction,
    pub tags: Tags,
    /// Normalized tags the element rules read (`:both` split into sides etc).
    pub filtered_tags: Tags,
    pub elements: Vec<WayElement>,
    pub traffic_signs: Vec<TrafficSign>,
    pub index: usize,
    pub count: usize,
}

impl Way {
    /// Builds the way at position `index` of a group of `count` ways.
    pub fn from_group(group: &TagGroup, index: usize, count: usize, settings: &DrawSettings) -> Self {
        let name = group
            .name
            .clone()
            .unwrap_or_else(|| format!("Way {}", index + 1));
        let filtered_tags = normalize_tags(&group.tags);
        let elements = build_elements(&filtered_tags, settings);
        let traffic_signs = signs_from_tags(&group.tags);
        Self {
            name,
            direction: group.direction,
            tags: group.tags.clone(),
            filtered_tags,
            elements,
            traffic_signs,
            index,
            count,
        }
    }

    pub fn pixel_width(&self, settings: &DrawSettings) -> f64 {
        self.width() * settings.pixel_pro_meter
    }
}

impl CrossSection for Way {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &Tags {
        &self.tags
    }

    fn elements(&self) -> &[WayElement] {
        &self.elements
    }

    fn traffic_signs(&self) -> &[TrafficSign] {
        &self.traffic_signs
    }
}

/// Splits `:both` keys and bare `sidewalk`/`cycleway` values into explicit
/// left/right keys. Explicit side keys win over derived ones.
pub fn normalize_tags(tags: &Tags) -> Tags {
    let mut filtered = Tags::new();
    for (key, value) in tags.iter() {
        if key == "sidewalk" {
            let (left, right) = match value {
                "both" | "yes" => ("yes", "yes"),
                "left" => ("yes", "no"),
                "right" => ("no", "yes"),
                "separate" => ("separate", "separate"),
                _ => ("no", "no"),
            };
            filtered.insert("sidewalk:left", left);
            filtered.insert("sidewalk:right", right);
        } else if key == "cycleway" {
            filtered.insert("cycleway:left", value);
            filtered.insert("cycleway:right", value);
        } else if key.contains(":both") {
            filtered.insert(key.replacen(":both", ":left", 1), value);
            filtered.insert(key.replacen(":both", ":right", 1), value);
        }
    }
    for (key, value) in tags.iter() {
        if key == "sidewalk" || key == "cycleway" || key.contains(":both") {
            continue;
        }
        filtered.insert(key, value);
    }
    filtered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn key(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Element sequence, left to right, for normalized tags.
pub fn build_elements(tags: &Tags, settings: &DrawSettings) -> Vec<WayElement> {
    let highway = tags.get("highway").unwrap_or("");
    let mut elements = if ROAD_HIGHWAYS.contains(&highway) {
        road_elements(tags, settings)
    } else {
        match highway {
            "footway" => vec![WayElement::solid(
                ElementKind::Surface,
                FOOTWAY_WIDTH,
                FOOTWAY,
                settings,
            )],
            "cycleway" => cycle_track_elements(tags, settings),
            "path" => path_elements(tags, settings),
            _ => vec![WayElement::solid(
                ElementKind::Surface,
                UNKNOWN_WIDTH,
                UNKNOWN_SURFACE,
                settings,
            )],
        }
    };
    if !ROAD_HIGHWAYS.contains(&highway) {
        if let Some(width) = tags.get("width").and_then(parse_meters) {
            scale_surfaces(&mut elements, width);
        }
    }
    elements
}

fn road_elements(tags: &Tags, settings: &DrawSettings) -> Vec<WayElement> {
    let mut elements = Vec::new();
    elements.extend(side_elements(tags, Side::Left, settings));

    match tags.get("lanes").and_then(parse_lanes) {
        Some(lanes) => {
            for lane in 0..lanes {
                if lane > 0 {
                    elements.push(WayElement::dashed(
                        LANE_MARKING_WIDTH,
                        MARKING,
                        ASPHALT,
                        LANE_MARKING_DASH,
                        LANE_MARKING_GAP,
                        settings,
                    ));
                }
                elements.push(WayElement::solid(
                    ElementKind::Surface,
                    LANE_WIDTH,
                    ASPHALT,
                    settings,
                ));
            }
        }
        _ => elements.push(WayElement::solid(
            ElementKind::Surface,
            UNMARKED_CARRIAGEWAY_WIDTH,
            ASPHALT,
            settings,
        )),
    }

    let mut right = side_elements(tags, Side::Right, settings);
    right.reverse();
    elements.extend(right);
    elements
}

/// Elements of one road side, outermost first.
fn side_elements(tags: &Tags, side: Side, settings: &DrawSettings) -> Vec<WayElement> {
    let mut elements = Vec::new();
    if tags.get(&format!("sidewalk:{}", side.key())) == Some("yes") {
        elements.push(WayElement::solid(
            ElementKind::Surface,
            SIDEWALK_WIDTH,
            SIDEWALK,
            settings,
        ));
    }
    if tags.get(&format!("cycleway:{}", side.key())) == Some("lane") {
        let lane_type = tags.get(&format!("cycleway:{}:lane", side.key()));
        let surface = if lane_type == Some("exclusive") {
            CYCLE_LANE_EXCLUSIVE
        } else {
            ASPHALT
        };
        elements.push(WayElement::solid(
            ElementKind::Surface,
            CYCLE_LANE_WIDTH,
            surface,
            settings,
        ));
        if lane_type == Some("advisory") {
            elements.push(WayElement::dashed(
                CYCLE_LANE_LINE_WIDTH,
                MARKING,
                ASPHALT,
                ADVISORY_DASH,
                ADVISORY_GAP,
                settings,
            ));
        } else {
            elements.push(WayElement::solid(
                ElementKind::Marking,
                CYCLE_LANE_LINE_WIDTH,
                MARKING,
                settings,
            ));
        }
    }
    elements
}

fn cycle_track_elements(tags: &Tags, settings: &DrawSettings) -> Vec<WayElement> {
    if tags.get("bicycle:oneway") == Some("no") {
        let half = (TWO_WAY_CYCLE_TRACK_WIDTH - PATH_LINE_WIDTH) / 2.0;
        vec![
            WayElement::solid(ElementKind::Surface, half, CYCLE_TRACK, settings),
            WayElement::dashed(
                PATH_LINE_WIDTH,
                MARKING,
                CYCLE_TRACK,
                ADVISORY_DASH,
                ADVISORY_GAP,
                settings,
            ),
            WayElement::solid(ElementKind::Surface, half, CYCLE_TRACK, settings),
        ]
    } else {
        vec![WayElement::solid(
            ElementKind::Surface,
            CYCLE_TRACK_WIDTH,
            CYCLE_TRACK,
            settings,
        )]
    }
}

fn path_elements(tags: &Tags, settings: &DrawSettings) -> Vec<WayElement> {
    if tags.get("segregated") == Some("yes") {
        vec![
            WayElement::solid(ElementKind::Surface, PATH_HALF_WIDTH, FOOTWAY, settings),
            WayElement::solid(ElementKind::Marking, PATH_LINE_WIDTH, MARKING, settings),
            WayElement::solid(ElementKind::Surface, PATH_HALF_WIDTH, CYCLE_TRACK, settings),
        ]
    } else {
        vec![WayElement::solid(
            ElementKind::Surface,
            SHARED_PATH_WIDTH,
            SHARED_PATH,
            settings,
        )]
    }
}

fn parse_lanes(value: &str) -> Option<u32> {
    let lanes = value.trim().parse::<u32>().ok().filter(|lanes| *lanes >= 1)?;
    if lanes > MAX_LANES {
        warn!(lanes, max = MAX_LANES, "lane count out of range, drawing an unmarked carriageway");
        return None;
    }
    Some(lanes)
}

fn parse_meters(value: &str) -> Option<f64> {
    let trimmed = value.trim().trim_end_matches('m').trim();
    let width = trimmed
        .parse::<f64>()
        .ok()
        .filter(|width| width.is_finite() && *width > 0.0)?;
    if width > MAX_WAY_WIDTH {
        warn!(width, max = MAX_WAY_WIDTH, "way width out of range, keeping the default width");
        return None;
    }
    Some(width)
}

/// Scales surface strips so the way spans `target` meters; markings keep
/// their width.
fn scale_surfaces(elements: &mut [WayElement], target: f64) {
    let markings: f64 = elements
        .iter()
        .filter(|elem| elem.kind == ElementKind::Marking)
        .map(|elem| elem.width)
        .sum();
    let surfaces: f64 = elements
        .iter()
        .filter(|elem| elem.kind == ElementKind::Surface)
        .map(|elem| elem.width)
        .sum();
    let available = target - markings;
    if surfaces <= 0.0 || available <= 0.0 {
        return;
    }
    let factor = available / surfaces;
    for elem in elements.iter_mut().filter(|elem| elem.kind == ElementKind::Surface) {
        elem.width *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().copied().collect()
    }

    fn way(pairs: &[(&str, &str)]) -> Way {
        let group = TagGroup::new(None, tags(pairs));
        Way::from_group(&group, 0, 1, &DrawSettings::default())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn plain_road_is_four_meters() {
        let way = way(&[("highway", "road")]);
        assert_eq!(way.elements.len(), 1);
        assert!(approx(way.width(), 4.0));
        assert_eq!(way.name, "Way 1");
        assert!(!way.elements[0].is_dashed());
        assert_eq!(way.elements[0].height, DrawSettings::default().draw_height_px());
    }

    #[test]
    fn lanes_are_split_by_dashed_markings() {
        let way = way(&[("highway", "road"), ("lanes", "2")]);
        assert_eq!(way.elements.len(), 3);
        assert!(way.elements[1].is_dashed());
        assert_eq!(way.elements[1].background_colour, ASPHALT);
        assert!(approx(way.width(), 2.0 * LANE_WIDTH + LANE_MARKING_WIDTH));
    }

    #[test]
    fn advisory_lane_on_right_side() {
        let way = way(&[
            ("highway", "road"),
            ("cycleway:left", "no"),
            ("cycleway:right", "lane"),
            ("cycleway:right:lane", "advisory"),
            ("sidewalk:right", "separate"),
        ]);
        let kinds: Vec<(bool, &str)> = way
            .elements
            .iter()
            .map(|e| (e.is_dashed(), e.colour.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![(false, ASPHALT), (true, MARKING), (false, ASPHALT)]
        );
    }

    #[test]
    fn exclusive_lane_is_tinted_and_solid() {
        let way = way(&[
            ("highway", "road"),
            ("cycleway:right", "lane"),
            ("cycleway:right:lane", "exclusive"),
        ]);
        assert_eq!(way.elements.last().unwrap().colour, CYCLE_LANE_EXCLUSIVE);
        assert!(way.elements.iter().all(|e| !e.is_dashed()));
    }

    #[test]
    fn both_sidewalks_surround_the_carriageway() {
        let way = way(&[("highway", "residential"), ("sidewalk:both", "yes")]);
        let colours: Vec<&str> = way.elements.iter().map(|e| e.colour.as_str()).collect();
        assert_eq!(colours, vec![SIDEWALK, ASPHALT, SIDEWALK]);
        assert_eq!(way.filtered_tags.get("sidewalk:left"), Some("yes"));
        assert_eq!(way.filtered_tags.get("sidewalk:right"), Some("yes"));
        assert!(!way.filtered_tags.contains_key("sidewalk:both"));
    }

    #[test]
    fn explicit_side_beats_both() {
        let filtered = normalize_tags(&tags(&[("sidewalk:left", "no"), ("sidewalk:both", "yes")]));
        assert_eq!(filtered.get("sidewalk:left"), Some("no"));
        assert_eq!(filtered.get("sidewalk:right"), Some("yes"));
    }

    #[test]
    fn bare_sidewalk_value_is_split() {
        let filtered = normalize_tags(&tags(&[("sidewalk", "right")]));
        assert_eq!(filtered.get("sidewalk:left"), Some("no"));
        assert_eq!(filtered.get("sidewalk:right"), Some("yes"));
    }

    #[test]
    fn two_way_cycle_track_has_centre_line() {
        let way = way(&[("highway", "cycleway"), ("bicycle:oneway", "no")]);
        assert_eq!(way.elements.len(), 3);
        assert!(way.elements[1].is_dashed());
        assert!(approx(way.width(), TWO_WAY_CYCLE_TRACK_WIDTH));
    }

    #[test]
    fn segregated_path() {
        let way = way(&[("highway", "path"), ("segregated", "yes")]);
        assert_eq!(way.elements.len(), 3);
        assert_eq!(way.elements[1].kind, ElementKind::Marking);
    }

    #[test]
    fn lane_count_is_capped() {
        let widest = way(&[("highway", "road"), ("lanes", "16")]);
        assert_eq!(widest.elements.len(), 31);
        for lanes in ["17", "200000", "4294967295", "99999999999"] {
            let road = way(&[("highway", "road"), ("lanes", lanes)]);
            assert_eq!(road.elements.len(), 1, "lanes={lanes}");
            assert!(approx(road.width(), UNMARKED_CARRIAGEWAY_WIDTH));
        }
    }

    #[test]
    fn oversized_width_tag_is_ignored() {
        let huge = way(&[("highway", "footway"), ("width", "1e12")]);
        assert!(approx(huge.width(), FOOTWAY_WIDTH));
        let widest = way(&[("highway", "footway"), ("width", "100")]);
        assert!(approx(widest.width(), 100.0));
    }

    #[test]
    fn width_tag_scales_surfaces_only() {
        let way = way(&[("highway", "path"), ("segregated", "yes"), ("width", "4.12 m")]);
        assert!(approx(way.width(), 4.12));
        assert!(approx(way.elements[1].width, PATH_LINE_WIDTH));
        assert!(approx(way.elements[0].width, 2.0));
    }

    #[test]
    fn unknown_tags_are_kept_and_drawable() {
        let way = way(&[("highway", "bridleway"), ("horse", "designated")]);
        assert!(approx(way.width(), UNKNOWN_WIDTH));
        assert_eq!(way.tags.get("horse"), Some("designated"));
    }

    #[test]
    fn building_is_deterministic() {
        let pairs = [
            ("highway", "road"),
            ("lanes", "3"),
            ("cycleway:both", "lane"),
            ("cycleway:both:lane", "advisory"),
            ("sidewalk", "both"),
        ];
        let a = way(&pairs);
        let b = way(&pairs);
        assert_eq!(a.elements, b.elements);
        let sum: f64 = a.elements.iter().map(|e| e.width).sum();
        assert!(approx(a.width(), sum));
    }

    #[test]
    fn signs_come_from_tags() {
        let way = way(&[("highway", "cycleway"), ("traffic_sign", "DE:237")]);
        assert_eq!(way.traffic_signs.len(), 1);
        assert_eq!(way.traffic_signs[0].code, "237");
    }

    #[test]
    fn recognition_tables() {
        assert!(is_recognized("highway", "road"));
        assert!(!is_recognized("highway", "motorway"));
        assert!(is_ignored("maxspeed:bicycle", "walk"));
        assert!(RECOGNIZED_TAGS_ANY_VALUE.contains(&"name"));
    }
}
