//! Road cross-section diagrams from OSM-style tag examples.
//!
//! Each example is a list of tagged ways. Every way becomes a sequence of
//! strips (lanes, markings, sidewalks), the strips are laid out left to right
//! into an svg drawing, and all drawings are collected into an html table that
//! shows which tags were understood.

#[cfg(feature = "cli")]
pub mod cli;
pub mod drawing;
pub mod error;
pub mod layout;
pub mod render;
pub mod report;
pub mod settings;
pub mod tagging;
pub mod traffic_sign;
pub mod way;

#[cfg(feature = "cli")]
pub use cli::run;
pub use drawing::{Drawing, FileNamer};
pub use error::{DrawingError, IconError, LoadError, SettingsError};
pub use layout::{DrawingLayout, compute_layout};
pub use render::render_svg;
pub use report::Report;
pub use settings::{DrawSettings, get_draw_settings, write_draw_settings};
pub use tagging::{Example, TagGroup, Tags, load_examples};
pub use traffic_sign::{IconLibrary, TrafficSign};
pub use way::{CrossSection, Way, WayElement};
