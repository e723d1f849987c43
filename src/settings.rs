use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignWidths {
    pub gross: f64,
    pub mittel: f64,
    pub klein: f64,
}

impl Default for SignWidths {
    fn default() -> Self {
        // Round sign diameters in meters.
        Self {
            gross: 0.75,
            mittel: 0.6,
            klein: 0.42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignSettings {
    pub groessenfaktor: f64,
    pub breite: SignWidths,
}

impl Default for SignSettings {
    fn default() -> Self {
        Self {
            groessenfaktor: 2.0,
            breite: SignWidths::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawSettings {
    pub draw_height_meter: f64,
    pub pixel_pro_meter: f64,
    pub schild: SignSettings,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            draw_height_meter: 8.0,
            pixel_pro_meter: 50.0,
            schild: SignSettings::default(),
        }
    }
}

impl DrawSettings {
    /// Canvas height in pixels, before flooring.
    pub fn draw_height_px(&self) -> f64 {
        self.draw_height_meter * self.pixel_pro_meter
    }

    pub fn padding(&self) -> f64 {
        0.1 * self.pixel_pro_meter
    }

    /// Height of one label row, the unit that way and example labels stack by.
    pub fn label_height(&self) -> f64 {
        self.pixel_pro_meter - self.padding()
    }

    pub fn label_font_size(&self) -> f64 {
        0.5 * self.pixel_pro_meter
    }

    /// Pixel width a sign icon is scaled to.
    pub fn sign_width_px(&self) -> f64 {
        self.pixel_pro_meter * self.schild.groessenfaktor * self.schild.breite.gross
    }
}

#[derive(Debug, Deserialize, Default)]
struct SignWidthsFile {
    gross: Option<f64>,
    mittel: Option<f64>,
    klein: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct SignSettingsFile {
    groessenfaktor: Option<f64>,
    breite: Option<SignWidthsFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsFile {
    draw_height_meter: Option<f64>,
    pixel_pro_meter: Option<f64>,
    schild: Option<SignSettingsFile>,
}

/// Defaults, overridden per key by the file at `path` when it exists.
///
/// A missing or broken override file is not fatal: it is reported and the
/// defaults are used for every key it could not supply.
pub fn get_draw_settings(path: Option<&Path>) -> DrawSettings {
    let mut settings = DrawSettings::default();
    let Some(path) = path else {
        return settings;
    };
    if !path.exists() {
        debug!(path = %path.display(), "no settings override, using defaults");
        return settings;
    }
    match read_settings_file(path) {
        Ok(parsed) => apply_overrides(&mut settings, parsed),
        Err(err) => warn!("{err}; using default settings"),
    }
    settings
}

/// Persists `settings` as pretty JSON. Failure only affects later runs, so it is
/// logged and swallowed; the return value says whether the file was written.
pub fn write_draw_settings(settings: &DrawSettings, path: &Path) -> bool {
    match try_write_draw_settings(settings, path) {
        Ok(()) => {
            debug!(path = %path.display(), "settings written");
            true
        }
        Err(err) => {
            warn!("{err}");
            false
        }
    }
}

pub fn try_write_draw_settings(settings: &DrawSettings, path: &Path) -> Result<(), SettingsError> {
    let mut contents = serde_json::to_string_pretty(settings)?;
    contents.push('\n');
    std::fs::write(path, contents).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn read_settings_file(path: &Path) -> Result<SettingsFile, SettingsError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str::<SettingsFile>(&contents) {
        Ok(parsed) => Ok(parsed),
        // Hand-edited files may carry comments or trailing commas.
        Err(json_err) => json5::from_str::<SettingsFile>(&contents).map_err(|_| {
            SettingsError::Parse {
                path: path.to_path_buf(),
                reason: json_err.to_string(),
            }
        }),
    }
}

fn apply_overrides(settings: &mut DrawSettings, parsed: SettingsFile) {
    override_positive(&mut settings.draw_height_meter, parsed.draw_height_meter, "draw_height_meter");
    override_positive(&mut settings.pixel_pro_meter, parsed.pixel_pro_meter, "pixel_pro_meter");
    if let Some(schild) = parsed.schild {
        override_positive(
            &mut settings.schild.groessenfaktor,
            schild.groessenfaktor,
            "schild.groessenfaktor",
        );
        if let Some(breite) = schild.breite {
            override_positive(&mut settings.schild.breite.gross, breite.gross, "schild.breite.gross");
            override_positive(&mut settings.schild.breite.mittel, breite.mittel, "schild.breite.mittel");
            override_positive(&mut settings.schild.breite.klein, breite.klein, "schild.breite.klein");
        }
    }
}

fn override_positive(slot: &mut f64, value: Option<f64>, key: &str) {
    let Some(value) = value else {
        return;
    };
    if value.is_finite() && value > 0.0 {
        *slot = value;
    } else {
        warn!(key, value, "ignoring non-positive setting, keeping {}", *slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("way_section_settings_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn defaults_without_path() {
        let settings = get_draw_settings(None);
        assert_eq!(settings, DrawSettings::default());
        assert!(settings.draw_height_meter > 0.0);
        assert!(settings.pixel_pro_meter > 0.0);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = scratch_dir("missing");
        let settings = get_draw_settings(Some(&dir.join("nope.json")));
        assert_eq!(settings, DrawSettings::default());
    }

    #[test]
    fn override_takes_precedence_per_key() {
        let dir = scratch_dir("override");
        let path = dir.join("settings.json");
        fs::write(&path, r#"{"pixel_pro_meter": 20, "schild": {"breite": {"gross": 0.5}}}"#).unwrap();
        let settings = get_draw_settings(Some(&path));
        assert_eq!(settings.pixel_pro_meter, 20.0);
        assert_eq!(settings.schild.breite.gross, 0.5);
        assert_eq!(settings.draw_height_meter, DrawSettings::default().draw_height_meter);
        assert_eq!(settings.schild.groessenfaktor, 2.0);
    }

    #[test]
    fn non_positive_override_is_rejected() {
        let dir = scratch_dir("negative");
        let path = dir.join("settings.json");
        fs::write(&path, r#"{"draw_height_meter": -3, "pixel_pro_meter": 0}"#).unwrap();
        let settings = get_draw_settings(Some(&path));
        assert_eq!(settings, DrawSettings::default());
    }

    #[test]
    fn lenient_override_syntax() {
        let dir = scratch_dir("json5");
        let path = dir.join("settings.json");
        fs::write(&path, "{\n  // tighter scale\n  pixel_pro_meter: 25,\n}\n").unwrap();
        let settings = get_draw_settings(Some(&path));
        assert_eq!(settings.pixel_pro_meter, 25.0);
    }

    #[test]
    fn malformed_override_uses_defaults() {
        let dir = scratch_dir("malformed");
        let path = dir.join("settings.json");
        fs::write(&path, "{ this is not json").unwrap();
        assert_eq!(get_draw_settings(Some(&path)), DrawSettings::default());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = scratch_dir("round_trip");
        let path = dir.join("settings.json");
        let mut settings = DrawSettings::default();
        settings.draw_height_meter = 6.5;
        settings.schild.breite.klein = 0.31;
        assert!(write_draw_settings(&settings, &path));
        assert_eq!(get_draw_settings(Some(&path)), settings);
    }

    #[test]
    fn unwritable_path_is_not_fatal() {
        let dir = scratch_dir("unwritable");
        let path = dir.join("no_such_dir").join("settings.json");
        assert!(!write_draw_settings(&DrawSettings::default(), &path));
    }

    #[test]
    fn derived_sizes() {
        let settings = DrawSettings::default();
        assert_eq!(settings.padding(), 5.0);
        assert_eq!(settings.label_height(), 45.0);
        assert_eq!(settings.draw_height_px(), 400.0);
        assert_eq!(settings.sign_width_px(), 75.0);
    }
}
