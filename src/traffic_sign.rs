use crate::error::IconError;
use crate::settings::DrawSettings;
use crate::tagging::Tags;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_ICONS_DIR: &str = "img_src";

static SIGN_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[;,]\s*").unwrap());
static COUNTRY_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{2}:").unwrap());

/// Tag keys that carry sign codes, with the side weight their signs get.
const SIGN_KEYS: [(&str, f64); 3] = [
    ("traffic_sign", 0.5),
    ("traffic_sign:forward", 1.0),
    ("traffic_sign:backward", 0.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSign {
    pub code: String,
    /// Horizontal placement as a fraction of the way width, 0 is the left edge.
    pub side_weight: f64,
}

impl TrafficSign {
    pub fn new(code: impl Into<String>, side_weight: f64) -> Self {
        Self {
            code: code.into(),
            side_weight: side_weight.clamp(0.0, 1.0),
        }
    }

    pub fn icon_file_name(&self) -> String {
        format!("VZ_{}.svg", self.code)
    }

    /// Codes name a file inside the icon directory, so they must not carry
    /// path separators or parent references.
    pub fn has_valid_code(&self) -> bool {
        !(self.code.contains('/') || self.code.contains('\\') || self.code.contains(".."))
    }
}

/// Signs declared by a way's tags, in declaration order.
pub fn signs_from_tags(tags: &Tags) -> Vec<TrafficSign> {
    let mut signs = Vec::new();
    for (key, value) in tags.iter() {
        let Some(weight) = SIGN_KEYS
            .iter()
            .find(|(sign_key, _)| *sign_key == key)
            .map(|(_, weight)| *weight)
        else {
            continue;
        };
        for raw in SIGN_SEPARATOR_RE.split(value.trim()) {
            let code = COUNTRY_PREFIX_RE.replace(raw, "");
            let code = code.trim();
            if code.is_empty() || code == "none" {
                continue;
            }
            let sign = TrafficSign::new(code, weight);
            if !sign.has_valid_code() {
                warn!(key, code, "skipping traffic sign with an invalid code");
                continue;
            }
            signs.push(sign);
        }
    }
    signs
}

/// A sign icon scaled for the current settings.
#[derive(Debug, Clone)]
pub struct SignIcon {
    pub width: f64,
    pub height: f64,
    data_uri: String,
}

impl SignIcon {
    pub fn from_svg(data: &[u8], path: &Path, settings: &DrawSettings) -> Result<Self, IconError> {
        let tree = usvg::Tree::from_data(data, &usvg::Options::default()).map_err(|source| {
            IconError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let size = tree.size();
        let intrinsic_width = f64::from(size.width());
        let intrinsic_height = f64::from(size.height());
        if intrinsic_width <= 0.0 || intrinsic_height <= 0.0 {
            return Err(IconError::EmptySize {
                path: path.to_path_buf(),
            });
        }
        let multiplier = settings.sign_width_px() / intrinsic_width;
        Ok(Self {
            width: intrinsic_width * multiplier,
            height: intrinsic_height * multiplier,
            data_uri: format!("data:image/svg+xml;base64,{}", STANDARD.encode(data)),
        })
    }

    /// `<image>` element centered on the given point.
    pub fn svg_element(&self, center_x: f64, center_y: f64) -> String {
        let x = center_x - self.width / 2.0;
        let y = center_y - self.height / 2.0;
        format!(
            "<image x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" href=\"{}\"/>",
            self.width, self.height, self.data_uri
        )
    }
}

/// Loads sign icons from `<dir>/VZ_<code>.svg`, each file at most once.
#[derive(Debug)]
pub struct IconLibrary {
    dir: PathBuf,
    cache: HashMap<String, SignIcon>,
}

impl IconLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn icon_path(&self, sign: &TrafficSign) -> PathBuf {
        self.dir.join(sign.icon_file_name())
    }

    pub fn icon(&mut self, sign: &TrafficSign, settings: &DrawSettings) -> Result<&SignIcon, IconError> {
        if !sign.has_valid_code() {
            return Err(IconError::InvalidCode {
                code: sign.code.clone(),
            });
        }
        if !self.cache.contains_key(&sign.code) {
            let path = self.icon_path(sign);
            let data = std::fs::read(&path).map_err(|source| IconError::Read {
                path: path.clone(),
                source,
            })?;
            let icon = SignIcon::from_svg(&data, &path, settings)?;
            self.cache.insert(sign.code.clone(), icon);
        }
        self.cache
            .get(&sign.code)
            .ok_or_else(|| IconError::EmptySize {
                path: self.icon_path(sign),
            })
    }
}
