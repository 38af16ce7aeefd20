//! Builder configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::node::MAX_COMPACT_LEAF;
use crate::util::{Error, Result};

/// Default leaf-size threshold.
pub const DEFAULT_LEAF_SIZE: usize = 8;

/// Partitioning policy used at every split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitMode {
    /// Surface Area Heuristic; may refuse to split.
    #[default]
    Sah,
    /// Sort by centroid, cut at the middle index.
    ObjectMedian,
    /// Partition at the midpoint of the centroid extent.
    SpatialMedian,
}

impl SplitMode {
    pub const ALL: [SplitMode; 3] = [Self::Sah, Self::ObjectMedian, Self::SpatialMedian];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sah => "SAH",
            Self::ObjectMedian => "Object Median",
            Self::SpatialMedian => "Spatial Median",
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SplitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sah" => Ok(Self::Sah),
            "object-median" | "object_median" | "object" => Ok(Self::ObjectMedian),
            "spatial-median" | "spatial_median" | "spatial" => Ok(Self::SpatialMedian),
            _ => Err(Error::UnsupportedSplitMode(s.to_string())),
        }
    }
}

/// Numeric selector: 0 = SAH, 1 = object median, 2 = spatial median.
impl TryFrom<u32> for SplitMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Sah),
            1 => Ok(Self::ObjectMedian),
            2 => Ok(Self::SpatialMedian),
            other => Err(Error::UnsupportedSplitMode(other.to_string())),
        }
    }
}

/// SAH cost constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SahParams {
    /// Cost of testing one bounding box.
    pub cost_box: f32,
    /// Cost of intersecting one triangle.
    pub cost_tri: f32,
}

impl Default for SahParams {
    fn default() -> Self {
        Self {
            cost_box: 1.0,
            cost_tri: 2.0,
        }
    }
}

/// Everything the builder needs besides the triangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    pub split_mode: SplitMode,
    /// Ranges with at most this many triangles become leaves.
    pub leaf_size: usize,
    pub sah: SahParams,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            split_mode: SplitMode::default(),
            leaf_size: DEFAULT_LEAF_SIZE,
            sah: SahParams::default(),
        }
    }
}

impl BvhConfig {
    /// Default config with the given split mode.
    pub fn new(split_mode: SplitMode) -> Self {
        Self { split_mode, ..Self::default() }
    }

    pub fn with_split_mode(mut self, split_mode: SplitMode) -> Self {
        self.split_mode = split_mode;
        self
    }

    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    pub fn with_sah(mut self, cost_box: f32, cost_tri: f32) -> Self {
        self.sah = SahParams { cost_box, cost_tri };
        self
    }

    /// Parse a JSON config; missing fields take their defaults.
    ///
    /// `split_mode` accepts the names understood by [`SplitMode::from_str`]
    /// or the numeric selector.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let split_mode = match value.as_object_mut().and_then(|o| o.remove("split_mode")) {
            None => None,
            Some(serde_json::Value::String(name)) => Some(name.parse::<SplitMode>()?),
            Some(serde_json::Value::Number(n)) => match n.as_u64().and_then(|v| u32::try_from(v).ok()) {
                Some(v) => Some(SplitMode::try_from(v)?),
                None => return Err(Error::UnsupportedSplitMode(n.to_string())),
            },
            Some(other) => return Err(Error::UnsupportedSplitMode(other.to_string())),
        };

        let mut config: Self =
            serde_json::from_value(value).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(mode) = split_mode {
            config.split_mode = mode;
        }
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject configurations that cannot yield a compactable hierarchy.
    pub fn validate(&self) -> Result<()> {
        if self.leaf_size == 0 {
            return Err(Error::InvalidConfig("leaf_size must be at least 1".into()));
        }
        if self.leaf_size > MAX_COMPACT_LEAF {
            return Err(Error::InvalidConfig(format!(
                "leaf_size {} exceeds the compact leaf limit of {}",
                self.leaf_size, MAX_COMPACT_LEAF
            )));
        }
        let SahParams { cost_box, cost_tri } = self.sah;
        if !(cost_box.is_finite() && cost_box >= 0.0 && cost_tri.is_finite() && cost_tri > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "SAH costs must be finite with cost_box >= 0 and cost_tri > 0 (got {cost_box}, {cost_tri})"
            )));
        }
        Ok(())
    }
}
