//! Terrain ranges: rules that weigh how strongly a surface point belongs to a
//! terrain type.

use serde::{Deserialize, Serialize};

use crate::Color;

/// Offset added to configured temperatures to move them into the internal scale
/// that [`TerrainRange::factor`] receives.
pub const TEMPERATURE_OFFSET: f64 = 257.0;

/// Bound or variance value meaning "not constrained" in [`GaussianRangeDef`].
pub const UNBOUNDED: f64 = -1.0;

/// A classification rule producing a weight in `[0, 1]` and the two colors it
/// contributes to the blend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RangeData", into = "RangeData")]
pub enum TerrainRange {
    Uniform(UniformTerrainRange),
    Gaussian(GaussianTerrainRange),
}

impl TerrainRange {
    /// Weight of this range at a surface point.
    ///
    /// `x`/`y` identify the point (texel coordinates for map generation) and do not
    /// affect the built-in range kinds. `temperature` is in the internal scale.
    pub fn factor(&self, x: i32, y: i32, height: f64, slope: f64, temperature: f64) -> f64 {
        match self {
            TerrainRange::Uniform(range) => range.factor(x, y, height, slope, temperature),
            TerrainRange::Gaussian(range) => range.factor(x, y, height, slope, temperature),
        }
    }

    pub fn terrain_color(&self) -> Color {
        match self {
            TerrainRange::Uniform(range) => range.color,
            TerrainRange::Gaussian(range) => range.color,
        }
    }

    pub fn specular_color(&self) -> Color {
        match self {
            TerrainRange::Uniform(range) => range.specular,
            TerrainRange::Gaussian(range) => range.specular,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TerrainRange::Uniform(range) => range.name.as_deref(),
            TerrainRange::Gaussian(range) => range.name.as_deref(),
        }
    }

    /// Checks that every weight this range can produce is finite and in `[0, 1]`.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            TerrainRange::Uniform(range) => {
                if !(0.0..=1.0).contains(&range.factor) {
                    return Err(format!("factor {} outside [0, 1]", range.factor));
                }
                if !(range.min_height.is_finite() && range.max_height.is_finite()) {
                    return Err("uniform bounds must be finite".to_string());
                }
                Ok(())
            }
            TerrainRange::Gaussian(range) => {
                for (axis, gaussian) in [
                    ("height", &range.height),
                    ("slope", &range.slope),
                    ("temperature", &range.temperature),
                ] {
                    if let Some(variance) = gaussian.variance
                        && (variance == 0.0 || !variance.is_finite())
                    {
                        return Err(format!("{axis} variance must be non-zero and finite"));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Serialized form of [`TerrainRange`].
///
/// `Gaussian` is the hand-written format with `-1` markers. A range holding a
/// real `-1` bound or variance cannot be written that way and is stored as
/// `GaussianAxes`, which keeps every axis as explicit options.
#[derive(Serialize, Deserialize)]
enum RangeData {
    Uniform(UniformTerrainRange),
    Gaussian(GaussianRangeDef),
    GaussianAxes(GaussianTerrainRange),
}

impl From<RangeData> for TerrainRange {
    fn from(data: RangeData) -> Self {
        match data {
            RangeData::Uniform(range) => TerrainRange::Uniform(range),
            RangeData::Gaussian(def) => TerrainRange::Gaussian(def.into()),
            RangeData::GaussianAxes(range) => TerrainRange::Gaussian(range),
        }
    }
}

impl From<TerrainRange> for RangeData {
    fn from(range: TerrainRange) -> Self {
        match range {
            TerrainRange::Uniform(range) => RangeData::Uniform(range),
            TerrainRange::Gaussian(range) if range.collides_with_marker() => {
                RangeData::GaussianAxes(range)
            }
            TerrainRange::Gaussian(range) => RangeData::Gaussian(range.into()),
        }
    }
}

impl From<UniformTerrainRange> for TerrainRange {
    fn from(range: UniformTerrainRange) -> Self {
        TerrainRange::Uniform(range)
    }
}

impl From<GaussianTerrainRange> for TerrainRange {
    fn from(range: GaussianTerrainRange) -> Self {
        TerrainRange::Gaussian(range)
    }
}

/// Constant weight strictly between two heights.
///
/// Unlike [`GaussianTerrainRange`], `-1` carries no special meaning here: both
/// bounds are ordinary values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformTerrainRange {
    #[serde(default)]
    pub name: Option<String>,
    /// Exclusive lower height bound.
    pub min_height: f64,
    /// Exclusive upper height bound.
    pub max_height: f64,
    /// Weight inside the band, in `[0, 1]`.
    pub factor: f64,
    pub color: Color,
    pub specular: Color,
}

impl UniformTerrainRange {
    pub fn new(min_height: f64, max_height: f64, factor: f64, color: Color, specular: Color) -> Self {
        Self {
            name: None,
            min_height,
            max_height,
            factor,
            color,
            specular,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn factor(&self, _x: i32, _y: i32, height: f64, _slope: f64, _temperature: f64) -> f64 {
        if self.min_height < height && height < self.max_height {
            self.factor
        } else {
            0.0
        }
    }
}

/// One axis (height, slope or temperature) of a Gaussian range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianAxis {
    /// Inclusive hard lower bound, `None` when unconstrained.
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive hard upper bound, `None` when unconstrained.
    #[serde(default)]
    pub max: Option<f64>,
    /// Value at which this axis adds no penalty.
    pub median: f64,
    /// Penalty scale; `None` drops the axis from the falloff.
    #[serde(default)]
    pub variance: Option<f64>,
}

impl GaussianAxis {
    /// No hard bounds and no penalty.
    pub const FREE: Self = Self {
        min: None,
        max: None,
        median: 0.0,
        variance: None,
    };

    /// Penalized by distance from `median`, without hard bounds.
    pub fn around(median: f64, variance: f64) -> Self {
        Self {
            median,
            variance: Some(variance),
            ..Self::FREE
        }
    }

    /// Rejects values below `min`.
    pub fn at_least(self, min: f64) -> Self {
        Self {
            min: Some(min),
            ..self
        }
    }

    /// Rejects values above `max`.
    pub fn at_most(self, max: f64) -> Self {
        Self {
            max: Some(max),
            ..self
        }
    }

    fn shifted(self, offset: f64) -> Self {
        Self {
            min: self.min.map(|v| v + offset),
            max: self.max.map(|v| v + offset),
            median: self.median + offset,
            variance: self.variance,
        }
    }

    /// Whether the `-1` marker form would read a real value of this axis back
    /// as "unconstrained".
    fn collides_with_marker(&self, offset: f64) -> bool {
        let marker = |v: Option<f64>| v.is_some_and(|v| v - offset == UNBOUNDED);
        marker(self.min) || marker(self.max) || self.variance == Some(UNBOUNDED)
    }

    fn from_sentinel(min: f64, max: f64, median: f64, variance: f64, offset: f64) -> Self {
        let bound = |v: f64| (v != UNBOUNDED).then_some(v + offset);
        Self {
            min: bound(min),
            max: bound(max),
            median: median + offset,
            variance: (variance != UNBOUNDED).then_some(variance),
        }
    }

    /// Sentinel form `(min, max, median, variance)` with `offset` removed.
    fn to_sentinel(self, offset: f64) -> (f64, f64, f64, f64) {
        let bound = |v: Option<f64>| v.map_or(UNBOUNDED, |v| v - offset);
        (
            bound(self.min),
            bound(self.max),
            self.median - offset,
            self.variance.unwrap_or(UNBOUNDED),
        )
    }

    fn admits(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    /// `|median - value| / |variance|`, or 0 for an ignored axis.
    fn penalty(&self, value: f64) -> f64 {
        self.variance
            .map_or(0.0, |variance| ((self.median - value) / variance).abs())
    }
}

/// Weight that decays exponentially with the distance from a median on each axis,
/// cut to zero outside hard bounds.
///
/// Built in code with [`colored`](Self::colored) and the `with_*` axis setters,
/// or from a hand-written [`GaussianRangeDef`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianTerrainRange {
    #[serde(default)]
    pub name: Option<String>,
    pub height: GaussianAxis,
    pub slope: GaussianAxis,
    /// Stored in the internal temperature scale.
    pub temperature: GaussianAxis,
    pub color: Color,
    pub specular: Color,
}

impl GaussianTerrainRange {
    pub fn new(def: GaussianRangeDef) -> Self {
        Self::from(def)
    }

    /// A range with every axis free: weight 1 everywhere.
    pub fn colored(color: Color, specular: Color) -> Self {
        Self::from(GaussianRangeDef {
            color,
            specular,
            ..GaussianRangeDef::default()
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_height(mut self, axis: GaussianAxis) -> Self {
        self.height = axis;
        self
    }

    pub fn with_slope(mut self, axis: GaussianAxis) -> Self {
        self.slope = axis;
        self
    }

    /// Sets the temperature axis from configuration-scale values.
    pub fn with_temperature(mut self, axis: GaussianAxis) -> Self {
        self.temperature = axis.shifted(TEMPERATURE_OFFSET);
        self
    }

    fn collides_with_marker(&self) -> bool {
        self.height.collides_with_marker(0.0)
            || self.slope.collides_with_marker(0.0)
            || self.temperature.collides_with_marker(TEMPERATURE_OFFSET)
    }

    pub fn factor(&self, _x: i32, _y: i32, height: f64, slope: f64, temperature: f64) -> f64 {
        if !(self.height.admits(height)
            && self.slope.admits(slope)
            && self.temperature.admits(temperature))
        {
            return 0.0;
        }

        let penalty = self.height.penalty(height)
            + self.slope.penalty(slope)
            + self.temperature.penalty(temperature);
        (-penalty).exp()
    }
}

/// Definition of a [`GaussianTerrainRange`] as written in palettes.
///
/// Any bound or variance set to [`UNBOUNDED`] (`-1`) is ignored, independently
/// per axis and side. Temperatures are given in the configuration scale and
/// shifted by [`TEMPERATURE_OFFSET`] on construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianRangeDef {
    #[serde(default)]
    pub name: Option<String>,
    pub min_height: f64,
    pub max_height: f64,
    pub median_height: f64,
    pub height_variance: f64,
    pub min_slope: f64,
    pub max_slope: f64,
    pub median_slope: f64,
    pub slope_variance: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub median_temperature: f64,
    pub temperature_variance: f64,
    pub color: Color,
    pub specular: Color,
}

impl Default for GaussianRangeDef {
    /// Every axis unconstrained and ignored: weight 1 everywhere.
    fn default() -> Self {
        Self {
            name: None,
            min_height: UNBOUNDED,
            max_height: UNBOUNDED,
            median_height: 0.0,
            height_variance: UNBOUNDED,
            min_slope: UNBOUNDED,
            max_slope: UNBOUNDED,
            median_slope: 0.0,
            slope_variance: UNBOUNDED,
            min_temperature: UNBOUNDED,
            max_temperature: UNBOUNDED,
            median_temperature: 0.0,
            temperature_variance: UNBOUNDED,
            color: Color::BLACK,
            specular: Color::BLACK,
        }
    }
}

impl From<GaussianRangeDef> for GaussianTerrainRange {
    fn from(def: GaussianRangeDef) -> Self {
        Self {
            name: def.name,
            height: GaussianAxis::from_sentinel(
                def.min_height,
                def.max_height,
                def.median_height,
                def.height_variance,
                0.0,
            ),
            slope: GaussianAxis::from_sentinel(
                def.min_slope,
                def.max_slope,
                def.median_slope,
                def.slope_variance,
                0.0,
            ),
            temperature: GaussianAxis::from_sentinel(
                def.min_temperature,
                def.max_temperature,
                def.median_temperature,
                def.temperature_variance,
                TEMPERATURE_OFFSET,
            ),
            color: def.color,
            specular: def.specular,
        }
    }
}

/// Lossy when a real bound or variance equals [`UNBOUNDED`].
impl From<GaussianTerrainRange> for GaussianRangeDef {
    fn from(range: GaussianTerrainRange) -> Self {
        let (min_height, max_height, median_height, height_variance) =
            range.height.to_sentinel(0.0);
        let (min_slope, max_slope, median_slope, slope_variance) = range.slope.to_sentinel(0.0);
        let (min_temperature, max_temperature, median_temperature, temperature_variance) =
            range.temperature.to_sentinel(TEMPERATURE_OFFSET);
        Self {
            name: range.name,
            min_height,
            max_height,
            median_height,
            height_variance,
            min_slope,
            max_slope,
            median_slope,
            slope_variance,
            min_temperature,
            max_temperature,
            median_temperature,
            temperature_variance,
            color: range.color,
            specular: range.specular,
        }
    }
}
