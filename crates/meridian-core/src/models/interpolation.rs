//! Interpolation method and configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// Default maximum distance between interpolated vertices.
pub const DEFAULT_SPACING_METERS: f64 = 100_000.0;

/// Path followed between consecutive vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Straight chord in the host projection; nothing is inserted.
    None,
    /// Shortest path on the WGS84 ellipsoid.
    #[default]
    Geodesic,
    /// Constant-bearing path.
    Rhumb,
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationMethod::None => f.write_str("none"),
            InterpolationMethod::Geodesic => f.write_str("geodesic"),
            InterpolationMethod::Rhumb => f.write_str("rhumb"),
        }
    }
}

impl FromStr for InterpolationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(InterpolationMethod::None),
            "geodesic" | "great-circle" | "greatcircle" => Ok(InterpolationMethod::Geodesic),
            "rhumb" | "loxodrome" => Ok(InterpolationMethod::Rhumb),
            other => Err(format!(
                "Invalid interpolation method: {}. Use none, geodesic, or rhumb",
                other
            )),
        }
    }
}

/// Method plus vertex spacing, passed explicitly to every interpolation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    pub method: InterpolationMethod,
    /// Maximum distance between consecutive vertices, in meters.
    pub spacing: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self { method: InterpolationMethod::Geodesic, spacing: DEFAULT_SPACING_METERS }
    }
}

impl InterpolationConfig {
    pub fn new(method: InterpolationMethod, spacing: f64) -> Self {
        Self { method, spacing }
    }

    pub fn geodesic() -> Self {
        Self::new(InterpolationMethod::Geodesic, DEFAULT_SPACING_METERS)
    }

    pub fn rhumb() -> Self {
        Self::new(InterpolationMethod::Rhumb, DEFAULT_SPACING_METERS)
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Resolve a per-geometry override against this configuration.
    pub fn resolve(&self, method_override: Option<InterpolationMethod>) -> InterpolationConfig {
        match method_override {
            Some(method) => InterpolationConfig { method, spacing: self.spacing },
            None => *self,
        }
    }
}

/// Holder of the current configuration with scoped, self-restoring overrides.
///
/// ```
/// use meridian_core::models::{InterpolationConfig, InterpolationContext, InterpolationMethod};
///
/// let mut context = InterpolationContext::default();
/// {
///     let scoped = context.scoped(InterpolationConfig::rhumb().with_spacing(5_000.0));
///     assert_eq!(scoped.current().method, InterpolationMethod::Rhumb);
/// }
/// assert_eq!(context.current().method, InterpolationMethod::Geodesic);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterpolationContext {
    current: InterpolationConfig,
}

impl InterpolationContext {
    pub fn new(config: InterpolationConfig) -> Self {
        Self { current: config }
    }

    pub fn current(&self) -> InterpolationConfig {
        self.current
    }

    /// Override the configuration until the returned guard is dropped.
    pub fn scoped(&mut self, config: InterpolationConfig) -> ScopedConfig<'_> {
        let previous = std::mem::replace(&mut self.current, config);
        ScopedConfig { context: self, previous }
    }
}

/// Restores the previous configuration on drop.
pub struct ScopedConfig<'a> {
    context: &'a mut InterpolationContext,
    previous: InterpolationConfig,
}

impl Deref for ScopedConfig<'_> {
    type Target = InterpolationContext;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ScopedConfig<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ScopedConfig<'_> {
    fn drop(&mut self) {
        self.context.current = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("Geodesic".parse::<InterpolationMethod>(), Ok(InterpolationMethod::Geodesic));
        assert_eq!("rhumb".parse::<InterpolationMethod>(), Ok(InterpolationMethod::Rhumb));
        assert_eq!("NONE".parse::<InterpolationMethod>(), Ok(InterpolationMethod::None));
        assert!("spline".parse::<InterpolationMethod>().is_err());
    }

    #[test]
    fn test_resolve_override() {
        let config = InterpolationConfig::geodesic().with_spacing(1000.0);
        let resolved = config.resolve(Some(InterpolationMethod::Rhumb));
        assert_eq!(resolved.method, InterpolationMethod::Rhumb);
        assert_eq!(resolved.spacing, 1000.0);
        assert_eq!(config.resolve(None), config);
    }

    #[test]
    fn test_scoped_override_restores() {
        let mut context = InterpolationContext::new(InterpolationConfig::geodesic());
        {
            let mut scoped = context.scoped(InterpolationConfig::rhumb());
            assert_eq!(scoped.current().method, InterpolationMethod::Rhumb);
            {
                let nested = scoped.scoped(InterpolationConfig::new(InterpolationMethod::None, 1.0));
                assert_eq!(nested.current().method, InterpolationMethod::None);
            }
            assert_eq!(scoped.current().method, InterpolationMethod::Rhumb);
        }
        assert_eq!(context.current(), InterpolationConfig::geodesic());
    }
}
