//! Pointer position in physical pixels
//!
//! Platform queries are injected through [`PointerPlatform`] so the locator
//! can run against fakes. Resolution walks an ordered strategy list and the
//! first strategy that yields a position wins.

use std::fmt;
use std::sync::Arc;

/// Process-wide pointer and DPI queries of the host platform.
/// Every method answers `None` when the query is unsupported or fails.
pub trait PointerPlatform: Send + Sync {
    /// Pointer position already expressed in device pixels
    fn physical_position(&self) -> Option<(i32, i32)>;

    /// Pointer position in the DPI-scaled logical space
    fn logical_position(&self) -> Option<(i32, i32)>;

    /// Effective scale of the display containing the logical point
    fn monitor_scale(&self, x: i32, y: i32) -> Option<f64>;

    /// System-wide scale, used when per-monitor scale is unavailable
    fn system_scale(&self) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    NativePhysical,
    ScaledLogical,
    None,
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMethod::NativePhysical => write!(f, "native-physical"),
            ResolutionMethod::ScaledLogical => write!(f, "scaled-logical"),
            ResolutionMethod::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSample {
    pub x: i32,
    pub y: i32,
    pub method: ResolutionMethod,
    pub scale_used: Option<f64>,
}

impl CursorSample {
    /// "No cursor". The (0, 0) coordinates are not a position.
    pub fn unresolved() -> Self {
        Self {
            x: 0,
            y: 0,
            method: ResolutionMethod::None,
            scale_used: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.method != ResolutionMethod::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    NativePhysical,
    ScaledLogical,
}

impl LocateStrategy {
    pub const DEFAULT_ORDER: [LocateStrategy; 2] =
        [LocateStrategy::NativePhysical, LocateStrategy::ScaledLogical];

    fn attempt(self, platform: &dyn PointerPlatform) -> Option<CursorSample> {
        match self {
            LocateStrategy::NativePhysical => {
                let (x, y) = platform.physical_position()?;
                Some(CursorSample {
                    x,
                    y,
                    method: ResolutionMethod::NativePhysical,
                    scale_used: Some(1.0),
                })
            }
            LocateStrategy::ScaledLogical => {
                let (lx, ly) = platform.logical_position()?;
                let scale = platform
                    .monitor_scale(lx, ly)
                    .or_else(|| platform.system_scale())
                    .filter(|s| s.is_finite() && *s > 0.0)
                    .unwrap_or(1.0);
                Some(CursorSample {
                    x: (lx as f64 * scale).round() as i32,
                    y: (ly as f64 * scale).round() as i32,
                    method: ResolutionMethod::ScaledLogical,
                    scale_used: Some(scale),
                })
            }
        }
    }
}

pub struct PointerLocator {
    platform: Arc<dyn PointerPlatform>,
    strategies: Vec<LocateStrategy>,
}

impl PointerLocator {
    pub fn new(platform: Arc<dyn PointerPlatform>) -> Self {
        Self::with_strategies(platform, LocateStrategy::DEFAULT_ORDER.to_vec())
    }

    pub fn with_strategies(platform: Arc<dyn PointerPlatform>, strategies: Vec<LocateStrategy>) -> Self {
        Self {
            platform,
            strategies,
        }
    }

    pub fn locate(&self) -> CursorSample {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.attempt(self.platform.as_ref()))
            .unwrap_or_else(CursorSample::unresolved)
    }

    /// Unscaled logical position, the overlay's last-chance fallback
    pub fn raw_logical(&self) -> Option<(i32, i32)> {
        self.platform.logical_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakePointer;

    #[test]
    fn test_native_physical_wins() {
        let pointer = FakePointer {
            physical: Some((2000, 300)),
            logical: Some((1000, 150)),
            monitor_scale: Some(2.0),
            ..Default::default()
        };
        let sample = PointerLocator::new(Arc::new(pointer)).locate();

        assert_eq!((sample.x, sample.y), (2000, 300));
        assert_eq!(sample.method, ResolutionMethod::NativePhysical);
        assert_eq!(sample.scale_used, Some(1.0));
    }

    #[test]
    fn test_scaled_logical_uses_monitor_scale() {
        let pointer = FakePointer {
            logical: Some((1001, 150)),
            monitor_scale: Some(1.5),
            system_scale: Some(2.0),
            ..Default::default()
        };
        let sample = PointerLocator::new(Arc::new(pointer)).locate();

        assert_eq!((sample.x, sample.y), (1502, 225));
        assert_eq!(sample.method, ResolutionMethod::ScaledLogical);
        assert_eq!(sample.scale_used, Some(1.5));
    }

    #[test]
    fn test_scaled_logical_falls_back_to_system_scale() {
        let pointer = FakePointer {
            logical: Some((100, 40)),
            system_scale: Some(1.25),
            ..Default::default()
        };
        let sample = PointerLocator::new(Arc::new(pointer)).locate();

        assert_eq!((sample.x, sample.y), (125, 50));
        assert_eq!(sample.scale_used, Some(1.25));
    }

    #[test]
    fn test_scaled_logical_without_any_scale() {
        let pointer = FakePointer {
            logical: Some((100, 40)),
            ..Default::default()
        };
        let sample = PointerLocator::new(Arc::new(pointer)).locate();
        assert_eq!((sample.x, sample.y), (100, 40));
        assert_eq!(sample.scale_used, Some(1.0));
    }

    #[test]
    fn test_nothing_available() {
        let locator = PointerLocator::new(Arc::new(FakePointer::default()));
        let sample = locator.locate();

        assert!(!sample.is_resolved());
        assert_eq!(sample, CursorSample::unresolved());
        assert_eq!(locator.raw_logical(), None);
    }

    #[test]
    fn test_strategy_order_is_respected() {
        let pointer = FakePointer {
            physical: Some((10, 10)),
            logical: Some((5, 5)),
            system_scale: Some(3.0),
            ..Default::default()
        };
        let locator = PointerLocator::with_strategies(
            Arc::new(pointer),
            vec![LocateStrategy::ScaledLogical, LocateStrategy::NativePhysical],
        );
        let sample = locator.locate();

        assert_eq!(sample.method, ResolutionMethod::ScaledLogical);
        assert_eq!((sample.x, sample.y), (15, 15));
    }
}
