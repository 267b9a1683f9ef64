//! crates/draftsmith_core/src/follow.rs
//!
//! The auto-scroll follower: keeps a viewport positioned so the most
//! recently produced text stays visible while a document streams in.
//!
//! The follower is advisory. It never owns the scroll position; it only
//! recommends an action per content-growth notification, and a disabled
//! follower (manual-scroll override) recommends nothing at all.

use std::time::{Duration, Instant};

/// Pixels of already-produced text intentionally kept above the fold so the
/// reader can watch the document being written.
pub const FOLLOW_MARGIN_PX: f32 = 100.0;

/// Distances at or below this dead-band are left alone.
pub const ANIMATE_DEADBAND_PX: f32 = 50.0;

/// Distances beyond this are jumped instantly instead of tweened.
pub const SNAP_DISTANCE_PX: f32 = 500.0;

/// Minimum interval between two animated scroll recommendations.
pub const DEFAULT_ANIMATE_THROTTLE: Duration = Duration::from_millis(120);

/// A point-in-time measurement of the scrollable viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_top: f32,
    pub scroll_height: f32,
    pub client_height: f32,
}

/// What the caller should do with the viewport after a growth event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAction {
    /// Leave the viewport where it is.
    Hold,
    /// Tween toward the target offset.
    Animate(f32),
    /// Jump to the target offset without animation.
    Snap(f32),
}

#[derive(Debug)]
pub struct ScrollFollower {
    enabled: bool,
    animate_throttle: Duration,
    last_animate: Option<Instant>,
}

impl Default for ScrollFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollFollower {
    pub fn new() -> Self {
        Self::with_throttle(DEFAULT_ANIMATE_THROTTLE)
    }

    pub fn with_throttle(animate_throttle: Duration) -> Self {
        Self {
            enabled: true,
            animate_throttle,
            last_animate: None,
        }
    }

    /// Manual-scroll override: a disabled follower recommends nothing and
    /// never fights the user.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Computes the recommendation for one content-growth notification.
    pub fn on_growth(&mut self, metrics: ViewportMetrics) -> ScrollAction {
        if !self.enabled {
            return ScrollAction::Hold;
        }

        let target =
            (metrics.scroll_height - metrics.client_height - FOLLOW_MARGIN_PX).max(0.0);
        let distance = (target - metrics.scroll_top).abs();

        if distance <= ANIMATE_DEADBAND_PX {
            return ScrollAction::Hold;
        }

        if distance > SNAP_DISTANCE_PX {
            // A long tween is more distracting than the jump it avoids.
            self.last_animate = None;
            return ScrollAction::Snap(target);
        }

        let now = Instant::now();
        if let Some(last) = self.last_animate {
            if now.duration_since(last) < self.animate_throttle {
                return ScrollAction::Hold;
            }
        }
        self.last_animate = Some(now);
        ScrollAction::Animate(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follower() -> ScrollFollower {
        ScrollFollower::with_throttle(Duration::ZERO)
    }

    fn metrics(scroll_top: f32, scroll_height: f32) -> ViewportMetrics {
        ViewportMetrics {
            scroll_top,
            scroll_height,
            client_height: 600.0,
        }
    }

    #[test]
    fn holds_inside_the_dead_band() {
        // Target is 2000 - 600 - 100 = 1300; 40px away is within the band.
        let action = follower().on_growth(metrics(1260.0, 2000.0));
        assert_eq!(action, ScrollAction::Hold);
    }

    #[test]
    fn animates_in_the_mid_range() {
        let action = follower().on_growth(metrics(1100.0, 2000.0));
        assert_eq!(action, ScrollAction::Animate(1300.0));
    }

    #[test]
    fn snaps_across_large_distances() {
        let action = follower().on_growth(metrics(0.0, 2000.0));
        assert_eq!(action, ScrollAction::Snap(1300.0));
    }

    #[test]
    fn target_never_goes_negative_for_short_content() {
        let action = follower().on_growth(ViewportMetrics {
            scroll_top: 400.0,
            scroll_height: 500.0,
            client_height: 600.0,
        });
        assert_eq!(action, ScrollAction::Animate(0.0));
    }

    #[test]
    fn disabled_follower_recommends_nothing() {
        let mut f = follower();
        f.set_enabled(false);
        let action = f.on_growth(metrics(0.0, 5000.0));
        assert_eq!(action, ScrollAction::Hold);
    }

    #[test]
    fn animate_bursts_are_throttled() {
        let mut f = ScrollFollower::with_throttle(Duration::from_secs(3600));
        assert_eq!(
            f.on_growth(metrics(1100.0, 2000.0)),
            ScrollAction::Animate(1300.0)
        );
        // Immediately after, the follower stays quiet.
        assert_eq!(f.on_growth(metrics(1100.0, 2010.0)), ScrollAction::Hold);
        // A snap-distance jump is never throttled.
        assert_eq!(
            f.on_growth(metrics(0.0, 2000.0)),
            ScrollAction::Snap(1300.0)
        );
    }
}
