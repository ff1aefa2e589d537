// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Animated pan and zoom for coordinate jumps.

use std::time::Duration;

use wfs_client::LonLat;

/// Smoothstep easing: slow start, slow finish.
#[must_use]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    3.0 * t * t - 2.0 * t * t * t
}

/// View state at one point of an animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFrame {
    pub center: LonLat,
    pub zoom: f64,
    pub finished: bool,
}

/// Pan and zoom from one view to another.
///
/// The centre moves in projected metres so the path is straight on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAnimation {
    from: [f64; 2],
    to: [f64; 2],
    from_zoom: f64,
    to_zoom: f64,
    duration: Duration,
}

impl ViewAnimation {
    #[must_use]
    pub fn new(from: LonLat, from_zoom: f64, to: LonLat, to_zoom: f64, duration: Duration) -> Self {
        Self {
            from: from.to_mercator(),
            to: to.to_mercator(),
            from_zoom,
            to_zoom,
            duration,
        }
    }

    /// Target centre
    #[must_use]
    pub fn target(&self) -> LonLat {
        LonLat::from_mercator(self.to)
    }

    /// View after `elapsed` time.
    #[must_use]
    pub fn frame(&self, elapsed: Duration) -> ViewFrame {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };

        if progress >= 1.0 {
            return ViewFrame {
                center: self.target(),
                zoom: self.to_zoom,
                finished: true,
            };
        }

        let t = ease_in_out(progress);
        let x = self.from[0] + (self.to[0] - self.from[0]) * t;
        let y = self.from[1] + (self.to[1] - self.from[1]) * t;
        ViewFrame {
            center: LonLat::from_mercator([x, y]),
            zoom: self.from_zoom + (self.to_zoom - self.from_zoom) * t,
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert!(ease_in_out(0.25) < 0.25);
        assert!(ease_in_out(0.75) > 0.75);
        assert_eq!(ease_in_out(2.0), 1.0);
    }

    #[test]
    fn test_animation_reaches_target() {
        let anim = ViewAnimation::new(
            LonLat::new(-3.432, 54.910),
            6.0,
            LonLat::new(-3.4, 54.9),
            12.0,
            Duration::from_millis(1000),
        );

        let start = anim.frame(Duration::ZERO);
        assert!(!start.finished);
        assert!(close(start.zoom, 6.0));
        assert!(close(start.center.lon, -3.432));

        let middle = anim.frame(Duration::from_millis(500));
        assert!(close(middle.zoom, 9.0));

        let end = anim.frame(Duration::from_millis(1200));
        assert!(end.finished);
        assert!(close(end.zoom, 12.0));
        assert!(close(end.center.lat, 54.9));
        assert!(close(end.center.lon, -3.4));
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let anim = ViewAnimation::new(LonLat::new(0.0, 0.0), 6.0, LonLat::new(1.0, 1.0), 12.0, Duration::ZERO);
        assert!(anim.frame(Duration::ZERO).finished);
    }
}
