use lensing_common::Extent;
use serde::Serialize;

/// Destination rectangle of the composited image inside a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px - self.x < self.width && py - self.y < self.height
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }
}

/// Fit `image` inside `target` preserving the image's aspect ratio.
///
/// A wider-than-target image spans the full target width and is centered
/// vertically; otherwise it spans the full height and is centered
/// horizontally. Integer math, truncating. Both dimensions are at least one
/// pixel for a non-empty target. Returns `None` when either extent is empty.
pub fn letterbox(target: Extent, image: Extent) -> Option<Viewport> {
    if target.is_empty() || image.is_empty() {
        return None;
    }
    let (tw, th) = (target.width as u64, target.height as u64);
    let (iw, ih) = (image.width as u64, image.height as u64);

    let viewport = if iw * th > tw * ih {
        let h = (ih * tw / iw).clamp(1, th);
        Viewport {
            x: 0,
            y: ((th - h) / 2) as u32,
            width: target.width,
            height: h as u32,
        }
    } else {
        let w = (iw * th / ih).clamp(1, tw);
        Viewport {
            x: ((tw - w) / 2) as u32,
            y: 0,
            width: w as u32,
            height: target.height,
        }
    };
    Some(viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: Extent = Extent::new(960, 720);

    #[test]
    fn wide_target_gets_side_bars() {
        let vp = letterbox(Extent::new(1920, 1080), IMAGE).unwrap();
        assert_eq!(
            vp,
            Viewport {
                x: 240,
                y: 0,
                width: 1440,
                height: 1080
            }
        );
    }

    #[test]
    fn tall_target_gets_top_and_bottom_bars() {
        let vp = letterbox(Extent::new(800, 1000), IMAGE).unwrap();
        assert_eq!(
            vp,
            Viewport {
                x: 0,
                y: 200,
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn matching_aspect_fills_target() {
        let vp = letterbox(Extent::new(480, 360), IMAGE).unwrap();
        assert_eq!(
            vp,
            Viewport {
                x: 0,
                y: 0,
                width: 480,
                height: 360
            }
        );
    }

    #[test]
    fn zero_area_target_has_no_viewport() {
        assert_eq!(letterbox(Extent::new(0, 1080), IMAGE), None);
        assert_eq!(letterbox(Extent::new(1920, 0), IMAGE), None);
        assert_eq!(letterbox(Extent::new(0, 0), IMAGE), None);
    }

    #[test]
    fn sliver_target_keeps_one_pixel() {
        let vp = letterbox(Extent::new(1, 1000), IMAGE).unwrap();
        assert_eq!(vp.width, 1);
        assert_eq!(vp.height, 1);
        assert_eq!(vp.y, 499);
    }

    #[test]
    fn viewport_is_centered_and_inside_target() {
        for (w, h) in [(1, 1), (3, 7), (1280, 720), (641, 1999), (4096, 17)] {
            let target = Extent::new(w, h);
            let vp = letterbox(target, IMAGE).unwrap();
            assert!(vp.x + vp.width <= w);
            assert!(vp.y + vp.height <= h);
            let left = vp.x;
            let right = w - (vp.x + vp.width);
            let top = vp.y;
            let bottom = h - (vp.y + vp.height);
            assert!(right.abs_diff(left) <= 1);
            assert!(bottom.abs_diff(top) <= 1);
            assert!(vp.width == w || vp.height == h);
        }
    }

    #[test]
    fn contains_respects_edges() {
        let vp = Viewport {
            x: 10,
            y: 20,
            width: 5,
            height: 5,
        };
        assert!(vp.contains(10, 20));
        assert!(vp.contains(14, 24));
        assert!(!vp.contains(15, 24));
        assert!(!vp.contains(9, 20));
    }
}
