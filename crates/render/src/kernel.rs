//! Kernel contract: the work-group grid, the output image, and the
//! [`RenderKernel`] capability that fills it.

use crate::params::FrameParameters;
use lensing_common::Extent;
use lensing_scene::GpuObject;
use serde::Serialize;

/// 2D work-group dispatch covering an image with square groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchGrid {
    pub groups_x: u32,
    pub groups_y: u32,
    pub group_size: u32,
}

impl DispatchGrid {
    /// `ceil(dimension / group_size)` groups per axis. Boundary groups
    /// overhang the image and must self-clip.
    pub fn covering(extent: Extent, group_size: u32) -> Self {
        let group_size = group_size.max(1);
        Self {
            groups_x: extent.width.div_ceil(group_size),
            groups_y: extent.height.div_ceil(group_size),
            group_size,
        }
    }

    /// Total invocations along each axis, including the overhang.
    pub fn threads(&self) -> (u32, u32) {
        (
            self.groups_x * self.group_size,
            self.groups_y * self.group_size,
        )
    }

    /// Visit every invocation inside `extent` in group order, skipping the
    /// overhanging threads of boundary groups.
    pub fn for_each_invocation(&self, extent: Extent, mut f: impl FnMut(Invocation)) {
        for gy in 0..self.groups_y {
            for gx in 0..self.groups_x {
                for ly in 0..self.group_size {
                    let y = gy * self.group_size + ly;
                    if y >= extent.height {
                        break;
                    }
                    for lx in 0..self.group_size {
                        let x = gx * self.group_size + lx;
                        if x >= extent.width {
                            break;
                        }
                        f(Invocation { x, y });
                    }
                }
            }
        }
    }
}

/// One in-bounds kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub x: u32,
    pub y: u32,
}

/// Fixed-resolution 4-channel, 8-bit-per-channel image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    extent: Extent,
    pixels: Vec<[u8; 4]>,
}

impl RgbaImage {
    pub fn new(extent: Extent) -> Self {
        Self::filled(extent, [0, 0, 0, 0])
    }

    pub fn filled(extent: Extent, color: [u8; 4]) -> Self {
        Self {
            extent,
            pixels: vec![color; extent.area() as usize],
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Write one pixel. Out-of-bounds writes are dropped.
    pub fn put(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn fill(&mut self, color: [u8; 4]) {
        self.pixels.fill(color);
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.extent.width && y < self.extent.height)
            .then(|| y as usize * self.extent.width as usize + x as usize)
    }
}

/// A compute kernel that turns frame parameters and the object array into
/// pixels. The physics behind it is opaque to the rest of the system.
pub trait RenderKernel {
    fn name(&self) -> &str;

    /// Write `image` in place. Invocations outside the image are no-ops.
    fn dispatch(
        &self,
        params: &FrameParameters,
        objects: &[GpuObject],
        grid: DispatchGrid,
        image: &mut RgbaImage,
    );
}

/// Stub kernel writing a deterministic pattern: a horizontal red ramp, a
/// vertical green ramp, and a blue checker of alternating work-groups.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternKernel;

impl PatternKernel {
    /// Pixel the pattern holds at `(x, y)` for a given image and group size.
    pub fn expected(extent: Extent, group_size: u32, x: u32, y: u32) -> [u8; 4] {
        let ramp = |v: u32, len: u32| (v as u64 * 255 / len.saturating_sub(1).max(1) as u64) as u8;
        let group_size = group_size.max(1);
        let checker = (x / group_size + y / group_size) % 2 == 0;
        [
            ramp(x, extent.width),
            ramp(y, extent.height),
            if checker { 255 } else { 0 },
            255,
        ]
    }
}

impl RenderKernel for PatternKernel {
    fn name(&self) -> &str {
        "pattern"
    }

    fn dispatch(
        &self,
        _params: &FrameParameters,
        _objects: &[GpuObject],
        grid: DispatchGrid,
        image: &mut RgbaImage,
    ) {
        let extent = image.extent();
        grid.for_each_invocation(extent, |inv| {
            image.put(
                inv.x,
                inv.y,
                Self::expected(extent, grid.group_size, inv.x, inv.y),
            );
        });
    }
}
