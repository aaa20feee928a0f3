/// Pixel dimensions of the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// RGBA8 pixel grid, row-major with the top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    viewport: Viewport,
    pixels: Vec<u8>,
}

impl RasterBuffer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            pixels: vec![0; viewport.pixel_count() * 4],
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn width(&self) -> u32 {
        self.viewport.width
    }

    pub fn height(&self) -> u32 {
        self.viewport.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reallocates the backing storage when the viewport changed. Returns
    /// `true` if a resize happened; previous contents are discarded.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if viewport == self.viewport {
            return false;
        }

        self.viewport = viewport;
        self.pixels = vec![0; viewport.pixel_count() * 4];
        true
    }

    /// Writes every pixel from a closure that receives `(x, y)`.
    pub fn fill_with(&mut self, mut shade: impl FnMut(u32, u32) -> [u8; 4]) {
        let width = self.viewport.width.max(1) as usize;
        for (index, pixel) in self.pixels.chunks_exact_mut(4).enumerate() {
            let x = (index % width) as u32;
            let y = (index / width) as u32;
            pixel.copy_from_slice(&shade(x, y));
        }
    }
}

/// Source of the viewport size, sampled once per step.
pub trait Surface: Send {
    fn viewport(&self) -> Viewport;
}

/// Headless surface with constant dimensions.
#[derive(Debug, Clone, Copy)]
pub struct FixedSurface(pub Viewport);

impl Surface for FixedSurface {
    fn viewport(&self) -> Viewport {
        self.0
    }
}

/// Produces the image content for one virtual time.
///
/// Implementations must write every pixel of `target` and be deterministic for
/// identical `(time, viewport)` inputs.
pub trait ComputePass: Send {
    fn shade(&self, time: f64, target: &mut RasterBuffer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_only_when_dimensions_change() {
        let mut raster = RasterBuffer::new(Viewport::new(2, 2));
        assert!(!raster.resize(Viewport::new(2, 2)));
        assert!(raster.resize(Viewport::new(3, 1)));
        assert_eq!(raster.pixels().len(), 12);
    }

    #[test]
    fn fill_with_visits_each_pixel_in_row_order() {
        let mut raster = RasterBuffer::new(Viewport::new(3, 2));
        raster.fill_with(|x, y| [x as u8, y as u8, 0, 255]);

        let px = raster.pixels();
        assert_eq!(&px[0..4], &[0, 0, 0, 255]);
        assert_eq!(&px[8..12], &[2, 0, 0, 255]);
        assert_eq!(&px[12..16], &[0, 1, 0, 255]);
    }
}
