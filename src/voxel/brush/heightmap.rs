//! Height samples used by heightfield brushes and terrain import

use std::path::Path;

use crate::core::types::Result;
use crate::core::Error;

/// Row-major grid of normalized heights in [0, 1]
#[derive(Clone, Debug, PartialEq)]
pub struct Heightmap {
    width: usize,
    depth: usize,
    samples: Vec<f32>,
}

impl Heightmap {
    /// Wrap `width * depth` samples (x fastest). Values are clamped to [0, 1].
    pub fn new(width: usize, depth: usize, samples: Vec<f32>) -> Result<Self> {
        if width < 2 || depth < 2 {
            return Err(Error::Heightmap(format!(
                "heightmap needs at least 2x2 samples, got {}x{}",
                width, depth
            )));
        }
        if samples.len() != width * depth {
            return Err(Error::Heightmap(format!(
                "expected {} samples, got {}",
                width * depth,
                samples.len()
            )));
        }
        let samples = samples
            .into_iter()
            .map(|h| if h.is_finite() { h.clamp(0.0, 1.0) } else { 0.0 })
            .collect();
        Ok(Self { width, depth, samples })
    }

    /// Build from a function of normalized (u, v) in [0, 1]
    pub fn from_fn(width: usize, depth: usize, f: impl Fn(f32, f32) -> f32) -> Result<Self> {
        if width < 2 || depth < 2 {
            return Self::new(width, depth, Vec::new());
        }
        let mut samples = Vec::with_capacity(width * depth);
        for iz in 0..depth {
            for ix in 0..width {
                let u = ix as f32 / (width - 1) as f32;
                let v = iz as f32 / (depth - 1) as f32;
                samples.push(f(u, v));
            }
        }
        Self::new(width, depth, samples)
    }

    /// Load a grayscale heightmap image; white is the highest point.
    pub fn from_image(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| Error::Heightmap(format!("{}: {}", path.display(), e)))?
            .to_luma16();
        let (w, d) = img.dimensions();
        let samples = img.pixels().map(|p| p.0[0] as f32 / u16::MAX as f32).collect();
        log::info!("Loaded heightmap {} ({}x{})", path.display(), w, d);
        Self::new(w as usize, d as usize, samples)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Sample at integer indices, clamped to the map
    pub fn get(&self, ix: i64, iz: i64) -> f32 {
        let x = ix.clamp(0, self.width as i64 - 1) as usize;
        let z = iz.clamp(0, self.depth as i64 - 1) as usize;
        self.samples[x + z * self.width]
    }

    /// Bilinear sample at normalized (u, v), clamped to [0, 1]
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let fx = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let fz = v.clamp(0.0, 1.0) * (self.depth - 1) as f32;
        let (x0, z0) = (fx.floor() as i64, fz.floor() as i64);
        let (tx, tz) = (fx - x0 as f32, fz - z0 as f32);

        let h00 = self.get(x0, z0);
        let h10 = self.get(x0 + 1, z0);
        let h01 = self.get(x0, z0 + 1);
        let h11 = self.get(x0 + 1, z0 + 1);

        let a = h00 + (h10 - h00) * tx;
        let b = h01 + (h11 - h01) * tx;
        a + (b - a) * tz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(Heightmap::new(1, 4, vec![0.0; 4]).is_err());
        assert!(Heightmap::new(2, 2, vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_bilinear_sample() {
        let map = Heightmap::new(2, 2, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        assert!((map.sample(0.5, 0.5) - 0.5).abs() < 1e-6);
        assert!((map.sample(1.0, 0.0) - 1.0).abs() < 1e-6);
        assert!((map.sample(-3.0, 0.0)).abs() < 1e-6);
    }

    #[test]
    fn test_from_fn_corners() {
        let map = Heightmap::from_fn(5, 3, |u, v| u * 0.5 + v * 0.5).unwrap();
        assert_eq!(map.get(0, 0), 0.0);
        assert!((map.get(4, 2) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_values_clamped() {
        let map = Heightmap::new(2, 2, vec![-1.0, 2.0, f32::NAN, 0.5]).unwrap();
        assert_eq!(map.get(0, 0), 0.0);
        assert_eq!(map.get(1, 0), 1.0);
        assert_eq!(map.get(0, 1), 0.0);
    }

    #[test]
    fn test_from_image() {
        crate::core::logging::try_init_for_tests();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("height.png");
        let img = image::GrayImage::from_fn(4, 2, |x, _| image::Luma([if x >= 2 { 255 } else { 0 }]));
        img.save(&path).unwrap();

        let map = Heightmap::from_image(&path).unwrap();
        assert_eq!((map.width(), map.depth()), (4, 2));
        assert_eq!(map.get(0, 0), 0.0);
        assert!((map.get(3, 1) - 1.0).abs() < 1e-6);
    }
}
