//! Per-image shape bookkeeping.

use serde::{Deserialize, Serialize};

/// Height, width and channel count of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }
}

/// The shape an image had after one transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageShape {
    pub transform: String,
    pub shape: ImageShape,
}

/// Shape history of one image through the pipeline.
///
/// Postprocessing uses it to map predictions on the padded batch back onto
/// the original image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeInfo {
    /// Shape of the image as handed to the pipeline.
    pub original: ImageShape,
    /// One entry per transform, in pipeline order.
    pub stages: Vec<StageShape>,
}

impl ShapeInfo {
    pub fn new(original: ImageShape) -> Self {
        Self {
            original,
            stages: Vec::new(),
        }
    }

    /// Records the shape produced by `transform`.
    pub fn push(&mut self, transform: &str, shape: ImageShape) {
        self.stages.push(StageShape {
            transform: transform.to_string(),
            shape,
        });
    }

    /// Shape after the last transform (the original shape if there were none).
    pub fn current(&self) -> ImageShape {
        self.stages.last().map_or(self.original, |s| s.shape)
    }

    /// Number of recorded stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// `(height, width)` ratio between the output of the last resize stage and
    /// the original image, or `(1.0, 1.0)` when nothing was resized.
    ///
    /// Resize stages are those whose transform name starts with `Resize`.
    pub fn scale_factor(&self) -> (f32, f32) {
        let Some(resized) = self
            .stages
            .iter()
            .rev()
            .find(|s| s.transform.starts_with("Resize"))
        else {
            return (1.0, 1.0);
        };
        if self.original.height == 0 || self.original.width == 0 {
            return (1.0, 1.0);
        }
        (
            resized.shape.height as f32 / self.original.height as f32,
            resized.shape.width as f32 / self.original.width as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_defaults_to_original() {
        let info = ShapeInfo::new(ImageShape::new(10, 20, 3));
        assert_eq!(info.current(), ImageShape::new(10, 20, 3));
        assert!(info.is_empty());
        assert_eq!(info.scale_factor(), (1.0, 1.0));
    }

    #[test]
    fn test_scale_factor_uses_last_resize() {
        let mut info = ShapeInfo::new(ImageShape::new(100, 200, 3));
        info.push("ResizeByShort", ImageShape::new(50, 100, 3));
        info.push("Resize", ImageShape::new(25, 25, 3));
        info.push("Padding", ImageShape::new(32, 32, 3));

        assert_eq!(info.len(), 3);
        assert_eq!(info.current(), ImageShape::new(32, 32, 3));
        assert_eq!(info.scale_factor(), (0.25, 0.125));
    }
}
