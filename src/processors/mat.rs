//! The working image representation transforms operate on.

use crate::core::errors::DeployError;
use crate::pipeline::ImageShape;
use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::{Array3, ArrayView2, Axis};

/// An `f32` image in height, width, channel layout.
///
/// Values keep whatever range the previous stage produced: images decoded
/// through [`Mat::from_dynamic`] start in `0.0..=255.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mat {
    data: Array3<f32>,
}

impl Mat {
    /// Wraps an `[H, W, C]` array.
    pub fn from_array(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Builds an `[H, W, C]` image from row-major interleaved values.
    pub fn from_shape_vec(
        height: usize,
        width: usize,
        channels: usize,
        values: Vec<f32>,
    ) -> Result<Self, DeployError> {
        Ok(Self {
            data: Array3::from_shape_vec((height, width, channels), values)?,
        })
    }

    /// An image filled with `value`.
    pub fn filled(height: usize, width: usize, channels: usize, value: f32) -> Self {
        Self {
            data: Array3::from_elem((height, width, channels), value),
        }
    }

    /// Converts a decoded image to a 3-channel RGB `Mat`.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgb(&image.to_rgb8())
    }

    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let data = Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
            image.get_pixel(x as u32, y as u32)[c] as f32
        });
        Self { data }
    }

    pub fn from_gray(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let data = Array3::from_shape_fn((height as usize, width as usize, 1), |(y, x, _)| {
            image.get_pixel(x as u32, y as u32)[0] as f32
        });
        Self { data }
    }

    pub fn height(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn channels(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn shape(&self) -> ImageShape {
        ImageShape::new(self.height(), self.width(), self.channels())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array3<f32> {
        &mut self.data
    }

    /// Replaces the pixel data, typically with a resized or cropped array.
    pub fn set_data(&mut self, data: Array3<f32>) {
        self.data = data;
    }

    /// A single channel as an `[H, W]` view.
    pub fn plane(&self, channel: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), channel)
    }

    pub fn into_array(self) -> Array3<f32> {
        self.data
    }
}

impl From<Array3<f32>> for Mat {
    fn from(data: Array3<f32>) -> Self {
        Self::from_array(data)
    }
}
