//! Illustration processing for the playback device's display.

use fabula_core::{ImageFormat, SynthesizedImage};
use fabula_rate_limit::DeviceImageSettings;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Shape illustrations must have before they reach the device.
///
/// Images are decoded using the format the image service declared,
/// resized to exactly `width` x `height`, optionally converted to
/// grayscale, and re-encoded as JPEG.
///
/// # Examples
///
/// ```
/// use fabula_pipeline::DeviceImageProfile;
///
/// let profile = DeviceImageProfile::builder()
///     .width(800u32)
///     .height(480u32)
///     .build()
///     .unwrap();
///
/// assert_eq!(*profile.width(), 800);
/// assert!(*profile.grayscale());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), default)]
pub struct DeviceImageProfile {
    /// Target width in pixels
    width: u32,
    /// Target height in pixels
    height: u32,
    /// Drop color information
    grayscale: bool,
    /// JPEG quality, 1 to 100
    jpeg_quality: u8,
}

impl Default for DeviceImageProfile {
    fn default() -> Self {
        Self::from(&DeviceImageSettings::default())
    }
}

impl From<&DeviceImageSettings> for DeviceImageProfile {
    fn from(settings: &DeviceImageSettings) -> Self {
        Self {
            width: settings.width.max(1),
            height: settings.height.max(1),
            grayscale: settings.grayscale,
            jpeg_quality: settings.jpeg_quality.clamp(1, 100),
        }
    }
}

impl DeviceImageProfile {
    /// Creates a new profile builder.
    pub fn builder() -> DeviceImageProfileBuilder {
        DeviceImageProfileBuilder::default()
    }

    /// Reshape `image` for the device.
    ///
    /// The result is always declared as [`ImageFormat::Jpeg`].
    ///
    /// # Errors
    ///
    /// Returns error if the bytes do not decode as the declared format or
    /// the JPEG encoder rejects the result.
    pub fn apply(&self, image: &SynthesizedImage) -> Result<SynthesizedImage, image::ImageError> {
        let decoded = image::load_from_memory_with_format(&image.bytes, codec_format(image.format))?;
        let resized = decoded.resize_exact(self.width, self.height, FilterType::Lanczos3);

        let mut bytes = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality);
            if self.grayscale {
                encoder.encode_image(&resized.to_luma8())?;
            } else {
                encoder.encode_image(&resized.to_rgb8())?;
            }
        }

        tracing::debug!(
            width = self.width,
            height = self.height,
            grayscale = self.grayscale,
            size = bytes.len(),
            "Illustration prepared for device"
        );
        Ok(SynthesizedImage {
            bytes,
            format: ImageFormat::Jpeg,
        })
    }
}

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Webp => image::ImageFormat::WebP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GenericImageView, Rgba, RgbaImage};
    use std::io::Cursor;

    fn red_png(width: u32, height: u32) -> SynthesizedImage {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        SynthesizedImage {
            bytes,
            format: ImageFormat::Png,
        }
    }

    fn profile(grayscale: bool) -> DeviceImageProfile {
        DeviceImageProfile::builder()
            .width(40u32)
            .height(20u32)
            .grayscale(grayscale)
            .build()
            .unwrap()
    }

    #[test]
    fn resizes_to_device_dimensions_in_grayscale() {
        let prepared = profile(true).apply(&red_png(64, 64)).unwrap();

        assert_eq!(prepared.format, ImageFormat::Jpeg);
        let decoded =
            image::load_from_memory_with_format(&prepared.bytes, image::ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (40, 20));
        assert_eq!(decoded.color(), ColorType::L8);
    }

    #[test]
    fn color_is_kept_when_grayscale_is_off() {
        let prepared = profile(false).apply(&red_png(10, 30)).unwrap();

        let decoded =
            image::load_from_memory_with_format(&prepared.bytes, image::ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (40, 20));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        let garbage = SynthesizedImage {
            bytes: b"not an image".to_vec(),
            format: ImageFormat::Png,
        };
        assert!(profile(true).apply(&garbage).is_err());
    }

    #[test]
    fn declared_format_is_not_guessed() {
        let mut mislabeled = red_png(8, 8);
        mislabeled.format = ImageFormat::Jpeg;
        assert!(profile(true).apply(&mislabeled).is_err());
    }

    #[test]
    fn settings_are_clamped() {
        let settings = DeviceImageSettings {
            enabled: true,
            width: 0,
            height: 0,
            grayscale: false,
            jpeg_quality: 0,
        };
        let profile = DeviceImageProfile::from(&settings);
        assert_eq!((*profile.width(), *profile.height()), (1, 1));
        assert_eq!(*profile.jpeg_quality(), 1);
    }
}
