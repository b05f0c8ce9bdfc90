//! Color filter invocation with rollback.
//!
//! Filters always run on the pristine uploaded bytes, never on a previous
//! filter's output, so applying filters in any order never compounds.

use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::FilterError;

/// Opaque color filter.
///
/// Takes encoded image bytes and returns raw RGBA8 pixels with the same pixel
/// count as the input image.
pub trait ImageFilter {
    fn name(&self) -> &str;

    fn apply(&self, image_bytes: &[u8]) -> Result<Vec<u8>, FilterError>;
}

/// RGBA8 surface texture
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    image: RgbaImage,
}

impl Texture {
    /// Decode an encoded image (PNG, JPEG, ...)
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self {
            image: image::load_from_memory(bytes)?.to_rgba8(),
        })
    }

    /// Wrap raw RGBA8 pixels, which must cover exactly `width * height` pixels
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, FilterError> {
        let expected = width as usize * height as usize * 4;
        let actual = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .filter(|_| actual == expected)
            .map(|image| Self { image })
            .ok_or(FilterError::DimensionMismatch { expected, actual })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Raw RGBA8 pixels, row-major
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.image.into_raw()
    }
}

#[derive(Debug, Clone)]
struct PristineImage {
    bytes: Vec<u8>,
    texture: Texture,
}

/// Holds the uploaded image and the texture currently shown on the face
#[derive(Debug, Clone, Default)]
pub struct FilterAdapter {
    pristine: Option<PristineImage>,
    current: Option<Texture>,
    revision: u64,
}

impl FilterAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pristine image; the decoded texture is shown unfiltered
    pub fn set_image(&mut self, bytes: Vec<u8>, texture: Texture) {
        self.current = Some(texture.clone());
        self.pristine = Some(PristineImage { bytes, texture });
        self.revision += 1;
    }

    pub fn has_image(&self) -> bool {
        self.pristine.is_some()
    }

    /// Encoded bytes of the last upload
    pub fn pristine_bytes(&self) -> Option<&[u8]> {
        self.pristine.as_ref().map(|p| p.bytes.as_slice())
    }

    /// Texture currently assigned to the face
    pub fn current(&self) -> Option<&Texture> {
        self.current.as_ref()
    }

    /// Bumped whenever the current texture is replaced
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Run `filter` on the pristine bytes and show the result.
    ///
    /// On failure the unfiltered upload is shown again and the error is
    /// returned for reporting.
    pub fn apply<F: ImageFilter + ?Sized>(&mut self, filter: &F) -> Result<&Texture, FilterError> {
        let Some(pristine) = self.pristine.as_ref() else {
            return Err(FilterError::NoImage);
        };

        let (width, height) = pristine.texture.dimensions();
        let result = filter
            .apply(&pristine.bytes)
            .and_then(|pixels| Texture::from_rgba(width, height, pixels));

        match result {
            Ok(texture) => {
                debug!("Applied {} filter to {}x{} image", filter.name(), width, height);
                self.revision += 1;
                Ok(&*self.current.insert(texture))
            }
            Err(err) => {
                warn!(
                    "{} filter failed, restoring original texture: {}",
                    filter.name(),
                    err
                );
                self.current = Some(pristine.texture.clone());
                self.revision += 1;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{png_bytes, FailingFilter, MappingFilter};

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(Texture::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Texture::from_rgba(2, 2, vec![0; 12]),
            Err(FilterError::DimensionMismatch {
                expected: 16,
                actual: 12
            })
        ));
        assert!(matches!(
            Texture::from_rgba(2, 2, vec![0; 20]),
            Err(FilterError::DimensionMismatch {
                expected: 16,
                actual: 20
            })
        ));
    }

    #[test]
    fn test_apply_without_image() {
        let mut adapter = FilterAdapter::new();
        assert!(matches!(
            adapter.apply(&MappingFilter::invert()),
            Err(FilterError::NoImage)
        ));
    }

    #[test]
    fn test_filters_never_compound() {
        let bytes = png_bytes(4, 3);
        let mut adapter = FilterAdapter::new();
        adapter.set_image(bytes.clone(), Texture::decode(&bytes).unwrap());

        let filter = MappingFilter::invert();
        let once = adapter.apply(&filter).unwrap().clone();
        let twice = adapter.apply(&filter).unwrap().clone();

        assert_eq!(once, twice);
        assert_eq!(filter.inputs(), vec![bytes.clone(), bytes]);
    }

    #[test]
    fn test_failure_restores_original() {
        let bytes = png_bytes(4, 3);
        let original = Texture::decode(&bytes).unwrap();
        let mut adapter = FilterAdapter::new();
        adapter.set_image(bytes, original.clone());
        adapter.apply(&MappingFilter::invert()).unwrap();
        assert_ne!(adapter.current(), Some(&original));

        let err = adapter.apply(&FailingFilter::malformed()).unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::ErrorKind::MalformedInput));
        assert_eq!(adapter.current(), Some(&original));
    }

    #[test]
    fn test_wrong_pixel_count_rolls_back() {
        let bytes = png_bytes(4, 3);
        let original = Texture::decode(&bytes).unwrap();
        let mut adapter = FilterAdapter::new();
        adapter.set_image(bytes, original.clone());

        let err = adapter.apply(&MappingFilter::truncating()).unwrap_err();
        assert!(matches!(err, FilterError::DimensionMismatch { expected: 48, .. }));
        assert_eq!(adapter.current(), Some(&original));
    }
}
