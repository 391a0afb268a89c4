use crate::{Error, Result};
use image::RgbImage;

/// Absolute per-channel difference of two equally sized RGB images.
pub fn difference_image(reference: &RgbImage, candidate: &RgbImage) -> Result<RgbImage> {
    if reference.dimensions() != candidate.dimensions() {
        return Err(Error::DimensionMismatch {
            reference: reference.dimensions(),
            candidate: candidate.dimensions(),
        });
    }
    Ok(RgbImage::from_fn(reference.width(), reference.height(), |x, y| {
        let [r0, g0, b0] = reference.get_pixel(x, y).0;
        let [r1, g1, b1] = candidate.get_pixel(x, y).0;
        image::Rgb([r0.abs_diff(r1), g0.abs_diff(g1), b0.abs_diff(b1)])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_differ_independently() {
        let a = RgbImage::from_pixel(2, 1, image::Rgb([10, 200, 0]));
        let mut b = a.clone();
        b.put_pixel(1, 0, image::Rgb([250, 100, 0]));
        let d = difference_image(&a, &b).unwrap();
        assert_eq!(d.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(d.get_pixel(1, 0).0, [240, 100, 0]);
        assert_eq!(difference_image(&b, &a).unwrap(), d);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let err = difference_image(&RgbImage::new(2, 2), &RgbImage::new(3, 2)).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
