use opencv::{
    core::{self, Mat, Point, Scalar, Size, Vector},
    imgproc,
    prelude::*,
};

use crate::config::{AreaBounds, ColorRange, MorphologyConfig};
use crate::track::BlobCandidate;

/// Per-frame color-based object locator.
///
/// Thresholds the frame in HSV space, cleans the mask with morphological
/// opening/closing, and reports the centroid of the largest contour whose
/// area falls inside the configured window. Stateless: the caller owns the
/// settings and decides when they change between frames.
pub struct FrameLocator;

impl FrameLocator {
    /// Locate the tracked object in one frame.
    ///
    /// Returns `None` both when no qualifying blob exists and when any
    /// internal OpenCV operation fails: per-frame misses are routine and must
    /// never fault the acquisition loop.
    pub fn locate(
        frame: &Mat,
        color: &ColorRange,
        area: &AreaBounds,
        morph: &MorphologyConfig,
    ) -> Option<BlobCandidate> {
        Self::try_locate(frame, color, area, morph).ok().flatten()
    }

    fn try_locate(
        frame: &Mat,
        color: &ColorRange,
        area: &AreaBounds,
        morph: &MorphologyConfig,
    ) -> opencv::Result<Option<BlobCandidate>> {
        let mut hsv = Mat::default();
        imgproc::cvt_color(frame, &mut hsv, imgproc::COLOR_BGR2HSV, 0)?;

        let lower = Scalar::new(
            color.hue_low as f64,
            color.saturation_low as f64,
            color.value_low as f64,
            0.0,
        );
        let upper = Scalar::new(
            color.hue_high as f64,
            color.saturation_high as f64,
            color.value_high as f64,
            0.0,
        );
        let mut mask = Mat::default();
        core::in_range(&hsv, &lower, &upper, &mut mask)?;

        if morph.morph_iters > 0 {
            let kernel = Mat::ones(5, 5, core::CV_8U)?.to_mat()?;
            let anchor = Point::new(-1, -1);
            let border = imgproc::morphology_default_border_value()?;

            let mut opened = Mat::default();
            imgproc::morphology_ex(
                &mask,
                &mut opened,
                imgproc::MORPH_OPEN,
                &kernel,
                anchor,
                morph.morph_iters,
                core::BORDER_CONSTANT,
                border,
            )?;
            let mut closed = Mat::default();
            imgproc::morphology_ex(
                &opened,
                &mut closed,
                imgproc::MORPH_CLOSE,
                &kernel,
                anchor,
                morph.morph_iters,
                core::BORDER_CONSTANT,
                border,
            )?;
            mask = closed;
        }

        // Optional blur to soften contour edges
        if morph.blur_size > 0 {
            let mut blurred = Mat::default();
            imgproc::gaussian_blur(
                &mask,
                &mut blurred,
                Size::new(morph.blur_size, morph.blur_size),
                0.0,
                0.0,
                core::BORDER_DEFAULT,
            )?;
            mask = blurred;
        }

        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;
        if contours.is_empty() {
            return Ok(None);
        }

        let mut largest: Option<(Vector<Point>, f64)> = None;
        for contour in &contours {
            let contour_area = imgproc::contour_area(&contour, false)?;
            if largest.as_ref().map_or(true, |(_, a)| contour_area > *a) {
                largest = Some((contour, contour_area));
            }
        }
        let Some((contour, blob_area)) = largest else {
            return Ok(None);
        };

        // Deliberate noise/false-positive filter, not an error
        if blob_area < area.min_area || blob_area > area.max_area {
            return Ok(None);
        }

        let m = imgproc::moments(&contour, false)?;
        if m.m00 == 0.0 {
            return Ok(None);
        }
        let x = (m.m10 / m.m00).round() as i32;
        let y = (m.m01 / m.m00).round() as i32;

        Ok(Some(BlobCandidate {
            x,
            y,
            area: blob_area,
        }))
    }
}
