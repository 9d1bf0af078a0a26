use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
    prelude::*,
};

use crate::track::{BlobCandidate, TrackSample};

const MARKER_COLOR: Scalar = Scalar::new(0.0, 255.0, 0.0, 0.0); // green, BGR
const TRAIL_COLOR: Scalar = Scalar::new(0.0, 200.0, 255.0, 0.0);

/// Draw text with a black outline for visibility on any background.
pub fn draw_text(
    frame: &mut Mat,
    text: &str,
    x: i32,
    y: i32,
    font_scale: f64,
    color: Scalar,
) -> opencv::Result<()> {
    let org = Point::new(x, y);
    imgproc::put_text(
        frame,
        text,
        org,
        imgproc::FONT_HERSHEY_SIMPLEX,
        font_scale,
        Scalar::new(0.0, 0.0, 0.0, 0.0),
        3,
        imgproc::LINE_8,
        false,
    )?;
    imgproc::put_text(
        frame,
        text,
        org,
        imgproc::FONT_HERSHEY_SIMPLEX,
        font_scale,
        color,
        1,
        imgproc::LINE_8,
        false,
    )
}

/// Mark the located object: filled center dot, ring, crosshair, and
/// coordinate/area labels next to it.
pub fn draw_marker(frame: &mut Mat, candidate: &BlobCandidate) -> opencv::Result<()> {
    let center = Point::new(candidate.x, candidate.y);

    imgproc::circle(frame, center, 8, MARKER_COLOR, imgproc::FILLED, imgproc::LINE_8, 0)?;
    imgproc::circle(frame, center, 12, MARKER_COLOR, 2, imgproc::LINE_8, 0)?;
    imgproc::line(
        frame,
        Point::new(center.x - 15, center.y),
        Point::new(center.x + 15, center.y),
        MARKER_COLOR,
        2,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::line(
        frame,
        Point::new(center.x, center.y - 15),
        Point::new(center.x, center.y + 15),
        MARKER_COLOR,
        2,
        imgproc::LINE_8,
        0,
    )?;

    draw_text(
        frame,
        &format!("({}, {})", candidate.x, candidate.y),
        center.x + 20,
        center.y - 10,
        0.6,
        MARKER_COLOR,
    )?;
    draw_text(
        frame,
        &format!("Area: {:.0}", candidate.area),
        center.x + 20,
        center.y + 15,
        0.5,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
    )
}

/// Connect recorded positions with a polyline showing the path so far.
pub fn draw_trail(frame: &mut Mat, trajectory: &[TrackSample]) -> opencv::Result<()> {
    for pair in trajectory.windows(2) {
        imgproc::line(
            frame,
            Point::new(pair[0].x, pair[0].y),
            Point::new(pair[1].x, pair[1].y),
            TRAIL_COLOR,
            2,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(())
}
