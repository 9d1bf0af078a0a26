use anyhow::anyhow;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};

/// Static properties of an opened video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProperties {
    pub fps: f64,
    pub frame_count: i32,
    pub width: i32,
    pub height: i32,
    /// Seconds, 0 when the container does not report a frame rate.
    pub duration: f64,
}

/// Thin owner of an OpenCV capture handle. Decoding and seeking live here;
/// playback cadence and frame fan-out belong to the acquisition loop.
pub struct VideoSource {
    cap: VideoCapture,
}

impl VideoSource {
    /// Open a video file, failing when the container cannot be decoded.
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let cap = VideoCapture::from_file(path, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(anyhow!("failed to open video file: {}", path));
        }
        Ok(VideoSource { cap })
    }

    pub fn properties(&self) -> opencv::Result<VideoProperties> {
        let fps = self.cap.get(videoio::CAP_PROP_FPS)?;
        let frame_count = self.cap.get(videoio::CAP_PROP_FRAME_COUNT)? as i32;
        let width = self.cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = self.cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        let duration = if fps > 0.0 {
            frame_count as f64 / fps
        } else {
            0.0
        };
        Ok(VideoProperties {
            fps,
            frame_count,
            width,
            height,
            duration,
        })
    }

    /// Decode the next frame; `None` at end of stream.
    pub fn read_frame(&mut self) -> opencv::Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.cap.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    /// Presentation timestamp of the current stream position, in seconds.
    pub fn timestamp(&self) -> f64 {
        self.cap
            .get(videoio::CAP_PROP_POS_MSEC)
            .map(|ms| ms / 1000.0)
            .unwrap_or(0.0)
    }

    pub fn current_frame_number(&self) -> i32 {
        self.cap
            .get(videoio::CAP_PROP_POS_FRAMES)
            .map(|n| n as i32)
            .unwrap_or(0)
    }

    /// Jump to an absolute frame index.
    pub fn seek(&mut self, frame_number: i32) -> opencv::Result<()> {
        self.cap
            .set(videoio::CAP_PROP_POS_FRAMES, frame_number as f64)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::{
        core::{self, Scalar, Size},
        videoio::VideoWriter,
    };
    use std::env;
    use std::path::PathBuf;

    #[test]
    fn test_open_missing_file_fails() {
        assert!(VideoSource::open("/nonexistent/clip.mp4").is_err());
    }

    /// Write a short single-color MJPG clip. Returns `None` when the codec
    /// is unavailable in this OpenCV build.
    fn write_blank_clip(frames: i32) -> Option<PathBuf> {
        let path = env::temp_dir().join(format!("chromatrack_seek_{}.avi", std::process::id()));
        let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G').ok()?;
        let mut writer = VideoWriter::new(
            &path.to_string_lossy(),
            fourcc,
            50.0,
            Size::new(64, 48),
            true,
        )
        .ok()?;
        if !writer.is_opened().ok()? {
            return None;
        }
        let frame =
            Mat::new_rows_cols_with_default(48, 64, core::CV_8UC3, Scalar::all(40.0)).unwrap();
        for _ in 0..frames {
            writer.write(&frame).ok()?;
        }
        Some(path)
    }

    #[test]
    fn test_seek_repositions_stream() {
        let Some(path) = write_blank_clip(10) else {
            return;
        };
        let mut source = VideoSource::open(&path.to_string_lossy()).unwrap();
        assert_eq!(source.current_frame_number(), 0);

        source.seek(5).unwrap();
        assert_eq!(source.current_frame_number(), 5);

        let frame = source.read_frame().unwrap();
        assert!(frame.is_some());
        assert_eq!(source.current_frame_number(), 6);
        // 6 frames at 50 fps into the stream
        assert!(source.timestamp() > 0.0);

        let props = source.properties().unwrap();
        assert_eq!(props.frame_count, 10);

        let _ = std::fs::remove_file(&path);
    }
}
