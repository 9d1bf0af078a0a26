use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use opencv::core::Mat;

use crate::locator::FrameLocator;
use crate::recorder::TrackRecorder;
use crate::track::BlobCandidate;
use crate::video::VideoSource;

/// Fallback inter-frame delay when the container reports no frame rate.
const DEFAULT_FRAME_DELAY: f64 = 1.0 / 30.0;

/// Typed per-frame event emitted by the acquisition worker. Consumers
/// subscribe before the loop starts; each subscriber gets its own copy.
#[derive(Debug)]
pub enum FrameEvent {
    Frame {
        frame: Mat,
        timestamp: f64,
        candidate: Option<BlobCandidate>,
    },
    /// End of stream or cancellation; always the final event.
    Finished,
}

/// Background acquisition loop: pulls frames from a video source at the
/// source's native rate, runs the locator, appends to the recorder, and
/// broadcasts a `FrameEvent` to every subscriber.
///
/// The worker is the only writer of the trajectory. `start` while already
/// running is a no-op; `stop` raises the cancellation flag (observed within
/// one frame) and joins the worker, after which no further appends occur.
pub struct Acquisition {
    recorder: Arc<TrackRecorder>,
    subscribers: Vec<Sender<FrameEvent>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Acquisition {
    pub fn new(recorder: Arc<TrackRecorder>) -> Self {
        Acquisition {
            recorder,
            subscribers: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Register a consumer. Subscriptions registered after `start` take
    /// effect on the next start.
    pub fn subscribe(&mut self) -> Receiver<FrameEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Launch the worker on the given source. No-op while a worker is live.
    pub fn start(&mut self, mut source: VideoSource) {
        if self.is_running() {
            return;
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.stop.store(false, Ordering::SeqCst);

        let recorder = Arc::clone(&self.recorder);
        let subscribers = self.subscribers.clone();
        let stop = Arc::clone(&self.stop);
        self.worker = Some(thread::spawn(move || {
            acquisition_loop(&mut source, &recorder, &subscribers, &stop);
        }));
    }

    /// Cancel the loop and wait for the worker to drain. The flag is checked
    /// once per frame, so the join is bounded by one frame's latency.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        self.stop();
    }
}

fn acquisition_loop(
    source: &mut VideoSource,
    recorder: &TrackRecorder,
    subscribers: &[Sender<FrameEvent>],
    stop: &AtomicBool,
) {
    let frame_delay = source
        .properties()
        .ok()
        .filter(|p| p.fps > 0.0)
        .map(|p| 1.0 / p.fps)
        .unwrap_or(DEFAULT_FRAME_DELAY);

    while !stop.load(Ordering::SeqCst) {
        let started = Instant::now();

        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            // End of stream and decode faults both end the run
            Ok(None) | Err(_) => break,
        };
        let timestamp = source.timestamp();

        // Settings are read once per frame; a concurrent update lands on the
        // next frame, never mid-locate
        let config = recorder.config();
        let candidate =
            FrameLocator::locate(&frame, &config.color, &config.area, &config.morphology);
        recorder.record(candidate, timestamp);

        for tx in subscribers {
            let _ = tx.send(FrameEvent::Frame {
                frame: frame.clone(),
                timestamp,
                candidate,
            });
        }

        // Pace to the source frame rate
        let elapsed = started.elapsed().as_secs_f64();
        if elapsed < frame_delay {
            thread::sleep(Duration::from_secs_f64(frame_delay - elapsed));
        }
    }

    for tx in subscribers {
        let _ = tx.send(FrameEvent::Finished);
    }
}
