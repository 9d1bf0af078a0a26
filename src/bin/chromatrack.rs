use clap::Parser;
use opencv::highgui;
use std::path::PathBuf;
use std::sync::Arc;

use chromatrack::{
    export, visualization, Acquisition, FrameEvent, KinematicsEngine, TrackRecorder,
    TrackingConfig, TrackingUpdate, VideoSource,
};

#[derive(Parser)]
#[command(
    name = "chromatrack",
    about = "Color-based object tracking and motion kinematics for video files",
    version = "0.1.0"
)]
struct Args {
    /// Path to the input video file
    #[arg(short, long, required = true)]
    input: PathBuf,

    /// Path to a tracking configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the raw trajectory (settings + samples) to this JSON file
    #[arg(long)]
    raw_out: Option<PathBuf>,

    /// Write the kinematics table to this CSV file
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// Show a window with the tracked object marked (ESC to interrupt)
    #[arg(short, long)]
    visualize: bool,

    /// Override: lower hue bound (0-180)
    #[arg(long)]
    hue_low: Option<i32>,
    /// Override: upper hue bound (0-180)
    #[arg(long)]
    hue_high: Option<i32>,
    /// Override: lower saturation bound (0-255)
    #[arg(long)]
    saturation_low: Option<i32>,
    /// Override: upper saturation bound (0-255)
    #[arg(long)]
    saturation_high: Option<i32>,
    /// Override: lower value bound (0-255)
    #[arg(long)]
    value_low: Option<i32>,
    /// Override: upper value bound (0-255)
    #[arg(long)]
    value_high: Option<i32>,
    /// Override: minimum accepted blob area
    #[arg(long)]
    min_area: Option<f64>,
    /// Override: maximum accepted blob area
    #[arg(long)]
    max_area: Option<f64>,
    /// Override: Gaussian blur kernel side (0 disables, must be odd)
    #[arg(long)]
    blur_size: Option<i32>,
    /// Override: morphological open/close iterations
    #[arg(long)]
    morph_iters: Option<i32>,
}

impl Args {
    fn overrides(&self) -> TrackingUpdate {
        TrackingUpdate {
            hue_low: self.hue_low,
            hue_high: self.hue_high,
            saturation_low: self.saturation_low,
            saturation_high: self.saturation_high,
            value_low: self.value_low,
            value_high: self.value_high,
            min_area: self.min_area,
            max_area: self.max_area,
            blur_size: self.blur_size,
            morph_iters: self.morph_iters,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load config, then fold in any CLI overrides
    let config = match &args.config {
        Some(path) => {
            println!("Loading configuration from {:?}...", path);
            TrackingConfig::from_file(path)?
        }
        None => TrackingConfig::default(),
    };
    let overrides = args.overrides();
    let config = if overrides.is_empty() {
        config
    } else {
        config.merged(&overrides)?
    };

    println!("Opening input file {:?}...", args.input);
    let source = VideoSource::open(&args.input.to_string_lossy())?;
    let props = source.properties()?;
    println!("Video properties:");
    println!("  Resolution: {}x{}", props.width, props.height);
    println!("  Total frames: {}", props.frame_count);
    println!("  FPS: {:.2}", props.fps);
    println!("  Duration: {:.2}s", props.duration);

    let recorder = Arc::new(TrackRecorder::new(config));
    recorder.start();

    let mut acquisition = Acquisition::new(Arc::clone(&recorder));
    let events = acquisition.subscribe();

    let window_name = "chromatrack";
    if args.visualize {
        highgui::named_window(window_name, highgui::WINDOW_NORMAL)?;
        highgui::resize_window(window_name, props.width, props.height)?;
    }

    acquisition.start(source);

    let mut frame_id = 0;
    loop {
        match events.recv() {
            Ok(FrameEvent::Frame {
                mut frame,
                candidate,
                ..
            }) => {
                frame_id += 1;
                if frame_id % 50 == 0 {
                    println!(
                        "Processed {}/{} frames, {} samples recorded",
                        frame_id,
                        props.frame_count,
                        recorder.len()
                    );
                }
                if args.visualize {
                    if let Some(candidate) = &candidate {
                        visualization::draw_marker(&mut frame, candidate)?;
                    }
                    visualization::draw_trail(&mut frame, &recorder.snapshot())?;
                    highgui::imshow(window_name, &frame)?;
                    let key = highgui::wait_key(1)?;
                    if key == 27 {
                        println!("\nTracking interrupted by user.");
                        break;
                    }
                }
            }
            Ok(FrameEvent::Finished) | Err(_) => break,
        }
    }
    acquisition.stop();
    recorder.stop();

    let trajectory = recorder.snapshot();
    println!("\nTracking completed: {} samples from {} frames", trajectory.len(), frame_id);

    let mut engine = KinematicsEngine::new();
    let report = engine.analyze(&trajectory);
    println!("Motion analysis:");
    println!("  Total time: {:.2}s", report.total_time);
    println!("  Total distance: {:.1} px", report.total_distance);
    println!("  Max velocity: {:.1} px/s", report.max_velocity);
    println!("  Avg velocity: {:.1} px/s", report.avg_velocity);
    println!("  Max acceleration: {:.1} px/s^2", report.max_acceleration);

    if let Some(path) = &args.raw_out {
        export::export_raw(&recorder.config(), &trajectory, path)?;
        println!("Raw trajectory saved to {:?}", path);
    }
    if let Some(path) = &args.csv_out {
        export::export_table(&trajectory, &report, path)?;
        println!("Kinematics table saved to {:?}", path);
    }

    Ok(())
}
