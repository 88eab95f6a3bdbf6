//! Capture sequencing: one render/readback/decode cycle per camera.
//!
//! The sequencer walks an ordered capture list and drives each camera to
//! completion before advancing - render, readback, decode, hand the image to
//! the writer. Rendering and writing sit behind traits (`RenderBackend`,
//! `DepthSink`) so the loop is testable without a GPU or a filesystem.

use crate::core::camera::validate_clip_planes;
use crate::core::{depth, Camera, CameraError, CodecError, DepthImage, Extrinsic, Intrinsic};
use crate::gpu::{DepthRenderer, RenderError};
use thiserror::Error;

/// Boxed error type crossing the writer seam.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// One camera's worth of work: calibration plus the output identifier.
///
/// Identifiers name the output files, so list order must match the order the
/// writer receives frames.
#[derive(Clone, Debug)]
pub struct CaptureEntry {
    pub id: String,
    pub intrinsic: Intrinsic,
    pub extrinsic: Extrinsic,
}

/// External writer receiving each decoded depth image.
pub trait DepthSink {
    fn write(&mut self, id: &str, image: &DepthImage) -> Result<(), SinkError>;
}

/// Rendering seam driven by the sequencer; implemented by `gpu::DepthRenderer`.
pub trait RenderBackend {
    /// Fixed (width, height) of the render surface.
    fn resolution(&self) -> (u32, u32);

    /// Render one camera's depth into the surface.
    fn render(&mut self, camera: &Camera, near: f32, far: f32) -> Result<(), RenderError>;

    /// Copy the encoded frame into `out` (RGB, rows bottom-to-top).
    fn read_pixels(&mut self, out: &mut [u8]) -> Result<(), RenderError>;
}

impl RenderBackend for DepthRenderer {
    fn resolution(&self) -> (u32, u32) {
        DepthRenderer::resolution(self)
    }

    fn render(&mut self, camera: &Camera, near: f32, far: f32) -> Result<(), RenderError> {
        DepthRenderer::render(self, camera, near, far)
    }

    fn read_pixels(&mut self, out: &mut [u8]) -> Result<(), RenderError> {
        DepthRenderer::read_pixels(self, out)
    }
}

/// Errors scoped to a single camera's capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("writer failed: {0}")]
    Sink(#[source] SinkError),
}

/// Observable sequencer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Rendering(usize),
    Capturing(usize),
    Advancing(usize),
    Done,
}

/// Outcome of a capture run.
#[derive(Debug, Default)]
pub struct CaptureReport {
    /// Output identifiers captured, in list order
    pub captured: Vec<String>,

    /// Cameras that failed, with the error that stopped each one
    pub failures: Vec<(String, CaptureError)>,

    /// Entries never attempted because a fatal error aborted the run
    pub aborted: usize,
}

impl CaptureReport {
    /// Whether every listed camera was captured.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.aborted == 0
    }
}

/// Drives the ordered capture list, one camera at a time.
///
/// Owns the render backend (and through it the GPU context) for the run;
/// resources are released when the sequencer drops, on every exit path. The
/// host pixel buffer is allocated once and overwritten each iteration, and
/// is only ever read after the same iteration's render/readback pair.
pub struct CaptureSequencer<R: RenderBackend> {
    backend: R,
    near: f32,
    far: f32,
    pixel_buf: Vec<u8>,
    phase: Phase,
}

impl<R: RenderBackend> CaptureSequencer<R> {
    /// Create a sequencer over a backend and clip pair.
    ///
    /// An inverted or degenerate clip pair is a fatal configuration error,
    /// rejected here before any camera is processed.
    pub fn new(backend: R, near: f32, far: f32) -> Result<Self, CameraError> {
        validate_clip_planes(near, far)?;
        let (width, height) = backend.resolution();
        let pixel_buf = vec![0u8; width as usize * height as usize * depth::BYTES_PER_PIXEL];

        Ok(Self {
            backend,
            near,
            far,
            pixel_buf,
            phase: Phase::Idle,
        })
    }

    /// Current state of the capture loop.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Capture every entry in order, handing decoded images to `sink`.
    ///
    /// A single camera's failure is logged under its identifier and recorded
    /// without stopping the run. A fatal render error (dead adapter, failed
    /// readback) poisons the shared context, so the remaining entries are
    /// skipped and counted in the report. An empty list completes
    /// immediately with an empty, successful report.
    pub fn run(&mut self, entries: &[CaptureEntry], sink: &mut dyn DepthSink) -> CaptureReport {
        let mut report = CaptureReport::default();

        for (index, entry) in entries.iter().enumerate() {
            match self.capture_one(index, entry, sink) {
                Ok(()) => {
                    log::info!("captured camera {}", entry.id);
                    report.captured.push(entry.id.clone());
                }
                Err(err) => {
                    log::warn!("camera {} failed: {}", entry.id, err);
                    let fatal = matches!(&err, CaptureError::Render(e) if e.is_fatal());
                    report.failures.push((entry.id.clone(), err));
                    if fatal {
                        report.aborted = entries.len() - index - 1;
                        log::error!(
                            "render context unusable, skipping {} remaining cameras",
                            report.aborted
                        );
                        break;
                    }
                }
            }
            self.phase = Phase::Advancing(index);
        }

        self.phase = Phase::Done;
        report
    }

    fn capture_one(
        &mut self,
        index: usize,
        entry: &CaptureEntry,
        sink: &mut dyn DepthSink,
    ) -> Result<(), CaptureError> {
        self.phase = Phase::Rendering(index);
        let camera = Camera::new(entry.intrinsic, entry.extrinsic)?;
        self.backend.render(&camera, self.near, self.far)?;

        self.phase = Phase::Capturing(index);
        self.backend.read_pixels(&mut self.pixel_buf)?;
        let (width, height) = self.backend.resolution();
        let image = depth::decode_rgb(&self.pixel_buf, width, height)?;
        sink.write(&entry.id, &image).map_err(CaptureError::Sink)?;

        Ok(())
    }
}
