use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::export::domain::frame_numbering::{digit_count, frame_file_name, total_frames};
use crate::export::domain::frame_source::FrameSource;
use crate::export::domain::frame_time_average::FrameTimeAverager;
use crate::export::domain::image_writer::ImageWriter;
use crate::export::domain::render_state::RenderState;
use crate::export::exporter::{ensure_folder, export_frame};
use crate::shared::constants::{
    DEFAULT_FPS, DEFAULT_SEQUENCE_BEGIN_S, DEFAULT_SEQUENCE_END_S, SEQUENCE_FOLDER_NAME,
};
use crate::shared::duration_format::format_hms;
use crate::shared::export_error::ExportError;
use crate::time::domain::clock::Clock;

/// What to export: a time range of the animation, sampled at `fps`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSettings {
    pub folder: PathBuf,
    pub fps: f64,
    pub begin_s: f64,
    pub end_s: f64,
}

impl SequenceSettings {
    pub fn new(root: &Path) -> Self {
        Self {
            folder: root.join(SEQUENCE_FOLDER_NAME),
            fps: DEFAULT_FPS,
            begin_s: DEFAULT_SEQUENCE_BEGIN_S,
            end_s: DEFAULT_SEQUENCE_END_S,
        }
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ExportError::InvalidFrameRate(self.fps));
        }
        if !(self.end_s > self.begin_s) {
            return Err(ExportError::InvalidRange {
                begin: self.begin_s,
                end: self.end_s,
            });
        }
        Ok(())
    }

    pub fn total_frames(&self) -> u32 {
        total_frames(self.end_s - self.begin_s, self.fps)
    }
}

/// Outcome of one [`SequenceExporter::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStep {
    /// No export in progress.
    Idle,
    /// Frame `index` was written.
    Exported { index: u32 },
    /// The range was covered; the clock is back in realtime mode.
    Finished,
}

/// Snapshot of a running export for progress display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceProgress {
    pub frame_count: u32,
    pub total_frames: u32,
    pub digits: usize,
    /// Mean wall-clock seconds spent per exported frame so far.
    pub average_frame_time_s: f64,
}

impl SequenceProgress {
    pub fn remaining_frames(&self) -> u32 {
        self.total_frames.saturating_sub(self.frame_count)
    }

    /// Estimated wall-clock seconds until the export finishes.
    pub fn remaining_s(&self) -> f64 {
        self.remaining_frames() as f64 * self.average_frame_time_s
    }

    pub fn fraction(&self) -> f32 {
        if self.total_frames == 0 {
            1.0
        } else {
            self.frame_count as f32 / self.total_frames as f32
        }
    }

    /// `Exported 003 / 120 frames`
    pub fn label(&self) -> String {
        format!(
            "Exported {:0width$} / {} frames",
            self.frame_count,
            self.total_frames,
            width = self.digits
        )
    }

    /// `1m 05s remaining`
    pub fn remaining_label(&self) -> String {
        format!("{} remaining", format_hms(self.remaining_s()))
    }
}

#[derive(Debug, Clone)]
struct ActiveExport {
    folder: PathBuf,
    end_s: f64,
    frame_count: u32,
    total_frames: u32,
    digits: usize,
    averager: FrameTimeAverager,
    last_export: Instant,
}

/// Fixed-timestep image sequence export.
///
/// While exporting, the exporter owns the animation clock: it runs at exactly
/// `1 / fps` per rendered frame starting at `begin_s`, and every rendered frame
/// is written as `folder/<zero-padded index>.png` until `end_s` is reached.
///
/// The host loop must, once per frame and in this order:
/// render at `clock.time()`, call [`update`](Self::update), advance the clock.
pub struct SequenceExporter {
    settings: SequenceSettings,
    window_open: bool,
    active: Option<ActiveExport>,
}

impl SequenceExporter {
    pub fn new(root: &Path) -> Self {
        Self {
            settings: SequenceSettings::new(root),
            window_open: false,
            active: None,
        }
    }

    pub fn settings(&self) -> &SequenceSettings {
        &self.settings
    }

    /// Edits apply to the next export; a running export keeps its own copy.
    pub fn settings_mut(&mut self) -> &mut SequenceSettings {
        &mut self.settings
    }

    pub fn is_window_open(&self) -> bool {
        self.window_open
    }

    /// The dialog cannot be closed while an export is running.
    pub fn set_window_open(&mut self, open: bool) {
        self.window_open = open || self.is_exporting();
    }

    pub fn is_exporting(&self) -> bool {
        self.active.is_some()
    }

    pub fn begin(
        &mut self,
        render_state: &mut RenderState,
        clock: &mut dyn Clock,
    ) -> Result<(), ExportError> {
        self.begin_at(render_state, clock, Instant::now())
    }

    /// Starts exporting. Nothing changes if the settings are invalid or the
    /// folder cannot be created.
    pub fn begin_at(
        &mut self,
        render_state: &mut RenderState,
        clock: &mut dyn Clock,
        now: Instant,
    ) -> Result<(), ExportError> {
        self.settings.validate()?;
        if let Err(e) = ensure_folder(&self.settings.folder) {
            log::warn!("Couldn't start exporting because folder creation failed: {e}");
            return Err(e);
        }

        let total = self.settings.total_frames();
        self.active = Some(ActiveExport {
            folder: self.settings.folder.clone(),
            end_s: self.settings.end_s,
            frame_count: 0,
            total_frames: total,
            digits: digit_count(total),
            averager: FrameTimeAverager::new(),
            last_export: now,
        });
        self.window_open = true;
        render_state.set_is_exporting(true);
        clock.set_fixed_timestep(self.settings.fps);
        clock.set_time(self.settings.begin_s);

        log::info!(
            "Exporting {total} frames at {} fps to {}",
            self.settings.fps,
            self.settings.folder.display()
        );
        Ok(())
    }

    pub fn update(
        &mut self,
        source: &mut dyn FrameSource,
        writer: &dyn ImageWriter,
        render_state: &mut RenderState,
        clock: &mut dyn Clock,
    ) -> Result<SequenceStep, ExportError> {
        self.update_at(source, writer, render_state, clock, Instant::now())
    }

    /// Writes the frame just rendered, or ends the export once the range is covered.
    ///
    /// A write failure ends the export before the error is returned.
    pub fn update_at(
        &mut self,
        source: &mut dyn FrameSource,
        writer: &dyn ImageWriter,
        render_state: &mut RenderState,
        clock: &mut dyn Clock,
        now: Instant,
    ) -> Result<SequenceStep, ExportError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(SequenceStep::Idle);
        };
        self.window_open = true;

        // The frame counter guards against rounding leaving time a hair under end_s
        if clock.time() >= active.end_s || active.frame_count >= active.total_frames {
            self.end(render_state, clock);
            return Ok(SequenceStep::Finished);
        }

        let index = active.frame_count;
        let path = active.folder.join(frame_file_name(index, active.digits));
        if let Err(e) = export_frame(source, writer, render_state.size(), &path) {
            log::error!("Sequence export stopped at frame {index}: {e}");
            self.end(render_state, clock);
            return Err(e);
        }

        active.frame_count += 1;
        active
            .averager
            .push(now.saturating_duration_since(active.last_export));
        active.last_export = now;
        Ok(SequenceStep::Exported { index })
    }

    /// Stops exporting and hands the clock back in realtime mode.
    pub fn end(&mut self, render_state: &mut RenderState, clock: &mut dyn Clock) {
        if let Some(active) = self.active.take() {
            log::info!(
                "Sequence export ended after {} of {} frames",
                active.frame_count,
                active.total_frames
            );
        }
        render_state.set_is_exporting(false);
        clock.set_realtime();
        self.window_open = false;
    }

    pub fn progress(&self) -> Option<SequenceProgress> {
        self.active.as_ref().map(|active| SequenceProgress {
            frame_count: active.frame_count,
            total_frames: active.total_frames,
            digits: active.digits,
            average_frame_time_s: active.averager.average(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::infrastructure::cpu_framebuffer::CpuFramebuffer;
    use crate::export::infrastructure::png_file_writer::PngFileWriter;
    use crate::shared::frame::Frame;
    use crate::shared::rect_size::RectSize;
    use crate::time::infrastructure::simulation_clock::SimulationClock;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // --- Stubs ---

    struct RecordingWriter {
        written: Arc<Mutex<Vec<PathBuf>>>,
        fail: bool,
    }

    impl RecordingWriter {
        fn new() -> (Self, Arc<Mutex<Vec<PathBuf>>>) {
            let written = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    written: written.clone(),
                    fail: false,
                },
                written,
            )
        }

        fn failing() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                fail: true,
            }
        }
    }

    impl ImageWriter for RecordingWriter {
        fn write_png(&self, path: &Path, _frame: &Frame) -> Result<(), ExportError> {
            if self.fail {
                return Err(ExportError::WriterClosed);
            }
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct Harness {
        exporter: SequenceExporter,
        render_state: RenderState,
        clock: SimulationClock,
        fb: CpuFramebuffer,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(fps: f64, begin_s: f64, end_s: f64) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut exporter = SequenceExporter::new(dir.path());
            let settings = exporter.settings_mut();
            settings.fps = fps;
            settings.begin_s = begin_s;
            settings.end_s = end_s;
            let mut render_state = RenderState::new(RectSize::new(32, 32).unwrap());
            render_state.set_export_size(4, 2).unwrap();
            Self {
                exporter,
                render_state,
                clock: SimulationClock::new(),
                fb: CpuFramebuffer::new(RectSize::new(32, 32).unwrap()),
                _dir: dir,
            }
        }

        fn begin(&mut self) -> Result<(), ExportError> {
            self.exporter.begin(&mut self.render_state, &mut self.clock)
        }

        /// One host frame: render, export, advance.
        fn frame(&mut self, writer: &dyn ImageWriter) -> Result<SequenceStep, ExportError> {
            self.fb.resize(self.render_state.size());
            let step = self.exporter.update(
                &mut self.fb,
                writer,
                &mut self.render_state,
                &mut self.clock,
            );
            self.clock.update();
            step
        }

        fn run_to_end(&mut self, writer: &dyn ImageWriter) -> Vec<SequenceStep> {
            let mut steps = Vec::new();
            loop {
                let step = self.frame(writer).unwrap();
                steps.push(step);
                if step != (SequenceStep::Exported { index: steps.len() as u32 - 1 }) {
                    return steps;
                }
            }
        }
    }

    // --- Settings ---

    #[test]
    fn test_default_settings() {
        let settings = SequenceSettings::new(Path::new("/work"));
        assert_eq!(settings.folder, PathBuf::from("/work/exports"));
        assert_eq!(settings.fps, 30.0);
        assert_eq!(settings.total_frames(), 300);
    }

    #[test]
    fn test_invalid_frame_rate_rejected() {
        let mut h = Harness::new(0.0, 0.0, 1.0);
        assert!(matches!(h.begin(), Err(ExportError::InvalidFrameRate(_))));
        assert!(!h.exporter.is_exporting());
        assert!(!h.clock.is_fixed_timestep());
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut h = Harness::new(30.0, 2.0, 2.0);
        assert!(matches!(h.begin(), Err(ExportError::InvalidRange { .. })));
        assert!(!h.render_state.is_exporting());
    }

    // --- Lifecycle ---

    #[test]
    fn test_begin_takes_over_clock_and_render_state() {
        let mut h = Harness::new(24.0, 3.0, 4.0);
        h.begin().unwrap();
        assert!(h.exporter.is_exporting());
        assert!(h.exporter.is_window_open());
        assert!(h.render_state.is_exporting());
        assert_eq!(h.render_state.size(), RectSize::new(4, 2).unwrap());
        assert_eq!(h.clock.fixed_fps(), Some(24.0));
        assert_eq!(h.clock.time(), 3.0);
        assert!(h.exporter.settings().folder.is_dir());
    }

    #[test]
    fn test_exports_exactly_total_frames_then_finishes() {
        let mut h = Harness::new(10.0, 0.0, 1.0);
        let (writer, written) = RecordingWriter::new();
        h.begin().unwrap();
        let steps = h.run_to_end(&writer);

        assert_eq!(steps.len(), 11);
        assert_eq!(steps.last(), Some(&SequenceStep::Finished));
        let names: Vec<String> = written
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("{i}.png")).collect();
        assert_eq!(names, expected);

        assert!(!h.exporter.is_exporting());
        assert!(!h.exporter.is_window_open());
        assert!(!h.render_state.is_exporting());
        assert!(!h.clock.is_fixed_timestep());
    }

    #[test]
    fn test_partial_last_frame_is_included() {
        // 0.25s at 10 fps covers frames at 0.0, 0.1 and 0.2
        let mut h = Harness::new(10.0, 0.0, 0.25);
        let (writer, written) = RecordingWriter::new();
        h.begin().unwrap();
        h.run_to_end(&writer);
        assert_eq!(written.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_writes_zero_padded_pngs() {
        let mut h = Harness::new(6.0, 0.0, 2.0);
        h.begin().unwrap();
        h.run_to_end(&PngFileWriter::new());

        let folder = h.exporter.settings().folder.clone();
        for i in 0..12 {
            let path = folder.join(format!("{i:02}.png"));
            let img = image::open(&path).unwrap();
            assert_eq!((img.width(), img.height()), (4, 2));
        }
        assert!(!folder.join("12.png").exists());
    }

    #[test]
    fn test_update_when_idle_does_nothing() {
        let mut h = Harness::new(30.0, 0.0, 1.0);
        let (writer, written) = RecordingWriter::new();
        assert_eq!(h.frame(&writer).unwrap(), SequenceStep::Idle);
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stop_restores_realtime() {
        let mut h = Harness::new(30.0, 0.0, 1.0);
        let (writer, written) = RecordingWriter::new();
        h.begin().unwrap();
        h.frame(&writer).unwrap();
        h.frame(&writer).unwrap();
        h.exporter.end(&mut h.render_state, &mut h.clock);

        assert_eq!(written.lock().unwrap().len(), 2);
        assert!(!h.exporter.is_exporting());
        assert!(!h.exporter.is_window_open());
        assert!(!h.clock.is_fixed_timestep());
        assert!(h.exporter.progress().is_none());
        assert_eq!(h.frame(&writer).unwrap(), SequenceStep::Idle);
    }

    #[test]
    fn test_write_failure_ends_export() {
        let mut h = Harness::new(30.0, 0.0, 1.0);
        h.begin().unwrap();
        let err = h.frame(&RecordingWriter::failing()).unwrap_err();
        assert!(matches!(err, ExportError::WriterClosed));
        assert!(!h.exporter.is_exporting());
        assert!(!h.render_state.is_exporting());
        assert!(!h.clock.is_fixed_timestep());
    }

    #[test]
    fn test_folder_creation_failure_aborts_begin() {
        let mut h = Harness::new(30.0, 0.0, 1.0);
        let blocker = h._dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        h.exporter.settings_mut().folder = blocker.join("frames");

        assert!(matches!(h.begin(), Err(ExportError::CreateFolder { .. })));
        assert!(!h.exporter.is_exporting());
        assert!(!h.render_state.is_exporting());
        assert!(!h.clock.is_fixed_timestep());
    }

    #[test]
    fn test_window_stays_open_while_exporting() {
        let mut h = Harness::new(30.0, 0.0, 1.0);
        h.exporter.set_window_open(true);
        h.begin().unwrap();
        h.exporter.set_window_open(false);
        assert!(h.exporter.is_window_open());
        h.exporter.end(&mut h.render_state, &mut h.clock);
        h.exporter.set_window_open(true);
        h.exporter.set_window_open(false);
        assert!(!h.exporter.is_window_open());
    }

    #[test]
    fn test_settings_edits_do_not_affect_running_export() {
        let mut h = Harness::new(10.0, 0.0, 0.5);
        let (writer, written) = RecordingWriter::new();
        h.begin().unwrap();
        h.exporter.settings_mut().end_s = 100.0;
        h.exporter.settings_mut().folder = PathBuf::from("/nowhere");
        h.run_to_end(&writer);
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| !p.starts_with("/nowhere")));
    }

    // --- Progress ---

    #[test]
    fn test_progress_estimates_remaining_time() {
        let mut h = Harness::new(10.0, 0.0, 1.0);
        let writer = PngFileWriter::new();
        let t0 = Instant::now();
        h.exporter
            .begin_at(&mut h.render_state, &mut h.clock, t0)
            .unwrap();

        for (i, ms) in [100u64, 300].iter().enumerate() {
            h.fb.resize(h.render_state.size());
            let step = h
                .exporter
                .update_at(
                    &mut h.fb,
                    &writer,
                    &mut h.render_state,
                    &mut h.clock,
                    t0 + Duration::from_millis(*ms),
                )
                .unwrap();
            assert_eq!(step, SequenceStep::Exported { index: i as u32 });
            h.clock.update();
        }

        let progress = h.exporter.progress().unwrap();
        assert_eq!(progress.frame_count, 2);
        assert_eq!(progress.total_frames, 10);
        assert_eq!(progress.remaining_frames(), 8);
        // Deltas of 100ms and 200ms average to 150ms
        assert_relative_eq!(progress.average_frame_time_s, 0.15, epsilon = 1e-9);
        assert_relative_eq!(progress.remaining_s(), 1.2, epsilon = 1e-9);
        assert_relative_eq!(progress.fraction(), 0.2);
    }

    #[test]
    fn test_progress_labels() {
        let progress = SequenceProgress {
            frame_count: 3,
            total_frames: 120,
            digits: 3,
            average_frame_time_s: 0.5,
        };
        assert_eq!(progress.label(), "Exported 003 / 120 frames");
        assert_eq!(progress.remaining_label(), "59s remaining");
    }
}
