use std::fs;
use std::path::{Path, PathBuf};

use crate::export::domain::file_naming::{find_available_file_name_in, image_output_path};
use crate::export::domain::frame_source::FrameSource;
use crate::export::domain::image_writer::ImageWriter;
use crate::export::domain::render_state::RenderState;
use crate::shared::constants::{DEFAULT_FILE_NAME, IMAGE_FOLDER_NAME};
use crate::shared::export_error::ExportError;
use crate::shared::rect_size::RectSize;

#[cfg(feature = "image-sequence")]
use crate::export::sequence_exporter::{SequenceExporter, SequenceStep};
#[cfg(feature = "image-sequence")]
use crate::time::domain::clock::Clock;

/// Reads `size` pixels out of `source` and encodes them to `path`.
pub fn export_frame(
    source: &mut dyn FrameSource,
    writer: &dyn ImageWriter,
    size: RectSize,
    path: &Path,
) -> Result<(), ExportError> {
    let frame = source.read_pixels(size)?;
    writer.write_png(path, &frame)
}

/// Creates `folder` and its parents if they do not exist yet.
pub fn ensure_folder(folder: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(folder).map_err(|source| ExportError::CreateFolder {
        path: folder.to_path_buf(),
        source,
    })
}

/// Export dialog state and the export operations behind it.
///
/// Toolkit independent: hosts draw the dialogs from the accessors and feed
/// edits and button presses back through the setters.
///
/// A single snapshot is exported in two steps so the frame in between can be
/// rendered at the export resolution:
///
/// 1. [`begin_image_export`](Self::begin_image_export) flips the render state to exporting.
/// 2. The host renders one frame at `render_state.size()`.
/// 3. [`end_image_export`](Self::end_image_export) reads it back and writes the PNG.
pub struct Exporter {
    writer: Box<dyn ImageWriter>,
    image_folder: PathBuf,
    file_name: String,
    image_window_open: bool,
    show_file_exists_warning: bool,
    #[cfg(feature = "image-sequence")]
    sequence: SequenceExporter,
}

impl Exporter {
    /// Snapshots default to `root/out`, sequences to `root/exports`.
    pub fn new(root: &Path, writer: Box<dyn ImageWriter>) -> Self {
        Self {
            writer,
            image_folder: root.join(IMAGE_FOLDER_NAME),
            file_name: DEFAULT_FILE_NAME.to_owned(),
            image_window_open: false,
            show_file_exists_warning: false,
            #[cfg(feature = "image-sequence")]
            sequence: SequenceExporter::new(root),
        }
    }

    pub fn image_folder(&self) -> &Path {
        &self.image_folder
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `image_folder/file_name.png`
    pub fn image_output_path(&self) -> PathBuf {
        image_output_path(&self.image_folder, &self.file_name)
    }

    pub fn set_image_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = file_name.into();
        self.refresh_file_exists_warning();
    }

    pub fn set_image_folder(&mut self, folder: impl Into<PathBuf>) {
        self.image_folder = folder.into();
        self.refresh_file_exists_warning();
    }

    /// True when the current output path would overwrite an existing file.
    pub fn show_file_exists_warning(&self) -> bool {
        self.show_file_exists_warning
    }

    /// Replaces the file name with the first one not taken in the image folder.
    pub fn find_available_file_name(&mut self) {
        self.file_name = find_available_file_name_in(&self.image_folder, &self.file_name);
        self.refresh_file_exists_warning();
    }

    pub fn is_image_window_open(&self) -> bool {
        self.image_window_open
    }

    /// Opening the dialog moves the file name off any existing file.
    pub fn set_image_window_open(&mut self, open: bool) {
        self.image_window_open = open;
        if open {
            self.find_available_file_name();
        }
    }

    /// "Export as PNG": closes the dialog and tells the host to start the export.
    pub fn confirm_image_export(&mut self) -> bool {
        self.image_window_open = false;
        true
    }

    /// Refused with [`ExportError::SequenceInProgress`] while a sequence owns
    /// the render state.
    pub fn begin_image_export(&self, render_state: &mut RenderState) -> Result<(), ExportError> {
        if self.is_sequence_running() {
            return Err(ExportError::SequenceInProgress);
        }
        render_state.set_is_exporting(true);
        Ok(())
    }

    /// Writes the frame rendered since [`begin_image_export`](Self::begin_image_export).
    ///
    /// The exporting flag is cleared whether or not the write succeeds, unless
    /// a sequence export still needs it.
    pub fn end_image_export(
        &mut self,
        source: &mut dyn FrameSource,
        render_state: &mut RenderState,
    ) -> Result<PathBuf, ExportError> {
        let path = self.image_output_path();
        let result = ensure_folder(&self.image_folder)
            .and_then(|()| self.export_image(source, render_state.size(), &path));
        if !self.is_sequence_running() {
            render_state.set_is_exporting(false);
        }
        result?;
        log::info!("Exported image to {}", path.display());
        self.refresh_file_exists_warning();
        Ok(path)
    }

    pub fn export_image(
        &self,
        source: &mut dyn FrameSource,
        size: RectSize,
        path: &Path,
    ) -> Result<(), ExportError> {
        export_frame(source, self.writer.as_ref(), size, path)
    }

    fn refresh_file_exists_warning(&mut self) {
        self.show_file_exists_warning = self.image_output_path().exists();
    }

    #[cfg(feature = "image-sequence")]
    fn is_sequence_running(&self) -> bool {
        self.sequence.is_exporting()
    }

    #[cfg(not(feature = "image-sequence"))]
    fn is_sequence_running(&self) -> bool {
        false
    }
}

#[cfg(feature = "image-sequence")]
impl Exporter {
    pub fn sequence(&self) -> &SequenceExporter {
        &self.sequence
    }

    pub fn sequence_mut(&mut self) -> &mut SequenceExporter {
        &mut self.sequence
    }

    pub fn begin_sequence_export(
        &mut self,
        render_state: &mut RenderState,
        clock: &mut dyn Clock,
    ) -> Result<(), ExportError> {
        self.sequence.begin(render_state, clock)
    }

    /// Call once per rendered frame, before advancing `clock`.
    pub fn update(
        &mut self,
        source: &mut dyn FrameSource,
        render_state: &mut RenderState,
        clock: &mut dyn Clock,
    ) -> Result<SequenceStep, ExportError> {
        self.sequence
            .update(source, self.writer.as_ref(), render_state, clock)
    }

    pub fn end_sequence_export(&mut self, render_state: &mut RenderState, clock: &mut dyn Clock) {
        self.sequence.end(render_state, clock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::infrastructure::cpu_framebuffer::CpuFramebuffer;
    use crate::export::infrastructure::png_file_writer::PngFileWriter;
    use crate::shared::frame::Frame;

    fn size(width: u32, height: u32) -> RectSize {
        RectSize::new(width, height).unwrap()
    }

    fn exporter(root: &Path) -> Exporter {
        Exporter::new(root, Box::new(PngFileWriter::new()))
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_defaults_live_under_root() {
        let exporter = exporter(Path::new("/work"));
        assert_eq!(exporter.image_folder(), Path::new("/work/out"));
        assert_eq!(exporter.file_name(), "image");
        assert_eq!(exporter.image_output_path(), PathBuf::from("/work/out/image.png"));
        assert!(!exporter.is_image_window_open());
    }

    #[test]
    fn test_opening_window_avoids_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("out/image.png"));
        let mut exporter = exporter(dir.path());

        exporter.set_image_window_open(true);
        assert!(exporter.is_image_window_open());
        assert_eq!(exporter.file_name(), "image(1)");
        assert!(!exporter.show_file_exists_warning());
    }

    #[test]
    fn test_editing_path_toggles_overwrite_warning() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("out/taken.png"));
        let mut exporter = exporter(dir.path());

        exporter.set_image_file_name("taken");
        assert!(exporter.show_file_exists_warning());
        exporter.set_image_file_name("free");
        assert!(!exporter.show_file_exists_warning());
        exporter.set_image_folder(dir.path().join("elsewhere"));
        exporter.set_image_file_name("taken");
        assert!(!exporter.show_file_exists_warning());
    }

    #[test]
    fn test_confirm_closes_window() {
        let mut exporter = exporter(Path::new("/work"));
        exporter.set_image_window_open(true);
        assert!(exporter.confirm_image_export());
        assert!(!exporter.is_image_window_open());
    }

    #[test]
    fn test_image_export_renders_at_export_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = exporter(dir.path());
        let mut render_state = RenderState::new(size(64, 48));
        render_state.set_export_size(8, 6).unwrap();
        let mut fb = CpuFramebuffer::new(render_state.size());

        exporter.begin_image_export(&mut render_state).unwrap();
        assert!(render_state.is_exporting());
        fb.resize(render_state.size());
        *fb.frame_mut() = Frame::filled(size(8, 6), [0, 255, 0, 255]);

        let path = exporter.end_image_export(&mut fb, &mut render_state).unwrap();
        assert!(!render_state.is_exporting());
        assert_eq!(path, dir.path().join("out/image.png"));

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(3, 3).0, [0, 255, 0, 255]);
        // The file now exists, so the dialog would warn before overwriting it
        assert!(exporter.show_file_exists_warning());
    }

    #[test]
    fn test_failed_image_export_still_clears_exporting() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = exporter(dir.path());
        let mut render_state = RenderState::new(size(64, 48));
        // Framebuffer never resized to the export size
        let mut fb = CpuFramebuffer::new(size(64, 48));

        exporter.begin_image_export(&mut render_state).unwrap();
        let err = exporter
            .end_image_export(&mut fb, &mut render_state)
            .unwrap_err();
        assert!(matches!(err, ExportError::SizeMismatch { .. }));
        assert!(!render_state.is_exporting());
    }

    #[test]
    fn test_folder_creation_failure_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let mut exporter = exporter(dir.path());
        exporter.set_image_folder(blocker.join("sub"));
        let mut render_state = RenderState::new(size(4, 4));
        let mut fb = CpuFramebuffer::new(size(4, 4));

        let err = exporter
            .end_image_export(&mut fb, &mut render_state)
            .unwrap_err();
        assert!(matches!(err, ExportError::CreateFolder { .. }));
    }

    #[cfg(feature = "image-sequence")]
    mod with_sequence {
        use super::*;
        use crate::time::domain::clock::Clock;
        use crate::time::infrastructure::simulation_clock::SimulationClock;

        struct Running {
            exporter: Exporter,
            render_state: RenderState,
            clock: SimulationClock,
            fb: CpuFramebuffer,
            _dir: tempfile::TempDir,
        }

        /// A sequence exporting 8x8 frames from a 32x32 window.
        fn running_sequence() -> Running {
            let dir = tempfile::tempdir().unwrap();
            let mut exporter = exporter(dir.path());
            let mut render_state = RenderState::new(size(32, 32));
            render_state.set_export_size(8, 8).unwrap();
            let mut clock = SimulationClock::new();
            exporter
                .begin_sequence_export(&mut render_state, &mut clock)
                .unwrap();
            let fb = CpuFramebuffer::new(render_state.size());
            Running {
                exporter,
                render_state,
                clock,
                fb,
                _dir: dir,
            }
        }

        #[test]
        fn test_image_export_refused_while_sequence_runs() {
            let mut r = running_sequence();
            let err = r
                .exporter
                .begin_image_export(&mut r.render_state)
                .unwrap_err();
            assert!(matches!(err, ExportError::SequenceInProgress));
            assert!(r.render_state.is_exporting());
            assert_eq!(r.render_state.size(), size(8, 8));
        }

        #[test]
        fn test_snapshot_during_sequence_keeps_sequence_alive() {
            let mut r = running_sequence();
            let path = r
                .exporter
                .end_image_export(&mut r.fb, &mut r.render_state)
                .unwrap();
            assert!(path.exists());
            assert!(r.render_state.is_exporting());

            r.fb.resize(r.render_state.size());
            let step = r
                .exporter
                .update(&mut r.fb, &mut r.render_state, &mut r.clock)
                .unwrap();
            assert_eq!(step, SequenceStep::Exported { index: 0 });
            assert!(r.exporter.sequence().is_exporting());
            assert!(r.clock.is_fixed_timestep());
        }

        #[test]
        fn test_image_export_allowed_after_sequence_stops() {
            let mut r = running_sequence();
            r.exporter
                .end_sequence_export(&mut r.render_state, &mut r.clock);
            r.exporter.begin_image_export(&mut r.render_state).unwrap();
            assert!(r.render_state.is_exporting());
        }
    }
}
