use std::path::PathBuf;

use frame_export_core::export::domain::render_state::RenderState;
use frame_export_core::export::exporter::Exporter;
use frame_export_core::scene::infrastructure::scene_renderer::SceneRenderer;
use frame_export_core::shared::export_error::ExportError;
use frame_export_core::time::domain::clock::Clock;
use frame_export_core::time::infrastructure::simulation_clock::SimulationClock;

#[cfg(feature = "image-sequence")]
use frame_export_core::export::sequence_exporter::SequenceStep;

use crate::workers::encode_worker::EncodeEvent;

/// Outcome of the last export, shown under the preview.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Saved(PathBuf),
    Error(String),
}

/// Exporter, render state and clock driven one host frame at a time.
///
/// Frames are encoded in the background, so an export only counts as saved
/// once the encoder reports its files as written.
pub struct ExportSession {
    exporter: Exporter,
    render_state: RenderState,
    clock: SimulationClock,
    status: Option<Status>,
    pending_image_export: bool,
    /// Folder of a finished sequence whose frames are still being encoded.
    #[cfg(feature = "image-sequence")]
    finished_sequence: Option<PathBuf>,
}

impl ExportSession {
    pub fn new(exporter: Exporter, render_state: RenderState) -> Self {
        Self {
            exporter,
            render_state,
            clock: SimulationClock::new(),
            status: None,
            pending_image_export: false,
            #[cfg(feature = "image-sequence")]
            finished_sequence: None,
        }
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    pub fn exporter_mut(&mut self) -> &mut Exporter {
        &mut self.exporter
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn render_state_mut(&mut self) -> &mut RenderState {
        &mut self.render_state
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// True while a snapshot or a sequence owns the render state.
    pub fn is_exporting(&self) -> bool {
        self.is_sequence_exporting() || self.render_state.is_exporting()
    }

    #[cfg(feature = "image-sequence")]
    pub fn is_sequence_exporting(&self) -> bool {
        self.exporter.sequence().is_exporting()
    }

    #[cfg(not(feature = "image-sequence"))]
    pub fn is_sequence_exporting(&self) -> bool {
        false
    }

    /// "Export as PNG": closes the dialog and captures the next frame.
    /// Ignored while a sequence is exporting.
    pub fn request_image_export(&mut self) {
        if self.is_sequence_exporting() {
            log::warn!("Snapshot ignored while an image sequence is exporting");
            return;
        }
        if self.exporter.confirm_image_export() {
            self.pending_image_export = true;
        }
    }

    #[cfg(feature = "image-sequence")]
    pub fn start_sequence_export(&mut self) {
        match self
            .exporter
            .begin_sequence_export(&mut self.render_state, &mut self.clock)
        {
            Ok(()) => {
                self.status = None;
                self.finished_sequence = None;
            }
            Err(e) => self.status = Some(Status::Error(e.to_string())),
        }
    }

    #[cfg(feature = "image-sequence")]
    pub fn stop_sequence_export(&mut self) {
        if self.is_sequence_exporting() {
            self.exporter
                .end_sequence_export(&mut self.render_state, &mut self.clock);
        }
    }

    /// One host frame: render at the clock's time, let the exporter consume
    /// the frame, then advance the clock. `pending_jobs` is the number of
    /// frames the encoder has not finished yet.
    pub fn frame(&mut self, renderer: &mut SceneRenderer, pending_jobs: usize) {
        let exporting_image = std::mem::take(&mut self.pending_image_export);
        if exporting_image {
            if let Err(e) = self.exporter.begin_image_export(&mut self.render_state) {
                self.fail("Image export", &e);
                return;
            }
        }

        if let Err(e) = renderer.render(self.render_state.size(), self.clock.time()) {
            self.on_render_failed(&e);
            return;
        }

        if exporting_image {
            if let Err(e) = self
                .exporter
                .end_image_export(renderer.source(), &mut self.render_state)
            {
                self.fail("Image export", &e);
            }
        }

        #[cfg(feature = "image-sequence")]
        self.update_sequence(renderer);

        self.settle(pending_jobs);
        self.clock.update();
    }

    /// A failed render leaves nothing to export: drop any snapshot in
    /// progress and stop a running sequence.
    fn on_render_failed(&mut self, error: &ExportError) {
        self.fail("Render", error);
        #[cfg(feature = "image-sequence")]
        self.stop_sequence_export();
        self.render_state.set_is_exporting(false);
    }

    #[cfg(feature = "image-sequence")]
    fn update_sequence(&mut self, renderer: &mut SceneRenderer) {
        match self
            .exporter
            .update(renderer.source(), &mut self.render_state, &mut self.clock)
        {
            Ok(SequenceStep::Finished) => {
                self.finished_sequence = Some(self.exporter.sequence().settings().folder.clone());
            }
            Ok(SequenceStep::Exported { .. } | SequenceStep::Idle) => {}
            Err(e) => self.fail("Sequence export", &e),
        }
    }

    pub fn handle_encode_event(&mut self, event: EncodeEvent) {
        match event {
            EncodeEvent::Written(path) => {
                if path == self.exporter.image_output_path() {
                    // Re-evaluate the overwrite warning now the file exists
                    let name = self.exporter.file_name().to_owned();
                    self.exporter.set_image_file_name(name);
                    self.status = Some(Status::Saved(path));
                }
            }
            EncodeEvent::Failed { path, message } => {
                log::error!("Failed to write {}: {message}", path.display());
                self.status = Some(Status::Error(format!(
                    "Failed to write {}: {message}",
                    path.display()
                )));
                #[cfg(feature = "image-sequence")]
                {
                    self.finished_sequence = None;
                    self.stop_sequence_export();
                }
            }
        }
    }

    /// Reports a finished sequence as saved once its last frame is written.
    #[cfg(feature = "image-sequence")]
    pub fn settle(&mut self, pending_jobs: usize) {
        if pending_jobs == 0 {
            if let Some(folder) = self.finished_sequence.take() {
                self.status = Some(Status::Saved(folder));
            }
        }
    }

    #[cfg(not(feature = "image-sequence"))]
    pub fn settle(&mut self, _pending_jobs: usize) {}

    fn fail(&mut self, what: &str, error: &ExportError) {
        log::error!("{what} failed: {error}");
        self.status = Some(Status::Error(error.to_string()));
    }
}
