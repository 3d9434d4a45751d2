use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use frame_export_core::export::domain::image_writer::ImageWriter;
use frame_export_core::export::infrastructure::png_file_writer::PngFileWriter;
use frame_export_core::shared::export_error::ExportError;
use frame_export_core::shared::frame::Frame;

/// Frames queued ahead of the encoder before the render loop blocks.
pub const QUEUE_CAPACITY: usize = 8;

/// Messages sent from the encode thread to the UI.
#[derive(Debug, Clone)]
pub enum EncodeEvent {
    Written(PathBuf),
    Failed { path: PathBuf, message: String },
}

struct EncodeJob {
    path: PathBuf,
    frame: Frame,
}

/// [`ImageWriter`] that hands frames to a background PNG encoder so the
/// render loop does not wait on compression and disk writes.
pub struct ChannelImageWriter {
    jobs: Sender<EncodeJob>,
    pending: Arc<AtomicUsize>,
}

impl ImageWriter for ChannelImageWriter {
    fn write_png(&self, path: &Path, frame: &Frame) -> Result<(), ExportError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let job = EncodeJob {
            path: path.to_path_buf(),
            frame: frame.clone(),
        };
        self.jobs.send(job).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            ExportError::WriterClosed
        })
    }
}

/// UI side of the encode thread: its events plus the number of frames
/// queued or being encoded.
pub struct EncodeQueue {
    events: Receiver<EncodeEvent>,
    pending: Arc<AtomicUsize>,
}

impl EncodeQueue {
    /// Frames accepted by the writer whose event has not been sent yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn try_recv(&self) -> Option<EncodeEvent> {
        self.events.try_recv().ok()
    }

    /// Blocks until every queued frame is on disk (or failed), or until
    /// `timeout` runs out. Returns the events received meanwhile.
    pub fn drain(&self, timeout: Duration) -> Vec<EncodeEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while self.pending() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(event) => events.push(event),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("Gave up waiting for {} queued frames", self.pending());
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        events.extend(self.events.try_iter());
        events
    }
}

/// Spawn the encode thread. It exits once the returned writer is dropped and
/// the queue has drained.
pub fn spawn(capacity: usize) -> (ChannelImageWriter, EncodeQueue) {
    let (job_tx, job_rx) = crossbeam_channel::bounded::<EncodeJob>(capacity);
    let (event_tx, event_rx) = crossbeam_channel::unbounded::<EncodeEvent>();
    let pending = Arc::new(AtomicUsize::new(0));

    let worker_pending = Arc::clone(&pending);
    thread::spawn(move || {
        let writer = PngFileWriter::new();
        for job in job_rx {
            let event = match writer.write_png(&job.path, &job.frame) {
                Ok(()) => EncodeEvent::Written(job.path),
                Err(e) => {
                    log::error!("{e}");
                    EncodeEvent::Failed {
                        path: job.path,
                        message: e.to_string(),
                    }
                }
            };
            // Count the job as done only once its event is visible
            let sent = event_tx.send(event).is_ok();
            worker_pending.fetch_sub(1, Ordering::SeqCst);
            if !sent {
                break;
            }
        }
        log::debug!("Encode worker stopped");
    });

    let writer = ChannelImageWriter {
        jobs: job_tx,
        pending: Arc::clone(&pending),
    };
    let queue = EncodeQueue {
        events: event_rx,
        pending,
    };
    (writer, queue)
}
