//! Engine thread: owns the gallery, the enrollment pipeline, and attendance
//! runs. Requests arrive over a channel from the D-Bus handlers; replies go
//! back over oneshots. The loop processes one request at a time, which also
//! serializes gallery writes (enrollment) against gallery reads (matching).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use rollcall_core::{
    AttendanceEntry, AttendanceSession, Detector, DetectorError, EnrollError, Enrollment,
    EnrollmentPipeline, EuclideanMatcher, FrameOutcome, Gallery, GeometryConfig, RecordStore,
    StoreError,
};

use crate::backend::{FrameSource, FrameSourceError};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Enroll(#[from] EnrollError),
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("frame source error: {0}")]
    FrameSource(#[from] FrameSourceError),
    #[error("capture source delivered no frame")]
    NoFrame,
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Roll produced by one attendance run.
#[derive(Debug, Clone, Serialize)]
pub struct AttendReport {
    pub session_id: String,
    pub frames_processed: usize,
    pub roll: Vec<AttendanceEntry>,
}

/// Daemon status summary.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub enrolled_identities: Vec<String>,
    pub last_roll_size: usize,
}

/// Opens a fresh frame source for each enrollment attempt or attendance run.
pub type SourceFactory =
    Box<dyn Fn() -> Result<Box<dyn FrameSource + Send>, FrameSourceError> + Send>;

enum EngineRequest {
    Enroll {
        name: String,
        reply: oneshot::Sender<Result<Enrollment, EngineError>>,
    },
    Attend {
        max_frames: usize,
        reply: oneshot::Sender<Result<AttendReport, EngineError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<AttendanceEntry>>,
    },
    Roster {
        reply: oneshot::Sender<Vec<String>>,
    },
    Status {
        reply: oneshot::Sender<StatusReport>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    stop: Arc<AtomicBool>,
}

impl EngineHandle {
    /// Request enrollment: take one frame, validate the face, persist, and
    /// add the embedding to the gallery.
    pub async fn enroll(&self, name: String) -> Result<Enrollment, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Enroll { name, reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Request an attendance run over up to `max_frames` frames (0 = until
    /// the source is exhausted or [`stop`](Self::stop) is called).
    pub async fn attend(&self, max_frames: usize) -> Result<AttendReport, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Attend { max_frames, reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Roll of the most recently completed attendance run.
    pub async fn snapshot(&self) -> Result<Vec<AttendanceEntry>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Identities currently enrolled in the gallery, in enrollment order.
    pub async fn roster(&self) -> Result<Vec<String>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Roster { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    pub async fn status(&self) -> Result<StatusReport, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Status { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Signal the attendance loop to stop before its next tick. An in-flight
    /// detector call finishes, but its frame is not processed.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Bootstraps the gallery from storage first (fail-fast on store or detector
/// unavailability), then enters the request loop.
pub fn spawn_engine(
    mut detector: Box<dyn Detector + Send>,
    source_factory: SourceFactory,
    mut store: Box<dyn RecordStore + Send>,
    geometry: GeometryConfig,
    match_threshold: f32,
) -> Result<EngineHandle, EngineError> {
    let gallery = bootstrap_gallery(detector.as_mut(), store.as_ref())?;
    tracing::info!(identities = gallery.len(), "gallery bootstrapped");

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    std::thread::Builder::new()
        .name("rollcall-engine".into())
        .spawn(move || {
            let mut gallery = gallery;
            let mut pipeline = EnrollmentPipeline::new(geometry);
            let mut last_roll: Vec<AttendanceEntry> = Vec::new();

            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Enroll { name, reply } => {
                        let result = run_enroll(
                            &name,
                            detector.as_mut(),
                            &source_factory,
                            store.as_mut(),
                            &mut pipeline,
                            &mut gallery,
                        );
                        let _ = reply.send(result);
                    }
                    EngineRequest::Attend { max_frames, reply } => {
                        stop_flag.store(false, Ordering::SeqCst);
                        let result = run_attend(
                            detector.as_mut(),
                            &source_factory,
                            &gallery,
                            match_threshold,
                            max_frames,
                            &stop_flag,
                        );
                        if let Ok(report) = &result {
                            last_roll = report.roll.clone();
                        }
                        let _ = reply.send(result);
                    }
                    EngineRequest::Snapshot { reply } => {
                        let _ = reply.send(last_roll.clone());
                    }
                    EngineRequest::Roster { reply } => {
                        let _ =
                            reply.send(gallery.identities().map(str::to_owned).collect());
                    }
                    EngineRequest::Status { reply } => {
                        let _ = reply.send(StatusReport {
                            enrolled_identities: gallery
                                .identities()
                                .map(str::to_owned)
                                .collect(),
                            last_roll_size: last_roll.len(),
                        });
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok(EngineHandle { tx, stop })
}

/// Rebuild the gallery from persisted records by re-running each stored
/// image through the detector. Records whose image yields no single usable
/// face are skipped with a warning, never fatal.
fn bootstrap_gallery(
    detector: &mut dyn Detector,
    store: &dyn RecordStore,
) -> Result<Gallery, EngineError> {
    let mut gallery = Gallery::new();
    for record in store.all_records()? {
        let detections = detector.detect(&rollcall_core::Frame::new(record.image))?;
        match detections.as_slice() {
            [single] => match &single.embedding {
                Some(embedding) => gallery.insert(&record.identity, embedding.clone()),
                None => tracing::warn!(
                    identity = %record.identity,
                    "stored image yielded no embedding; skipping record"
                ),
            },
            other => tracing::warn!(
                identity = %record.identity,
                faces = other.len(),
                "stored image did not yield exactly one face; skipping record"
            ),
        }
    }
    Ok(gallery)
}

fn run_enroll(
    name: &str,
    detector: &mut dyn Detector,
    source_factory: &SourceFactory,
    store: &mut dyn RecordStore,
    pipeline: &mut EnrollmentPipeline,
    gallery: &mut Gallery,
) -> Result<Enrollment, EngineError> {
    let mut source = source_factory()?;
    let frame = source.next_frame()?.ok_or(EngineError::NoFrame)?;
    let detections = detector.detect(&frame)?;
    let enrollment = pipeline.attempt_capture(&detections, &frame, name, store, gallery)?;
    Ok(enrollment)
}

fn run_attend(
    detector: &mut dyn Detector,
    source_factory: &SourceFactory,
    gallery: &Gallery,
    threshold: f32,
    max_frames: usize,
    stop: &AtomicBool,
) -> Result<AttendReport, EngineError> {
    if gallery.is_empty() {
        tracing::warn!("gallery is empty; every face will report as unknown");
    }

    let mut source = source_factory()?;
    let mut session = AttendanceSession::start();
    let matcher = EuclideanMatcher;
    let mut frames_processed = 0usize;

    loop {
        if stop.load(Ordering::SeqCst) {
            tracing::info!(session = %session.id(), frames_processed, "attendance run stopped");
            break;
        }
        if max_frames > 0 && frames_processed >= max_frames {
            break;
        }

        let Some(frame) = source.next_frame()? else {
            break;
        };

        // A flaky detector costs one frame, not the run.
        let detections = match detector.detect(&frame) {
            Ok(d) => d,
            Err(err) => {
                tracing::warn!(error = %err, "detector failed for frame; skipping");
                frames_processed += 1;
                continue;
            }
        };

        let outcomes = session.process_frame(&detections, &matcher, gallery, threshold);
        for outcome in &outcomes {
            if let FrameOutcome::Matched { identity, distance, newly_marked: false } = outcome {
                tracing::debug!(identity = %identity, distance = *distance, "seen again");
            }
        }
        frames_processed += 1;
    }

    Ok(AttendReport {
        session_id: session.id().to_string(),
        frames_processed,
        roll: session.snapshot(),
    })
}
