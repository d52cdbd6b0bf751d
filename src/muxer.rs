//! Container multiplexer capability and protocol-enforcing adapter.
//!
//! The multiplexer itself is external: it accepts one track descriptor and
//! compressed samples in presentation-time order, and produces a file.
//! [`MuxerAdapter`] wraps it and enforces the protocol the encoder drain
//! loop relies on — exactly one track, registered before the first sample,
//! samples in non-decreasing timestamp order.

use crate::{
    codec::{SampleInfo, TrackDescriptor},
    error::PipelineError,
};

/// An external container multiplexer.
///
/// Implementations create the output file in their constructor and surface
/// [`PipelineError::ContainerOpenFailed`] from there.
pub trait ContainerMuxer: Send {
    /// Register a track and return its index.
    fn add_track(&mut self, descriptor: &TrackDescriptor) -> Result<usize, PipelineError>;

    /// Start the muxer. Valid only after [`add_track`](ContainerMuxer::add_track).
    fn start(&mut self) -> Result<(), PipelineError>;

    /// Write one compressed sample to the given track.
    fn write_sample(
        &mut self,
        track: usize,
        data: &[u8],
        info: &SampleInfo,
    ) -> Result<(), PipelineError>;

    /// Finalize the container and release the muxer. Called unconditionally
    /// on every exit path; finalization of a muxer that never started is a
    /// no-op.
    fn release(&mut self) -> Result<(), PipelineError>;
}

/// Wraps a [`ContainerMuxer`] and enforces the single-track write protocol.
pub(crate) struct MuxerAdapter {
    muxer: Box<dyn ContainerMuxer>,
    track: Option<usize>,
    last_pts_us: Option<i64>,
}

impl MuxerAdapter {
    pub(crate) fn new(muxer: Box<dyn ContainerMuxer>) -> Self {
        Self {
            muxer,
            track: None,
            last_pts_us: None,
        }
    }

    /// Register the single video track and start the muxer.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MuxerOrder`] if a track was already
    /// registered for this run.
    pub(crate) fn register_track(
        &mut self,
        descriptor: &TrackDescriptor,
    ) -> Result<(), PipelineError> {
        if self.track.is_some() {
            return Err(PipelineError::MuxerOrder(
                "track already registered for this run".to_string(),
            ));
        }
        let track = self.muxer.add_track(descriptor)?;
        self.muxer.start()?;
        self.track = Some(track);
        log::debug!(
            "Muxer track {track} registered ({}x{}, {})",
            descriptor.width,
            descriptor.height,
            descriptor.mime_type,
        );
        Ok(())
    }

    /// Write one sample through to the wrapped muxer.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MuxerOrder`] if no track has been registered
    /// or the timestamp moves backwards.
    pub(crate) fn write_sample(
        &mut self,
        data: &[u8],
        info: &SampleInfo,
    ) -> Result<(), PipelineError> {
        let track = self.track.ok_or_else(|| {
            PipelineError::MuxerOrder("sample offered before track registration".to_string())
        })?;
        if let Some(last) = self.last_pts_us {
            if info.pts_us < last {
                return Err(PipelineError::MuxerOrder(format!(
                    "sample timestamp {} precedes previous {last}",
                    info.pts_us,
                )));
            }
        }
        self.muxer.write_sample(track, data, info)?;
        self.last_pts_us = Some(info.pts_us);
        Ok(())
    }

    /// Whether the track has been registered yet.
    pub(crate) fn has_track(&self) -> bool {
        self.track.is_some()
    }

    /// Finalize and release the wrapped muxer.
    pub(crate) fn release(&mut self) -> Result<(), PipelineError> {
        self.muxer.release()
    }
}
