//! Frame selection by timestamp.
//!
//! An asynchronous decoder cannot seek to an arbitrary time; instead the
//! extraction loop counts decoded frames and compares the running count
//! against a precomputed set of frame indices. This module converts the
//! caller's requested timestamps into that set.
//!
//! The conversion is `index = floor(time_sec * frame_rate)`: a request for
//! the frame at 6.34 s in a 30 fps stream selects frame 190.

use std::collections::BTreeSet;

/// Convert requested timestamps (seconds) into frame indices for a stream
/// with the given frame rate.
///
/// Pure function: no I/O, order-preserving, duplicates preserved.
///
/// # Example
///
/// ```
/// use framepipe::frame_indices;
///
/// assert_eq!(frame_indices(&[0.0, 0.5, 1.0], 30), vec![0, 15, 30]);
/// ```
pub fn frame_indices(times_sec: &[f64], frame_rate: u32) -> Vec<u64> {
    times_sec
        .iter()
        .map(|&time| (time * f64::from(frame_rate)) as u64)
        .collect()
}

/// The set of frame indices an extraction run must persist.
///
/// Computed once from the caller-supplied timestamps before the drain loop
/// starts; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RequestedFrames {
    indices: BTreeSet<u64>,
}

impl RequestedFrames {
    /// Build the set from requested timestamps and the stream frame rate.
    pub fn from_times(times_sec: &[f64], frame_rate: u32) -> Self {
        let indices = frame_indices(times_sec, frame_rate).into_iter().collect();
        Self { indices }
    }

    /// Whether the frame with the given decode index was requested.
    pub fn contains(&self, index: u64) -> bool {
        self.indices.contains(&index)
    }

    /// Number of distinct frames requested.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no frames were requested.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
