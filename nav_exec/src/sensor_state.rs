//! # Shared sensor state
//!
//! Producers (sensor clients) and the control loop share one `SensorState`. It holds a slot per
//! source containing the latest normalised sample and a sequence number which is bumped on every
//! write. A slot holds "new data" while its sequence number differs from the one last consumed by
//! the control loop.
//!
//! Each slot is guarded by its own mutex. Only the source's producer writes a slot and only the
//! control loop marks it consumed, so no global lock is needed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard};

use log::{trace, warn};
use serde::Serialize;

use crate::norm::{
    DisplacementSample, HeadingNormaliser, HeadingSample, MarkerNormaliser, MarkerObservation,
    NormError, Params as NormParams,
};
use comms_if::eqpt::{
    marker::MarkerDetections,
    odom::{Displacement, Heading},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Latest sample from one source.
#[derive(Debug)]
struct Slot<T> {
    sample: Option<T>,

    /// Incremented on every write
    seq: u64,

    /// Sequence number of the last sample consumed by the control loop
    consumed_seq: u64,
}

/// A source's slot along with the normaliser applied on the write path.
#[derive(Debug)]
struct Channel<T, N> {
    slot: Slot<T>,
    norm: N,
}

/// State shared between the sensor producers and the control loop.
#[derive(Debug)]
pub struct SensorState {
    marker: Mutex<Channel<MarkerObservation, MarkerNormaliser>>,
    displacement: Mutex<Slot<DisplacementSample>>,
    heading: Mutex<Channel<HeadingSample, HeadingNormaliser>>,
}

/// A copy of the new data held by each slot, taken at the start of a control cycle.
///
/// Sources with no new data since they were last consumed are `None`.
#[derive(Debug, Clone, Default)]
pub struct SensorSnapshot {
    pub marker: Option<MarkerObservation>,
    pub displacement: Option<DisplacementSample>,
    pub heading: Option<HeadingSample>,

    marker_seq: u64,
    displacement_seq: u64,
    heading_seq: u64,
}

/// Which sources currently hold new data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NewDataFlags {
    pub marker: bool,
    pub displacement: bool,
    pub heading: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A raw sample from any of the sensor streams.
#[derive(Debug, Clone)]
pub enum SensorMsg {
    Marker(MarkerDetections),
    Displacement(Displacement),
    Heading(Heading),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            sample: None,
            seq: 0,
            consumed_seq: 0,
        }
    }

    fn write(&mut self, sample: T) {
        self.sample = Some(sample);
        self.seq += 1;
    }

    fn is_new(&self) -> bool {
        self.seq != self.consumed_seq
    }

    /// Read the sample if it's new, along with the sequence number it was read at.
    fn read(&self) -> (Option<T>, u64) {
        match self.is_new() {
            true => (self.sample.clone(), self.seq),
            false => (None, self.seq),
        }
    }

    /// Mark everything up to `seq` as consumed. Samples written after `seq` stay new.
    fn consume(&mut self, seq: u64) {
        if seq > self.consumed_seq {
            self.consumed_seq = seq;
        }
    }
}

impl SensorState {
    /// Create an empty sensor state. The normalisers start with no bias latched.
    pub fn new(norm_params: &NormParams) -> Result<Self, NormError> {
        Ok(Self {
            marker: Mutex::new(Channel {
                slot: Slot::new(),
                norm: MarkerNormaliser::new(norm_params)?,
            }),
            displacement: Mutex::new(Slot::new()),
            heading: Mutex::new(Channel {
                slot: Slot::new(),
                norm: HeadingNormaliser::new(),
            }),
        })
    }

    // ---- PRODUCER INTERFACE ----

    /// Push a raw sample from any stream.
    ///
    /// Invalid samples are dropped with a warning and the slot is left untouched.
    pub fn push(&self, msg: SensorMsg) -> Result<(), NormError> {
        let result = match msg {
            SensorMsg::Marker(ref d) => self.push_marker(d),
            SensorMsg::Displacement(ref d) => self.push_displacement(d),
            SensorMsg::Heading(ref h) => self.push_heading(h),
        };

        if let Err(ref e) = result {
            warn!("Dropping invalid sensor sample: {}", e);
        }

        result
    }

    pub fn push_marker(&self, dets: &MarkerDetections) -> Result<(), NormError> {
        let mut chan = lock(&self.marker);
        let obs = chan.norm.normalise(dets)?;
        chan.slot.write(obs);

        trace!("Marker sample {} (visible: {})", chan.slot.seq, obs.visible);
        Ok(())
    }

    pub fn push_displacement(&self, disp: &Displacement) -> Result<(), NormError> {
        let sample = DisplacementSample::from_displacement(disp)?;
        let mut slot = lock(&self.displacement);
        slot.write(sample);

        trace!("Displacement sample {}", slot.seq);
        Ok(())
    }

    pub fn push_heading(&self, heading: &Heading) -> Result<(), NormError> {
        let mut chan = lock(&self.heading);
        let sample = chan.norm.normalise(heading)?;
        chan.slot.write(sample);

        trace!("Heading sample {}", chan.slot.seq);
        Ok(())
    }

    // ---- CONSUMER INTERFACE ----

    /// Copy the new data out of every slot.
    ///
    /// Each slot is copied under its own lock, so a producer writing concurrently can never cause
    /// a torn read of a sample.
    pub fn snapshot(&self) -> SensorSnapshot {
        let (marker, marker_seq) = lock(&self.marker).slot.read();
        let (displacement, displacement_seq) = lock(&self.displacement).read();
        let (heading, heading_seq) = lock(&self.heading).slot.read();

        SensorSnapshot {
            marker,
            displacement,
            heading,
            marker_seq,
            displacement_seq,
            heading_seq,
        }
    }

    /// Mark the samples captured in `snapshot` as consumed.
    ///
    /// Samples which arrived after the snapshot was taken remain new.
    pub fn consume(&self, snapshot: &SensorSnapshot) {
        lock(&self.marker).slot.consume(snapshot.marker_seq);
        lock(&self.displacement).consume(snapshot.displacement_seq);
        lock(&self.heading).slot.consume(snapshot.heading_seq);
    }

    /// Which slots currently hold new data.
    pub fn new_data_flags(&self) -> NewDataFlags {
        NewDataFlags {
            marker: lock(&self.marker).slot.is_new(),
            displacement: lock(&self.displacement).is_new(),
            heading: lock(&self.heading).slot.is_new(),
        }
    }
}

impl SensorSnapshot {
    /// The new marker observation, if one arrived and a marker was in view.
    pub fn visible_marker(&self) -> Option<&MarkerObservation> {
        self.marker.as_ref().filter(|m| m.visible)
    }

    /// The dead reckoning pair, if both displacement and heading arrived.
    pub fn dead_reckoning(&self) -> Option<(&DisplacementSample, &HeadingSample)> {
        match (&self.displacement, &self.heading) {
            (Some(d), Some(h)) => Some((d, h)),
            _ => None,
        }
    }

    /// True if no source had new data when the snapshot was taken.
    pub fn is_empty(&self) -> bool {
        self.marker.is_none() && self.displacement.is_none() && self.heading.is_none()
    }

    pub fn flags(&self) -> NewDataFlags {
        NewDataFlags {
            marker: self.marker.is_some(),
            displacement: self.displacement.is_some(),
            heading: self.heading.is_some(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock a slot, recovering the data if a producer panicked while holding the lock.
///
/// Slots are only ever overwritten whole, so a poisoned slot still holds a consistent sample.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;

    fn state() -> SensorState {
        SensorState::new(&NormParams::default()).unwrap()
    }

    #[test]
    fn test_empty_state() {
        let s = state();
        let snap = s.snapshot();

        assert_eq!(snap.flags(), NewDataFlags::default());
        assert!(snap.is_empty());
        assert!(snap.visible_marker().is_none());
        assert!(snap.dead_reckoning().is_none());
    }

    #[test]
    fn test_consume_clears_flags() {
        let s = state();
        s.push_displacement(&Displacement::new([1.0, 2.0, 0.0])).unwrap();
        s.push_heading(&Heading::from_yaw(0.3)).unwrap();

        let snap = s.snapshot();
        assert!(snap.dead_reckoning().is_some());
        assert_eq!(
            s.new_data_flags(),
            NewDataFlags {
                marker: false,
                displacement: true,
                heading: true
            }
        );

        // Snapshot alone does not alter the flags
        let _ = s.snapshot();
        assert!(s.new_data_flags().displacement);

        s.consume(&snap);
        assert_eq!(s.new_data_flags(), NewDataFlags::default());
        assert!(s.snapshot().dead_reckoning().is_none());
    }

    #[test]
    fn test_late_arrival_survives_consume() {
        let s = state();
        s.push_displacement(&Displacement::new([1.0, 0.0, 0.0])).unwrap();
        let snap = s.snapshot();

        // New sample arrives between snapshot and consume
        s.push_displacement(&Displacement::new([2.0, 0.0, 0.0])).unwrap();
        s.consume(&snap);

        let next = s.snapshot();
        assert_eq!(next.displacement.unwrap().position_m_inr[0], 2.0);
    }

    #[test]
    fn test_invalid_sample_dropped() {
        let s = state();
        assert!(s
            .push(SensorMsg::Displacement(Displacement::new([std::f64::NAN, 0.0, 0.0])))
            .is_err());
        assert!(s.push(SensorMsg::Heading(Heading::new([0.0; 4]))).is_err());
        assert_eq!(s.new_data_flags(), NewDataFlags::default());
    }

    #[test]
    fn test_marker_not_visible_is_new_but_unusable() {
        let s = state();
        s.push(SensorMsg::Marker(MarkerDetections::none())).unwrap();

        let snap = s.snapshot();
        assert!(snap.flags().marker);
        assert!(!snap.is_empty());
        assert!(snap.visible_marker().is_none());
    }
}
