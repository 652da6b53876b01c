//! Splitting interleaved two-echo series by echo time.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::error::{Result, VolumeError};
use crate::stack::{Slice, SliceStack};

/// Echo time in milliseconds, usable as a map key.
pub type EchoTime = OrderedFloat<f64>;

/// Groups the slices of `stack` by echo time, lowest first.
pub fn split_by_echo_time(stack: SliceStack) -> Result<BTreeMap<EchoTime, SliceStack>> {
    let mut groups: BTreeMap<EchoTime, Vec<Slice>> = BTreeMap::new();
    for slice in stack.into_slices() {
        let Some(echo_time) = slice.echo_time else {
            return Err(VolumeError::MissingAttribute {
                file: slice.file.unwrap_or_default(),
                attribute: "EchoTime",
            });
        };
        groups
            .entry(OrderedFloat(echo_time))
            .or_default()
            .push(slice);
    }
    Ok(groups
        .into_iter()
        .map(|(echo_time, slices)| (echo_time, SliceStack::new(slices)))
        .collect())
}

/// The two echoes of a chemical-shift acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoPair {
    pub out_phase_echo_time: f64,
    pub out_phase: SliceStack,
    pub in_phase_echo_time: f64,
    pub in_phase: SliceStack,
}

impl EchoPair {
    /// The lower echo time is out-of-phase, the higher one in-phase.
    pub fn from_split(split: BTreeMap<EchoTime, SliceStack>) -> Result<Self> {
        let echo_times: Vec<f64> = split.keys().map(|t| t.0).collect();
        match echo_times.len() {
            0 => Err(VolumeError::EmptySeries),
            1 => Err(VolumeError::IncompleteEchoPair {
                echo_time: echo_times[0],
            }),
            2 => {
                let mut stacks = split.into_iter();
                match (stacks.next(), stacks.next()) {
                    (Some((out_te, out_phase)), Some((in_te, in_phase))) => Ok(Self {
                        out_phase_echo_time: out_te.into_inner(),
                        out_phase,
                        in_phase_echo_time: in_te.into_inner(),
                        in_phase,
                    }),
                    _ => Err(VolumeError::UnexpectedEchoCount { echo_times }),
                }
            }
            _ => Err(VolumeError::UnexpectedEchoCount { echo_times }),
        }
    }
}

/// Splits `stack` into its out-of-phase and in-phase echoes.
pub fn split_echo_pair(stack: SliceStack) -> Result<EchoPair> {
    EchoPair::from_split(split_by_echo_time(stack)?)
}
