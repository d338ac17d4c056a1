// Binary automaton format: header, state table, transition table.

use bytemuck::Zeroable;

use crate::FstError;
use crate::automaton::{AutomatonBuilder, Transition, WeightedAutomaton};

/// Header magic constants (little-endian).
const COOKIE1: u32 = 0x5046_5354;
const COOKIE2: u32 = 0x0002_71A3;

/// Current format version, stored at byte 8 of the header.
pub const VERSION: u8 = 1;

/// Size of the binary header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of the counts block that follows the header.
const COUNTS_SIZE: usize = 16;

/// Parsed file header.
///
/// - bytes 0..4: cookie1 (magic number)
/// - bytes 4..8: cookie2 (magic number)
/// - byte 8: format version
/// - bytes 9..16: reserved (zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
}

/// Parses and validates the 16-byte header.
pub fn parse_header(data: &[u8]) -> Result<Header, FstError> {
    if data.len() < HEADER_SIZE {
        return Err(FstError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let cookie1 = read_u32(data, 0);
    let cookie2 = read_u32(data, 4);
    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(FstError::InvalidMagic);
    }
    if data[8] != VERSION {
        return Err(FstError::UnsupportedVersion(data[8]));
    }

    Ok(Header { version: data[8] })
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Writes the header for the current version.
pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&COOKIE1.to_le_bytes());
    out.extend_from_slice(&COOKIE2.to_le_bytes());
    out.push(VERSION);
    out.extend_from_slice(&[0u8; 7]);
}

/// Serializes an automaton.
///
/// Layout after the header: state count, start state, transition count and
/// one reserved word (all u32 LE); one f64 final weight per state (infinity
/// for non-final states); then the transition records as laid out in memory.
/// Only little-endian hosts are supported.
pub fn to_bytes(automaton: &WeightedAutomaton) -> Vec<u8> {
    let transitions = automaton.transitions();
    let mut out = Vec::with_capacity(
        HEADER_SIZE
            + COUNTS_SIZE
            + automaton.num_states() * 8
            + std::mem::size_of_val(transitions),
    );
    write_header(&mut out);
    write_body(automaton, &mut out);
    out
}

/// Appends the counts, final weights and transitions of `automaton`.
pub fn write_body(automaton: &WeightedAutomaton, out: &mut Vec<u8>) {
    let transitions = automaton.transitions();
    out.extend_from_slice(&(automaton.num_states() as u32).to_le_bytes());
    out.extend_from_slice(&automaton.start().to_le_bytes());
    out.extend_from_slice(&(transitions.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for &weight in automaton.raw_finals() {
        out.extend_from_slice(&weight.to_le_bytes());
    }
    out.extend_from_slice(bytemuck::cast_slice::<Transition, u8>(transitions));
}

/// Loads an automaton written by [`to_bytes`].
pub fn from_bytes(data: &[u8]) -> Result<WeightedAutomaton, FstError> {
    parse_header(data)?;
    let (automaton, _) = read_body(data, HEADER_SIZE)?;
    Ok(automaton)
}

/// Reads an automaton body starting at `offset`; returns it with the offset
/// just past its last byte.
pub fn read_body(data: &[u8], offset: usize) -> Result<(WeightedAutomaton, usize), FstError> {
    let counts_end = offset + COUNTS_SIZE;
    if data.len() < counts_end {
        return Err(FstError::TooShort {
            expected: counts_end,
            actual: data.len(),
        });
    }
    let state_count = read_u32(data, offset) as usize;
    let start = read_u32(data, offset + 4);
    let transition_count = read_u32(data, offset + 8) as usize;

    let finals_end = counts_end + state_count * 8;
    let record = size_of::<Transition>();
    let end = finals_end + transition_count * record;
    if data.len() < end {
        return Err(FstError::TooShort {
            expected: end,
            actual: data.len(),
        });
    }

    let mut builder = AutomatonBuilder::with_capacity(state_count, transition_count);
    for _ in 0..state_count {
        builder.add_state();
    }
    builder.set_start(start);
    for (state, chunk) in data[counts_end..finals_end].chunks_exact(8).enumerate() {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        let weight = f64::from_le_bytes(raw);
        if weight != f64::INFINITY {
            builder.set_final(state as u32, weight);
        }
    }

    // Copy into an aligned Vec before reinterpreting.
    let mut transitions = vec![Transition::zeroed(); transition_count];
    bytemuck::cast_slice_mut::<Transition, u8>(&mut transitions)
        .copy_from_slice(&data[finals_end..end]);
    for t in &transitions {
        builder.add_transition(t.from, t.to, t.input, t.output, t.weight);
    }

    Ok((builder.finish()?, end))
}
