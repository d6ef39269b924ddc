//! Command trace capture and validation
//!
//! A `CommandTrace` rebuilds the command/parameter structure from the raw
//! byte stream seen on the bus. It is used to check that a bring-up
//! sequence matches a known-good reference and that every pixel stream is
//! preceded by a matching addressing window.

use heapless::Vec;

use crate::commands::{command_name, CASET, RAMWR, RASET};
use crate::init::InitStep;
use crate::window::AddressWindow;

/// Parameter bytes kept per recorded command
pub const MAX_TRACE_PARAMS: usize = 8;

/// Maximum differences kept in a report
pub const MAX_DIFFERENCES: usize = 16;

/// One command as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// Command byte
    pub command: u8,
    /// First parameter bytes (pixel streams are not kept)
    pub params: Vec<u8, MAX_TRACE_PARAMS>,
    /// Total data bytes that followed the command
    pub data_len: usize,
}

impl RecordedCommand {
    /// Mnemonic of the command, for logs
    pub fn name(&self) -> &'static str {
        command_name(self.command)
    }
}

/// Bus byte stream decoded into commands
#[derive(Debug, Default)]
pub struct CommandTrace<const N: usize> {
    commands: Vec<RecordedCommand, N>,
    /// Data bytes seen before any command
    orphan_data: usize,
    overflowed: bool,
}

impl<const N: usize> CommandTrace<N> {
    /// Create an empty trace
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
            orphan_data: 0,
            overflowed: false,
        }
    }

    /// Record a byte sent with DC low
    pub fn push_command(&mut self, command: u8) {
        let entry = RecordedCommand {
            command,
            params: Vec::new(),
            data_len: 0,
        };
        if self.commands.push(entry).is_err() {
            self.overflowed = true;
        }
    }

    /// Record a byte sent with DC high
    pub fn push_data(&mut self, byte: u8) {
        if self.overflowed {
            return;
        }
        match self.commands.last_mut() {
            Some(last) => {
                last.data_len += 1;
                // Params beyond the kept prefix are pixel payload
                let _ = last.params.push(byte);
            }
            None => self.orphan_data += 1,
        }
    }

    /// Recorded commands in bus order
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Data bytes that were clocked before any command
    pub fn orphan_data(&self) -> usize {
        self.orphan_data
    }

    /// Whether more than `N` commands were seen
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Discard everything recorded so far
    pub fn clear(&mut self) {
        self.commands.clear();
        self.orphan_data = 0;
        self.overflowed = false;
    }

    /// Pixel writes as `(window, data bytes)` pairs
    ///
    /// The window is the last complete CASET/RASET pair before each RAMWR,
    /// or `None` if the stream was not addressed.
    pub fn pixel_writes(&self) -> impl Iterator<Item = (Option<AddressWindow>, usize)> + '_ {
        let mut caset: Option<[u8; 4]> = None;
        let mut raset: Option<[u8; 4]> = None;

        self.commands.iter().filter_map(move |cmd| {
            match cmd.command {
                CASET => caset = four_params(cmd),
                RASET => raset = four_params(cmd),
                RAMWR => {
                    let window = match (caset.take(), raset.take()) {
                        (Some(c), Some(r)) => Some(AddressWindow::from_params(c, r)),
                        _ => None,
                    };
                    return Some((window, cmd.data_len));
                }
                _ => {}
            }
            None
        })
    }
}

fn four_params(cmd: &RecordedCommand) -> Option<[u8; 4]> {
    if cmd.data_len != 4 {
        return None;
    }
    let p = &cmd.params;
    Some([p[0], p[1], p[2], p[3]])
}

/// A mismatch between a reference sequence and a recorded one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceDifference {
    /// Reference command absent at the end of the recording
    Missing { position: usize, command: u8 },
    /// Recorded command beyond the end of the reference
    Extra { position: usize, command: u8 },
    /// Different command at the same position
    Reordered {
        position: usize,
        expected: u8,
        actual: u8,
    },
    /// Same command, different parameters
    Params { position: usize, command: u8 },
}

/// Outcome of comparing a recording against a reference
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub differences: Vec<SequenceDifference, MAX_DIFFERENCES>,
    /// More differences existed than could be kept
    pub truncated: bool,
}

impl ValidationReport {
    /// No differences at all
    pub fn is_clean(&self) -> bool {
        self.differences.is_empty() && !self.truncated
    }

    fn push(&mut self, diff: SequenceDifference) {
        if self.differences.push(diff).is_err() {
            self.truncated = true;
        }
    }
}

/// Compare a recorded sequence position by position against a reference
pub fn validate(reference: &[InitStep], actual: &[RecordedCommand]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let len = reference.len().max(actual.len());

    for position in 0..len {
        match (reference.get(position), actual.get(position)) {
            (Some(expected), Some(recorded)) => {
                if expected.command != recorded.command {
                    report.push(SequenceDifference::Reordered {
                        position,
                        expected: expected.command,
                        actual: recorded.command,
                    });
                } else if expected.params != recorded.params.as_slice()
                    || expected.params.len() != recorded.data_len
                {
                    report.push(SequenceDifference::Params {
                        position,
                        command: expected.command,
                    });
                }
            }
            (Some(expected), None) => report.push(SequenceDifference::Missing {
                position,
                command: expected.command,
            }),
            (None, Some(recorded)) => report.push(SequenceDifference::Extra {
                position,
                command: recorded.command,
            }),
            (None, None) => {}
        }
    }

    report
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::commands::{DISPON, MADCTL, SLPOUT};
    use crate::init::init_sequence;
    use crate::Orientation;

    fn record<const N: usize>(trace: &mut CommandTrace<N>, steps: &[InitStep]) {
        for step in steps {
            trace.push_command(step.command);
            for &p in step.params {
                trace.push_data(p);
            }
        }
    }

    #[test]
    fn test_identical_sequence_is_clean() {
        let reference = init_sequence(Orientation::Landscape, true);
        let mut trace: CommandTrace<32> = CommandTrace::new();
        record(&mut trace, &reference);

        let report = validate(&reference, trace.commands());
        assert!(report.is_clean());
    }

    #[test]
    fn test_missing_tail_is_reported() {
        let reference = init_sequence(Orientation::Landscape, true);
        let mut trace: CommandTrace<32> = CommandTrace::new();
        record(&mut trace, &reference[..reference.len() - 1]);

        let report = validate(&reference, trace.commands());
        assert_eq!(
            report.differences.as_slice(),
            &[SequenceDifference::Missing {
                position: reference.len() - 1,
                command: DISPON
            }]
        );
    }

    #[test]
    fn test_wrong_param_is_reported() {
        let reference = init_sequence(Orientation::Landscape, true);
        let actual = init_sequence(Orientation::Portrait, true);
        let mut trace: CommandTrace<32> = CommandTrace::new();
        record(&mut trace, &actual);

        let report = validate(&reference, trace.commands());
        assert_eq!(report.differences.len(), 1);
        assert!(matches!(
            report.differences[0],
            SequenceDifference::Params { command: MADCTL, .. }
        ));
    }

    #[test]
    fn test_swapped_commands_are_reordered() {
        let reference = init_sequence(Orientation::Landscape, true);
        let mut swapped = reference;
        swapped.swap(0, 1);
        let mut trace: CommandTrace<32> = CommandTrace::new();
        record(&mut trace, &swapped);

        let report = validate(&reference, trace.commands());
        assert_eq!(report.differences.len(), 2);
        assert_eq!(
            report.differences[0],
            SequenceDifference::Reordered {
                position: 0,
                expected: reference[0].command,
                actual: SLPOUT
            }
        );
    }

    #[test]
    fn test_pixel_writes_pair_window_with_payload() {
        let mut trace: CommandTrace<8> = CommandTrace::new();
        trace.push_command(CASET);
        for b in [0, 10, 0, 11] {
            trace.push_data(b);
        }
        trace.push_command(RASET);
        for b in [0, 20, 0, 20] {
            trace.push_data(b);
        }
        trace.push_command(RAMWR);
        for b in [0xF8, 0x00, 0x07, 0xE0] {
            trace.push_data(b);
        }
        // A second stream without a fresh window
        trace.push_command(RAMWR);
        trace.push_data(0);

        let writes: std::vec::Vec<_> = trace.pixel_writes().collect();
        assert_eq!(
            writes,
            std::vec![
                (Some(AddressWindow::new(10, 20, 11, 20)), 4),
                (None, 1)
            ]
        );
    }

    #[test]
    fn test_overflow_and_orphans() {
        let mut trace: CommandTrace<1> = CommandTrace::new();
        trace.push_data(0xAA);
        trace.push_command(SLPOUT);
        trace.push_command(DISPON);

        assert_eq!(trace.orphan_data(), 1);
        assert!(trace.overflowed());
        assert_eq!(trace.commands().len(), 1);

        trace.clear();
        assert!(!trace.overflowed());
        assert!(trace.commands().is_empty());
    }
}
