use super::{Direction, Level, LineDriver, LineError, LineId, Wiring};
use std::collections::HashMap;

//===========================================================================//

/// The default time from output enable to valid data, in microseconds.
const DEFAULT_ACCESS_TIME_US: u32 = 100;

//===========================================================================//

/// A single interaction with a [`SimLines`] backend.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineEvent {
    /// A line's direction was changed.
    Direction(LineId, Direction),
    /// A line's output level was set.
    Level(LineId, Level),
    /// A line was sampled, producing the given level.
    Sample(LineId, Level),
    /// The caller blocked for the given number of microseconds.
    Delay(u32),
}

//===========================================================================//

/// A line driver that simulates a ROM chip attached to the lines described by
/// a [`Wiring`].
///
/// The simulated chip only drives its data lines while both chip enable and
/// output enable are held low, and only after its access time has elapsed
/// since output enable was asserted; at any other time the data lines float
/// high.  Address bits that have no wired line are seen by the chip as zero,
/// so contents beyond the wired address range alias the lower addresses.
///
/// Delays advance a virtual clock and never block.
pub struct SimLines {
    wiring: Wiring,
    image: Box<[u8]>,
    directions: HashMap<LineId, Direction>,
    latches: HashMap<LineId, Level>,
    now_us: u64,
    access_time_us: u32,
    enabled_since: Option<u64>,
    accesses: Vec<u16>,
    events: Option<Vec<LineEvent>>,
}

impl SimLines {
    /// Returns a simulated chip with the given contents, attached to the
    /// given lines.  Panics if the image is empty.
    pub fn new(wiring: Wiring, image: Box<[u8]>) -> SimLines {
        assert!(!image.is_empty());
        SimLines {
            wiring,
            image,
            directions: HashMap::new(),
            latches: HashMap::new(),
            now_us: 0,
            access_time_us: DEFAULT_ACCESS_TIME_US,
            enabled_since: None,
            accesses: Vec::new(),
            events: None,
        }
    }

    /// Returns a simulated erased chip of the given size (every byte 0xff).
    pub fn blank(wiring: Wiring, size: usize) -> SimLines {
        SimLines::new(wiring, vec![0xff; size].into_boxed_slice())
    }

    /// Sets how long the simulated chip takes to present valid data after
    /// output enable is asserted.
    pub fn with_access_time(mut self, micros: u32) -> SimLines {
        self.access_time_us = micros;
        self
    }

    /// Enables recording of every line interaction (see
    /// [`SimLines::events`]).
    pub fn with_trace(mut self) -> SimLines {
        self.events = Some(Vec::new());
        self
    }

    /// Returns the recorded line interactions, in order.  This is empty unless
    /// tracing was enabled with [`SimLines::with_trace`].
    pub fn events(&self) -> &[LineEvent] {
        self.events.as_deref().unwrap_or(&[])
    }

    /// Removes and returns the recorded line interactions.
    pub fn take_events(&mut self) -> Vec<LineEvent> {
        self.events.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Returns the address seen by the chip each time its outputs were
    /// enabled, in order.
    pub fn accesses(&self) -> &[u16] {
        &self.accesses
    }

    /// Returns the total simulated time that has been spent in delays.
    pub fn elapsed_us(&self) -> u64 {
        self.now_us
    }

    /// Returns the current direction of the given line, or `None` if it has
    /// never been configured.
    pub fn direction(&self, line: LineId) -> Option<Direction> {
        self.directions.get(&line).copied()
    }

    /// Returns the level most recently set on the given line, or `None` if
    /// none has been set.
    pub fn latched_level(&self, line: LineId) -> Option<Level> {
        self.latches.get(&line).copied()
    }

    fn record(&mut self, event: LineEvent) {
        if let Some(events) = self.events.as_mut() {
            events.push(event);
        }
    }

    /// Returns the level the chip sees on a line that we drive.  Lines that
    /// aren't outputs are treated as not driven.
    fn driven_level(&self, line: LineId) -> Option<Level> {
        match self.directions.get(&line) {
            Some(Direction::Output) => {
                Some(self.latches.get(&line).copied().unwrap_or(Level::Low))
            }
            _ => None,
        }
    }

    fn is_asserted(&self, line: LineId) -> bool {
        self.driven_level(line) == Some(Level::Low)
    }

    fn current_address(&self) -> u16 {
        let mut addr = 0u16;
        for (bit, &line) in self.wiring.address.iter().enumerate() {
            if self.driven_level(line) == Some(Level::High) {
                addr |= 1 << bit;
            }
        }
        addr
    }

    fn update_chip_state(&mut self) {
        let enabled = self.is_asserted(self.wiring.chip_enable)
            && self.is_asserted(self.wiring.output_enable);
        match (enabled, self.enabled_since) {
            (true, None) => {
                self.enabled_since = Some(self.now_us);
                let addr = self.current_address();
                self.accesses.push(addr);
            }
            (false, Some(_)) => self.enabled_since = None,
            _ => {}
        }
    }

    fn data_level(&self, bit: usize) -> Level {
        match self.enabled_since {
            Some(since)
                if self.now_us - since >= u64::from(self.access_time_us) =>
            {
                let addr = self.current_address() as usize;
                let byte = self.image[addr % self.image.len()];
                Level::from_bit((byte >> bit) & 1 != 0)
            }
            _ => Level::High,
        }
    }
}

impl LineDriver for SimLines {
    fn description(&self) -> String {
        let size = self.image.len();
        let size = if size < 1024 {
            format!("{size}B")
        } else {
            format!("{}kB", size >> 10)
        };
        format!(
            "simulated {} ROM on {} address lines",
            size,
            self.wiring.address.len()
        )
    }

    fn set_direction(
        &mut self,
        line: LineId,
        direction: Direction,
    ) -> Result<(), LineError> {
        self.record(LineEvent::Direction(line, direction));
        self.directions.insert(line, direction);
        self.update_chip_state();
        Ok(())
    }

    fn set_level(&mut self, line: LineId, level: Level) {
        self.record(LineEvent::Level(line, level));
        self.latches.insert(line, level);
        self.update_chip_state();
    }

    fn get_level(&mut self, line: LineId) -> Level {
        let level = match self.directions.get(&line) {
            Some(Direction::Output) => {
                self.latches.get(&line).copied().unwrap_or(Level::Low)
            }
            _ => match self.wiring.data.iter().position(|&l| l == line) {
                Some(bit) => self.data_level(bit),
                None => Level::High,
            },
        };
        self.record(LineEvent::Sample(line, level));
        level
    }

    fn delay_us(&mut self, micros: u32) {
        self.record(LineEvent::Delay(micros));
        self.now_us += u64::from(micros);
    }
}

//===========================================================================//


//===========================================================================//
