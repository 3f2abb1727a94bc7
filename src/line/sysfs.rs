use super::{Direction, Level, LineDriver, LineError, LineId};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

//===========================================================================//

/// How many times to try configuring a freshly exported line whose attribute
/// files are not yet writable.
const EXPORT_SETTLE_ATTEMPTS: u32 = 20;

/// How long to wait between those attempts.
const EXPORT_SETTLE_DELAY: Duration = Duration::from_millis(5);

//===========================================================================//

/// A line driver for the Linux sysfs GPIO interface.
///
/// Lines are exported on demand when their direction is first set, and their
/// `value` files are kept open for the rest of the session.  Once a line is
/// configured, I/O failures are logged and otherwise ignored; a line that
/// can't be sampled reads as high.
pub struct SysfsLines {
    root: PathBuf,
    values: HashMap<LineId, File>,
    directions: HashMap<LineId, Direction>,
    pending: HashMap<LineId, Level>,
}

impl SysfsLines {
    /// The usual location of the sysfs GPIO interface.
    pub const DEFAULT_ROOT: &'static str = "/sys/class/gpio";

    /// Returns a driver for the sysfs GPIO tree rooted at the given
    /// directory.  No lines are touched until they are configured.
    pub fn new<P: Into<PathBuf>>(root: P) -> SysfsLines {
        SysfsLines {
            root: root.into(),
            values: HashMap::new(),
            directions: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Returns the root directory of this driver's sysfs GPIO tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn line_dir(&self, line: LineId) -> PathBuf {
        self.root.join(format!("gpio{}", line.0))
    }

    fn export(&self, line: LineId) -> io::Result<()> {
        if !self.line_dir(line).is_dir() {
            tracing::debug!("exporting {}", line);
            fs::write(self.root.join("export"), line.0.to_string())?;
        }
        Ok(())
    }

    fn configure(
        &mut self,
        line: LineId,
        direction: Direction,
    ) -> io::Result<()> {
        self.export(line)?;
        let dir = self.line_dir(line);
        // Writing "high" or "low" switches to output and sets the level in a
        // single step, so the line never glitches.
        let mode: &[u8] = match direction {
            Direction::Input => b"in",
            Direction::Output => match self.pending.get(&line) {
                Some(Level::High) => b"high",
                _ => b"low",
            },
        };
        // udev may still be fixing up permissions on a just-exported line.
        retry_while_denied(EXPORT_SETTLE_ATTEMPTS, EXPORT_SETTLE_DELAY, || {
            fs::write(dir.join("direction"), mode)
        })?;
        if !self.values.contains_key(&line) {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(dir.join("value"))?;
            self.values.insert(line, file);
        }
        self.directions.insert(line, direction);
        Ok(())
    }

    fn write_value(&mut self, line: LineId, level: Level) -> io::Result<()> {
        if let Some(file) = self.values.get_mut(&line) {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(if level.is_high() { b"1" } else { b"0" })?;
        }
        Ok(())
    }

    fn read_value(&mut self, line: LineId) -> io::Result<Level> {
        let file = self.values.get_mut(&line).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "line is not configured")
        })?;
        file.seek(SeekFrom::Start(0))?;
        let mut byte = [0u8; 1];
        file.read_exact(&mut byte)?;
        Ok(Level::from_bit(byte[0] != b'0'))
    }
}

impl LineDriver for SysfsLines {
    fn description(&self) -> String {
        format!("sysfs GPIO at {}", self.root.display())
    }

    fn set_direction(
        &mut self,
        line: LineId,
        direction: Direction,
    ) -> Result<(), LineError> {
        self.configure(line, direction)
            .map_err(|source| LineError::Unavailable { line, source })
    }

    fn set_level(&mut self, line: LineId, level: Level) {
        self.pending.insert(line, level);
        if self.directions.get(&line) == Some(&Direction::Output) {
            if let Err(error) = self.write_value(line, level) {
                tracing::warn!("failed to drive {}: {}", line, error);
            }
        }
    }

    fn get_level(&mut self, line: LineId) -> Level {
        match self.read_value(line) {
            Ok(level) => level,
            Err(error) => {
                tracing::warn!("failed to sample {}: {}", line, error);
                Level::High
            }
        }
    }

    fn delay_us(&mut self, micros: u32) {
        thread::sleep(Duration::from_micros(u64::from(micros)));
    }
}

//===========================================================================//

/// Runs `op` up to `attempts` times, sleeping `delay` between attempts, for as
/// long as it fails with a permission error.  Any other result is returned
/// immediately.
fn retry_while_denied<T, F>(
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> io::Result<T>
where
    F: FnMut() -> io::Result<T>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Err(error)
                if error.kind() == io::ErrorKind::PermissionDenied
                    && attempt < attempts =>
            {
                tracing::debug!("attempt {} denied: {}", attempt, error);
                thread::sleep(delay);
                attempt += 1;
            }
            result => return result,
        }
    }
}

//===========================================================================//


//===========================================================================//
