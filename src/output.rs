// src/output.rs

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::PendulumError;

/// Diagnostic reporting projections. Each mode selects one two-column view
/// of the simulation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    None,
    Trajectory,
    PhaseSpace,
    EnergyTime,
    XTime,
    YTime,
    AngleTime,
    AngularRateTime,
    EnergyCollisions,
}

impl OutputMode {
    /// Map a numeric selector to a mode. Anything outside the table is fatal
    /// right here, before a recorder is ever built around it.
    pub fn from_selector(selector: u8) -> Result<OutputMode, PendulumError> {
        match selector {
            0 => Ok(OutputMode::None),
            1 => Ok(OutputMode::Trajectory),
            2 => Ok(OutputMode::PhaseSpace),
            3 => Ok(OutputMode::EnergyTime),
            4 => Ok(OutputMode::XTime),
            5 => Ok(OutputMode::YTime),
            6 => Ok(OutputMode::AngleTime),
            7 => Ok(OutputMode::AngularRateTime),
            8 => Ok(OutputMode::EnergyCollisions),
            _ => Err(PendulumError::InvalidOutputSelector { selector }),
        }
    }

    /// Modes that are only meaningful while the string is taut; these get
    /// suppressed during ballistic flight and restored at the next collision.
    fn taut_only(self) -> bool {
        matches!(self, OutputMode::PhaseSpace | OutputMode::XTime)
    }

    fn header(self) -> [&'static str; 2] {
        match self {
            OutputMode::None => ["", ""],
            OutputMode::Trajectory => ["x", "y"],
            OutputMode::PhaseSpace => ["theta", "angular_rate"],
            OutputMode::EnergyTime => ["t", "energy"],
            OutputMode::XTime => ["t", "x"],
            OutputMode::YTime => ["t", "y"],
            OutputMode::AngleTime => ["t", "theta"],
            OutputMode::AngularRateTime => ["t", "angular_rate"],
            OutputMode::EnergyCollisions => ["collisions", "energy"],
        }
    }
}

/// One observation of the simulation, ready to be projected by a mode.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub angular_rate: f64,
    pub energy: f64,
    pub collisions: u32,
}

/// Sink for diagnostic samples. Owns the destination instead of going
/// through a global stream, so tests can redirect it freely. Tracks the
/// current and the default mode: slack suppression zeroes the current mode
/// and a collision restores it.
pub struct Recorder {
    mode: OutputMode,
    default_mode: OutputMode,
    wrote_header: bool,
    writer: csv::Writer<Box<dyn Write + Send>>,
}

impl Recorder {
    pub fn from_writer(writer: Box<dyn Write + Send>, mode: OutputMode) -> Self {
        Recorder {
            mode,
            default_mode: mode,
            wrote_header: false,
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn to_path(path: impl AsRef<Path>, mode: OutputMode) -> Result<Self, PendulumError> {
        let file = File::create(path).map_err(csv::Error::from)?;
        Ok(Recorder::from_writer(Box::new(file), mode))
    }

    /// A recorder that drops everything, for silent runs.
    pub fn disabled() -> Self {
        Recorder::from_writer(Box::new(io::sink()), OutputMode::None)
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub(crate) fn suppress_while_slack(&mut self) {
        if self.mode.taut_only() {
            self.mode = OutputMode::None;
        }
    }

    pub(crate) fn restore_after_collision(&mut self) {
        if self.mode == OutputMode::None {
            self.mode = self.default_mode;
        }
    }

    pub fn record(&mut self, s: &Sample) -> Result<(), PendulumError> {
        let fields: [String; 2] = match self.mode {
            OutputMode::None => return Ok(()),
            OutputMode::Trajectory => [s.x.to_string(), s.y.to_string()],
            OutputMode::PhaseSpace => [s.theta.to_string(), s.angular_rate.to_string()],
            OutputMode::EnergyTime => [s.t.to_string(), s.energy.to_string()],
            OutputMode::XTime => [s.t.to_string(), s.x.to_string()],
            OutputMode::YTime => [s.t.to_string(), s.y.to_string()],
            OutputMode::AngleTime => [s.t.to_string(), s.theta.to_string()],
            OutputMode::AngularRateTime => [s.t.to_string(), s.angular_rate.to_string()],
            OutputMode::EnergyCollisions => [s.collisions.to_string(), s.energy.to_string()],
        };

        if !self.wrote_header {
            self.writer.write_record(self.mode.header())?;
            self.wrote_header = true;
        }
        self.writer.write_record(&fields)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), PendulumError> {
        self.writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn new() -> Self {
            SharedBuf(Arc::new(Mutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample() -> Sample {
        Sample {
            t: 0.5,
            x: 1.0,
            y: -2.0,
            theta: 4.0,
            angular_rate: -1.5,
            energy: 1.25,
            collisions: 3,
        }
    }

    #[test]
    fn selector_table_round_trips() {
        assert_eq!(OutputMode::from_selector(0).unwrap(), OutputMode::None);
        assert_eq!(OutputMode::from_selector(2).unwrap(), OutputMode::PhaseSpace);
        assert_eq!(
            OutputMode::from_selector(8).unwrap(),
            OutputMode::EnergyCollisions
        );
        assert!(matches!(
            OutputMode::from_selector(9),
            Err(PendulumError::InvalidOutputSelector { selector: 9 })
        ));
    }

    #[test]
    fn records_are_projected_by_mode() {
        let buf = SharedBuf::new();
        let mut rec = Recorder::from_writer(Box::new(buf.clone()), OutputMode::EnergyTime);
        rec.record(&sample()).unwrap();
        rec.flush().unwrap();

        assert_eq!(buf.contents(), "t,energy\n0.5,1.25\n");
    }

    #[test]
    fn disabled_recorder_writes_nothing() {
        let buf = SharedBuf::new();
        let mut rec = Recorder::from_writer(Box::new(buf.clone()), OutputMode::None);
        rec.record(&sample()).unwrap();
        rec.flush().unwrap();

        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn taut_only_modes_are_suppressed_and_restored() {
        let buf = SharedBuf::new();
        let mut rec = Recorder::from_writer(Box::new(buf.clone()), OutputMode::PhaseSpace);

        rec.suppress_while_slack();
        assert_eq!(rec.mode(), OutputMode::None);
        rec.record(&sample()).unwrap();
        rec.flush().unwrap();
        assert_eq!(buf.contents(), "");

        rec.restore_after_collision();
        assert_eq!(rec.mode(), OutputMode::PhaseSpace);
        rec.record(&sample()).unwrap();
        rec.flush().unwrap();
        assert_eq!(buf.contents(), "theta,angular_rate\n4,-1.5\n");
    }

    #[test]
    fn always_on_modes_survive_slack() {
        let mut rec = Recorder::disabled();
        rec.restore_after_collision();
        assert_eq!(rec.mode(), OutputMode::None);

        let buf = SharedBuf::new();
        let mut rec = Recorder::from_writer(Box::new(buf.clone()), OutputMode::EnergyTime);
        rec.suppress_while_slack();
        assert_eq!(rec.mode(), OutputMode::EnergyTime);
    }
}
