// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame sinks standing in for a network transport.

use serde::Serialize;
use std::io::Write;
use trajecta_playback::{PlaybackId, TickSnapshot};

/// Errors writing frames
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Output stream failed
    #[error("Failed to write frame: {0}")]
    Io(#[from] std::io::Error),

    /// Frame could not be encoded
    #[error("Failed to encode frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// How frames are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Trace-level log lines
    Log,
    /// One JSON object per frame
    Json,
}

#[derive(Serialize)]
struct FrameLine<'a> {
    tick: u64,
    timestamp: f64,
    track: &'a str,
    playback: PlaybackId,
    x: f64,
    y: f64,
    z: f64,
    azimuth: f64,
    elevation: f64,
    distance: f64,
}

/// Writes every frame of a tick snapshot
#[derive(Debug)]
pub struct LogTransport<W: Write> {
    format: OutputFormat,
    writer: W,
    frames_sent: u64,
}

impl<W: Write> LogTransport<W> {
    /// Create a transport writing to `writer`
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self {
            format,
            writer,
            frames_sent: 0,
        }
    }

    /// Frames sent so far
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Consume the transport, returning the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Emit every frame in the snapshot
    pub fn send(&mut self, snapshot: &TickSnapshot) -> Result<(), TransportError> {
        for frame in &snapshot.frames {
            match self.format {
                OutputFormat::Log => {
                    tracing::trace!(
                        "tick {} {} <- {}: ({:.3}, {:.3}, {:.3})",
                        snapshot.tick,
                        frame.track_id,
                        frame.playback_id,
                        frame.position.x,
                        frame.position.y,
                        frame.position.z
                    );
                }
                OutputFormat::Json => {
                    let aed = frame.aed();
                    let line = FrameLine {
                        tick: snapshot.tick,
                        timestamp: frame.timestamp,
                        track: &frame.track_id.0,
                        playback: frame.playback_id,
                        x: frame.position.x,
                        y: frame.position.y,
                        z: frame.position.z,
                        azimuth: aed.azimuth,
                        elevation: aed.elevation,
                        distance: aed.distance,
                    };
                    serde_json::to_writer(&mut self.writer, &line)?;
                    self.writer.write_all(b"\n")?;
                }
            }
            self.frames_sent += 1;
        }

        if self.format == OutputFormat::Json && !snapshot.frames.is_empty() {
            self.writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajecta_motion::{CoordinateSystem, Position};
    use trajecta_playback::{TrackFrame, TrackId};

    fn snapshot() -> TickSnapshot {
        let frame = |track: &str, x: f64| TrackFrame {
            track_id: TrackId::new(track),
            playback_id: PlaybackId::new(),
            position: Position::new(x, 0.0, 0.0),
            coordinate_system: CoordinateSystem::Cartesian,
            timestamp: 0.25,
        };
        TickSnapshot {
            tick: 3,
            timestamp: 0.25,
            frames: vec![frame("a", 2.0), frame("b", -1.0)],
            ..Default::default()
        }
    }

    #[test]
    fn test_json_lines() {
        let mut transport = LogTransport::new(OutputFormat::Json, Vec::new());
        transport.send(&snapshot()).unwrap();
        assert_eq!(transport.frames_sent(), 2);

        let output = String::from_utf8(transport.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["track"], "a");
        assert_eq!(lines[0]["tick"], 3);
        assert_eq!(lines[0]["x"], 2.0);
        assert_eq!(lines[0]["distance"], 2.0);
        assert_eq!(lines[1]["azimuth"], 180.0);
    }

    #[test]
    fn test_log_format_writes_nothing() {
        let mut transport = LogTransport::new(OutputFormat::Log, Vec::new());
        transport.send(&snapshot()).unwrap();
        assert_eq!(transport.frames_sent(), 2);
        assert!(transport.into_inner().is_empty());
    }
}
