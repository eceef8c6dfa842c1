//! Output sinks for validated scenario records.
//!
//! The miner's only obligation to the outside world is an append-only stream
//! of self-describing records in discovery order. [`JsonLinesSink`] writes
//! one JSON object per line to any [`io::Write`].

use std::io;

use crate::model::ScenarioRecord;

/// An append-only consumer of emitted records.
pub trait Sink {
    /// Append one record to the stream.
    fn emit(&mut self, record: &ScenarioRecord) -> io::Result<()>;
}

/// Writes records as JSON lines.
pub struct JsonLinesSink<W: io::Write> {
    writer: W,
}

impl<W: io::Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flush and hand back the writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> Sink for JsonLinesSink<W> {
    fn emit(&mut self, record: &ScenarioRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Collects records in memory. Handy for tests and for callers that
/// post-process a scan's output as a batch.
#[derive(Debug, Default)]
pub struct VecSink {
    /// The records emitted so far, in discovery order.
    pub records: Vec<ScenarioRecord>,
}

impl VecSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for VecSink {
    fn emit(&mut self, record: &ScenarioRecord) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
