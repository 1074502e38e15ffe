//! Output sinks. A sink receives each call in two halves: the head before the
//! next layer runs, the tail once it has returned.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::config::{OutputConfig, OutputFormat};
use crate::record::CallRecord;

pub trait OutputSink: Send {
    fn head(&mut self, record: &CallRecord) -> io::Result<()>;
    fn tail(&mut self, record: &CallRecord) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Open the sink selected by configuration.
pub fn open(config: &OutputConfig) -> io::Result<Box<dyn OutputSink>> {
    let writer: Box<dyn Write + Send> = match &config.file {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    Ok(match config.format {
        OutputFormat::Text => Box::new(TextSink::new(writer, config.flush)),
        OutputFormat::Json => Box::new(JsonSink::new(writer, config.flush)),
        OutputFormat::None => Box::new(NullSink),
    })
}

pub struct NullSink;

impl OutputSink for NullSink {
    fn head(&mut self, _record: &CallRecord) -> io::Result<()> {
        Ok(())
    }

    fn tail(&mut self, _record: &CallRecord) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Human-readable output:
///
/// ```text
/// Thread 0, Frame 3:
/// vkQueueSubmit(queue, submitCount, pSubmits, fence) returns VkResult SUCCESS (0):
///     queue: VkQueue = 0x55d0c2a1
///     ...
/// ```
pub struct TextSink<W> {
    out: W,
    flush_each_call: bool,
}

impl<W: Write + Send> TextSink<W> {
    pub fn new(out: W, flush_each_call: bool) -> Self {
        Self { out, flush_each_call }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> OutputSink for TextSink<W> {
    fn head(&mut self, record: &CallRecord) -> io::Result<()> {
        write!(self.out, "Thread {}, Frame {}", record.thread, record.frame)?;
        if let Some(ts) = record.timestamp_us {
            write!(self.out, ", Time {} us", ts)?;
        }
        writeln!(self.out, ":")?;
        write!(self.out, "{}(", record.name)?;
        for (i, arg) in record.inputs.iter().enumerate() {
            if i > 0 {
                write!(self.out, ", ")?;
            }
            write!(self.out, "{}", arg.name)?;
        }
        write!(self.out, ")")
    }

    fn tail(&mut self, record: &CallRecord) -> io::Result<()> {
        match &record.result {
            Some(result) => writeln!(self.out, " returns VkResult {}:", result)?,
            None => writeln!(self.out, " returns void:")?,
        }
        for arg in record.inputs.iter().chain(record.outputs.iter()) {
            writeln!(self.out, "    {}: {} = {}", arg.name, arg.ty, arg.value)?;
        }
        writeln!(self.out)?;
        if self.flush_each_call {
            self.out.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// One JSON object per call, newline separated.
pub struct JsonSink<W> {
    out: W,
    flush_each_call: bool,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(out: W, flush_each_call: bool) -> Self {
        Self { out, flush_each_call }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> OutputSink for JsonSink<W> {
    fn head(&mut self, record: &CallRecord) -> io::Result<()> {
        write!(
            self.out,
            "{{\"name\":\"{}\",\"thread\":{},\"frame\":{}",
            record.name, record.thread, record.frame
        )?;
        if let Some(ts) = record.timestamp_us {
            write!(self.out, ",\"timestamp_us\":{}", ts)?;
        }
        write!(self.out, ",\"inputs\":")?;
        serde_json::to_writer(&mut self.out, &record.inputs)?;
        Ok(())
    }

    fn tail(&mut self, record: &CallRecord) -> io::Result<()> {
        if let Some(result) = &record.result {
            write!(self.out, ",\"result\":")?;
            serde_json::to_writer(&mut self.out, result)?;
        }
        write!(self.out, ",\"outputs\":")?;
        serde_json::to_writer(&mut self.out, &record.outputs)?;
        writeln!(self.out, "}}")?;
        if self.flush_each_call {
            self.out.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
