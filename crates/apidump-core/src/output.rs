use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::sink::OutputSink;

/// The single point of mutual exclusion for dump output.
///
/// Writes performed inside one [`with_exclusive_output`](Self::with_exclusive_output)
/// closure never interleave with another thread's.
pub struct OutputSerializer {
    sink: Mutex<Box<dyn OutputSink>>,
    failed: AtomicBool,
}

impl OutputSerializer {
    pub fn new(sink: Box<dyn OutputSink>) -> Self {
        Self {
            sink: Mutex::new(sink),
            failed: AtomicBool::new(false),
        }
    }

    pub fn with_exclusive_output<T>(&self, f: impl FnOnce(&mut OutputGuard<'_>) -> T) -> T {
        let mut sink = self.sink.lock();
        let mut guard = OutputGuard {
            sink: sink.as_mut(),
            serializer: self,
        };
        f(&mut guard)
    }

    /// Flush whatever the sink has buffered.
    pub fn flush(&self) {
        let result = self.sink.lock().flush();
        self.report(result);
    }

    /// Output failures never reach the application. The first one is logged.
    fn report(&self, result: io::Result<()>) {
        if let Err(e) = result {
            if !self.failed.swap(true, Ordering::Relaxed) {
                tracing::warn!(error = %e, "dump output failed; further write errors are suppressed");
            }
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Exclusive access to the sink for the duration of one closure.
pub struct OutputGuard<'a> {
    sink: &'a mut dyn OutputSink,
    serializer: &'a OutputSerializer,
}

impl OutputGuard<'_> {
    pub fn head(&mut self, record: &crate::record::CallRecord) {
        let result = self.sink.head(record);
        self.serializer.report(result);
    }

    pub fn tail(&mut self, record: &crate::record::CallRecord) {
        let result = self.sink.tail(record);
        self.serializer.report(result);
    }
}
