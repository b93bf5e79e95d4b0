//! Background acquisition of `<timestamp> <value>` lines

use super::buffer::{SampleBuffer, Summary};
use crate::serial::SerialConnection;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Result of decoding one received line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    Sample { time: f64, value: f64 },
    /// Not valid UTF-8, typically garbage from the board reset
    NotUtf8,
    /// Wrong field count or non-numeric field
    Malformed,
}

/// Decode a raw line as two whitespace-separated floats
pub fn decode_line(raw: &[u8]) -> Decoded {
    let Ok(text) = std::str::from_utf8(raw) else {
        return Decoded::NotUtf8;
    };

    let mut fields = text.split_whitespace();
    let (Some(time), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
        return Decoded::Malformed;
    };

    match (time.parse::<f64>(), value.parse::<f64>()) {
        (Ok(time), Ok(value)) => Decoded::Sample { time, value },
        _ => Decoded::Malformed,
    }
}

/// Joins line fragments cut short by a read timeout.
///
/// A chunk without the newline that is shorter than the cap is held back
/// and prefixed to the next chunk.
#[derive(Debug)]
pub struct LineAssembler {
    pending: Vec<u8>,
    cap: usize,
}

impl LineAssembler {
    pub fn new(cap: usize) -> Self {
        Self {
            pending: Vec::new(),
            cap,
        }
    }

    /// Add a chunk; returns a complete line once one is available
    pub fn feed(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        self.pending.extend_from_slice(chunk);
        if self.pending.last() == Some(&b'\n') || self.pending.len() >= self.cap {
            Some(std::mem::take(&mut self.pending))
        } else {
            None
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Counters kept by the acquisition thread
#[derive(Debug, Default)]
pub struct StreamStats {
    pub accepted: AtomicUsize,
    pub dropped: AtomicUsize,
}

impl StreamStats {
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Polls a connection on a background thread and fills a shared buffer
pub struct DataStream<P> {
    conn: Option<SerialConnection<P>>,
    buffer: Arc<Mutex<SampleBuffer>>,
    running: Arc<AtomicBool>,
    stats: Arc<StreamStats>,
    thread: Option<JoinHandle<SerialConnection<P>>>,
}

impl<P> DataStream<P>
where
    P: Read + Write + Send + 'static,
{
    pub fn new(conn: SerialConnection<P>, capacity: usize) -> Self {
        Self {
            conn: Some(conn),
            buffer: Arc::new(Mutex::new(SampleBuffer::new(capacity))),
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(StreamStats::default()),
            thread: None,
        }
    }

    /// Spawn the acquisition thread. Does nothing if it is already running.
    pub fn start(&mut self) {
        if self.thread.is_some() {
            return;
        }
        let Some(conn) = self.conn.take() else {
            return;
        };

        self.running.store(true, Ordering::SeqCst);

        let buffer = Arc::clone(&self.buffer);
        let running = Arc::clone(&self.running);
        let stats = Arc::clone(&self.stats);

        self.thread = Some(thread::spawn(move || {
            acquisition_loop(conn, buffer, running, stats)
        }));
    }

    /// Signal the thread to finish its current read and wait for it
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            match handle.join() {
                Ok(conn) => self.conn = Some(conn),
                Err(_) => log::error!("Acquisition thread panicked"),
            }
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.thread.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Lock the buffer for reading. Hold the guard only as long as needed.
    pub fn buffer(&self) -> MutexGuard<'_, SampleBuffer> {
        lock_buffer(&self.buffer)
    }

    pub fn summary(&self) -> Summary {
        self.buffer().summary()
    }

    pub fn mean(&self) -> f64 {
        self.buffer().mean()
    }

    pub fn max(&self) -> f64 {
        self.buffer().max()
    }

    pub fn min(&self) -> f64 {
        self.buffer().min()
    }

    pub fn status(&self) -> String {
        self.buffer().status()
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}

impl<P> Drop for DataStream<P> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("Acquisition thread panicked");
            }
        }
    }
}

fn lock_buffer(buffer: &Mutex<SampleBuffer>) -> MutexGuard<'_, SampleBuffer> {
    // A panic while holding the lock cannot leave the buffers misaligned
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

fn acquisition_loop<P: Read + Write>(
    mut conn: SerialConnection<P>,
    buffer: Arc<Mutex<SampleBuffer>>,
    running: Arc<AtomicBool>,
    stats: Arc<StreamStats>,
) -> SerialConnection<P> {
    log::debug!("Acquisition started on {}", conn.name());
    let mut assembler = LineAssembler::new(conn.reply_cap());

    while running.load(Ordering::SeqCst) {
        let chunk = match conn.read_line() {
            Ok(chunk) => chunk,
            Err(e) => {
                log::error!("Read error on {}: {}", conn.name(), e);
                thread::sleep(Duration::from_millis(100));
                continue;
            }
        };

        if chunk.is_empty() {
            thread::sleep(Duration::from_millis(10));
            continue;
        }

        let Some(raw) = assembler.feed(&chunk) else {
            continue;
        };

        match decode_line(&raw) {
            Decoded::Sample { time, value } => {
                lock_buffer(&buffer).push(time, value);
                stats.accepted.fetch_add(1, Ordering::Relaxed);
            }
            Decoded::NotUtf8 => {
                log::warn!("invalid data got non unicode. This may happen at the start.");
                stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Decoded::Malformed => {
                log::debug!("Dropped line {:?}", String::from_utf8_lossy(&raw));
                stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    if assembler.has_pending() {
        log::debug!("Discarding partial line on {}", conn.name());
    }
    log::debug!("Acquisition stopped on {}", conn.name());
    conn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::port::mock::MockPort;
    use std::time::Instant;

    #[test]
    fn test_decode_valid() {
        assert_eq!(
            decode_line(b"1.5 512\r\n"),
            Decoded::Sample { time: 1.5, value: 512.0 }
        );
        assert_eq!(
            decode_line(b"  0.25\t-3e2 \n"),
            Decoded::Sample { time: 0.25, value: -300.0 }
        );
    }

    #[test]
    fn test_decode_rejects() {
        assert_eq!(decode_line(b"abc 1\n"), Decoded::Malformed);
        assert_eq!(decode_line(b"1 2 3\n"), Decoded::Malformed);
        assert_eq!(decode_line(b"42\n"), Decoded::Malformed);
        assert_eq!(decode_line(b"\n"), Decoded::Malformed);
        assert_eq!(decode_line(b"\xff\xfe 1\n"), Decoded::NotUtf8);
    }

    fn wait_for<F: Fn() -> bool>(condition: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_stream_fills_buffer() {
        let input = b"\xff\xff\n0.0 400\ngarbage\n1.0 500\n2.0 600\n3.0 700\n";
        let conn = SerialConnection::from_transport(MockPort::new(input), "mock");
        let mut stream = DataStream::new(conn, 3);

        stream.start();
        wait_for(|| stream.stats().accepted() + stream.stats().dropped() == 6);
        stream.stop();

        assert!(!stream.is_running());
        assert_eq!(stream.stats().accepted(), 4);
        assert_eq!(stream.stats().dropped(), 2);
        assert_eq!(stream.status(), "ndata = 3");
        assert_eq!(stream.min(), 500.0);
        assert_eq!(stream.max(), 700.0);
        assert_eq!(stream.mean(), 600.0);
        assert_eq!(stream.buffer().time_span(), Some((1.0, 3.0)));
    }

    #[test]
    fn test_start_twice_and_restart() {
        let conn = SerialConnection::from_transport(MockPort::timing_out(b"5 1\n"), "mock");
        let mut stream = DataStream::new(conn, 10);

        stream.start();
        stream.start();
        assert!(stream.is_running());
        wait_for(|| stream.stats().accepted() == 1);
        stream.stop();

        // connection comes back from the thread, so the stream can run again
        stream.start();
        assert!(stream.is_running());
        stream.stop();
        assert_eq!(stream.summary().count, 1);
    }

    #[test]
    fn test_drop_joins_running_thread() {
        let conn = SerialConnection::from_transport(MockPort::timing_out(b"7 3\n"), "mock");
        let mut stream = DataStream::new(conn, 10);

        stream.start();
        wait_for(|| stream.stats().accepted() == 1);
        let started = Instant::now();
        drop(stream);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_assembler_joins_fragments() {
        let mut assembler = LineAssembler::new(255);
        assert_eq!(assembler.feed(b"1.5 51"), None);
        assert!(assembler.has_pending());
        assert_eq!(assembler.feed(b"2\n"), Some(b"1.5 512\n".to_vec()));
        assert!(!assembler.has_pending());
        assert_eq!(assembler.feed(b"3 4\n"), Some(b"3 4\n".to_vec()));
    }

    #[test]
    fn test_assembler_releases_at_cap() {
        let mut assembler = LineAssembler::new(4);
        assert_eq!(assembler.feed(b"ab"), None);
        assert_eq!(assembler.feed(b"cd"), Some(b"abcd".to_vec()));
    }

    #[test]
    fn test_timed_out_fragment_is_not_stored() {
        let conn = SerialConnection::from_transport(MockPort::timing_out(b"1.5 51"), "mock");
        let mut stream = DataStream::new(conn, 10);

        stream.start();
        thread::sleep(Duration::from_millis(200));
        stream.stop();

        assert_eq!(stream.stats().accepted(), 0);
        assert_eq!(stream.stats().dropped(), 0);
        assert_eq!(stream.status(), "ndata = 0");
    }

    #[test]
    fn test_empty_stream_summary() {
        let conn = SerialConnection::from_transport(MockPort::new(b""), "mock");
        let stream = DataStream::new(conn, 10);
        assert_eq!(stream.mean(), -1.0);
        assert_eq!(stream.status(), "ndata = 0");
    }
}
