//! Named-pipe transport.
//!
//! The child's stdout and stderr are opened on the write end of a FIFO at a
//! fixed path while a dedicated thread drains the read end into the
//! demultiplexer. The flow is:
//!
//! 1. [`Fifo::create`]: `mkfifo` at the path; an existing FIFO is reused.
//! 2. [`Fifo::open_reader`] (non-blocking) then [`Fifo::open_writer`].
//! 3. [`StreamReader::spawn`]: reader thread reads until every writer has
//!    closed, or until it is told to stop and has drained what is left.
//! 4. [`StreamReader::stop_and_join`] once the child has exited.
//!
//! `Drop` on [`Fifo`] removes the path.

#![allow(unsafe_code)] // mkfifo() requires unsafe

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};

use crate::demux::{Demultiplexer, DemuxSummary, READ_BUF_SIZE};
use crate::domain::TransportError;

/// How long the reader waits for data before checking for a stop signal.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

const FIFO_MODE: libc::mode_t = 0o600;

// ---------------------------------------------------------------------------
// Fifo
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Fifo {
    path: PathBuf,
}

impl Fifo {
    /// Create the FIFO at `path`, tolerating one that already exists.
    ///
    /// # Errors
    /// [`TransportError::NotAFifo`] if something other than a FIFO occupies
    /// the path, [`TransportError::FifoCreation`] for any other failure.
    pub fn create(path: &Path) -> Result<Self, TransportError> {
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|e| {
            TransportError::FifoCreation {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, e),
            }
        })?;

        // SAFETY: c_path is a valid NUL-terminated string that outlives the call
        if unsafe { libc::mkfifo(c_path.as_ptr(), FIFO_MODE) } == 0 {
            info!("created FIFO {}", path.display());
            return Ok(Self { path: path.to_path_buf() });
        }

        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::AlreadyExists {
            return Err(TransportError::FifoCreation { path: path.to_path_buf(), source: err });
        }

        let metadata = fs::symlink_metadata(path)
            .map_err(|source| TransportError::FifoCreation { path: path.to_path_buf(), source })?;
        if !metadata.file_type().is_fifo() {
            return Err(TransportError::NotAFifo(path.to_path_buf()));
        }

        debug!("reusing existing FIFO {}", path.display());
        Ok(Self { path: path.to_path_buf() })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the read end without waiting for a writer.
    ///
    /// # Errors
    /// Returns [`TransportError::FifoOpen`] if the FIFO cannot be opened.
    pub fn open_reader(&self) -> Result<File, TransportError> {
        OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
            .map_err(|source| TransportError::FifoOpen { path: self.path.clone(), source })
    }

    /// Open the write end. Call after [`open_reader`](Self::open_reader) so
    /// the open does not block.
    ///
    /// # Errors
    /// Returns [`TransportError::FifoOpen`] if the FIFO cannot be opened.
    pub fn open_writer(&self) -> Result<File, TransportError> {
        OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|source| TransportError::FifoOpen { path: self.path.clone(), source })
    }
}

impl Drop for Fifo {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("removed FIFO {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove FIFO {}: {e}", self.path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// StreamReader
// ---------------------------------------------------------------------------

/// Reader thread feeding a demultiplexer from a non-blocking FIFO.
pub struct StreamReader {
    handle: JoinHandle<io::Result<DemuxSummary>>,
    stop: Sender<()>,
}

impl StreamReader {
    /// Start draining `source` on a new thread.
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<W>(source: File, demux: Demultiplexer<W>) -> io::Result<Self>
    where
        W: Write + Send + 'static,
    {
        let (stop, stop_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("see-fifo-reader".to_string())
            .spawn(move || read_until_stopped(source, demux, &stop_rx))?;
        Ok(Self { handle, stop })
    }

    /// Tell the reader the child is gone, then wait for it to drain.
    ///
    /// # Errors
    /// Returns an error if the reader failed or panicked.
    pub fn stop_and_join(self) -> Result<DemuxSummary, TransportError> {
        // The reader may already have hit end of stream and dropped its receiver
        let _ = self.stop.try_send(());
        drop(self.stop);
        let summary = self.handle.join().map_err(|_| TransportError::ReaderPanicked)??;
        Ok(summary)
    }
}

fn read_until_stopped<R, W>(
    mut source: R,
    mut demux: Demultiplexer<W>,
    stop: &Receiver<()>,
) -> io::Result<DemuxSummary>
where
    R: Read,
    W: Write,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut stopping = false;

    loop {
        match source.read(&mut buf) {
            Ok(0) => {
                debug!("FIFO reached end of stream");
                break;
            }
            Ok(n) => demux.push_bytes(&buf[..n])?,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if stopping {
                    debug!("FIFO drained after stop signal");
                    break;
                }
                match stop.recv_timeout(POLL_INTERVAL) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => stopping = true,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    demux.finish()
}
