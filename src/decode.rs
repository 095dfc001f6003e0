//! Character decoding on a background worker.
//!
//! The worker decodes the raw input to UTF-8 with `encoding_rs_io` and sends it
//! in chunks over a bounded channel; [`PipeReader`] is the receiving end and can
//! be handed to any parser expecting a `Read`. A byte-order mark always wins over
//! the requested encoding.

use std::{
    io::{self, Read},
    sync::mpsc::{Receiver, SyncSender, sync_channel},
    thread::{self, JoinHandle},
};

use encoding_rs::Encoding;
use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::error::Error;

const CHUNK_SIZE: usize = 8 * 1024;
/// Chunks in flight between the worker and the reader.
const PIPE_CAPACITY: usize = 16;

/// Looks up an encoding by its WHATWG label ("utf-16le", "latin1", "shift_jis"…).
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, Error> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::unsupported(format!("unknown encoding label `{}`", label)))
}

/// Reading end of the decoder pipe. Yields UTF-8.
pub struct PipeReader {
    receiver: Receiver<io::Result<Vec<u8>>>,
    chunk: Vec<u8>,
    position: usize,
    closed: bool,
}

impl PipeReader {
    fn new(receiver: Receiver<io::Result<Vec<u8>>>) -> Self {
        Self {
            receiver,
            chunk: Vec::new(),
            position: 0,
            closed: false,
        }
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.position >= self.chunk.len() {
            if self.closed {
                return Ok(0);
            }
            match self.receiver.recv() {
                Ok(Ok(chunk)) => {
                    self.chunk = chunk;
                    self.position = 0;
                }
                Ok(Err(e)) => {
                    self.closed = true;
                    return Err(e);
                }
                // Worker finished and dropped its sender.
                Err(_) => self.closed = true,
            }
        }
        let available = &self.chunk[self.position..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.position += count;
        Ok(count)
    }
}

/// Starts decoding `input` on a worker thread.
///
/// With no `label`, the input is taken as UTF-8 unless it starts with a
/// byte-order mark. The handle yields the number of UTF-8 bytes produced.
pub fn spawn_decoder<R>(
    input: R,
    label: Option<&str>,
) -> Result<(PipeReader, JoinHandle<Result<u64, Error>>), Error>
where
    R: Read + Send + 'static,
{
    let encoding = label.map(encoding_for_label).transpose()?;
    let (sender, receiver) = sync_channel(PIPE_CAPACITY);
    let handle = thread::Builder::new()
        .name("xliffconv-decoder".to_string())
        .spawn(move || decode_into(input, encoding, sender))?;
    Ok((PipeReader::new(receiver), handle))
}

fn decode_into<R: Read>(
    input: R,
    encoding: Option<&'static Encoding>,
    sender: SyncSender<io::Result<Vec<u8>>>,
) -> Result<u64, Error> {
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(encoding)
        .bom_override(true)
        .build(input);
    let mut produced = 0u64;

    loop {
        let mut chunk = vec![0; CHUNK_SIZE];
        match decoder.read(&mut chunk) {
            Ok(0) => return Ok(produced),
            Ok(count) => {
                chunk.truncate(count);
                produced += count as u64;
                if sender.send(Ok(chunk)).is_err() {
                    log::debug!("decoder pipe closed by the reader after {} bytes", produced);
                    return Ok(produced);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let message = e.to_string();
                // The reader sees the failure too; it may already be gone.
                let _ = sender.send(Err(io::Error::new(e.kind(), message.clone())));
                return Err(Error::decode_error(message, Some(Box::new(e))));
            }
        }
    }
}

/// Joins a decoder worker, turning a panic into a decode error.
pub fn join_decoder(handle: JoinHandle<Result<u64, Error>>) -> Result<u64, Error> {
    handle
        .join()
        .map_err(|_| Error::decode_error("decoder thread panicked", None))?
}
