use crate::error::{PersistenceError, Result};
use crate::frame::{FrameHeader, MAX_BODY_LEN};
use crate::header::LogHeader;
use eventdb_kernel::{EventId, EventRecord};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// A decoded frame and where it sits in the file.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub offset: u64,
    pub len: u64,
    pub record: EventRecord,
}

/// Streams frames in file order.
///
/// Iteration ends after the first error. An incomplete final frame surfaces as
/// `PersistenceError::TornTail` carrying the offset where valid data ends.
pub struct LogReader<R> {
    reader: R,
    header: LogHeader,
    offset: u64,
    last_id: Option<EventId>,
    done: bool,
}

impl LogReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> LogReader<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let header = LogHeader::read_from(&mut reader)?;
        Ok(Self {
            reader,
            header,
            offset: LogHeader::SIZE as u64,
            last_id: None,
            done: false,
        })
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    /// End of the last frame read successfully.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_entry(&mut self) -> Option<Result<LogEntry>> {
        let mut head = [0u8; FrameHeader::SIZE];
        match read_full(&mut self.reader, &mut head) {
            Ok(0) => return None,
            Ok(n) if n < FrameHeader::SIZE => {
                return Some(Err(PersistenceError::TornTail { offset: self.offset }))
            }
            Ok(_) => {}
            Err(e) => return Some(Err(e.into())),
        }

        let header = match FrameHeader::parse(&head) {
            Ok(h) => h,
            Err(e) => return Some(Err(e)),
        };
        if header.body_len > MAX_BODY_LEN {
            return Some(Err(PersistenceError::FrameTooLarge {
                offset: self.offset,
                len: header.body_len,
            }));
        }

        let mut body = vec![0u8; header.body_len as usize];
        match read_full(&mut self.reader, &mut body) {
            Ok(n) if n < body.len() => {
                return Some(Err(PersistenceError::TornTail { offset: self.offset }))
            }
            Ok(_) => {}
            Err(e) => return Some(Err(e.into())),
        }

        let record = match header.open_body(&body) {
            Ok(r) => r,
            Err(e) => return Some(Err(e)),
        };
        if let Some(previous) = self.last_id {
            if record.id <= previous {
                return Some(Err(PersistenceError::OutOfOrder {
                    previous,
                    found: record.id,
                }));
            }
        }

        let len = (FrameHeader::SIZE + body.len()) as u64;
        let entry = LogEntry {
            offset: self.offset,
            len,
            record,
        };
        self.offset += len;
        self.last_id = Some(entry.record.id);
        Some(Ok(entry))
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.read_entry();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Reads until `buf` is full or EOF, returning the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Whole-file summary used by offline tooling.
#[derive(Debug)]
pub struct LogScan {
    pub header: LogHeader,
    pub records: Vec<EventRecord>,
    /// Length of the file prefix made of the header and complete frames.
    pub valid_len: u64,
    /// Offset of an incomplete final frame, if any.
    pub torn_tail: Option<u64>,
}

/// Reads every frame. Corruption is an error; a torn tail is reported, not raised.
pub fn scan(path: impl AsRef<Path>) -> Result<LogScan> {
    let mut reader = LogReader::open(path)?;
    let mut records = Vec::new();
    let mut torn_tail = None;

    for item in reader.by_ref() {
        match item {
            Ok(entry) => records.push(entry.record),
            Err(PersistenceError::TornTail { offset }) => torn_tail = Some(offset),
            Err(e) => return Err(e),
        }
    }

    Ok(LogScan {
        header: reader.header().clone(),
        records,
        valid_len: reader.offset(),
        torn_tail,
    })
}
