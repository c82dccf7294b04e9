/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Request and response body streams.
//!
//! Bodies are classified by capability, not probed at runtime: a body is
//! absent, an in-memory replayable byte buffer, an external seekable source
//! whose position can be saved and restored, or a one-shot streaming source.
//! The signer's payload-hash policy and the retry middleware's replay decision
//! both key off this classification.

use bytes::Bytes;
use std::fmt;
use std::io;
use std::io::{Read, Seek, SeekFrom};

/// A byte source whose position can be recovered.
///
/// Payload hashing streams a seekable source through SHA-256 and then restores
/// the position it started at; a seek failure fails the signing attempt.
pub trait SeekableSource: Read + Seek + Send + Sync + fmt::Debug {}

impl<T> SeekableSource for T where T: Read + Seek + Send + Sync + fmt::Debug {}

/// A one-shot byte source. It can be sent at most once and never hashed
/// implicitly.
pub trait StreamingSource: Read + Send + Sync + fmt::Debug {}

impl<T> StreamingSource for T where T: Read + Send + Sync + fmt::Debug {}

enum Kind {
    Empty,
    Bytes(BytesCursor),
    Seekable(Box<dyn SeekableSource>),
    Streaming(Box<dyn StreamingSource>),
}

/// A request or response body.
pub struct Body {
    kind: Kind,
}

impl Body {
    /// An absent body.
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    /// An in-memory body. Replayable: retries clone it freely.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            kind: Kind::Bytes(BytesCursor::new(data.into())),
        }
    }

    /// A body backed by an external seekable source.
    ///
    /// The source can be hashed (position restored afterwards) and rewound,
    /// but not cloned, so it is sent at most once per call.
    pub fn from_seekable(source: impl SeekableSource + 'static) -> Self {
        Self {
            kind: Kind::Seekable(Box::new(source)),
        }
    }

    /// A one-shot streaming body.
    pub fn from_streaming(source: impl StreamingSource + 'static) -> Self {
        Self {
            kind: Kind::Streaming(Box::new(source)),
        }
    }

    /// The body bytes, when they are available without performing I/O.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            Kind::Empty => Some(&[]),
            Kind::Bytes(cursor) => Some(cursor.data.as_ref()),
            _ => None,
        }
    }

    /// The total body length, when it is knowable without performing I/O.
    pub fn content_length(&self) -> Option<u64> {
        match &self.kind {
            Kind::Empty => Some(0),
            Kind::Bytes(cursor) => Some(cursor.data.len() as u64),
            _ => None,
        }
    }

    /// True when the body position can be saved and restored.
    pub fn is_seekable(&self) -> bool {
        matches!(self.kind, Kind::Bytes(_) | Kind::Seekable(_))
    }

    /// True when the body can be sent more than once.
    pub fn is_replayable(&self) -> bool {
        matches!(self.kind, Kind::Empty | Kind::Bytes(_))
    }

    /// True when no bytes will ever be produced.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::Empty)
    }

    /// The seekable view of this body, if it has one.
    pub fn as_seekable(&mut self) -> Option<&mut dyn SeekableSource> {
        match &mut self.kind {
            Kind::Bytes(cursor) => Some(cursor),
            Kind::Seekable(source) => Some(source.as_mut()),
            _ => None,
        }
    }

    /// Restores the body to its start so it can be sent again.
    ///
    /// Fails for streaming bodies, which can only be sent once.
    pub fn rewind(&mut self) -> io::Result<()> {
        match &mut self.kind {
            Kind::Empty => Ok(()),
            Kind::Bytes(cursor) => {
                cursor.position = 0;
                Ok(())
            }
            Kind::Seekable(source) => source.seek(SeekFrom::Start(0)).map(|_| ()),
            Kind::Streaming(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "streaming bodies cannot be rewound",
            )),
        }
    }

    /// Clones the body for a replay, rewound to its start.
    ///
    /// Returns `None` when the body is not replayable; retry middleware must
    /// refuse to replay such calls.
    pub fn try_clone(&self) -> Option<Body> {
        match &self.kind {
            Kind::Empty => Some(Body::empty()),
            Kind::Bytes(cursor) => Some(Body::from_bytes(cursor.data.clone())),
            _ => None,
        }
    }

    /// Reads the remaining bytes of this body.
    pub fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Empty => Ok(0),
            Kind::Bytes(cursor) => cursor.read_to_end(buf),
            Kind::Seekable(source) => source.read_to_end(buf),
            Kind::Streaming(source) => source.read_to_end(buf),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Self::from_bytes(data)
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&'static str> for Body {
    fn from(data: &'static str) -> Self {
        Self::from_bytes(data.as_bytes())
    }
}

impl From<&'static [u8]> for Body {
    fn from(data: &'static [u8]) -> Self {
        Self::from_bytes(data)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Empty => f.write_str("Body::Empty"),
            Kind::Bytes(cursor) => write!(f, "Body::Bytes({} bytes)", cursor.data.len()),
            Kind::Seekable(_) => f.write_str("Body::Seekable"),
            Kind::Streaming(_) => f.write_str("Body::Streaming"),
        }
    }
}

/// An in-memory cursor over shared bytes.
#[derive(Debug, Clone)]
struct BytesCursor {
    data: Bytes,
    position: u64,
}

impl BytesCursor {
    fn new(data: Bytes) -> Self {
        Self { data, position: 0 }
    }
}

impl Read for BytesCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.position.min(self.data.len() as u64) as usize..];
        let take = remaining.len().min(buf.len());
        buf[..take].copy_from_slice(&remaining[..take]);
        self.position += take as u64;
        Ok(take)
    }
}

impl Seek for BytesCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.data.len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => len + offset,
            SeekFrom::Current(offset) => self.position as i64 + offset,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot seek before the start of the body",
            ));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}
