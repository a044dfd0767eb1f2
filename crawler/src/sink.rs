//! Append-only line writers for crawl output.

use crate::crawler::{CrawlResult, ErrorRecord};
use std::fmt;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes one line per record and flushes after each, so partial output
/// survives an aborted run.
#[derive(Debug)]
struct LineWriter<W> {
    writer: W,
    lines: usize,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    async fn append(&mut self, record: &impl fmt::Display) -> io::Result<()> {
        let line = format!("{record}\n");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        self.lines += 1;
        Ok(())
    }

    async fn close(mut self) -> io::Result<W> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(self.writer)
    }
}

/// Node list: one `<address>\t<layer>` line per classified node.
#[derive(Debug)]
pub struct NodeListSink<W> {
    inner: LineWriter<W>,
}

impl<W: AsyncWrite + Unpin> NodeListSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: LineWriter::new(writer),
        }
    }

    pub async fn write(&mut self, result: &CrawlResult) -> io::Result<()> {
        self.inner.append(result).await
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.inner.lines
    }

    /// Flush and shut down the underlying writer.
    pub async fn close(self) -> io::Result<W> {
        self.inner.close().await
    }
}

/// Error log: one `<address>:<cause>[:...]` line per failed node.
#[derive(Debug)]
pub struct ErrorSink<W> {
    inner: LineWriter<W>,
}

impl<W: AsyncWrite + Unpin> ErrorSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: LineWriter::new(writer),
        }
    }

    pub async fn write(&mut self, record: &ErrorRecord) -> io::Result<()> {
        self.inner.append(record).await
    }

    pub fn lines(&self) -> usize {
        self.inner.lines
    }

    pub async fn close(self) -> io::Result<W> {
        self.inner.close().await
    }
}
