use std::io::{self, Write};

use tracing_subscriber::fmt::MakeWriter;
use upm_client::Secrets;

/// Log writer that masks every registered secret before the bytes leave the
/// process.
pub(crate) struct RedactingMakeWriter<M> {
    secrets: Secrets,
    inner: M,
}

impl RedactingMakeWriter<fn() -> io::Stderr> {
    pub(crate) fn stderr(secrets: Secrets) -> Self {
        Self {
            secrets,
            inner: io::stderr,
        }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for RedactingMakeWriter<M> {
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            secrets: self.secrets.clone(),
            inner: self.inner.make_writer(),
        }
    }
}

pub(crate) struct RedactingWriter<W> {
    secrets: Secrets,
    inner: W,
}

impl<W: Write> Write for RedactingWriter<W> {
    // The fmt layer hands over each event as a single buffer, so a secret
    // never straddles two writes.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.inner
            .write_all(self.secrets.redact(&text).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
