//! Console logging for rill applications.
//!
//! Every rill crate reports through `tracing`: structural output changes at `trace`,
//! mounts and reconciliation summaries at `debug`. [`install`] wires those events to
//! `stderr`.

use std::io::{self, Write};
use std::sync::Once;

use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the filter directives, e.g. `RILL_LOG=rill_core=trace`.
pub const ENV_VAR: &str = "RILL_LOG";

const DEFAULT_DIRECTIVE: &str = "info";
const PREFIX: &str = "[rill] ";

static INSTALLED: Once = Once::new();

/// Builds the filter from [`ENV_VAR`], falling back to `info` when it is unset or invalid.
#[must_use]
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs the console subscriber (idempotent).
///
/// Does nothing beyond the first call, and leaves an already installed global subscriber
/// in place.
pub fn install() {
    INSTALLED.call_once(|| {
        let console = fmt::layer()
            .with_writer(PrefixedWriter)
            .with_target(true)
            .with_filter(filter());

        if tracing_subscriber::registry().with(console).try_init().is_err() {
            eprintln!("{PREFIX}a global tracing subscriber is already installed");
        }
    });
}

#[derive(Clone, Copy, Default)]
struct PrefixedWriter;

impl<'a> MakeWriter<'a> for PrefixedWriter {
    type Writer = PrefixedWriterInner<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        PrefixedWriterInner {
            inner: io::stderr(),
            wrote_prefix: false,
        }
    }
}

struct PrefixedWriterInner<W> {
    inner: W,
    wrote_prefix: bool,
}

impl<W: Write> Write for PrefixedWriterInner<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_prefix {
            self.inner.write_all(PREFIX.as_bytes())?;
            self.wrote_prefix = true;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent() {
        install();
        install();
        tracing::debug!("still fine");
    }

    #[test]
    fn prefix_is_written_once_per_event() {
        let mut writer = PrefixedWriterInner {
            inner: Vec::new(),
            wrote_prefix: false,
        };
        writer.write_all(b"one ").unwrap();
        writer.write_all(b"two").unwrap();
        assert_eq!(writer.inner, b"[rill] one two");
    }
}
