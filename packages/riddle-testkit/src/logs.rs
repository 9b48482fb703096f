use std::{
	io::{self, Write},
	sync::{Arc, Mutex},
};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Collects everything logged while [`LogCapture::capture`] runs.
#[derive(Clone, Debug, Default)]
pub struct LogCapture {
	buf: Arc<Mutex<Vec<u8>>>,
}
impl LogCapture {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
		let subscriber = tracing_subscriber::fmt()
			.with_writer(self.clone())
			.with_ansi(false)
			.with_max_level(Level::TRACE)
			.finish();

		tracing::subscriber::with_default(subscriber, f)
	}

	pub fn contents(&self) -> String {
		let buf = self.buf.lock().unwrap_or_else(|err| err.into_inner());

		String::from_utf8_lossy(&buf).into_owned()
	}

	/// Lines logged at `level`, e.g. `"ERROR"`.
	pub fn lines_at(&self, level: &str) -> Vec<String> {
		self.contents().lines().filter(|line| line.contains(level)).map(str::to_string).collect()
	}
}
impl<'a> MakeWriter<'a> for LogCapture {
	type Writer = CaptureWriter;

	fn make_writer(&'a self) -> Self::Writer {
		CaptureWriter { buf: self.buf.clone() }
	}
}

pub struct CaptureWriter {
	buf: Arc<Mutex<Vec<u8>>>,
}
impl Write for CaptureWriter {
	fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
		let mut buf = self.buf.lock().unwrap_or_else(|err| err.into_inner());

		buf.extend_from_slice(bytes);

		Ok(bytes.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}
