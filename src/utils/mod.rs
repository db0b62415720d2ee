pub mod console;
pub mod paths;

pub use console::{ConsoleReporter, RecordingReporter, Reporter};
