//! Colored terminal output.

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    stdout: BufferWriter,
    verbose: bool,
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool) -> Self {
        Self {
            stdout: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
        }
    }

    fn tagged(&self, writer: &BufferWriter, tag: &str, spec: &ColorSpec, message: &str) -> std::io::Result<()> {
        let mut buffer = writer.buffer();
        buffer.set_color(spec)?;
        write!(&mut buffer, "{tag}")?;
        buffer.reset()?;
        writeln!(&mut buffer, " {message}")?;
        writer.print(&buffer)
    }

    /// Print an info message
    pub fn info(&self, message: &str) -> std::io::Result<()> {
        let spec = ColorSpec::new().set_fg(Some(Color::Cyan)).clone();
        self.tagged(&self.stdout, "ℹ", &spec, message)
    }

    /// Print a success message
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        let spec = ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true).clone();
        self.tagged(&self.stdout, "✓", &spec, message)
    }

    /// Print a verbose message (only in verbose mode)
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        let spec = ColorSpec::new().set_fg(Some(Color::Blue)).clone();
        self.tagged(&self.stdout, "→", &spec, message)
    }

    /// Print an error message to stderr
    pub fn error(&self, message: &str) {
        let stderr = BufferWriter::stderr(ColorChoice::Auto);
        let spec = ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true).clone();
        if self.tagged(&stderr, "✗", &spec, message).is_err() {
            // Stderr failed - fallback to stdout as last resort
            println!("[STDERR ERROR] ✗ {message}");
        }
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        let mut buffer = self.stdout.buffer();
        writeln!(&mut buffer, "    {message}")?;
        self.stdout.print(&buffer)
    }

    /// Print a plain message
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        let mut buffer = self.stdout.buffer();
        writeln!(&mut buffer, "{message}")?;
        self.stdout.print(&buffer)
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
