/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

/// Return the default implementation of [`Output`], which prints to `stdout`.
pub fn default() -> DefaultOutput {
    DefaultOutput::new()
}

/// Reports are written through this trait so binaries print to `stdout` while tests
/// capture or discard the same text.
pub trait Output {
    fn sink(&mut self) -> &mut dyn std::io::Write;
}

/// This allows `&mut dyn Output` to be used as the receiver of the `write!` macro.
impl std::io::Write for &mut dyn Output {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.sink().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.sink().flush()
    }
}

/// An output that prints to `stdout`.
#[derive(Debug)]
pub struct DefaultOutput(std::io::Stdout);

impl DefaultOutput {
    pub fn new() -> Self {
        Self(std::io::stdout())
    }
}

impl Default for DefaultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for DefaultOutput {
    fn sink(&mut self) -> &mut dyn std::io::Write {
        &mut self.0
    }
}

/// An output that discards everything.
#[derive(Debug)]
pub struct Sink(std::io::Sink);

impl Sink {
    pub fn new() -> Self {
        Self(std::io::sink())
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for Sink {
    fn sink(&mut self) -> &mut dyn std::io::Write {
        &mut self.0
    }
}

/// Capture everything written in a buffer.
#[derive(Debug)]
pub struct Memory(Vec<u8>);

impl Memory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Consume `self`, returning everything that was written to it.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Return everything written so far as text, replacing invalid UTF-8.
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for Memory {
    fn sink(&mut self) -> &mut dyn std::io::Write {
        &mut self.0
    }
}

///////////
// Tests //
///////////
