use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Print, PrintStyledContent},
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::{
    error::TuiError,
    renderer::{RenderFrame, RenderLine},
};

#[derive(Debug)]
enum TerminalTarget {
    Stdout {
        handle: Stdout,
        alternate_screen: bool,
    },
    Buffer(String),
}

impl TerminalTarget {
    fn write_frame(&mut self, frame: &RenderFrame) -> Result<(), TuiError> {
        match self {
            Self::Stdout {
                handle,
                alternate_screen,
            } => {
                if *alternate_screen {
                    queue!(handle, MoveTo(0, 0), Clear(ClearType::All))?;
                    for (row, line) in frame.lines().iter().enumerate() {
                        let row = u16::try_from(row).unwrap_or(u16::MAX);
                        queue!(handle, MoveTo(0, row))?;
                        write_line(handle, line)?;
                    }
                } else {
                    for line in frame.lines() {
                        write_line(handle, line)?;
                        queue!(handle, Print("\n"))?;
                    }
                }
                handle.flush()?;
                Ok(())
            }
            Self::Buffer(buffer) => {
                buffer.clear();
                buffer.push_str(&frame.to_plain_text());
                Ok(())
            }
        }
    }
}

impl Drop for TerminalTarget {
    fn drop(&mut self) {
        if let Self::Stdout {
            handle,
            alternate_screen: true,
        } = self
        {
            let _ = execute!(handle, Show, LeaveAlternateScreen);
        }
    }
}

fn write_line(handle: &mut Stdout, line: &RenderLine) -> Result<(), TuiError> {
    for segment in line.segments() {
        queue!(handle, PrintStyledContent(segment.as_styled_content()))?;
    }
    Ok(())
}

/// Where presented frames end up.
#[derive(Debug)]
pub struct Terminal {
    target: TerminalTarget,
    frames: usize,
}

impl Terminal {
    /// Prints frames to `stdout` one after another, leaving the screen as it is.
    #[must_use]
    pub fn stdout() -> Self {
        Self::from_target(TerminalTarget::Stdout {
            handle: io::stdout(),
            alternate_screen: false,
        })
    }

    /// Takes over the screen: enters the alternate screen, hides the cursor and redraws
    /// every frame from the top-left corner. The screen is restored on drop.
    ///
    /// # Errors
    ///
    /// Fails when the terminal rejects the setup sequence.
    pub fn fullscreen() -> Result<Self, TuiError> {
        let mut handle = io::stdout();
        execute!(handle, EnterAlternateScreen, Hide)?;
        Ok(Self::from_target(TerminalTarget::Stdout {
            handle,
            alternate_screen: true,
        }))
    }

    /// Keeps the last frame as plain text in memory.
    #[must_use]
    pub const fn buffered() -> Self {
        Self::from_target(TerminalTarget::Buffer(String::new()))
    }

    const fn from_target(target: TerminalTarget) -> Self {
        Self { target, frames: 0 }
    }

    /// Draws a frame.
    ///
    /// # Errors
    ///
    /// Propagates terminal I/O failures.
    pub fn render(&mut self, frame: &RenderFrame) -> Result<(), TuiError> {
        self.target.write_frame(frame)?;
        self.frames += 1;
        Ok(())
    }

    /// Returns how many frames were drawn so far.
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Returns the last frame when the terminal was created via [`Self::buffered`].
    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        match &self.target {
            TerminalTarget::Buffer(buffer) => Some(buffer),
            TerminalTarget::Stdout { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderSegment;

    #[test]
    fn buffered_terminal_keeps_the_last_frame() {
        let mut terminal = Terminal::buffered();
        let mut frame = RenderFrame::default();
        frame.push_line(0).push(RenderSegment::plain("one"));
        terminal.render(&frame).unwrap();

        let mut frame = RenderFrame::default();
        frame.push_line(2).push(RenderSegment::plain("two"));
        terminal.render(&frame).unwrap();

        assert_eq!(terminal.snapshot(), Some("  two"));
        assert_eq!(terminal.frames(), 2);
    }
}
