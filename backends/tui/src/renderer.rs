use crossterm::style::{Attribute, Attributes, Color, ContentStyle, StyledContent};
use rill_core::NodeId;
use rill_memory::MemoryDocument;
use unicode_width::UnicodeWidthChar;

use crate::error::TuiError;

/// Represents a fully resolved frame ready to be drawn to the terminal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    lines: Vec<RenderLine>,
}

impl RenderFrame {
    /// Pushes a new line indented by `indent` spaces and returns it.
    pub fn push_line(&mut self, indent: usize) -> &mut RenderLine {
        let index = self.lines.len();
        self.lines.push(RenderLine::new(indent));
        &mut self.lines[index]
    }

    /// Returns the set of lines recorded in this frame.
    #[must_use]
    pub fn lines(&self) -> &[RenderLine] {
        &self.lines
    }

    /// Returns the frame as plain text, one line per row.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        self.lines
            .iter()
            .map(RenderLine::to_plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Representation of a single line in the terminal output.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderLine {
    segments: Vec<RenderSegment>,
}

impl RenderLine {
    fn new(indent: usize) -> Self {
        let mut segments = Vec::new();
        if indent > 0 {
            segments.push(RenderSegment::plain(" ".repeat(indent)));
        }
        Self { segments }
    }

    /// Pushes a new segment onto the line.
    pub fn push(&mut self, segment: RenderSegment) {
        self.segments.push(segment);
    }

    /// Returns the list of segments contained in this line.
    #[must_use]
    pub fn segments(&self) -> &[RenderSegment] {
        &self.segments
    }

    /// Returns the line without styling.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        self.segments.iter().map(RenderSegment::content).collect()
    }

    /// Cuts the line so that it occupies at most `width` terminal columns.
    fn truncate(&mut self, width: usize) {
        let mut remaining = width;
        let mut keep = 0;
        for segment in &mut self.segments {
            if remaining == 0 {
                break;
            }
            let mut used = 0;
            let mut end = 0;
            for (index, c) in segment.content.char_indices() {
                let w = c.width().unwrap_or(0);
                if used + w > remaining {
                    break;
                }
                used += w;
                end = index + c.len_utf8();
            }
            let whole = end == segment.content.len();
            segment.content.truncate(end);
            remaining -= used;
            keep += 1;
            if !whole {
                break;
            }
        }
        self.segments.truncate(keep);
    }
}

/// Atomic piece of content rendered on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSegment {
    content: String,
    style: ContentStyle,
}

impl RenderSegment {
    /// Creates a plain (unstyled) segment.
    pub fn plain(content: impl Into<String>) -> Self {
        Self::styled(content, ContentStyle::new())
    }

    /// Creates a segment with custom styling.
    pub fn styled(content: impl Into<String>, style: ContentStyle) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }

    /// Borrows the raw text stored in this segment.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the segment's style.
    #[must_use]
    pub const fn style(&self) -> &ContentStyle {
        &self.style
    }

    /// Converts this segment into a [`StyledContent`] for printing through crossterm.
    #[must_use]
    pub fn as_styled_content(&self) -> StyledContent<String> {
        self.style.apply(self.content.clone())
    }
}

/// Walks an output document and produces terminal friendly frames.
///
/// Elements show as their tag followed by their attributes; text nodes show their content.
/// Children are indented below their parent.
#[derive(Debug, Clone)]
pub struct Renderer {
    indent: usize,
    max_width: Option<usize>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer indenting by two columns per level, with no width limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            indent: 2,
            max_width: None,
        }
    }

    /// Sets the number of columns each nesting level indents by.
    #[must_use]
    pub const fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Cuts every line to at most `width` columns.
    #[must_use]
    pub const fn with_max_width(mut self, width: Option<usize>) -> Self {
        self.max_width = width;
        self
    }

    /// Renders the children of `container` into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::UnknownNode`] when `container` is not part of `document`.
    pub fn render(
        &self,
        document: &MemoryDocument,
        container: NodeId,
    ) -> Result<RenderFrame, TuiError> {
        if !document.contains(container) {
            return Err(TuiError::UnknownNode(container));
        }
        let mut frame = RenderFrame::default();
        for &child in document.children(container) {
            self.render_node(document, &mut frame, 0, child);
        }
        if let Some(width) = self.max_width {
            for line in &mut frame.lines {
                line.truncate(width);
            }
        }
        Ok(frame)
    }

    fn render_node(
        &self,
        document: &MemoryDocument,
        frame: &mut RenderFrame,
        depth: usize,
        node: NodeId,
    ) {
        if let Some(text) = document.text(node) {
            frame
                .push_line(depth * self.indent)
                .push(RenderSegment::plain(text));
            return;
        }
        let Some(tag) = document.tag(node) else {
            return;
        };

        let line = frame.push_line(depth * self.indent);
        line.push(RenderSegment::styled(tag, tag_style()));
        for (key, value) in document.attributes(node).into_iter().flatten() {
            line.push(RenderSegment::styled(
                format!(" {key}={value:?}"),
                attribute_style(),
            ));
        }
        for &child in document.children(node) {
            self.render_node(document, frame, depth + 1, child);
        }
    }
}

fn tag_style() -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(Color::Cyan);
    style.attributes = Attributes::from(Attribute::Bold);
    style
}

fn attribute_style() -> ContentStyle {
    let mut style = ContentStyle::new();
    style.attributes = Attributes::from(Attribute::Dim);
    style
}
