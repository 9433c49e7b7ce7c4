//! Structured text emission for simdgen.
//!
//! Generators never format indentation or braces themselves. They describe
//! output as a sequence of lines and nested blocks through the [`Emit`]
//! trait, and an implementation decides how that becomes text.
//!
//! # Padding
//!
//! Items are usually separated by a blank line. Rather than tracking that in
//! every generator, an item asks for [`Emit::pad`] before it starts. The pad
//! is dropped at the very start of output, directly after a block opener and
//! after another pad, so callers can request it unconditionally.
//!
//! ```text
//! impl Dot for float4 {        <- open_block
//!   #[inline]                  <- pad suppressed, then line
//!   fn dot(...) -> f32 {
//!     ...
//!   }
//!                              <- pad
//!   ...
//! }                            <- close_block
//! ```

#![warn(missing_docs)]

/// Default number of spaces per indentation level.
pub const DEFAULT_INDENT: usize = 2;

/// A sink for structured text.
pub trait Emit {
    /// Write one line at the current indentation.
    fn line(&mut self, text: &str);

    /// Request a blank line before the next item.
    fn pad(&mut self);

    /// Write `header {` and indent subsequent lines.
    fn open_block(&mut self, header: &str);

    /// Dedent and write the closing `}`.
    fn close_block(&mut self);

    /// Write a padded line.
    fn padded(&mut self, text: &str) {
        self.pad();
        self.line(text);
    }

    /// Write a block whose body is produced by `body`.
    fn block<F>(&mut self, header: &str, body: F)
    where
        Self: Sized,
        F: FnOnce(&mut Self),
    {
        self.open_block(header);
        body(self);
        self.close_block();
    }

    /// Write a padded block.
    fn padded_block<F>(&mut self, header: &str, body: F)
    where
        Self: Sized,
        F: FnOnce(&mut Self),
    {
        self.pad();
        self.block(header, body);
    }
}

/// An [`Emit`] implementation rendering into a `String`.
#[derive(Debug, Clone)]
pub struct TextEmitter {
    out: String,
    depth: usize,
    indent: usize,
    /// True at the start of output, after an opener and after a pad.
    at_boundary: bool,
}

impl TextEmitter {
    /// Create an emitter with the default indentation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_indent(DEFAULT_INDENT)
    }

    /// Create an emitter indenting by `indent` spaces per level.
    #[must_use]
    pub fn with_indent(indent: usize) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            indent,
            at_boundary: true,
        }
    }

    /// Current nesting depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consume the emitter and return the text.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    fn write_indent(&mut self) {
        let width = self.depth * self.indent;
        self.out.extend(std::iter::repeat(' ').take(width));
    }
}

impl Default for TextEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emit for TextEmitter {
    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            self.write_indent();
            self.out.push_str(text);
        }
        self.out.push('\n');
        self.at_boundary = false;
    }

    fn pad(&mut self) {
        if !self.at_boundary {
            self.out.push('\n');
            self.at_boundary = true;
        }
    }

    fn open_block(&mut self, header: &str) {
        self.write_indent();
        self.out.push_str(header);
        self.out.push_str(" {\n");
        self.depth += 1;
        self.at_boundary = true;
    }

    fn close_block(&mut self) {
        debug_assert!(self.depth > 0, "close_block without open_block");
        self.depth = self.depth.saturating_sub(1);
        self.write_indent();
        self.out.push_str("}\n");
        self.at_boundary = false;
    }
}
