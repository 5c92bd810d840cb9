//! Line terminator normalization for decoded text.

/// Rewrites `\r\n`, `\r` and `\n` terminators to a single `\n` and makes sure
/// the last line is terminated. Text may arrive in arbitrary chunks; a `\r` at
/// the end of one chunk followed by `\n` at the start of the next counts as one
/// terminator.
#[derive(Debug, Default)]
pub(crate) struct LineNormalizer {
    after_cr: bool,
    line_open: bool,
}

impl LineNormalizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends the normalized form of `chunk` to `out`.
    pub(crate) fn push(&mut self, chunk: &str, out: &mut String) {
        for c in chunk.chars() {
            if self.after_cr {
                self.after_cr = false;
                if c == '\n' {
                    continue;
                }
            }
            match c {
                '\r' => {
                    out.push('\n');
                    self.after_cr = true;
                    self.line_open = false;
                }
                '\n' => {
                    out.push('\n');
                    self.line_open = false;
                }
                c => {
                    out.push(c);
                    self.line_open = true;
                }
            }
        }
    }

    /// Terminates a trailing unterminated line.
    pub(crate) fn finish(&mut self, out: &mut String) {
        if self.line_open {
            out.push('\n');
            self.line_open = false;
        }
        self.after_cr = false;
    }
}
