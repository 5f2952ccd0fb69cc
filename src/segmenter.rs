use thiserror::Error;

/// Rejected line width for display segmentation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("chars_per_line must be greater than zero")]
pub struct InvalidLineWidth;

/// One display line of the target text.
///
/// `start_index` and `end_index` are inclusive character offsets into the
/// original text. A line terminated by a newline owns the newline's offset
/// even though the newline is not part of `text`, so that every caret
/// offset in the target maps to exactly one line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub start_index: usize,
    pub end_index: usize,
}

impl Line {
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Split `text` into display lines at most `chars_per_line` characters wide.
///
/// A newline ends the current line (the newline itself is consumed, never
/// rendered) and opens a new one. A line that fills up without a newline
/// breaks before the overflowing character, which starts the next line.
/// A trailing partial line is emitted if non-empty.
pub fn segment(text: &str, chars_per_line: usize) -> Result<Vec<Line>, InvalidLineWidth> {
    if chars_per_line == 0 {
        return Err(InvalidLineWidth);
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut len = 0;

    for (i, ch) in text.chars().enumerate() {
        if ch == '\n' {
            lines.push(Line {
                text: std::mem::take(&mut current),
                start_index: start,
                end_index: i,
            });
            start = i + 1;
            len = 0;
        } else if len >= chars_per_line {
            lines.push(Line {
                text: std::mem::take(&mut current),
                start_index: start,
                end_index: i - 1,
            });
            start = i;
            current.push(ch);
            len = 1;
        } else {
            current.push(ch);
            len += 1;
        }
    }

    if !current.is_empty() {
        lines.push(Line {
            text: current,
            start_index: start,
            end_index: start + len - 1,
        });
    }

    Ok(lines)
}

/// Map an absolute caret offset to `(line_index, column)`.
///
/// Lines cover contiguous, disjoint offset ranges, so a binary search on
/// `end_index` finds the owner in O(log n). Offsets past the last line
/// return `None`.
pub fn locate(lines: &[Line], offset: usize) -> Option<(usize, usize)> {
    let idx = lines.partition_point(|line| line.end_index < offset);
    let line = lines.get(idx)?;
    (offset >= line.start_index).then_some((idx, offset - line.start_index))
}

/// The visible slice of lines, scrolled to follow the caret.
///
/// Pure view-model; it never influences correctness or metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayWindow {
    pub start_line: usize,
    pub max_visible: usize,
}

impl DisplayWindow {
    pub fn new(max_visible: usize) -> Self {
        Self {
            start_line: 0,
            max_visible,
        }
    }

    /// Scroll so `current_line` stays inside the window, clamped to the
    /// available line range.
    pub fn follow(&mut self, current_line: usize, total_lines: usize) {
        if self.max_visible == 0 {
            self.start_line = 0;
            return;
        }

        if current_line >= self.start_line + self.max_visible {
            self.start_line = current_line + 1 - self.max_visible;
        } else if current_line < self.start_line {
            self.start_line = current_line;
        }

        let max_start = total_lines.saturating_sub(self.max_visible);
        self.start_line = self.start_line.min(max_start);
    }

    pub fn visible_range(&self, total_lines: usize) -> std::ops::Range<usize> {
        let end = (self.start_line + self.max_visible).min(total_lines);
        self.start_line.min(end)..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_width() {
        let lines = segment("abcdef", 3).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "abc");
        assert_eq!((lines[0].start_index, lines[0].end_index), (0, 2));
        assert_eq!(lines[1].text, "def");
        assert_eq!((lines[1].start_index, lines[1].end_index), (3, 5));
    }

    #[test]
    fn splits_on_newline_and_consumes_it() {
        let lines = segment("ab\ncd", 80).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "ab");
        assert_eq!((lines[0].start_index, lines[0].end_index), (0, 2));
        assert_eq!(lines[1].text, "cd");
        assert_eq!((lines[1].start_index, lines[1].end_index), (3, 4));
    }

    #[test]
    fn consecutive_newlines_emit_empty_line() {
        let lines = segment("a\n\nb", 80).unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "a");
        assert!(lines[1].is_empty());
        assert_eq!((lines[1].start_index, lines[1].end_index), (2, 2));
        assert_eq!(lines[2].text, "b");
    }

    #[test]
    fn trailing_newline_emits_no_empty_tail() {
        let lines = segment("ab\n", 80).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "ab");
    }

    #[test]
    fn trailing_partial_line_is_emitted() {
        let lines = segment("abcd", 3).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "d");
        assert_eq!((lines[1].start_index, lines[1].end_index), (3, 3));
    }

    #[test]
    fn empty_text_yields_no_lines() {
        assert!(segment("", 10).unwrap().is_empty());
    }

    #[test]
    fn zero_width_is_rejected() {
        assert_eq!(segment("abc", 0), Err(InvalidLineWidth));
    }

    #[test]
    fn locate_maps_offsets_to_line_and_column() {
        let lines = segment("abcdef", 3).unwrap();

        assert_eq!(locate(&lines, 0), Some((0, 0)));
        assert_eq!(locate(&lines, 2), Some((0, 2)));
        assert_eq!(locate(&lines, 3), Some((1, 0)));
        assert_eq!(locate(&lines, 5), Some((1, 2)));
        assert_eq!(locate(&lines, 6), None);
    }

    #[test]
    fn locate_assigns_newline_offset_to_terminated_line() {
        let lines = segment("ab\ncd", 80).unwrap();

        // Caret sitting on the newline belongs to the line it ends.
        assert_eq!(locate(&lines, 2), Some((0, 2)));
        assert_eq!(locate(&lines, 3), Some((1, 0)));
    }

    #[test]
    fn window_follows_caret_down_and_up() {
        let mut window = DisplayWindow::new(3);

        window.follow(0, 10);
        assert_eq!(window.start_line, 0);

        // Caret moves past the third visible line.
        window.follow(3, 10);
        assert_eq!(window.start_line, 1);

        window.follow(8, 10);
        assert_eq!(window.start_line, 6);

        // Scrolling back up.
        window.follow(2, 10);
        assert_eq!(window.start_line, 2);
    }

    #[test]
    fn window_clamps_to_available_lines() {
        let mut window = DisplayWindow::new(3);

        window.follow(1, 2);
        assert_eq!(window.start_line, 0);
        assert_eq!(window.visible_range(2), 0..2);
    }
}
