use crate::term::MARGIN;

/// Half-open range of buffer indices currently visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub left: usize,
    pub right: usize,
}

/// The in-progress line: character buffer, cursor offset from the end,
/// the accumulated escape string that repositions the visible cursor
/// after a redraw, and a sliding viewport over lines wider than the
/// terminal.
///
/// Flat state with per-keystroke transitions. `0 <= offset <= len` and
/// `left <= right <= len` hold after every operation; moves and
/// backspace at the buffer boundaries are no-ops.
#[derive(Debug, Default)]
pub struct EditorState {
    chars: Vec<char>,
    offset: usize,
    arrows: String,
    window: Window,
    max_visible: Option<usize>,
}

const CURSOR_LEFT: &str = "\x1b[D";
const CURSOR_RIGHT: &str = "\x1b[C";

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn cursor_offset(&self) -> usize {
        self.offset
    }

    pub fn arrow_escapes(&self) -> &str {
        &self.arrows
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// The windowed slice of the buffer a renderer should draw.
    pub fn visible(&self) -> String {
        self.chars[self.window.left..self.window.right]
            .iter()
            .collect()
    }

    /// Feed in the current terminal width (or `None` when there is no
    /// terminal, which makes the viewport unbounded). Queried by the
    /// session once per loop iteration so resizes take effect.
    pub fn set_viewport_width(&mut self, cols: Option<usize>) {
        self.max_visible = cols.map(|c| c.saturating_sub(MARGIN).max(1));
        self.normalize_window();
    }

    pub fn insert(&mut self, c: char) {
        let at = self.chars.len() - self.offset;
        self.chars.insert(at, c);
        self.normalize_window();
    }

    /// Remove the character immediately before the cursor. No-op at the
    /// start of the buffer or when the target sits left of the viewport.
    pub fn backspace(&mut self) {
        if self.chars.is_empty() || self.offset >= self.chars.len() {
            return;
        }
        let at = self.chars.len() - self.offset - 1;
        if at < self.window.left {
            return;
        }
        self.chars.remove(at);
        // the deletion shifts everything after the cursor, so the
        // pending escapes are rebuilt from the offset
        self.arrows = CURSOR_LEFT.repeat(self.offset);
        self.normalize_window();
    }

    pub fn move_left(&mut self) {
        if self.offset < self.chars.len() {
            self.offset += 1;
            self.arrows.push_str(CURSOR_LEFT);
            self.normalize_window();
        }
    }

    pub fn move_right(&mut self) {
        if self.offset > 0 {
            self.offset -= 1;
            self.arrows.push_str(CURSOR_RIGHT);
            self.normalize_window();
        }
    }

    /// Replace the whole line (history recall), cursor at the end.
    pub fn replace(&mut self, text: &str) {
        self.chars = text.chars().collect();
        self.offset = 0;
        self.arrows.clear();
        self.normalize_window();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.offset = 0;
        self.arrows.clear();
        self.window = Window::default();
    }

    pub fn slice(&self, left: usize, right: usize) -> String {
        self.chars[left..right].iter().collect()
    }

    /// Replace `[left, right)` with `replacement` (tab completion).
    pub fn splice(&mut self, left: usize, right: usize, replacement: &str) {
        self.chars.splice(left..right, replacement.chars());
        self.offset = self.offset.min(self.chars.len());
        self.normalize_window();
    }

    /// Bounds of the `|`-delimited segment the cursor is inside.
    ///
    /// Scans backward from the cursor for a `|`, then skips forward
    /// past the delimiter and surrounding non-letters; symmetric scan
    /// forward for the right bound (one past the last letter). Missing
    /// delimiters clamp to the buffer ends.
    pub fn segment_bounds(&self) -> (usize, usize) {
        let len = self.chars.len();
        let n = len - self.offset;

        let mut left = 0usize;
        let mut i = n as isize - 1;
        while i > 0 {
            if self.chars[i as usize] == '|' {
                let mut l = i as usize;
                while l < len && !self.chars[l].is_alphabetic() {
                    l += 1;
                }
                left = l;
                break;
            }
            i -= 1;
        }

        let mut right = len;
        let mut j = n;
        while j < len {
            if self.chars[j] == '|' {
                let mut r = j;
                while r > 0 && !self.chars[r].is_alphabetic() {
                    r -= 1;
                }
                right = r + 1;
                break;
            }
            j += 1;
        }

        (left, right.max(left))
    }

    /// Re-establish the sliding-window invariants: width never exceeds
    /// the viewport, bounds stay inside the buffer, and the cursor
    /// (plus the character under it) stays visible.
    fn normalize_window(&mut self) {
        let len = self.chars.len();
        let max = self.max_visible.unwrap_or(usize::MAX);
        let cursor = len - self.offset;
        // the column the cursor occupies; one past it when a character
        // sits under the cursor
        let upper = if self.offset > 0 { cursor + 1 } else { cursor };

        let mut right = self.window.right.min(len);
        let mut left = self.window.left.min(right);

        // use the available width
        while right - left < max && right < len {
            right += 1;
        }
        while right - left < max && left > 0 {
            left -= 1;
        }
        // slide to keep the cursor position visible
        if cursor < left {
            right -= left - cursor;
            left = cursor;
        } else if upper > right {
            left += upper - right;
            right = upper;
        }
        // shrink after a resize, dropping columns away from the cursor
        while right - left > max {
            if upper < right {
                right -= 1;
            } else {
                left += 1;
            }
        }

        self.window = Window { left, right };
    }
}
