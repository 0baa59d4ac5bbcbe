use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, queue};

use crate::editor::EditorState;

/// Draws the current editing state. Two variants exist: a single-line
/// prompt with a session label, and a full-screen filter view over
/// externally supplied lines. The session re-invokes the renderer
/// after every keystroke and after every external print.
pub trait Renderer {
    fn render(&mut self, out: &mut dyn Write, state: &EditorState) -> io::Result<()>;
}

/// Single-line prompt prefixed with a channel/session label.
///
/// The label is shared with the driver so commands like `connect` can
/// relabel the prompt without reaching into the session.
pub struct PromptRenderer {
    label: Rc<RefCell<String>>,
}

impl PromptRenderer {
    pub fn new(label: Rc<RefCell<String>>) -> Self {
        Self { label }
    }
}

impl Renderer for PromptRenderer {
    fn render(&mut self, mut out: &mut dyn Write, state: &EditorState) -> io::Result<()> {
        queue!(&mut out, terminal::Clear(ClearType::CurrentLine), cursor::MoveToColumn(0))?;
        write!(
            out,
            "[{}]> {}{}",
            self.label.borrow(),
            state.visible(),
            state.arrow_escapes()
        )
    }
}

/// Full-screen live filter: redraws every supplied line containing the
/// in-progress text as a substring, then the prompt line beneath.
///
/// The line list is shared with the driver, which swaps it out when a
/// new batch of comments is loaded.
pub struct InteractiveRenderer {
    lines: Rc<RefCell<Vec<String>>>,
}

impl InteractiveRenderer {
    pub fn new(lines: Rc<RefCell<Vec<String>>>) -> Self {
        Self { lines }
    }
}

impl Renderer for InteractiveRenderer {
    fn render(&mut self, mut out: &mut dyn Write, state: &EditorState) -> io::Result<()> {
        queue!(&mut out, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        let filter = state.text();
        for line in self.lines.borrow().iter() {
            if line.contains(&filter) {
                write!(out, "{line}\r\n")?;
            }
        }
        queue!(&mut out, terminal::Clear(ClearType::CurrentLine), cursor::MoveToColumn(0))?;
        write!(out, "> {}{}", state.visible(), state.arrow_escapes())
    }
}
