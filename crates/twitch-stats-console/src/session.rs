use std::collections::HashMap;
use std::io::{self, Read, Write};

use chrono::Local;
use thiserror::Error;

use crate::buffer::CycleBuffer;
use crate::complete::{self, NameLookup};
use crate::editor::EditorState;
use crate::key::{self, Key};
use crate::render::Renderer;
use crate::term;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Stdin closed; the session loop cannot continue.
    #[error("input stream closed")]
    EndOfInput,
    #[error("input read failed: {0}")]
    Io(#[from] io::Error),
}

/// One interactive console session.
///
/// Owns the committed-line history, the in-progress editor state, the
/// renderer and the completion lookup. Single-threaded and blocking:
/// the session owns its input stream for the duration of
/// [`process_console`](Self::process_console), and asynchronous output
/// from elsewhere in the application must funnel through
/// [`print`](Self::print)/[`println`](Self::println) so the prompt is
/// redrawn below it. These methods are not synchronized; the caller
/// serializes them.
pub struct ConsoleSession {
    history: CycleBuffer,
    editor: EditorState,
    renderer: Box<dyn Renderer>,
    lookup: Box<dyn NameLookup>,
    out: Box<dyn Write>,
    printed_width: usize,
}

impl ConsoleSession {
    pub fn new(renderer: Box<dyn Renderer>, lookup: Box<dyn NameLookup>) -> Self {
        Self::with_output(renderer, lookup, Box::new(io::stdout()))
    }

    pub fn with_output(
        renderer: Box<dyn Renderer>,
        lookup: Box<dyn NameLookup>,
        out: Box<dyn Write>,
    ) -> Self {
        Self {
            history: CycleBuffer::new(),
            editor: EditorState::new(),
            renderer,
            lookup,
            out,
            printed_width: 0,
        }
    }

    /// Swap the renderer (e.g. prompt view to interactive filter view).
    /// History carries over.
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = renderer;
    }

    pub fn history(&self) -> &CycleBuffer {
        &self.history
    }

    /// Run the edit loop until Enter commits a line.
    ///
    /// Blocks on `input`; returns the committed line, or
    /// [`ConsoleError`] when the stream closes or a read fails.
    /// Malformed escape sequences are dropped without a state change.
    pub fn process_console(&mut self, input: &mut dyn Read) -> Result<String, ConsoleError> {
        let mut tab_buffer = CycleBuffer::new();
        let mut prefix_buffer = CycleBuffer::new();
        loop {
            // terminals can be resized mid-session
            self.editor.set_viewport_width(term::viewport_width());
            self.renderer.render(&mut *self.out, &self.editor).ok();
            self.out.flush().ok();

            let Some(key) = key::read_key(input)? else {
                continue;
            };
            match key {
                Key::Insert(c) => {
                    self.editor.insert(c);
                    // typing invalidates stale completion and recall state
                    tab_buffer.clear();
                    prefix_buffer.clear();
                }
                Key::Backspace => {
                    self.editor.backspace();
                    tab_buffer.clear();
                    prefix_buffer.clear();
                }
                Key::Enter => {
                    let line = self.editor.text();
                    let duplicate = self
                        .history
                        .entries()
                        .last()
                        .is_some_and(|last| *last == line);
                    let skip_empty = line.is_empty() && self.history.is_empty();
                    if !duplicate && !skip_empty {
                        self.history.add(line.clone());
                    }
                    self.history.index = self.history.len();
                    write!(self.out, "\r\n\r\n").ok();
                    self.out.flush().ok();
                    self.editor.clear();
                    return Ok(line);
                }
                Key::Tab => {
                    let (left, right) = self.editor.segment_bounds();
                    let segment = self.editor.slice(left, right);
                    let replacement =
                        complete::process_tab(&segment, &*self.lookup, &mut tab_buffer);
                    self.editor.splice(left, right, &replacement);
                }
                Key::ArrowUp => {
                    if !self.history.is_empty() {
                        if prefix_buffer.is_empty() {
                            prefix_buffer = prefix_buffer_for(&self.editor.text(), &self.history);
                        }
                        if prefix_buffer.index != 0 {
                            prefix_buffer.index -= 1;
                            self.editor.replace(prefix_buffer.get());
                        }
                    }
                }
                Key::ArrowDown => {
                    if !self.history.is_empty() {
                        if prefix_buffer.is_empty() {
                            prefix_buffer = prefix_buffer_for(&self.editor.text(), &self.history);
                        }
                        if prefix_buffer.index + 1 >= prefix_buffer.len() {
                            // newest candidate is the in-progress line itself
                            self.editor.replace(prefix_buffer.back());
                        } else {
                            prefix_buffer.index += 1;
                            self.editor.replace(prefix_buffer.get());
                        }
                    }
                }
                Key::ArrowLeft => self.editor.move_left(),
                Key::ArrowRight => self.editor.move_right(),
            }
        }
    }

    /// Write into the output region above the prompt without ending the
    /// output line; a following `print`/`println` continues it.
    pub fn print(&mut self, text: &str) {
        self.reposition_into_output();
        write!(self.out, "{text}").ok();
        self.printed_width += text.chars().count();
        self.finish_output();
    }

    /// Write one completed line into the output region above the prompt.
    pub fn println(&mut self, text: &str) {
        self.reposition_into_output();
        write!(self.out, "{text}").ok();
        self.printed_width = 0;
        self.finish_output();
    }

    /// Timestamped line with the caller's `file:line`, through
    /// [`println`](Self::println).
    #[track_caller]
    pub fn log(&mut self, text: &str) {
        let loc = std::panic::Location::caller();
        let file = loc.file().rsplit('/').next().unwrap_or("???");
        let now = Local::now().format("%Y-%m-%d %H:%M:%S %z");
        self.println(&format!("[{now}] {file}:{line}: {text}", line = loc.line()));
    }

    /// Clear the prompt line and move the cursor onto the bottom line
    /// of the output region, continuing a partially printed line if one
    /// is pending.
    fn reposition_into_output(&mut self) {
        write!(self.out, "\x1b[2K\r").ok();
        if self.printed_width != 0 {
            write!(self.out, "\x1b[2F\x1b[{}C", self.printed_width).ok();
        } else {
            write!(self.out, "\x1b[1F").ok();
        }
    }

    /// Restore the two-line separation and redraw the prompt below.
    fn finish_output(&mut self) {
        write!(self.out, "\r\n\r\n").ok();
        self.renderer.render(&mut *self.out, &self.editor).ok();
        self.out.flush().ok();
    }
}

/// Ephemeral recall view: history entries sharing `line` as a prefix,
/// duplicates collapsed onto their most recent occurrence, with the
/// in-progress line appended last so ArrowDown can return to it.
fn prefix_buffer_for(line: &str, history: &CycleBuffer) -> CycleBuffer {
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for entry in history.entries() {
        *remaining.entry(entry.as_str()).or_insert(0) += 1;
    }
    let mut filtered = CycleBuffer::new();
    for entry in history.entries() {
        let count = remaining
            .get_mut(entry.as_str())
            .expect("entry counted above");
        *count -= 1;
        if (line.is_empty() || entry.starts_with(line)) && *count == 0 {
            filtered.add(entry.clone());
        }
    }
    filtered.add(line.to_string());
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Yields one keystroke chunk per read call, the way a terminal
    /// delivers raw input.
    struct ScriptedInput {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ScriptedInput {
        fn new() -> Self {
            Self {
                chunks: VecDeque::new(),
            }
        }

        fn typed(mut self, text: &str) -> Self {
            for c in text.chars() {
                let mut chunk = [0u8; 4];
                self.chunks
                    .push_back(c.encode_utf8(&mut chunk).as_bytes().to_vec());
            }
            self
        }

        fn raw(mut self, bytes: &[u8]) -> Self {
            self.chunks.push_back(bytes.to_vec());
            self
        }

        fn enter(self) -> Self {
            self.raw(b"\n")
        }

        fn tab(self) -> Self {
            self.raw(b"\t")
        }

        fn up(self) -> Self {
            self.raw(b"\x1b[A")
        }

        fn down(self) -> Self {
            self.raw(b"\x1b[B")
        }
    }

    impl Read for ScriptedInput {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Ok(0),
            }
        }
    }

    struct NullRenderer;

    impl Renderer for NullRenderer {
        fn render(&mut self, _out: &mut dyn Write, _state: &EditorState) -> io::Result<()> {
            Ok(())
        }
    }

    struct MarkerRenderer;

    impl Renderer for MarkerRenderer {
        fn render(&mut self, out: &mut dyn Write, state: &EditorState) -> io::Result<()> {
            write!(out, "<prompt:{}>", state.text())
        }
    }

    struct NoNames;

    impl NameLookup for NoNames {
        fn names_with_prefix(&self, _prefix: &str) -> Vec<String> {
            Vec::new()
        }
    }

    struct TwoBobs;

    impl NameLookup for TwoBobs {
        fn names_with_prefix(&self, _prefix: &str) -> Vec<String> {
            vec!["bob".to_string(), "bobby".to_string()]
        }
    }

    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn quiet_session(lookup: Box<dyn NameLookup>) -> ConsoleSession {
        ConsoleSession::with_output(Box::new(NullRenderer), lookup, Box::new(io::sink()))
    }

    #[test]
    fn test_empty_enter_commits_nothing() {
        let mut session = quiet_session(Box::new(NoNames));
        let mut input = ScriptedInput::new().enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "");
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_typed_line_is_committed() {
        let mut session = quiet_session(Box::new(NoNames));
        let mut input = ScriptedInput::new().typed("connect chan").enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "connect chan");
        assert_eq!(session.history().entries(), ["connect chan"]);
    }

    #[test]
    fn test_consecutive_duplicates_suppressed() {
        let mut session = quiet_session(Box::new(NoNames));
        for line in ["a", "a", "b", "a"] {
            let mut input = ScriptedInput::new().typed(line).enter();
            session.process_console(&mut input).unwrap();
        }
        assert_eq!(session.history().entries(), ["a", "b", "a"]);
        assert_eq!(session.history().index, 3);
    }

    #[test]
    fn test_prefix_recall_skips_other_commands() {
        let mut session = quiet_session(Box::new(NoNames));
        for line in ["find bob", "find alice", "connect x"] {
            let mut input = ScriptedInput::new().typed(line).enter();
            session.process_console(&mut input).unwrap();
        }
        let mut input = ScriptedInput::new().typed("find ").up().up().up().enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "find bob");
    }

    #[test]
    fn test_prefix_recall_down_returns_to_in_progress_line() {
        let mut session = quiet_session(Box::new(NoNames));
        for line in ["find bob", "find alice", "connect x"] {
            let mut input = ScriptedInput::new().typed(line).enter();
            session.process_console(&mut input).unwrap();
        }
        let mut input = ScriptedInput::new()
            .typed("find ")
            .up()
            .up()
            .down()
            .down()
            .enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "find ");
    }

    #[test]
    fn test_recall_with_empty_line_cycles_all_deduplicated() {
        let mut session = quiet_session(Box::new(NoNames));
        for line in ["a", "b", "a"] {
            let mut input = ScriptedInput::new().typed(line).enter();
            session.process_console(&mut input).unwrap();
        }
        // dedup keeps the most recent "a": candidates are b, a, ""
        let mut input = ScriptedInput::new().up().up().enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "b");
    }

    #[test]
    fn test_tab_completes_first_candidate() {
        let mut session = quiet_session(Box::new(TwoBobs));
        let mut input = ScriptedInput::new().typed("find b").tab().enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "find bob");
    }

    #[test]
    fn test_second_tab_cycles_candidates() {
        let mut session = quiet_session(Box::new(TwoBobs));
        let mut input = ScriptedInput::new().typed("find b").tab().tab().enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "find bobby");
    }

    #[test]
    fn test_tab_only_touches_cursor_segment() {
        let mut session = quiet_session(Box::new(TwoBobs));
        let mut input = ScriptedInput::new()
            .typed("connect a | find bo")
            .tab()
            .enter();
        assert_eq!(
            session.process_console(&mut input).unwrap(),
            "connect a | find bob"
        );
    }

    #[test]
    fn test_typing_discards_completion_state() {
        let mut session = quiet_session(Box::new(TwoBobs));
        // the trailing 'x' invalidates the candidate list; the next Tab
        // resolves fresh and starts from the first candidate again
        let mut input = ScriptedInput::new()
            .typed("find b")
            .tab()
            .typed("x")
            .raw(&[127])
            .tab()
            .enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "find bob");
    }

    #[test]
    fn test_malformed_escape_is_dropped() {
        let mut session = quiet_session(Box::new(NoNames));
        let mut input = ScriptedInput::new()
            .typed("ab")
            .raw(b"\x1b[")
            .typed("c")
            .enter();
        assert_eq!(session.process_console(&mut input).unwrap(), "abc");
    }

    #[test]
    fn test_end_of_input_propagates() {
        let mut session = quiet_session(Box::new(NoNames));
        let mut input = ScriptedInput::new().typed("abandoned");
        let err = session.process_console(&mut input).unwrap_err();
        assert!(matches!(err, ConsoleError::EndOfInput));
    }

    #[test]
    fn test_println_redraws_prompt_below_output() {
        let sink = SharedSink::default();
        let mut session = ConsoleSession::with_output(
            Box::new(MarkerRenderer),
            Box::new(NoNames),
            Box::new(sink.clone()),
        );
        session.println("hello from elsewhere");
        let out = String::from_utf8(sink.0.borrow().clone()).unwrap();
        let text_at = out.find("hello from elsewhere").unwrap();
        let prompt_at = out.find("<prompt:").unwrap();
        assert!(text_at < prompt_at);
    }

    #[test]
    fn test_print_continues_output_line() {
        let sink = SharedSink::default();
        let mut session = ConsoleSession::with_output(
            Box::new(NullRenderer),
            Box::new(NoNames),
            Box::new(sink.clone()),
        );
        session.print("abc");
        session.print("de");
        // second print repositions to column 3 of the pending line
        let out = String::from_utf8(sink.0.borrow().clone()).unwrap();
        assert!(out.contains("\x1b[2F\x1b[3C"));
    }

    #[test]
    fn test_log_includes_source_location() {
        let sink = SharedSink::default();
        let mut session = ConsoleSession::with_output(
            Box::new(NullRenderer),
            Box::new(NoNames),
            Box::new(sink.clone()),
        );
        session.log("boom");
        let out = String::from_utf8(sink.0.borrow().clone()).unwrap();
        assert!(out.contains("session.rs:"));
        assert!(out.contains("boom"));
    }

    #[test]
    fn test_prefix_buffer_deduplicates_and_appends_line() {
        let mut history = CycleBuffer::new();
        for entry in ["find bob", "find alice", "find bob", "connect x"] {
            history.add(entry.to_string());
        }
        let filtered = prefix_buffer_for("find ", &history);
        assert_eq!(filtered.entries(), ["find alice", "find bob", "find "]);
        assert_eq!(filtered.index, 2);
    }
}
