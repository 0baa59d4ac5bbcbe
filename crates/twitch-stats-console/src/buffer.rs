/// Cursor-indexed ordered buffer of strings.
///
/// One primitive backs three uses: the session history, the ephemeral
/// prefix-filtered recall view, and the tab-completion candidate list.
/// `index` is public because history commit resets it one past the end.
#[derive(Debug, Default, Clone)]
pub struct CycleBuffer {
    entries: Vec<String>,
    pub index: usize,
}

impl CycleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Entry at the current cursor. Callers must keep `index` in range.
    pub fn get(&self) -> &str {
        &self.entries[self.index]
    }

    pub fn get_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Append one entry and park the cursor on it, so the next
    /// `cycle()` wraps around to the first entry.
    pub fn add(&mut self, entry: String) {
        self.entries.push(entry);
        self.index = self.entries.len() - 1;
    }

    /// Replace the contents wholesale, cursor on the last element.
    pub fn fill(&mut self, entries: Vec<String>) {
        self.entries = entries;
        self.index = self.entries.len().saturating_sub(1);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
    }

    /// Last entry. Panics on an empty buffer: callers are expected to
    /// have checked `is_empty()` first, so this is caller misuse, not
    /// a runtime failure.
    pub fn back(&self) -> &str {
        self.entries
            .last()
            .expect("back() on empty buffer")
            .as_str()
    }

    /// Advance the cursor by one, wrapping, and return the new entry.
    /// Panics on an empty buffer, same contract as `back()`.
    pub fn cycle(&mut self) -> &str {
        assert!(!self.entries.is_empty(), "cycle() on empty buffer");
        self.index = (self.index + 1) % self.entries.len();
        &self.entries[self.index]
    }
}
