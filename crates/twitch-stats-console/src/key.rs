use std::io::Read;

use crate::session::ConsoleError;

/// One decoded key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Insert(char),
    Backspace,
    Enter,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

const BACKSPACE: u8 = 127;
const ESC: u8 = 27;

/// A terminal delivers at most one keystroke per read, but a single
/// keystroke may span several bytes (UTF-8 rune or CSI escape), so the
/// chunk must be large enough to take a whole sequence in one call.
const READ_CHUNK: usize = 16;

/// Read one key event from `input`.
///
/// `Ok(None)` means the chunk held a malformed or incomplete escape
/// sequence; the event is dropped and the caller should keep reading.
/// A zero-byte read maps to [`ConsoleError::EndOfInput`].
pub fn read_key(input: &mut dyn Read) -> Result<Option<Key>, ConsoleError> {
    let mut buf = [0u8; READ_CHUNK];
    let n = input.read(&mut buf)?;
    if n == 0 {
        return Err(ConsoleError::EndOfInput);
    }
    Ok(decode(&buf[..n]))
}

fn decode(bytes: &[u8]) -> Option<Key> {
    match bytes[0] {
        BACKSPACE => Some(Key::Backspace),
        // LF in cooked-ish mode, CR once raw mode has cleared ICRNL
        b'\n' | b'\r' => Some(Key::Enter),
        b'\t' => Some(Key::Tab),
        ESC => {
            // An arrow arrives as ESC [ A/B/C/D within the same read.
            // Anything shorter is an incomplete sequence and is dropped
            // rather than inserting a literal ESC.
            if bytes.len() < 3 {
                return None;
            }
            if bytes[1] == b'[' {
                match bytes[2] {
                    b'A' => Some(Key::ArrowUp),
                    b'B' => Some(Key::ArrowDown),
                    b'D' => Some(Key::ArrowLeft),
                    b'C' => Some(Key::ArrowRight),
                    _ => None,
                }
            } else {
                // Meta combos on some terminals produce ESC + char;
                // insert the character itself.
                first_char(&bytes[1..]).map(Key::Insert)
            }
        }
        _ => first_char(bytes).map(Key::Insert),
    }
}

fn first_char(bytes: &[u8]) -> Option<char> {
    String::from_utf8_lossy(bytes).chars().next()
}
