use crate::buffer::CycleBuffer;

/// Candidate source for tab completion.
///
/// `prefix` follows the SQL-LIKE convention with a trailing `%`
/// (`"bo%"` means names starting with `bo`, bare `"%"` means all).
/// Implementations handle their own failures and return an empty list;
/// the engine then falls back to echoing the literal typed token.
pub trait NameLookup {
    fn names_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// Lets a driver keep a handle on the lookup it hands to the session.
impl<T: NameLookup + ?Sized> NameLookup for std::rc::Rc<T> {
    fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        (**self).names_with_prefix(prefix)
    }
}

/// Complete one `|`-delimited segment.
///
/// On the first Tab for a segment `candidates` is empty: the candidate
/// list is resolved once from the lookup and the first candidate is
/// appended to the command. Repeat Tabs skip the lookup and cycle.
///
/// The segment is trimmed before tokenizing, so trailing spaces do not
/// produce an empty argument token.
pub fn process_tab(segment: &str, lookup: &dyn NameLookup, candidates: &mut CycleBuffer) -> String {
    let trimmed = segment.trim();
    let mut parts = trimmed.split(' ');
    let command = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    let new_state = format!("{command} ");
    let prefix = match args.first() {
        Some(arg) => format!("{arg}%"),
        None => "%".to_string(),
    };

    match command {
        "find" => {
            if candidates.is_empty() {
                candidates.fill(lookup.names_with_prefix(&prefix));
                if candidates.is_empty() {
                    candidates.add(args.first().copied().unwrap_or("").to_string());
                }
            }
            format!("{new_state}{}", candidates.cycle())
        }
        _ => new_state,
    }
}
