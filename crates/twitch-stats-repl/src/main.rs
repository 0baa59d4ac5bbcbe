use std::cell::RefCell;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use twitch_stats_console::{
    ConsoleError, ConsoleSession, InteractiveRenderer, NameLookup, PromptRenderer, RawModeGuard,
};

mod names;

use names::SqliteNames;

#[derive(Parser, Debug)]
#[command(name = "twitch-stats-repl")]
#[command(about = "Interactive console for the twitch-stats bot")]
struct Args {
    /// Channel label shown in the prompt
    #[arg(long, default_value = "twitch")]
    channel: String,
    /// Path to the followers database (defaults to the user data dir)
    #[arg(long)]
    db: Option<PathBuf>,
    /// Seed the followers table from a file with one name per line
    #[arg(long)]
    seed: Option<PathBuf>,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("twitch-stats")
        .join("followers.db")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let db_path = args.db.clone().unwrap_or_else(default_db_path);
    let lookup = Rc::new(SqliteNames::open(&db_path)?);
    if let Some(seed) = &args.seed {
        let added = lookup.seed_from_file(seed)?;
        println!("seeded {added} names from {}", seed.display());
    }

    let channel = Rc::new(RefCell::new(args.channel.clone()));
    let mut session = ConsoleSession::new(
        Box::new(PromptRenderer::new(channel.clone())),
        Box::new(lookup.clone()),
    );

    let _raw = RawModeGuard::enable();
    let mut stdin = io::stdin();

    loop {
        let line = match session.process_console(&mut stdin) {
            Ok(line) => line,
            Err(ConsoleError::EndOfInput) => break,
            Err(err) => return Err(err.into()),
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("quit") => break,
            Some("connect") => match parts.next() {
                Some(chan) => *channel.borrow_mut() = chan.to_string(),
                None => session.println("Provide channel name"),
            },
            Some("find") => match parts.next() {
                Some(name) => find_person(&mut session, &*lookup, name),
                None => session.println("Provide a name"),
            },
            Some("interactive") => {
                interactive_sort(&mut session, &mut stdin)?;
                session.set_renderer(Box::new(PromptRenderer::new(channel.clone())));
            }
            Some("help") => {
                session.println("connect <channel> | find <name> | interactive | quit");
            }
            Some(other) => session.println(&format!("Unknown command: {other}")),
            None => {}
        }
    }
    Ok(())
}

fn find_person(session: &mut ConsoleSession, lookup: &SqliteNames, name: &str) {
    let matches = lookup.names_with_prefix(&format!("{name}%"));
    if matches.is_empty() {
        session.println(&format!("{name}: no matches"));
        return;
    }
    for m in &matches {
        session.print(&format!("{m} "));
    }
    session.println("");
}

/// Live filter view over loaded comment lines: everything containing
/// the in-progress input is redrawn above the prompt on each keystroke.
fn interactive_sort(session: &mut ConsoleSession, stdin: &mut dyn Read) -> Result<()> {
    let comments: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    session.set_renderer(Box::new(InteractiveRenderer::new(comments.clone())));
    loop {
        let line = match session.process_console(stdin) {
            Ok(line) => line,
            Err(ConsoleError::EndOfInput) => break,
            Err(err) => return Err(err.into()),
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("quit") => break,
            Some("load") => match parts.next() {
                Some(path) => match load_comments(Path::new(path)) {
                    Ok(lines) => *comments.borrow_mut() = lines,
                    Err(err) => session.log(&format!("{err}")),
                },
                None => session.println("Provide a file to load"),
            },
            Some("clear") => {
                if comments.borrow().is_empty() {
                    session.println("Load some comments");
                    continue;
                }
                comments.borrow_mut().clear();
            }
            _ => {}
        }
    }
    Ok(())
}

fn load_comments(path: &Path) -> io::Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::to_string)
        .collect())
}
