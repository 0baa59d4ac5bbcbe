use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tracing::warn;
use twitch_stats_console::NameLookup;

/// Follower-name lookup backed by the bot's sqlite database.
pub(crate) struct SqliteNames {
    conn: Connection,
}

impl SqliteNames {
    pub(crate) fn open(db_path: &Path) -> rusqlite::Result<Self> {
        if let Some(dir) = db_path.parent() {
            fs::create_dir_all(dir).ok();
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS followers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_name TEXT NOT NULL,
                to_name TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_from_name ON followers(from_name);",
        )?;
        Ok(Self { conn })
    }

    /// Import names from a text file, one per line. Returns how many
    /// rows were added.
    pub(crate) fn seed_from_file(&self, path: &Path) -> anyhow::Result<usize> {
        let text = fs::read_to_string(path)?;
        let mut added = 0;
        for name in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.conn
                .execute("INSERT INTO followers (from_name) VALUES (?1)", [name])?;
            added += 1;
        }
        Ok(added)
    }
}

impl NameLookup for SqliteNames {
    fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        let query = || -> rusqlite::Result<Vec<String>> {
            let mut stmt = self.conn.prepare(
                "SELECT DISTINCT from_name FROM followers
                 WHERE from_name LIKE ?1 ORDER BY from_name",
            )?;
            let rows = stmt.query_map([prefix], |row| row.get(0))?;
            rows.collect()
        };
        match query() {
            Ok(names) => names,
            Err(err) => {
                // completion degrades to echoing the typed token
                warn!("follower lookup failed: {err}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(names: &[&str]) -> (tempfile::TempDir, SqliteNames) {
        let dir = tempfile::tempdir().unwrap();
        let lookup = SqliteNames::open(&dir.path().join("followers.db")).unwrap();
        for name in names {
            lookup
                .conn
                .execute("INSERT INTO followers (from_name) VALUES (?1)", [*name])
                .unwrap();
        }
        (dir, lookup)
    }

    #[test]
    fn test_prefix_match() {
        let (_dir, lookup) = seeded(&["bobby", "alice", "bob", "bob"]);
        assert_eq!(lookup.names_with_prefix("bo%"), ["bob", "bobby"]);
        assert_eq!(lookup.names_with_prefix("%").len(), 3);
        assert!(lookup.names_with_prefix("z%").is_empty());
    }

    #[test]
    fn test_seed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = SqliteNames::open(&dir.path().join("followers.db")).unwrap();
        let list = dir.path().join("names.txt");
        fs::write(&list, "alice\n\n  bob  \n").unwrap();
        assert_eq!(lookup.seed_from_file(&list).unwrap(), 2);
        assert_eq!(lookup.names_with_prefix("%"), ["alice", "bob"]);
    }
}
