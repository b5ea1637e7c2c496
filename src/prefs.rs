use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::types::Theme;

const THEME_KEY: &str = "theme";

/// Open (creating if needed) the preferences database at `path`.
pub fn open_prefs_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA busy_timeout = 5000;
         CREATE TABLE IF NOT EXISTS settings (
             key   TEXT PRIMARY KEY,
             value TEXT NOT NULL
         );",
    )?;
    Ok(conn)
}

/// Stored theme, if one was ever saved. Unknown values read as unset.
pub fn read_theme(conn: &Connection) -> Result<Option<Theme>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            [THEME_KEY],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.as_deref().and_then(Theme::parse))
}

pub fn write_theme(conn: &Connection, theme: Theme) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [THEME_KEY, theme.as_str()],
    )?;
    Ok(())
}

/// Saved preference wins; otherwise follow the system light/dark signal.
pub fn resolve_theme(stored: Option<Theme>, system_prefers_dark: bool) -> Theme {
    stored.unwrap_or(if system_prefers_dark { Theme::Dark } else { Theme::Light })
}

/// Startup read. The preference is optional, so storage errors only log.
pub fn load_theme(path: Option<&Path>, system_prefers_dark: bool) -> Theme {
    let stored = path.and_then(|p| {
        open_prefs_db(p)
            .and_then(|conn| read_theme(&conn))
            .map_err(|e| tracing::warn!("Could not read theme preference: {e}"))
            .ok()
            .flatten()
    });
    resolve_theme(stored, system_prefers_dark)
}

/// Persist a toggled theme. Errors only log.
pub fn save_theme(path: Option<&Path>, theme: Theme) {
    let Some(path) = path else { return };
    if let Err(e) = open_prefs_db(path).and_then(|conn| write_theme(&conn, theme)) {
        tracing::warn!("Could not save theme preference: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_theme_follows_the_system() {
        assert_eq!(resolve_theme(None, true), Theme::Dark);
        assert_eq!(resolve_theme(None, false), Theme::Light);
        assert_eq!(resolve_theme(Some(Theme::Light), true), Theme::Light);
    }

    #[test]
    fn saved_theme_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.sqlite");

        assert_eq!(load_theme(Some(&path), false), Theme::Light);
        save_theme(Some(&path), Theme::Dark);
        assert_eq!(load_theme(Some(&path), false), Theme::Dark);
        save_theme(Some(&path), Theme::Light);

        let conn = open_prefs_db(&path).unwrap();
        assert_eq!(read_theme(&conn).unwrap(), Some(Theme::Light));
    }

    #[test]
    fn unknown_stored_value_reads_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_prefs_db(&dir.path().join("prefs.sqlite")).unwrap();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('theme', 'sepia')",
            [],
        )
        .unwrap();
        assert_eq!(read_theme(&conn).unwrap(), None);
    }

    #[test]
    fn missing_path_is_harmless() {
        save_theme(None, Theme::Dark);
        assert_eq!(load_theme(None, true), Theme::Dark);
    }
}
