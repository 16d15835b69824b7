use anyhow::{Context, Result};
use rusqlite::Connection;

const DROP_ALL: &str = "
    DROP VIEW IF EXISTS show_scores;
    DROP TABLE IF EXISTS types;
    DROP TABLE IF EXISTS production;
    DROP TABLE IF EXISTS directors;
    DROP TABLE IF EXISTS writers;
    DROP TABLE IF EXISTS top_cast;
    DROP TABLE IF EXISTS creators;
    DROP TABLE IF EXISTS metascore;
    DROP TABLE IF EXISTS userscore;
    DROP TABLE IF EXISTS genres;
    DROP TABLE IF EXISTS companies;
    DROP TABLE IF EXISTS people;
    DROP TABLE IF EXISTS shows;
";

// Foreign keys are declared for readers of the schema only. Connections that
// rebuild or fill it run with `foreign_keys = OFF`.
const CREATE_ALL: &str = "
    CREATE TABLE shows (
        show_id          INTEGER PRIMARY KEY,
        title            TEXT NOT NULL,
        releaseDate      TEXT,
        rating           TEXT,
        description      TEXT,
        duration         INTEGER,
        num_seasons      INTEGER,
        tagline          TEXT
    );

    CREATE TABLE genres (
        genre_id         INTEGER PRIMARY KEY AUTOINCREMENT,
        name             TEXT NOT NULL
    );
    CREATE UNIQUE INDEX idx_genres_name ON genres(name);

    CREATE TABLE companies (
        producer_id      INTEGER PRIMARY KEY AUTOINCREMENT,
        name             TEXT NOT NULL
    );
    CREATE UNIQUE INDEX idx_companies_name ON companies(name);

    CREATE TABLE people (
        person_id        INTEGER PRIMARY KEY AUTOINCREMENT,
        name             TEXT NOT NULL
    );
    CREATE UNIQUE INDEX idx_people_name ON people(name);

    CREATE TABLE metascore (
        show_id          INTEGER NOT NULL PRIMARY KEY REFERENCES shows(show_id),
        metascore        INTEGER,
        metascore_count  INTEGER
    );

    CREATE TABLE userscore (
        show_id          INTEGER NOT NULL PRIMARY KEY REFERENCES shows(show_id),
        userscore        REAL,
        userscore_count  INTEGER
    );

    CREATE TABLE types (
        show_id          INTEGER NOT NULL REFERENCES shows(show_id),
        genre_id         INTEGER NOT NULL REFERENCES genres(genre_id),
        PRIMARY KEY (show_id, genre_id)
    );

    CREATE TABLE production (
        show_id          INTEGER NOT NULL REFERENCES shows(show_id),
        producer_id      INTEGER NOT NULL REFERENCES companies(producer_id),
        PRIMARY KEY (show_id, producer_id)
    );

    CREATE TABLE directors (
        show_id          INTEGER NOT NULL REFERENCES shows(show_id),
        person_id        INTEGER NOT NULL REFERENCES people(person_id),
        PRIMARY KEY (show_id, person_id)
    );

    CREATE TABLE writers (
        show_id          INTEGER NOT NULL REFERENCES shows(show_id),
        person_id        INTEGER NOT NULL REFERENCES people(person_id),
        PRIMARY KEY (show_id, person_id)
    );

    CREATE TABLE top_cast (
        show_id          INTEGER NOT NULL REFERENCES shows(show_id),
        person_id        INTEGER NOT NULL REFERENCES people(person_id),
        PRIMARY KEY (show_id, person_id)
    );

    CREATE TABLE creators (
        show_id          INTEGER NOT NULL REFERENCES shows(show_id),
        person_id        INTEGER NOT NULL REFERENCES people(person_id),
        PRIMARY KEY (show_id, person_id)
    );

    CREATE INDEX idx_types_genre ON types(genre_id);
    CREATE INDEX idx_production_company ON production(producer_id);
    CREATE INDEX idx_directors_person ON directors(person_id);
    CREATE INDEX idx_writers_person ON writers(person_id);
    CREATE INDEX idx_top_cast_person ON top_cast(person_id);
    CREATE INDEX idx_creators_person ON creators(person_id);

    CREATE VIEW show_scores AS
        SELECT sh.show_id,
               m.metascore,
               m.metascore_count,
               u.userscore,
               u.userscore_count
        FROM shows sh
        LEFT JOIN metascore m ON m.show_id = sh.show_id
        LEFT JOIN userscore u ON u.show_id = sh.show_id;
";

/// Drops every catalog table and recreates it empty. Destructive; meant for
/// offline rebuilds, typically inside the ingestion transaction.
///
/// Switches foreign key checks off first, since dropping a referenced parent
/// table fails while they are on. The pragma is a no-op inside a transaction,
/// so callers holding one switch them off before opening it.
pub fn rebuild(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", false)?;
    conn.execute_batch(DROP_ALL)
        .context("Failed dropping catalog schema")?;
    conn.execute_batch(CREATE_ALL)
        .context("Failed creating catalog schema")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::rebuild;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type IN ('table','view') AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn rebuild_is_repeatable_and_clears_rows() {
        let conn = Connection::open_in_memory().unwrap();
        rebuild(&conn).unwrap();
        conn.execute("INSERT INTO shows(show_id,title) VALUES(1,'Lost')", [])
            .unwrap();

        rebuild(&conn).unwrap();
        let shows: i64 = conn
            .query_row("SELECT COUNT(*) FROM shows", [], |row| row.get(0))
            .unwrap();
        assert_eq!(shows, 0);
        assert_eq!(
            table_names(&conn),
            vec![
                "companies",
                "creators",
                "directors",
                "genres",
                "metascore",
                "people",
                "production",
                "show_scores",
                "shows",
                "top_cast",
                "types",
                "userscore",
                "writers",
            ]
        );
    }

    #[test]
    fn rebuild_replaces_a_schema_with_enforced_parent_keys() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE metascore(show_id INTEGER NOT NULL PRIMARY KEY, metascore INTEGER);
             CREATE TABLE shows(
                 show_id INTEGER PRIMARY KEY,
                 title TEXT NOT NULL,
                 FOREIGN KEY (show_id) REFERENCES metascore(show_id)
             );
             INSERT INTO metascore VALUES(1, 80);
             INSERT INTO shows VALUES(1, 'Lost');",
        )
        .unwrap();

        rebuild(&conn).unwrap();
        // Links to shows that are not stored are accepted.
        conn.execute("INSERT INTO top_cast(show_id,person_id) VALUES(42,7)", [])
            .unwrap();
    }

    #[test]
    fn people_names_are_unique() {
        let conn = Connection::open_in_memory().unwrap();
        rebuild(&conn).unwrap();
        conn.execute("INSERT INTO people(name) VALUES('Vince Gilligan')", [])
            .unwrap();
        assert!(conn
            .execute("INSERT INTO people(name) VALUES('Vince Gilligan')", [])
            .is_err());
    }
}
