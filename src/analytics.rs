//! Fixed trivia questions answered against the populated catalog.
//!
//! Every query is a read; ties are broken explicitly in SQL so results are
//! stable across runs.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{json, Value};

use crate::models::{
    CastOverlap, CultContributor, DecadeLeader, EliteDirector, GenreTopShow, MultiRoleCredit,
    ProductionSize, ScoreDivergence, ScoreKind,
};

pub const DIVERGENCE_MIN_USER_VOTES: i64 = 50;
pub const DIVERGENCE_MIN_META_VOTES: i64 = 10;
pub const ELITE_MIN_SHOWS: i64 = 5;
pub const CULT_MIN_USERSCORE: f64 = 9.0;
pub const CULT_MAX_METASCORE: i64 = 60;
pub const PRINCIPAL_CAST_SIZE: i64 = 5;
pub const PRODUCTION_EXTREMES: i64 = 100;

const TOP_SCORE_PER_GENRE: &str = "
    WITH scored AS (
        SELECT t.genre_id,
               s.show_id,
               CASE WHEN ?1 = 'meta' THEN s.metascore ELSE s.userscore END AS score,
               CASE WHEN ?1 = 'meta' THEN s.metascore_count ELSE s.userscore_count END AS votes
        FROM types t
        JOIN show_scores s ON s.show_id = t.show_id
    ),
    top_score AS (
        SELECT genre_id, MAX(score) AS score
        FROM scored
        WHERE score IS NOT NULL
        GROUP BY genre_id
    ),
    top_votes AS (
        SELECT sc.genre_id, MAX(sc.votes) AS votes
        FROM scored sc
        JOIN top_score ts ON ts.genre_id = sc.genre_id AND ts.score = sc.score
        GROUP BY sc.genre_id
    )
    SELECT g.genre_id, g.name, sh.show_id, sh.title, sc.score, sc.votes
    FROM scored sc
    JOIN top_score ts ON ts.genre_id = sc.genre_id AND ts.score = sc.score
    JOIN top_votes tv ON tv.genre_id = sc.genre_id AND tv.votes IS sc.votes
    JOIN genres g ON g.genre_id = sc.genre_id
    JOIN shows sh ON sh.show_id = sc.show_id
    ORDER BY g.name, sh.title, sh.show_id
";

const SCORE_DIVERGENCE_PCT: &str = "
    SELECT sh.show_id,
           sh.title,
           s.metascore,
           s.userscore,
           ABS(s.metascore - s.userscore * 10.0) / (s.userscore * 10.0) * 100.0 AS divergence
    FROM show_scores s
    JOIN shows sh ON sh.show_id = s.show_id
    WHERE s.metascore IS NOT NULL
      AND s.userscore * 10.0 > 0
      AND s.userscore_count >= ?1
      AND s.metascore_count >= ?2
    ORDER BY divergence DESC, sh.title ASC
    LIMIT 10
";

const SCORE_DIFFERENCE_ABS: &str = "
    SELECT sh.show_id,
           sh.title,
           s.metascore,
           s.userscore,
           ABS(s.metascore - s.userscore * 10.0) AS divergence
    FROM show_scores s
    JOIN shows sh ON sh.show_id = s.show_id
    WHERE s.metascore IS NOT NULL
      AND s.userscore IS NOT NULL
      AND s.metascore_count > 0
      AND s.userscore_count > 0
    ORDER BY divergence DESC, sh.title ASC
    LIMIT 20
";

const ELITE_DIRECTORS: &str = "
    WITH scored AS (
        SELECT show_id, CASE WHEN ?1 = 'meta' THEN metascore ELSE userscore END AS score
        FROM show_scores
    ),
    global AS (
        SELECT AVG(score) AS average FROM scored WHERE score IS NOT NULL
    )
    SELECT p.person_id, p.name, COUNT(*) AS shows, AVG(sc.score) AS average_score
    FROM directors d
    JOIN people p ON p.person_id = d.person_id
    JOIN scored sc ON sc.show_id = d.show_id
    GROUP BY p.person_id, p.name
    HAVING COUNT(*) > ?2 AND AVG(sc.score) > (SELECT average FROM global)
    ORDER BY average_score DESC, p.name ASC, p.person_id ASC
";

// UNION (not UNION ALL) so a person with several roles on one show counts it once.
const CULT_CONTRIBUTOR: &str = "
    WITH cult AS (
        SELECT show_id FROM show_scores WHERE userscore > ?1 AND metascore < ?2
    ),
    credits AS (
        SELECT show_id, person_id FROM directors
        UNION SELECT show_id, person_id FROM writers
        UNION SELECT show_id, person_id FROM top_cast
        UNION SELECT show_id, person_id FROM creators
    )
    SELECT p.person_id, p.name, COUNT(*) AS cult_shows
    FROM credits c
    JOIN cult ON cult.show_id = c.show_id
    JOIN people p ON p.person_id = c.person_id
    GROUP BY p.person_id, p.name
    ORDER BY cult_shows DESC, p.person_id ASC
    LIMIT 1
";

const PRINCIPAL_CAST_OVERLAP: &str = "
    WITH full_casts AS (
        SELECT show_id FROM top_cast GROUP BY show_id HAVING COUNT(*) >= ?1
    ),
    principal AS (
        SELECT show_id, person_id, position
        FROM (
            SELECT tc.show_id,
                   tc.person_id,
                   ROW_NUMBER() OVER (PARTITION BY tc.show_id ORDER BY tc.person_id) AS position
            FROM top_cast tc
            JOIN full_casts fc ON fc.show_id = tc.show_id
        )
        WHERE position <= ?1
    ),
    dated AS (
        SELECT show_id, title, CAST(substr(releaseDate, 1, 4) AS INTEGER) AS year
        FROM shows
        WHERE substr(releaseDate, 1, 4) GLOB '[0-9][0-9][0-9][0-9]'
    )
    SELECT a.show_id, da.title, da.year, b.show_id, db.title, db.year
    FROM principal a
    JOIN principal b
      ON b.position = a.position AND b.person_id = a.person_id AND b.show_id > a.show_id
    JOIN dated da ON da.show_id = a.show_id
    JOIN dated db ON db.show_id = b.show_id
    WHERE da.year <> db.year
    GROUP BY a.show_id, b.show_id
    HAVING COUNT(*) = ?1
    ORDER BY a.show_id, b.show_id
";

const MULTI_ROLE: &str = "
    WITH credits AS (
        SELECT show_id, person_id, 'director' AS role FROM directors
        UNION ALL SELECT show_id, person_id, 'writer' FROM writers
        UNION ALL SELECT show_id, person_id, 'actor' FROM top_cast
        UNION ALL SELECT show_id, person_id, 'creator' FROM creators
    )
    SELECT p.person_id, p.name, sh.show_id, sh.title, group_concat(c.role, ',') AS roles
    FROM credits c
    JOIN people p ON p.person_id = c.person_id
    JOIN shows sh ON sh.show_id = c.show_id
    GROUP BY p.person_id, sh.show_id
    HAVING COUNT(DISTINCT c.role) >= 2
    ORDER BY COUNT(DISTINCT c.role) DESC, p.name ASC, sh.title ASC
";

// Cast is left out: the crew behind a show, not its ensemble.
const LARGEST_PRODUCTIONS: &str = "
    WITH crew AS (
        SELECT show_id, person_id FROM directors
        UNION SELECT show_id, person_id FROM writers
        UNION SELECT show_id, person_id FROM creators
    )
    SELECT sh.show_id, sh.title, COUNT(crew.person_id) AS crew
    FROM shows sh
    LEFT JOIN crew ON crew.show_id = sh.show_id
    GROUP BY sh.show_id, sh.title
    ORDER BY crew DESC, sh.title ASC, sh.show_id ASC
    LIMIT ?1
";

const SMALLEST_PRODUCTIONS: &str = "
    WITH crew AS (
        SELECT show_id, person_id FROM directors
        UNION SELECT show_id, person_id FROM writers
        UNION SELECT show_id, person_id FROM creators
    )
    SELECT sh.show_id, sh.title, COUNT(crew.person_id) AS crew
    FROM shows sh
    JOIN crew ON crew.show_id = sh.show_id
    GROUP BY sh.show_id, sh.title
    ORDER BY crew ASC, sh.title ASC, sh.show_id ASC
    LIMIT ?1
";

const DECADE_LEADERS: &str = "
    WITH dated AS (
        SELECT show_id, CAST(substr(releaseDate, 1, 4) AS INTEGER) / 10 * 10 AS decade
        FROM shows
        WHERE substr(releaseDate, 1, 4) GLOB '[0-9][0-9][0-9][0-9]'
    ),
    scored AS (
        SELECT show_id, CASE WHEN ?1 = 'meta' THEN metascore ELSE userscore END AS score
        FROM show_scores
    ),
    per_genre AS (
        SELECT d.decade, t.genre_id, MAX(sc.score) AS max_score, COUNT(*) AS films
        FROM dated d
        JOIN types t ON t.show_id = d.show_id
        JOIN scored sc ON sc.show_id = d.show_id
        WHERE sc.score IS NOT NULL
        GROUP BY d.decade, t.genre_id
    ),
    ranked AS (
        SELECT decade, genre_id, max_score, films,
               ROW_NUMBER() OVER (
                   PARTITION BY decade
                   ORDER BY max_score DESC, films DESC, genre_id ASC
               ) AS position
        FROM per_genre
    )
    SELECT r.decade, r.genre_id, g.name, r.max_score, r.films
    FROM ranked r
    JOIN genres g ON g.genre_id = r.genre_id
    WHERE r.position = 1
    ORDER BY r.decade
";

/// Shows holding the best score of each genre; among equal scores only those
/// with the most votes survive.
pub fn top_score_per_genre(conn: &Connection, kind: ScoreKind) -> Result<Vec<GenreTopShow>> {
    let mut stmt = conn.prepare(TOP_SCORE_PER_GENRE)?;
    let rows = stmt
        .query_map(params![kind.as_str()], |row| {
            Ok(GenreTopShow {
                genre_id: row.get(0)?,
                genre: row.get(1)?,
                show_id: row.get(2)?,
                title: row.get(3)?,
                score: row.get(4)?,
                votes: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Top 10 by `|meta - user*10| / (user*10)` as a percentage, among shows with
/// enough votes on both sides.
pub fn score_divergence_pct(conn: &Connection) -> Result<Vec<ScoreDivergence>> {
    let mut stmt = conn.prepare(SCORE_DIVERGENCE_PCT)?;
    let rows = stmt
        .query_map(
            params![DIVERGENCE_MIN_USER_VOTES, DIVERGENCE_MIN_META_VOTES],
            divergence_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Top 20 by absolute `|meta - user*10|`, ties by title.
pub fn score_difference_abs(conn: &Connection) -> Result<Vec<ScoreDivergence>> {
    let mut stmt = conn.prepare(SCORE_DIFFERENCE_ABS)?;
    let rows = stmt
        .query_map([], divergence_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn divergence_row(row: &Row<'_>) -> rusqlite::Result<ScoreDivergence> {
    Ok(ScoreDivergence {
        show_id: row.get(0)?,
        title: row.get(1)?,
        metascore: row.get(2)?,
        userscore: row.get(3)?,
        divergence: row.get(4)?,
    })
}

/// Directors of more than five shows whose average beats the catalog average.
pub fn elite_directors(conn: &Connection, kind: ScoreKind) -> Result<Vec<EliteDirector>> {
    let mut stmt = conn.prepare(ELITE_DIRECTORS)?;
    let rows = stmt
        .query_map(params![kind.as_str(), ELITE_MIN_SHOWS], |row| {
            Ok(EliteDirector {
                person_id: row.get(0)?,
                name: row.get(1)?,
                shows: row.get(2)?,
                average_score: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// The person credited on the most cult shows, ties going to the lowest id.
pub fn cult_contributor(conn: &Connection) -> Result<Option<CultContributor>> {
    let contributor = conn
        .query_row(
            CULT_CONTRIBUTOR,
            params![CULT_MIN_USERSCORE, CULT_MAX_METASCORE],
            |row| {
                Ok(CultContributor {
                    person_id: row.get(0)?,
                    name: row.get(1)?,
                    cult_shows: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(contributor)
}

/// Pairs of shows from different years sharing the same five lowest-id cast members.
pub fn principal_cast_overlap(conn: &Connection) -> Result<Vec<CastOverlap>> {
    let mut stmt = conn.prepare(PRINCIPAL_CAST_OVERLAP)?;
    let rows = stmt
        .query_map(params![PRINCIPAL_CAST_SIZE], |row| {
            Ok(CastOverlap {
                first_show_id: row.get(0)?,
                first_title: row.get(1)?,
                first_year: row.get(2)?,
                second_show_id: row.get(3)?,
                second_title: row.get(4)?,
                second_year: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn multi_role_credits(conn: &Connection) -> Result<Vec<MultiRoleCredit>> {
    let mut stmt = conn.prepare(MULTI_ROLE)?;
    let rows = stmt
        .query_map([], |row| {
            let roles: String = row.get(4)?;
            let mut roles = roles
                .split(',')
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            roles.sort();
            roles.dedup();
            Ok(MultiRoleCredit {
                person_id: row.get(0)?,
                name: row.get(1)?,
                show_id: row.get(2)?,
                title: row.get(3)?,
                roles,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn largest_productions(conn: &Connection) -> Result<Vec<ProductionSize>> {
    production_sizes(conn, LARGEST_PRODUCTIONS)
}

/// Smallest crews first; shows with no crew at all are left out.
pub fn smallest_productions(conn: &Connection) -> Result<Vec<ProductionSize>> {
    production_sizes(conn, SMALLEST_PRODUCTIONS)
}

fn production_sizes(conn: &Connection, sql: &str) -> Result<Vec<ProductionSize>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![PRODUCTION_EXTREMES], |row| {
            Ok(ProductionSize {
                show_id: row.get(0)?,
                title: row.get(1)?,
                crew: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Per decade of release, the genre with the highest single score.
pub fn decade_leaders(conn: &Connection, kind: ScoreKind) -> Result<Vec<DecadeLeader>> {
    let mut stmt = conn.prepare(DECADE_LEADERS)?;
    let rows = stmt
        .query_map(params![kind.as_str()], |row| {
            Ok(DecadeLeader {
                decade: row.get(0)?,
                genre_id: row.get(1)?,
                genre: row.get(2)?,
                max_score: row.get(3)?,
                films: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Named entry points for the FAQ pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    TopScorePerGenre,
    ScoreDivergence,
    ScoreDifference,
    EliteDirectors,
    CultContributor,
    PrincipalCastOverlap,
    MultiRole,
    LargestProductions,
    SmallestProductions,
    DecadeLeaders,
}

impl Question {
    pub const ALL: [Question; 10] = [
        Question::TopScorePerGenre,
        Question::ScoreDivergence,
        Question::ScoreDifference,
        Question::EliteDirectors,
        Question::CultContributor,
        Question::PrincipalCastOverlap,
        Question::MultiRole,
        Question::LargestProductions,
        Question::SmallestProductions,
        Question::DecadeLeaders,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::TopScorePerGenre => "top-score-per-genre",
            Self::ScoreDivergence => "score-divergence",
            Self::ScoreDifference => "score-difference",
            Self::EliteDirectors => "elite-directors",
            Self::CultContributor => "cult-contributor",
            Self::PrincipalCastOverlap => "principal-cast-overlap",
            Self::MultiRole => "multi-role",
            Self::LargestProductions => "largest-productions",
            Self::SmallestProductions => "smallest-productions",
            Self::DecadeLeaders => "decade-leaders",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|q| q.slug() == value)
    }
}

/// Runs one question and serializes its rows; `kind` only affects score-aware questions.
pub fn answer(conn: &Connection, question: Question, kind: ScoreKind) -> Result<Value> {
    let value = match question {
        Question::TopScorePerGenre => json!(top_score_per_genre(conn, kind)?),
        Question::ScoreDivergence => json!(score_divergence_pct(conn)?),
        Question::ScoreDifference => json!(score_difference_abs(conn)?),
        Question::EliteDirectors => json!(elite_directors(conn, kind)?),
        Question::CultContributor => json!(cult_contributor(conn)?),
        Question::PrincipalCastOverlap => json!(principal_cast_overlap(conn)?),
        Question::MultiRole => json!(multi_role_credits(conn)?),
        Question::LargestProductions => json!(largest_productions(conn)?),
        Question::SmallestProductions => json!(smallest_productions(conn)?),
        Question::DecadeLeaders => json!(decade_leaders(conn, kind)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use rusqlite::{params, Connection};

    use super::*;
    use crate::{ingest::tests::sample_store, schema::rebuild};

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        rebuild(&conn).unwrap();
        conn
    }

    #[allow(clippy::too_many_arguments)]
    fn show(
        conn: &Connection,
        id: i64,
        title: &str,
        release: &str,
        meta: Option<i64>,
        meta_count: i64,
        user: Option<f64>,
        user_count: i64,
    ) {
        conn.execute(
            "INSERT INTO shows(show_id,title,releaseDate) VALUES(?1,?2,?3)",
            params![id, title, release],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO metascore VALUES(?1,?2,?3)",
            params![id, meta, meta_count],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO userscore VALUES(?1,?2,?3)",
            params![id, user, user_count],
        )
        .unwrap();
    }

    fn person(conn: &Connection, id: i64, name: &str) {
        conn.execute(
            "INSERT INTO people(person_id,name) VALUES(?1,?2)",
            params![id, name],
        )
        .unwrap();
    }

    fn link(conn: &Connection, table: &str, show_id: i64, person_id: i64) {
        // Test-only helper; table names come from literals below.
        conn.execute(
            &format!("INSERT INTO {table}(show_id,person_id) VALUES(?1,?2)"),
            params![show_id, person_id],
        )
        .unwrap();
    }

    fn genre(conn: &Connection, id: i64, name: &str, shows: &[i64]) {
        conn.execute(
            "INSERT INTO genres(genre_id,name) VALUES(?1,?2)",
            params![id, name],
        )
        .unwrap();
        for show_id in shows {
            conn.execute(
                "INSERT INTO types(show_id,genre_id) VALUES(?1,?2)",
                params![show_id, id],
            )
            .unwrap();
        }
    }

    #[test]
    fn divergence_ranks_the_wider_gap_first() {
        let conn = store();
        show(&conn, 1, "A", "2000-01-01", Some(90), 20, Some(9.5), 100);
        show(&conn, 2, "B", "2000-01-01", Some(40), 20, Some(4.0), 100);
        // Not enough user votes.
        show(&conn, 3, "C", "2000-01-01", Some(10), 20, Some(9.0), 49);

        let ranked = score_divergence_pct(&conn).unwrap();
        assert_eq!(
            ranked.iter().map(|r| r.show_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!((ranked[0].divergence - 5.263).abs() < 0.001);
        assert!(ranked[1].divergence.abs() < 1e-9);
    }

    #[test]
    fn absolute_difference_breaks_ties_by_title() {
        let conn = store();
        show(&conn, 1, "Zeta", "2000-01-01", Some(50), 1, Some(7.0), 1);
        show(&conn, 2, "Alpha", "2000-01-01", Some(90), 1, Some(7.0), 1);
        show(&conn, 3, "Mid", "2000-01-01", Some(80), 1, Some(7.5), 1);
        show(&conn, 4, "Unrated", "2000-01-01", Some(10), 0, Some(9.0), 5);

        let ranked = score_difference_abs(&conn).unwrap();
        assert_eq!(
            ranked.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(),
            vec!["Alpha", "Zeta", "Mid"]
        );
        assert!((ranked[0].divergence - 20.0).abs() < 1e-9);
    }

    #[test]
    fn elite_director_thresholds_are_strict() {
        let conn = store();
        person(&conn, 1, "Five Shows");
        person(&conn, 2, "Average Six");
        person(&conn, 3, "Strong Six");

        // Director 1: five shows scoring 100.
        for id in 1..=5 {
            show(&conn, id, "five", "2000-01-01", Some(100), 1, None, 0);
            link(&conn, "directors", id, 1);
        }
        // Director 2: six shows whose average (70) will equal the global average.
        for (offset, score) in [40, 40, 40, 100, 100, 100].into_iter().enumerate() {
            let id = 10 + offset as i64;
            show(&conn, id, "six", "2000-01-01", Some(score), 1, None, 0);
            link(&conn, "directors", id, 2);
        }
        // Director 3: six shows averaging 80.
        for (offset, score) in [80, 80, 80, 80, 80, 80].into_iter().enumerate() {
            let id = 20 + offset as i64;
            show(&conn, id, "strong", "2000-01-01", Some(score), 1, None, 0);
            link(&conn, "directors", id, 3);
        }
        // Pull the global average down to exactly 70: 17 shows so far sum to
        // 500 + 420 + 480 = 1400; three zero-score shows make it 1400 / 20.
        for id in 30..33 {
            show(&conn, id, "filler", "2000-01-01", Some(0), 1, None, 0);
        }

        let elite = elite_directors(&conn, ScoreKind::Meta).unwrap();
        assert_eq!(elite.len(), 1);
        assert_eq!(elite[0].person_id, 3);
        assert_eq!(elite[0].shows, 6);
        assert!((elite[0].average_score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn cult_contributor_counts_each_show_once() {
        let conn = store();
        show(&conn, 1, "Cult 1", "2000-01-01", Some(40), 1, Some(9.5), 1);
        show(&conn, 2, "Cult 2", "2001-01-01", Some(50), 1, Some(9.2), 1);
        show(&conn, 3, "Hit", "2002-01-01", Some(90), 1, Some(9.5), 1);
        person(&conn, 1, "Many Hats");
        person(&conn, 2, "Steady");
        person(&conn, 3, "Mainstream");

        // Many Hats: three roles on one cult show.
        link(&conn, "directors", 1, 1);
        link(&conn, "writers", 1, 1);
        link(&conn, "creators", 1, 1);
        // Steady: cast on both cult shows.
        link(&conn, "top_cast", 1, 2);
        link(&conn, "top_cast", 2, 2);
        link(&conn, "top_cast", 3, 3);

        let cult = cult_contributor(&conn).unwrap().unwrap();
        assert_eq!(cult.person_id, 2);
        assert_eq!(cult.cult_shows, 2);
    }

    #[test]
    fn divergence_vote_and_score_cutoffs() {
        let conn = store();
        show(&conn, 1, "Nine Critics", "2000-01-01", Some(80), 9, Some(5.0), 100);
        show(&conn, 2, "Ten Critics", "2000-01-01", Some(80), 10, Some(5.0), 100);
        show(&conn, 3, "Zero Users", "2000-01-01", Some(80), 10, Some(0.0), 100);
        show(&conn, 4, "Fifty Users", "2000-01-01", Some(80), 10, Some(5.0), 50);

        let ranked = score_divergence_pct(&conn).unwrap();
        assert_eq!(
            ranked.iter().map(|r| r.show_id).collect::<Vec<_>>(),
            vec![4, 2]
        );
    }

    #[test]
    fn rankings_stop_at_their_caps() {
        let conn = store();
        for id in 1..=25 {
            show(&conn, id, &format!("Show {id:02}"), "2000-01-01", Some(50), 20, Some(9.0), 100);
        }

        assert_eq!(score_divergence_pct(&conn).unwrap().len(), 10);
        let absolute = score_difference_abs(&conn).unwrap();
        assert_eq!(absolute.len(), 20);
        // Equal gaps fall back to title order.
        assert_eq!(absolute[0].title, "Show 01");
        assert_eq!(absolute[19].title, "Show 20");
    }

    #[test]
    fn production_lists_stop_at_one_hundred() {
        let conn = store();
        person(&conn, 1, "Prolific");
        for id in 1..=105 {
            show(&conn, id, &format!("Show {id:03}"), "2000-01-01", None, 0, None, 0);
            link(&conn, "directors", id, 1);
        }

        assert_eq!(largest_productions(&conn).unwrap().len(), 100);
        let smallest = smallest_productions(&conn).unwrap();
        assert_eq!(smallest.len(), 100);
        assert_eq!(smallest.last().map(|p| p.title.as_str()), Some("Show 100"));
    }

    #[test]
    fn cult_thresholds_are_strict() {
        let conn = store();
        show(&conn, 1, "User Nine", "2000-01-01", Some(40), 1, Some(9.0), 1);
        show(&conn, 2, "Meta Sixty", "2000-01-01", Some(60), 1, Some(9.5), 1);
        person(&conn, 1, "Boundary");
        link(&conn, "top_cast", 1, 1);
        link(&conn, "top_cast", 2, 1);
        assert!(cult_contributor(&conn).unwrap().is_none());

        show(&conn, 3, "Cult", "2000-01-01", Some(59), 1, Some(9.1), 1);
        link(&conn, "top_cast", 3, 1);
        let cult = cult_contributor(&conn).unwrap().unwrap();
        assert_eq!(cult.cult_shows, 1);
    }

    #[test]
    fn cult_contributor_tie_goes_to_lowest_id() {
        let conn = store();
        show(&conn, 1, "Cult", "2000-01-01", Some(40), 1, Some(9.5), 1);
        person(&conn, 7, "Later");
        person(&conn, 4, "Earlier");
        link(&conn, "top_cast", 1, 7);
        link(&conn, "top_cast", 1, 4);

        assert_eq!(cult_contributor(&conn).unwrap().unwrap().person_id, 4);
        assert!(cult_contributor(&store()).unwrap().is_none());
    }

    #[test]
    fn principal_cast_overlap_needs_five_members_and_different_years() {
        let conn = store();
        show(&conn, 1, "Original", "1990-05-01", None, 0, None, 0);
        show(&conn, 2, "Reunion", "2005-09-12", None, 0, None, 0);
        show(&conn, 3, "Short Cast", "2010-01-01", None, 0, None, 0);
        show(&conn, 4, "Same Year", "1990-11-30", None, 0, None, 0);
        for id in 1..=6 {
            person(&conn, id, &format!("Actor {id}"));
        }
        for show_id in [1, 2, 4] {
            for person_id in 1..=5 {
                link(&conn, "top_cast", show_id, person_id);
            }
        }
        // A sixth member sorts after the first five and does not change the signature.
        link(&conn, "top_cast", 2, 6);
        for person_id in 1..=4 {
            link(&conn, "top_cast", 3, person_id);
        }

        let pairs = principal_cast_overlap(&conn).unwrap();
        let ids = pairs
            .iter()
            .map(|p| (p.first_show_id, p.second_show_id))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![(1, 2), (2, 4)]);
        assert_eq!(pairs[0].first_year, 1990);
        assert_eq!(pairs[0].second_year, 2005);
    }

    #[test]
    fn multi_role_lists_each_role_once() {
        let conn = sample_store();
        let credits = multi_role_credits(&conn).unwrap();

        let summary = credits
            .iter()
            .map(|c| (c.name.as_str(), c.title.as_str(), c.roles.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("Ethan Coen", "Fargo", vec!["director".to_string(), "writer".to_string()]),
                ("Joel Coen", "Fargo", vec!["director".to_string(), "writer".to_string()]),
                (
                    "Peter Gould",
                    "Better Call Saul",
                    vec!["creator".to_string(), "writer".to_string()]
                ),
                (
                    "Vince Gilligan",
                    "Breaking Bad",
                    vec!["creator".to_string(), "writer".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn production_extremes() {
        let conn = sample_store();
        let largest = largest_productions(&conn).unwrap();
        // Breaking Bad: Vince + Peter; Better Call Saul: Peter + Vince; Fargo: two Coens.
        assert_eq!(
            largest
                .iter()
                .map(|p| (p.title.as_str(), p.crew))
                .collect::<Vec<_>>(),
            vec![("Better Call Saul", 2), ("Breaking Bad", 2), ("Fargo", 2)]
        );

        let conn = store();
        show(&conn, 1, "Crewless", "2000-01-01", None, 0, None, 0);
        show(&conn, 2, "Solo", "2000-01-01", None, 0, None, 0);
        person(&conn, 1, "Auteur");
        link(&conn, "directors", 2, 1);
        link(&conn, "writers", 2, 1);

        let smallest = smallest_productions(&conn).unwrap();
        assert_eq!(smallest.len(), 1);
        assert_eq!(smallest[0].show_id, 2);
        assert_eq!(smallest[0].crew, 1);

        let largest = largest_productions(&conn).unwrap();
        assert_eq!(largest.last().map(|p| p.crew), Some(0));
    }

    #[test]
    fn top_score_per_genre_breaks_ties_by_votes() {
        let conn = store();
        show(&conn, 1, "Low", "2000-01-01", Some(70), 5, None, 0);
        show(&conn, 2, "Tied Few", "2000-01-01", Some(95), 10, None, 0);
        show(&conn, 3, "Tied Many", "2000-01-01", Some(95), 40, None, 0);
        show(&conn, 4, "Solo", "2000-01-01", Some(60), 3, None, 0);
        genre(&conn, 1, "Drama", &[1, 2, 3]);
        genre(&conn, 2, "Comedy", &[4]);

        let top = top_score_per_genre(&conn, ScoreKind::Meta).unwrap();
        assert_eq!(
            top.iter()
                .map(|t| (t.genre.as_str(), t.show_id))
                .collect::<Vec<_>>(),
            vec![("Comedy", 4), ("Drama", 3)]
        );
        assert_eq!(top[1].votes, Some(40));
    }

    #[test]
    fn decade_leaders_tie_break_on_films_then_genre_id() {
        let conn = store();
        show(&conn, 1, "a", "1994-01-01", Some(90), 1, Some(8.0), 1);
        show(&conn, 2, "b", "1997-01-01", Some(60), 1, Some(9.0), 1);
        show(&conn, 3, "c", "1999-01-01", Some(90), 1, Some(7.0), 1);
        show(&conn, 4, "d", "2003-01-01", Some(70), 1, Some(6.0), 1);
        show(&conn, 5, "e", "unknown", Some(100), 1, Some(10.0), 1);
        genre(&conn, 1, "Drama", &[1, 4, 5]);
        genre(&conn, 2, "Crime", &[2, 3]);
        genre(&conn, 3, "Comedy", &[4]);

        let meta = decade_leaders(&conn, ScoreKind::Meta).unwrap();
        // 1990s: Drama and Crime both peak at 90; Crime has two films.
        // 2000s: Drama and Comedy both peak at 70 with one film; Drama has the lower id.
        assert_eq!(
            meta.iter()
                .map(|d| (d.decade, d.genre.as_str(), d.films))
                .collect::<Vec<_>>(),
            vec![(1990, "Crime", 2), (2000, "Drama", 1)]
        );

        let user = decade_leaders(&conn, ScoreKind::User).unwrap();
        assert_eq!(user[0].genre, "Crime");
        assert!((user[0].max_score - 9.0).abs() < 1e-9);
    }

    #[test]
    fn questions_round_trip_their_slugs() {
        for question in Question::ALL {
            assert_eq!(Question::parse(question.slug()), Some(question));
        }
        assert_eq!(Question::parse("nope"), None);

        let conn = sample_store();
        for question in Question::ALL {
            answer(&conn, question, ScoreKind::User).unwrap();
        }
    }
}
