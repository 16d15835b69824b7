//! Listing and detail reads behind the HTTP surface.
//!
//! Search and pagination happen in SQL; the `LIKE` patterns come from
//! [`PageRequest::like_pattern`] and are matched with `ESCAPE '\'`.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    CatalogStats, Credit, EntityDetail, Lookup, NamedEntity, Page, PageRequest, PersonDetail,
    PersonSummary, ScorePair, ShowDetail, ShowSummary,
};

pub fn stats(conn: &Connection) -> Result<CatalogStats> {
    let stats = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM shows),
                (SELECT COUNT(*) FROM people),
                (SELECT COUNT(*) FROM genres),
                (SELECT COUNT(*) FROM companies)",
        [],
        |row| {
            Ok(CatalogStats {
                shows: row.get(0)?,
                people: row.get(1)?,
                genres: row.get(2)?,
                companies: row.get(3)?,
            })
        },
    )?;
    Ok(stats)
}

pub fn list_shows(conn: &Connection, page: &PageRequest) -> Result<Page<ShowSummary>> {
    let pattern = page.like_pattern();
    let total = conn.query_row(
        "SELECT COUNT(*) FROM shows WHERE title LIKE ?1 ESCAPE '\\'",
        params![pattern],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare_cached(
        "SELECT show_id, title FROM shows
         WHERE title LIKE ?1 ESCAPE '\\'
         ORDER BY title, show_id
         LIMIT ?2 OFFSET ?3",
    )?;
    let items = stmt
        .query_map(params![pattern, page.limit, page.offset()], |row| {
            Ok(ShowSummary {
                show_id: row.get(0)?,
                title: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}

/// Full record of one show, or `None` when the id is unknown.
pub fn get_show(conn: &Connection, show_id: i64) -> Result<Option<ShowDetail>> {
    let detail = conn
        .query_row(
            "SELECT sh.show_id, sh.title, sh.releaseDate, sh.rating, sh.num_seasons,
                    sh.tagline, sh.description, sh.duration,
                    m.show_id, m.metascore, m.metascore_count,
                    u.show_id, u.userscore, u.userscore_count
             FROM shows sh
             LEFT JOIN metascore m ON m.show_id = sh.show_id
             LEFT JOIN userscore u ON u.show_id = sh.show_id
             WHERE sh.show_id = ?1",
            params![show_id],
            |row| {
                let has_scores = row.get::<_, Option<i64>>(8)?.is_some()
                    || row.get::<_, Option<i64>>(11)?.is_some();
                let scores = if has_scores {
                    Some(ScorePair {
                        metascore: row.get(9)?,
                        metascore_count: row.get(10)?,
                        userscore: row.get(12)?,
                        userscore_count: row.get(13)?,
                    })
                } else {
                    None
                };
                Ok(ShowDetail {
                    show_id: row.get(0)?,
                    title: row.get(1)?,
                    release_date: row.get(2)?,
                    rating: row.get(3)?,
                    num_seasons: row.get(4)?,
                    tagline: row.get(5)?,
                    description: row.get(6)?,
                    duration: row.get(7)?,
                    genres: Vec::new(),
                    companies: Vec::new(),
                    cast: Vec::new(),
                    scores,
                })
            },
        )
        .optional()?;

    let Some(mut detail) = detail else {
        return Ok(None);
    };
    detail.genres = names(
        conn,
        "SELECT g.name FROM types t JOIN genres g ON g.genre_id = t.genre_id
         WHERE t.show_id = ?1 ORDER BY g.name",
        show_id,
    )?;
    detail.companies = names(
        conn,
        "SELECT c.name FROM production p JOIN companies c ON c.producer_id = p.producer_id
         WHERE p.show_id = ?1 ORDER BY c.name",
        show_id,
    )?;
    detail.cast = names(
        conn,
        "SELECT p.name FROM top_cast tc JOIN people p ON p.person_id = tc.person_id
         WHERE tc.show_id = ?1 ORDER BY p.person_id",
        show_id,
    )?;
    Ok(Some(detail))
}

fn names(conn: &Connection, sql: &str, id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let names = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

struct LookupQueries {
    count: &'static str,
    list: &'static str,
    get: &'static str,
    shows: &'static str,
}

fn lookup_queries(lookup: Lookup) -> LookupQueries {
    match lookup {
        Lookup::Genre => LookupQueries {
            count: "SELECT COUNT(*) FROM genres WHERE name LIKE ?1 ESCAPE '\\'",
            list: "SELECT genre_id, name FROM genres
                   WHERE name LIKE ?1 ESCAPE '\\'
                   ORDER BY name, genre_id LIMIT ?2 OFFSET ?3",
            get: "SELECT genre_id, name FROM genres WHERE genre_id = ?1",
            shows: "SELECT sh.show_id, sh.title FROM types t
                    JOIN shows sh ON sh.show_id = t.show_id
                    WHERE t.genre_id = ?1 ORDER BY sh.title, sh.show_id",
        },
        Lookup::Company => LookupQueries {
            count: "SELECT COUNT(*) FROM companies WHERE name LIKE ?1 ESCAPE '\\'",
            list: "SELECT producer_id, name FROM companies
                   WHERE name LIKE ?1 ESCAPE '\\'
                   ORDER BY name, producer_id LIMIT ?2 OFFSET ?3",
            get: "SELECT producer_id, name FROM companies WHERE producer_id = ?1",
            shows: "SELECT sh.show_id, sh.title FROM production p
                    JOIN shows sh ON sh.show_id = p.show_id
                    WHERE p.producer_id = ?1 ORDER BY sh.title, sh.show_id",
        },
    }
}

fn list_lookup(conn: &Connection, lookup: Lookup, page: &PageRequest) -> Result<Page<NamedEntity>> {
    let queries = lookup_queries(lookup);
    let pattern = page.like_pattern();
    let total = conn.query_row(queries.count, params![pattern], |row| row.get(0))?;

    let mut stmt = conn.prepare_cached(queries.list)?;
    let items = stmt
        .query_map(params![pattern, page.limit, page.offset()], |row| {
            Ok(NamedEntity {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}

fn get_lookup(conn: &Connection, lookup: Lookup, id: i64) -> Result<Option<EntityDetail>> {
    let queries = lookup_queries(lookup);
    let entity = conn
        .query_row(queries.get, params![id], |row| {
            Ok(NamedEntity {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .optional()?;
    let Some(entity) = entity else {
        return Ok(None);
    };

    let mut stmt = conn.prepare_cached(queries.shows)?;
    let shows = stmt
        .query_map(params![id], |row| {
            Ok(ShowSummary {
                show_id: row.get(0)?,
                title: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some(EntityDetail {
        id: entity.id,
        name: entity.name,
        total: shows.len() as i64,
        shows,
    }))
}

pub fn list_genres(conn: &Connection, page: &PageRequest) -> Result<Page<NamedEntity>> {
    list_lookup(conn, Lookup::Genre, page)
}

pub fn get_genre(conn: &Connection, genre_id: i64) -> Result<Option<EntityDetail>> {
    get_lookup(conn, Lookup::Genre, genre_id)
}

pub fn list_companies(conn: &Connection, page: &PageRequest) -> Result<Page<NamedEntity>> {
    list_lookup(conn, Lookup::Company, page)
}

pub fn get_company(conn: &Connection, producer_id: i64) -> Result<Option<EntityDetail>> {
    get_lookup(conn, Lookup::Company, producer_id)
}

const CREDITS: &str = "
    SELECT show_id, person_id, 'director' AS role FROM directors
    UNION ALL SELECT show_id, person_id, 'writer' FROM writers
    UNION ALL SELECT show_id, person_id, 'actor' FROM top_cast
    UNION ALL SELECT show_id, person_id, 'creator' FROM creators
";

/// People ordered by name, each with the distinct labels of the roles they hold.
pub fn list_people(conn: &Connection, page: &PageRequest) -> Result<Page<PersonSummary>> {
    let pattern = page.like_pattern();
    let total = conn.query_row(
        "SELECT COUNT(*) FROM people WHERE name LIKE ?1 ESCAPE '\\'",
        params![pattern],
        |row| row.get(0),
    )?;

    let sql = format!(
        "WITH credits AS ({CREDITS}),
         page AS (
             SELECT person_id, name FROM people
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY name, person_id
             LIMIT ?2 OFFSET ?3
         )
         SELECT p.person_id, p.name,
                (SELECT group_concat(DISTINCT c.role) FROM credits c
                 WHERE c.person_id = p.person_id)
         FROM page p
         ORDER BY p.name, p.person_id"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let items = stmt
        .query_map(params![pattern, page.limit, page.offset()], |row| {
            let roles: Option<String> = row.get(2)?;
            let mut roles = roles
                .unwrap_or_default()
                .split(',')
                .filter(|r| !r.is_empty())
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            roles.sort();
            Ok(PersonSummary {
                person_id: row.get(0)?,
                name: row.get(1)?,
                roles,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}

pub fn get_person(conn: &Connection, person_id: i64) -> Result<Option<PersonDetail>> {
    let name: Option<String> = conn
        .query_row(
            "SELECT name FROM people WHERE person_id = ?1",
            params![person_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(name) = name else {
        return Ok(None);
    };

    let sql = format!(
        "WITH credits AS ({CREDITS})
         SELECT sh.show_id, sh.title, c.role
         FROM credits c
         JOIN shows sh ON sh.show_id = c.show_id
         WHERE c.person_id = ?1
         ORDER BY sh.title, c.role"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let credits = stmt
        .query_map(params![person_id], |row| {
            Ok(Credit {
                show_id: row.get(0)?,
                title: row.get(1)?,
                role: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some(PersonDetail {
        person_id,
        name,
        credits,
    }))
}
