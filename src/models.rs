use serde::{Deserialize, Serialize};

/// A person's credit category. Each variant owns one junction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Director,
    Writer,
    Cast,
    Creator,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Director, Role::Writer, Role::Cast, Role::Creator];

    /// Label shown to readers of the catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Writer => "writer",
            Self::Cast => "actor",
            Self::Creator => "creator",
        }
    }

    pub fn source_column(&self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Writer => "writer",
            Self::Cast => "top_cast",
            Self::Creator => "created_by",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Director => "directors",
            Self::Writer => "writers",
            Self::Cast => "top_cast",
            Self::Creator => "creators",
        }
    }

    pub(crate) fn insert_link_sql(&self) -> &'static str {
        match self {
            Self::Director => "INSERT OR IGNORE INTO directors(show_id,person_id) VALUES(?1,?2)",
            Self::Writer => "INSERT OR IGNORE INTO writers(show_id,person_id) VALUES(?1,?2)",
            Self::Cast => "INSERT OR IGNORE INTO top_cast(show_id,person_id) VALUES(?1,?2)",
            Self::Creator => "INSERT OR IGNORE INTO creators(show_id,person_id) VALUES(?1,?2)",
        }
    }

    /// Moves links from `?2` onto `?1`, leaving behind pairs that already exist for `?1`.
    pub(crate) fn repoint_sql(&self) -> &'static str {
        match self {
            Self::Director => "UPDATE OR IGNORE directors SET person_id = ?1 WHERE person_id = ?2",
            Self::Writer => "UPDATE OR IGNORE writers SET person_id = ?1 WHERE person_id = ?2",
            Self::Cast => "UPDATE OR IGNORE top_cast SET person_id = ?1 WHERE person_id = ?2",
            Self::Creator => "UPDATE OR IGNORE creators SET person_id = ?1 WHERE person_id = ?2",
        }
    }

    pub(crate) fn unlink_sql(&self) -> &'static str {
        match self {
            Self::Director => "DELETE FROM directors WHERE person_id = ?1",
            Self::Writer => "DELETE FROM writers WHERE person_id = ?1",
            Self::Cast => "DELETE FROM top_cast WHERE person_id = ?1",
            Self::Creator => "DELETE FROM creators WHERE person_id = ?1",
        }
    }

    pub(crate) fn count_sql(&self) -> &'static str {
        match self {
            Self::Director => "SELECT COUNT(*) FROM directors",
            Self::Writer => "SELECT COUNT(*) FROM writers",
            Self::Cast => "SELECT COUNT(*) FROM top_cast",
            Self::Creator => "SELECT COUNT(*) FROM creators",
        }
    }
}

/// Name-keyed lookup tables filled from delimited show columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Genre,
    Company,
}

impl Lookup {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Genre => "genre",
            Self::Company => "company",
        }
    }

    pub(crate) fn insert_sql(&self) -> &'static str {
        match self {
            Self::Genre => "INSERT OR IGNORE INTO genres(name) VALUES(?1)",
            Self::Company => "INSERT OR IGNORE INTO companies(name) VALUES(?1)",
        }
    }

    pub(crate) fn select_id_sql(&self) -> &'static str {
        match self {
            Self::Genre => "SELECT genre_id FROM genres WHERE name = ?1",
            Self::Company => "SELECT producer_id FROM companies WHERE name = ?1",
        }
    }

    pub(crate) fn link_sql(&self) -> &'static str {
        match self {
            Self::Genre => "INSERT OR IGNORE INTO types(show_id,genre_id) VALUES(?1,?2)",
            Self::Company => {
                "INSERT OR IGNORE INTO production(show_id,producer_id) VALUES(?1,?2)"
            }
        }
    }
}

/// Which of the two score tables a ranking reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    #[default]
    Meta,
    User,
}

impl ScoreKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "meta" | "metascore" => Some(Self::Meta),
            "user" | "userscore" => Some(Self::User),
            _ => None,
        }
    }

    /// Bound as the first parameter of score-aware queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::User => "user",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub shows: i64,
    pub people: i64,
    pub genres: i64,
    pub companies: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShowSummary {
    pub show_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScorePair {
    pub metascore: Option<i64>,
    pub metascore_count: Option<i64>,
    pub userscore: Option<f64>,
    pub userscore_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShowDetail {
    pub show_id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub rating: Option<String>,
    pub num_seasons: Option<i64>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i64>,
    pub genres: Vec<String>,
    pub companies: Vec<String>,
    pub cast: Vec<String>,
    pub scores: Option<ScorePair>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamedEntity {
    pub id: i64,
    pub name: String,
}

/// A genre or production company together with the shows linked to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityDetail {
    pub id: i64,
    pub name: String,
    pub total: i64,
    pub shows: Vec<ShowSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub person_id: i64,
    pub name: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credit {
    pub show_id: i64,
    pub title: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetail {
    pub person_id: i64,
    pub name: String,
    pub credits: Vec<Credit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
    pub query: Option<String>,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32, query: Option<String>) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            query: query
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// `LIKE` pattern matching the query as a substring, with wildcards escaped.
    pub fn like_pattern(&self) -> String {
        let Some(query) = &self.query else {
            return "%".to_string();
        };
        let mut pattern = String::with_capacity(query.len() + 2);
        pattern.push('%');
        for c in query.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenreTopShow {
    pub genre_id: i64,
    pub genre: String,
    pub show_id: i64,
    pub title: String,
    pub score: f64,
    pub votes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDivergence {
    pub show_id: i64,
    pub title: String,
    pub metascore: i64,
    pub userscore: f64,
    pub divergence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EliteDirector {
    pub person_id: i64,
    pub name: String,
    pub shows: i64,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CultContributor {
    pub person_id: i64,
    pub name: String,
    pub cult_shows: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CastOverlap {
    pub first_show_id: i64,
    pub first_title: String,
    pub first_year: i64,
    pub second_show_id: i64,
    pub second_title: String,
    pub second_year: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiRoleCredit {
    pub person_id: i64,
    pub name: String,
    pub show_id: i64,
    pub title: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSize {
    pub show_id: i64,
    pub title: String,
    pub crew: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecadeLeader {
    pub decade: i64,
    pub genre_id: i64,
    pub genre: String,
    pub max_score: f64,
    pub films: i64,
}
