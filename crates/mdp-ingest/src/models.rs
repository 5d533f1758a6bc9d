//! Typed records for the movie dataset tables
//!
//! One struct per dataset table, mirroring the column order of the dump
//! files. Optional columns use `Option`; the dump marks them with the `\N`
//! sentinel.

use serde::{Deserialize, Serialize};

use crate::parser::NULL_SENTINEL;

fn tsv_opt(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or(NULL_SENTINEL)
}

fn tsv_opt_int(field: Option<i32>) -> String {
    field.map_or_else(|| NULL_SENTINEL.to_string(), |v| v.to_string())
}

fn tsv_flag(flag: bool) -> &'static str {
    if flag {
        "1"
    } else {
        "0"
    }
}

/// One person from the name dump (table `name_basics`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameRecord {
    /// Stable person id (e.g. "nm0000001"), primary key
    pub nconst: String,
    /// Display name
    pub primary_name: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    /// Comma-separated profession list, free text
    pub primary_profession: Option<String>,
    /// Comma-separated title ids the person is known for, free text
    pub known_for_titles: Option<String>,
}

impl NameRecord {
    /// Format the record back into one dump-style TSV line
    pub fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.nconst,
            tsv_opt(&self.primary_name),
            tsv_opt_int(self.birth_year),
            tsv_opt_int(self.death_year),
            tsv_opt(&self.primary_profession),
            tsv_opt(&self.known_for_titles)
        )
    }
}

/// One title from the title dump (table `title_basics`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleRecord {
    /// Stable title id (e.g. "tt0000001"), primary key
    pub tconst: String,
    /// Type classification (movie, short, tvSeries, ...)
    pub title_type: Option<String>,
    pub primary_title: Option<String>,
    pub original_title: Option<String>,
    pub is_adult: bool,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    /// Comma-separated genre list, free text
    pub genres: Option<String>,
}

impl TitleRecord {
    /// Format the record back into one dump-style TSV line
    pub fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.tconst,
            tsv_opt(&self.title_type),
            tsv_opt(&self.primary_title),
            tsv_opt(&self.original_title),
            tsv_flag(self.is_adult),
            tsv_opt_int(self.start_year),
            tsv_opt_int(self.end_year),
            tsv_opt_int(self.runtime_minutes),
            tsv_opt(&self.genres)
        )
    }
}

/// A person's role on a title (table `title_principals`)
///
/// Keyed by (tconst, ordering); references both `title_basics` and
/// `name_basics`, so it loads after them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrincipalRecord {
    pub tconst: String,
    /// Position of this credit within the title, part of the key
    pub ordering: i32,
    pub nconst: String,
    /// Credit category (actor, director, ...)
    pub category: Option<String>,
    pub job: Option<String>,
    /// Character name(s), free text
    pub characters: Option<String>,
}

impl PrincipalRecord {
    /// Format the record back into one dump-style TSV line
    pub fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.tconst,
            self.ordering,
            self.nconst,
            tsv_opt(&self.category),
            tsv_opt(&self.job),
            tsv_opt(&self.characters)
        )
    }
}

/// A localized title variant (table `title_akas`)
///
/// Keyed by (title_id, ordering); references `title_basics`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AkaRecord {
    pub title_id: String,
    pub ordering: i32,
    pub title: Option<String>,
    pub region: Option<String>,
    pub language: Option<String>,
    pub types: Option<String>,
    pub attributes: Option<String>,
    pub is_original_title: bool,
}

impl AkaRecord {
    /// Format the record back into one dump-style TSV line
    pub fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.title_id,
            self.ordering,
            tsv_opt(&self.title),
            tsv_opt(&self.region),
            tsv_opt(&self.language),
            tsv_opt(&self.types),
            tsv_opt(&self.attributes),
            tsv_flag(self.is_original_title)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_name() -> NameRecord {
        NameRecord {
            nconst: "nm0000001".to_string(),
            primary_name: Some("Fred Astaire".to_string()),
            birth_year: Some(1899),
            death_year: Some(1987),
            primary_profession: Some("actor,soundtrack".to_string()),
            known_for_titles: Some("tt0072308,tt0050419".to_string()),
        }
    }

    #[test]
    fn test_name_to_tsv() {
        let tsv = sample_name().to_tsv();
        assert_eq!(
            tsv,
            "nm0000001\tFred Astaire\t1899\t1987\tactor,soundtrack\ttt0072308,tt0050419"
        );
    }

    #[test]
    fn test_name_to_tsv_with_absent_fields() {
        let mut record = sample_name();
        record.death_year = None;
        record.known_for_titles = None;

        let tsv = record.to_tsv();
        assert_eq!(tsv, "nm0000001\tFred Astaire\t1899\t\\N\tactor,soundtrack\t\\N");
    }

    #[test]
    fn test_title_to_tsv_flags_and_absent_years() {
        let record = TitleRecord {
            tconst: "tt0000001".to_string(),
            title_type: Some("short".to_string()),
            primary_title: Some("Carmencita".to_string()),
            original_title: Some("Carmencita".to_string()),
            is_adult: false,
            start_year: Some(1894),
            end_year: None,
            runtime_minutes: Some(1),
            genres: Some("Documentary,Short".to_string()),
        };

        assert_eq!(
            record.to_tsv(),
            "tt0000001\tshort\tCarmencita\tCarmencita\t0\t1894\t\\N\t1\tDocumentary,Short"
        );
    }

    #[test]
    fn test_principal_to_tsv() {
        let record = PrincipalRecord {
            tconst: "tt0000001".to_string(),
            ordering: 1,
            nconst: "nm1588970".to_string(),
            category: Some("self".to_string()),
            job: None,
            characters: Some("[\"Self\"]".to_string()),
        };

        assert_eq!(record.to_tsv(), "tt0000001\t1\tnm1588970\tself\t\\N\t[\"Self\"]");
    }

    #[test]
    fn test_aka_to_tsv_original_flag() {
        let record = AkaRecord {
            title_id: "tt0000001".to_string(),
            ordering: 2,
            title: Some("Carmencita".to_string()),
            region: None,
            language: None,
            types: Some("original".to_string()),
            attributes: None,
            is_original_title: true,
        };

        assert_eq!(record.to_tsv(), "tt0000001\t2\tCarmencita\t\\N\t\\N\toriginal\t\\N\t1");
    }
}
