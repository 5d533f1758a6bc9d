//! Lenient TSV parsing for the dataset dump files
//!
//! # File format
//!
//! Each dump file is UTF-8, tab-separated, one header line, with the
//! two-character sentinel `\N` marking an absent value:
//!
//! ```text
//! tconst	titleType	primaryTitle	originalTitle	isAdult	startYear	endYear	runtimeMinutes	genres
//! tt0000001	short	Carmencita	Carmencita	0	1894	\N	1	Documentary,Short
//! ```
//!
//! Parsing is lenient: a single bad row never aborts a multi-million-row
//! load.
//!
//! - a line with fewer fields than the table requires is dropped
//! - `\N`, empty, and whitespace-only fields map to absent values
//! - optional integers that fail to parse map to absent, never an error
//! - a key field that is unusable (absent id, unparsable ordering) drops
//!   the whole line
//!
//! No error escapes this module; every fallible path is an `Option`.

use crate::models::{AkaRecord, NameRecord, PrincipalRecord, TitleRecord};

/// Marker the dump format uses for "value not available", distinct from an
/// empty string.
pub const NULL_SENTINEL: &str = "\\N";

/// A record type that can be built from the split fields of one dump line.
pub trait FromTsv: Sized {
    /// Minimum number of tab-separated fields a line must carry.
    const MIN_FIELDS: usize;

    /// Build a record from the split fields of one line.
    ///
    /// Returns `None` when a key field is unusable; callers drop the line.
    fn from_fields(fields: &[&str]) -> Option<Self>;
}

/// Parse one data line into a record, or `None` if the line is malformed.
///
/// Splitting on `'\t'` preserves empty trailing fields, so a line ending in
/// a tab still meets its field-count requirement.
pub fn parse_line<R: FromTsv>(line: &str) -> Option<R> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < R::MIN_FIELDS {
        return None;
    }
    R::from_fields(&fields)
}

/// Map a raw field to text unless it is empty, whitespace-only, or `\N`.
pub fn optional_text(field: &str) -> Option<String> {
    if field.trim().is_empty() || field == NULL_SENTINEL {
        None
    } else {
        Some(field.to_string())
    }
}

/// Parse-or-absent integer coercion: `\N`, empty, and unparsable values all
/// map to `None`. Malformed numeric data degrades to "unknown".
pub fn optional_int(field: &str) -> Option<i32> {
    optional_text(field)?.trim().parse().ok()
}

/// Flag columns carry the literal "1" for true; anything else is false.
pub fn parse_flag(field: &str) -> bool {
    field == "1"
}

impl FromTsv for NameRecord {
    const MIN_FIELDS: usize = 6;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            nconst: optional_text(fields[0])?,
            primary_name: optional_text(fields[1]),
            birth_year: optional_int(fields[2]),
            death_year: optional_int(fields[3]),
            primary_profession: optional_text(fields[4]),
            known_for_titles: optional_text(fields[5]),
        })
    }
}

impl FromTsv for TitleRecord {
    const MIN_FIELDS: usize = 9;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            tconst: optional_text(fields[0])?,
            title_type: optional_text(fields[1]),
            primary_title: optional_text(fields[2]),
            original_title: optional_text(fields[3]),
            is_adult: parse_flag(fields[4]),
            start_year: optional_int(fields[5]),
            end_year: optional_int(fields[6]),
            runtime_minutes: optional_int(fields[7]),
            genres: optional_text(fields[8]),
        })
    }
}

impl FromTsv for PrincipalRecord {
    const MIN_FIELDS: usize = 6;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            tconst: optional_text(fields[0])?,
            // ordering is half the composite key; it cannot be absent
            ordering: optional_int(fields[1])?,
            nconst: optional_text(fields[2])?,
            category: optional_text(fields[3]),
            job: optional_text(fields[4]),
            characters: optional_text(fields[5]),
        })
    }
}

impl FromTsv for AkaRecord {
    const MIN_FIELDS: usize = 8;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            title_id: optional_text(fields[0])?,
            ordering: optional_int(fields[1])?,
            title: optional_text(fields[2]),
            region: optional_text(fields[3]),
            language: optional_text(fields[4]),
            types: optional_text(fields[5]),
            attributes: optional_text(fields[6]),
            is_original_title: parse_flag(fields[7]),
        })
    }
}
