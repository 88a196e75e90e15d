//! Textual post-processing of generated SQL

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

/// Columns every listing row must carry for the client cards
pub const REQUIRED_COLUMNS: &[&str] = &["id", "main_image", "price", "street_address", "suburb", "city"];

static FENCED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)```(?:sqlite|sql)?\s*(.+?)```").unwrap());

static STATEMENT_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(select|with)\b").unwrap());

static SELECT_FROM_PROPERTIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(\s*select\s+(?:distinct\s+)?)(.+?)(\s+from\s+properties\b(?:\s+(?:as\s+)?(\w+))?)").unwrap()
});

static AGGREGATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(count|avg|sum|min|max|group_concat)\s*\(").unwrap());

static PROPERTY_TYPE_EQ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\b(\w+)\.)?\bproperty_type\s*=\s*'([^']+)'").unwrap());

static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^']|'')*'").unwrap());

static WRITE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(insert|update|delete|drop|alter|create|replace|attach|detach|pragma|vacuum|reindex)\b").unwrap()
});

/// SQL keywords that can follow `FROM properties` and are not an alias
const CLAUSE_KEYWORDS: &[&str] = &[
    "where", "join", "inner", "left", "right", "cross", "natural", "order", "group", "limit",
    "having", "union", "on", "using", "offset", "window",
];

/// Pull the SQL statement out of an LLM reply
pub fn extract_sql(reply: &str) -> String {
    let mut text = match FENCED.captures(reply) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).to_string(),
        None => reply.to_string(),
    };

    if let Some(idx) = text.find("SQLResult:") {
        text.truncate(idx);
    }
    if let Some(idx) = text.find("SQLQuery:") {
        text = text[idx + "SQLQuery:".len()..].to_string();
    }

    // Drop any lead-in prose before the statement
    if let Some(m) = STATEMENT_START.find(&text) {
        text = text[m.start()..].to_string();
    }

    text.trim().trim_end_matches(';').trim().to_string()
}

/// Append missing required columns to a SELECT over `properties`
pub fn ensure_required_columns(sql: &str) -> String {
    let Some(caps) = SELECT_FROM_PROPERTIES.captures(sql) else {
        return sql.to_string();
    };
    let select_list = caps.get(2).map_or("", |m| m.as_str());
    if select_list.contains('*') || AGGREGATE.is_match(select_list) {
        return sql.to_string();
    }

    let alias = caps
        .get(4)
        .map(|m| m.as_str())
        .filter(|a| !CLAUSE_KEYWORDS.contains(&a.to_lowercase().as_str()));

    let lowered = select_list.to_lowercase();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !has_word(&lowered, col))
        .map(|col| match alias {
            Some(alias) => format!("{}.{}", alias, col),
            None => col.to_string(),
        })
        .collect();

    if missing.is_empty() {
        return sql.to_string();
    }

    let Some(list_match) = caps.get(2) else {
        return sql.to_string();
    };
    format!(
        "{}{}, {}{}",
        &sql[..list_match.start()],
        select_list,
        missing.join(", "),
        &sql[list_match.end()..]
    )
}

/// `property_type = 'House'` becomes `LOWER(property_type) = 'house'`
pub fn case_insensitive_property_type(sql: &str) -> String {
    PROPERTY_TYPE_EQ
        .replace_all(sql, |caps: &Captures<'_>| {
            let qualifier = caps.get(1).map(|m| format!("{}.", m.as_str())).unwrap_or_default();
            let value = caps.get(2).map_or("", |m| m.as_str()).to_lowercase();
            format!("LOWER({}property_type) = '{}'", qualifier, value)
        })
        .into_owned()
}

/// A single SELECT or WITH statement with no write keywords outside string literals
pub fn is_read_only(sql: &str) -> bool {
    let stripped = STRING_LITERAL.replace_all(sql, "''");
    let trimmed = stripped.trim().trim_end_matches(';').trim();
    let lowered = trimmed.to_lowercase();

    (lowered.starts_with("select") || lowered.starts_with("with"))
        && !trimmed.contains(';')
        && !WRITE_KEYWORD.is_match(trimmed)
}

fn has_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, _)| {
        let end = start + word.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        let boundary = |c: Option<char>| c.map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        boundary(before) && boundary(after)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sql_from_fenced_reply() {
        let reply = "Here you go:\n```sql\nSELECT title FROM properties WHERE city = 'harare';\n```";
        assert_eq!(extract_sql(reply), "SELECT title FROM properties WHERE city = 'harare'");
    }

    #[test]
    fn test_extract_sql_from_labelled_reply() {
        let reply = "SQLQuery: SELECT title FROM properties LIMIT 5\nSQLResult: [...]";
        assert_eq!(extract_sql(reply), "SELECT title FROM properties LIMIT 5");
    }

    #[test]
    fn test_required_columns_are_added() {
        let sql = ensure_required_columns("SELECT title, price FROM properties WHERE city = 'harare'");
        assert_eq!(
            sql,
            "SELECT title, price, id, main_image, street_address, suburb, city FROM properties WHERE city = 'harare'"
        );
    }

    #[test]
    fn test_required_columns_respect_alias() {
        let sql = ensure_required_columns(
            "SELECT p.title, p.id FROM properties p JOIN property_amenities pa ON pa.property_id = p.id",
        );
        assert!(sql.starts_with("SELECT p.title, p.id, p.main_image, p.price, p.street_address, p.suburb, p.city FROM"));

        let sql = ensure_required_columns("SELECT title FROM properties WHERE price < 500");
        assert!(sql.contains("title, id, main_image"));
        assert!(!sql.contains("WHERE."));
    }

    #[test]
    fn test_required_columns_skip_star_and_aggregates() {
        for sql in [
            "SELECT * FROM properties",
            "SELECT COUNT(*) FROM properties",
            "SELECT AVG(price) FROM properties WHERE city = 'harare'",
        ] {
            assert_eq!(ensure_required_columns(sql), sql);
        }
    }

    #[test]
    fn test_property_id_is_not_id() {
        let sql = ensure_required_columns("SELECT property_id FROM properties");
        assert!(sql.contains("property_id, id,"));
    }

    #[test]
    fn test_property_type_rewrite() {
        assert_eq!(
            case_insensitive_property_type("SELECT * FROM properties WHERE property_type = 'House'"),
            "SELECT * FROM properties WHERE LOWER(property_type) = 'house'"
        );
        assert_eq!(
            case_insensitive_property_type("SELECT * FROM properties p WHERE p.property_type='Apartment'"),
            "SELECT * FROM properties p WHERE LOWER(p.property_type) = 'apartment'"
        );
        let already = "SELECT * FROM properties WHERE LOWER(property_type) = 'house'";
        assert_eq!(case_insensitive_property_type(already), already);
    }

    #[test]
    fn test_read_only_guard() {
        assert!(is_read_only("SELECT * FROM properties"));
        assert!(is_read_only("WITH cheap AS (SELECT * FROM properties WHERE price < 100) SELECT * FROM cheap;"));
        assert!(is_read_only("SELECT * FROM properties WHERE description LIKE '%delete me%'"));
        assert!(!is_read_only("DELETE FROM properties"));
        assert!(!is_read_only("SELECT 1; DROP TABLE properties"));
        assert!(!is_read_only("PRAGMA table_info(properties)"));
    }
}
