//! Keyword matching and query feature extraction

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Commonly searched suburbs
pub const KNOWN_SUBURBS: &[&str] = &[
    "avondale", "borrowdale", "mount pleasant", "westgate", "greendale", "warren park",
    "mambo", "highlands", "mbare", "glen view", "glen norah", "hatfield", "msasa",
    "waterfalls", "chitungwiza", "epworth", "ruwa", "norton", "chegutu", "kadoma",
    "alexandra park", "belvedere", "braeside", "eastlea", "greystone park", "hillside",
    "kambuzuma", "lochinvar", "marlborough", "newlands", "tynwald",
];

/// Zimbabwean cities and towns
pub const KNOWN_CITIES: &[&str] = &[
    "harare", "bulawayo", "mutare", "gweru", "kwekwe", "masvingo", "chitungwiza",
    "epworth", "ruwa", "norton", "chegutu", "kadoma", "marondera", "chinhoyi",
    "kariba", "victoria falls", "hwange", "chiredzi", "bindura", "rusape",
];

/// Cities with a central business district
pub const CBD_CITIES: &[&str] = &[
    "harare", "bulawayo", "mutare", "gweru", "kwekwe", "masvingo",
    "chitungwiza", "epworth", "ruwa", "chegutu", "kadoma", "marondera",
];

/// Words that mark a message as being about property
pub const PROPERTY_TERMS: &[&str] = &[
    "house", "houses", "home", "homes", "apartment", "apartments", "flat", "flats",
    "property", "properties", "room", "rooms", "airbnb", "guesthouse", "guest house",
    "rent", "rental", "listing", "listings", "bedroom", "bedrooms",
];

/// True when `term` occurs in `text` on word boundaries
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    text.match_indices(term).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| contains_term(text, t))
}

/// Terms from `terms` present in `text`, in list order
pub fn matching_terms(text: &str, terms: &[&str]) -> Vec<String> {
    terms
        .iter()
        .filter(|t| contains_term(text, t))
        .map(|t| t.to_string())
        .collect()
}

pub fn mentions_property(text: &str) -> bool {
    contains_any(text, PROPERTY_TERMS)
}

/// Locations found in a query, split by how they should be matched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationInfo {
    pub suburbs: Vec<String>,
    pub cities: Vec<String>,
    /// Names that are both a suburb and a town
    pub ambiguous: Vec<String>,
}

impl LocationInfo {
    pub fn is_empty(&self) -> bool {
        self.suburbs.is_empty() && self.cities.is_empty() && self.ambiguous.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.suburbs
            .iter()
            .chain(self.cities.iter())
            .chain(self.ambiguous.iter())
            .cloned()
            .collect()
    }
}

pub fn extract_locations(text: &str) -> LocationInfo {
    let suburbs = matching_terms(text, KNOWN_SUBURBS);
    let cities = matching_terms(text, KNOWN_CITIES);

    let ambiguous: Vec<String> = suburbs
        .iter()
        .filter(|s| cities.contains(s))
        .cloned()
        .collect();

    LocationInfo {
        suburbs: suburbs.into_iter().filter(|s| !ambiguous.contains(s)).collect(),
        cities: cities.into_iter().filter(|c| !ambiguous.contains(c)).collect(),
        ambiguous,
    }
}

/// Canonical property type named in the query
pub fn detect_property_type(text: &str) -> Option<&'static str> {
    const TYPES: &[(&str, &[&str])] = &[
        ("guesthouse", &["guesthouse", "guesthouses", "guest house", "guest houses"]),
        ("airbnb", &["airbnb", "airbnbs"]),
        ("apartment", &["apartment", "apartments", "flat", "flats"]),
        ("house", &["house", "houses", "home", "homes"]),
        ("room", &["room", "rooms"]),
    ];

    TYPES
        .iter()
        .find(|(_, words)| contains_any(text, words))
        .map(|(name, _)| *name)
}

const AMOUNT: &str = r"\$?(\d+(?:,\d{3})*(?:\.\d+)?)";

static PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"below\s+{AMOUNT}"),
        format!(r"under\s+{AMOUNT}"),
        format!(r"less\s+than\s+{AMOUNT}"),
        format!(r"up\s+to\s+{AMOUNT}"),
        format!(r"max(?:imum)?\s+{AMOUNT}"),
        format!(r"{AMOUNT}\s+or\s+less"),
        format!(r"{AMOUNT}\s+and\s+below"),
        format!(r"cheaper\s+than\s+{AMOUNT}"),
        format!(r"no\s+more\s+than\s+{AMOUNT}"),
        format!(r"within\s+{AMOUNT}"),
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Upper price bound expressed in the query ("under $500", "1,000 or less")
pub fn extract_max_price(text: &str) -> Option<f64> {
    PRICE_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
    })
}

/// Capitalize each word ("mount pleasant" -> "Mount Pleasant")
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
