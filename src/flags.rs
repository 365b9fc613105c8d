//! Quality flagging for geocoded localities.
//!
//! Every check is an independent keyword or pattern match against the
//! original record text (never the resolver's normalized address, except
//! for the post-geocode consistency checks). All triggered reasons are
//! kept; the overall status is the most severe tier that fired.

use crate::geocoder::{GeocodeResult, LocationType};
use crate::offset::{has_bare_offset, OffsetSpec};
use crate::record::LocationRecord;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Overall trustworthiness of a row. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlagStatus {
    Ok,
    Review,
    Warning,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Review => "REVIEW",
            Self::Warning => "WARNING",
        }
    }
}

impl fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus every reason that contributed to it, in check order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagResult {
    pub status: FlagStatus,
    pub reasons: Vec<String>,
}

impl FlagResult {
    /// Reasons joined for the `flag_reason` column.
    pub fn reason(&self) -> String {
        self.reasons.join("; ")
    }

    pub fn has_reason(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.reasons.iter().any(|r| r.to_lowercase().contains(&needle))
    }
}

// ─── Reason texts ───────────────────────────────────────────────

pub const MISSING_STATE: &str = "missing state - may be ambiguous";
pub const COUNTY_STATE_ONLY: &str = "county/state only, no city or precise location - very vague";
pub const NO_COORDINATES: &str = "no coordinates - geocoding did not complete";
pub const OFFSET_DETECTED: &str = "directional offset detected";
pub const BARE_OFFSET: &str = "directional phrase without reference point";
pub const VAGUE_REFERENCE: &str = "vague reference point (behind/at/vic/near/vicinity of)";
pub const WATER_FEATURE: &str = "water feature - may use centerline/centroid";
pub const PARK_NAME_ONLY: &str = "park/natural area (name only - may use geometric center)";
pub const PARK_WITH_DETAIL: &str = "park/natural area with detail (may still use center)";
pub const ABBREVIATED: &str = "abbreviated location name";
pub const ACRONYM: &str = "possible acronym/abbreviation";
pub const MULTIPLE_COUNTIES: &str = "multiple counties listed";
pub const PARENTHETICAL: &str = "contains parenthetical info - may confuse geocoder";
pub const GEOMETRIC_CENTER: &str = "geometric center of area";
pub const UNEXPECTED_COUNTRY: &str = "unexpected country - verify result";

// ─── Keyword tables ─────────────────────────────────────────────

const VAGUE_WORDS: &[&str] = &["behind", "at", "vic", "near", "vicinity of"];

const WATER_WORDS: &[&str] = &["river", "lake", "creek", "bay", "beach", "shore", "falls", "pond"];

const PARK_WORDS: &[&str] = &[
    "park", "forest", "wilderness", "preserve", "refuge", "national", "state park", "grove",
    "seashore", "monument", "station", "dunes",
];

const AMBIGUOUS_ABBREVIATIONS: &[&str] =
    &["vic", "jct", "mt", "ft", "pt", "sta", "st", "co", "is", "cr"];

const UNEXPECTED_COUNTRY_WORDS: &[&str] = &["india", "uk", "united kingdom", "canada"];

#[rustfmt::skip]
const US_STATES: &[(&str, &str)] = &[
    ("alabama", "AL"), ("alaska", "AK"), ("arizona", "AZ"), ("arkansas", "AR"),
    ("california", "CA"), ("colorado", "CO"), ("connecticut", "CT"), ("delaware", "DE"),
    ("district of columbia", "DC"), ("florida", "FL"), ("georgia", "GA"), ("hawaii", "HI"),
    ("idaho", "ID"), ("illinois", "IL"), ("indiana", "IN"), ("iowa", "IA"),
    ("kansas", "KS"), ("kentucky", "KY"), ("louisiana", "LA"), ("maine", "ME"),
    ("maryland", "MD"), ("massachusetts", "MA"), ("michigan", "MI"), ("minnesota", "MN"),
    ("mississippi", "MS"), ("missouri", "MO"), ("montana", "MT"), ("nebraska", "NE"),
    ("nevada", "NV"), ("new hampshire", "NH"), ("new jersey", "NJ"), ("new mexico", "NM"),
    ("new york", "NY"), ("north carolina", "NC"), ("north dakota", "ND"), ("ohio", "OH"),
    ("oklahoma", "OK"), ("oregon", "OR"), ("pennsylvania", "PA"), ("rhode island", "RI"),
    ("south carolina", "SC"), ("south dakota", "SD"), ("tennessee", "TN"), ("texas", "TX"),
    ("utah", "UT"), ("vermont", "VT"), ("virginia", "VA"), ("washington", "WA"),
    ("west virginia", "WV"), ("wisconsin", "WI"), ("wyoming", "WY"),
];

/// Case-insensitive, word-bounded alternation over a keyword list.
fn word_list(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("valid keyword regex")
}

static VAGUE_RE: LazyLock<Regex> = LazyLock::new(|| word_list(VAGUE_WORDS));
static WATER_RE: LazyLock<Regex> = LazyLock::new(|| word_list(WATER_WORDS));
static PARK_RE: LazyLock<Regex> = LazyLock::new(|| word_list(PARK_WORDS));
static COUNTRY_RE: LazyLock<Regex> = LazyLock::new(|| word_list(UNEXPECTED_COUNTRY_WORDS));
static US_RE: LazyLock<Regex> = LazyLock::new(|| word_list(&["usa", "united states"]));

static SINGLE_LETTER_ABBREV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[\s,;(/])[a-z]\.").expect("valid abbreviation regex"));

static LISTED_ABBREV_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = AMBIGUOUS_ABBREVIATIONS.join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\.", alternation)).expect("valid abbreviation regex")
});

static MULTI_COUNTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/|\bor\b").expect("valid county regex"));

// ─── Classification ─────────────────────────────────────────────

struct Flags {
    status: FlagStatus,
    reasons: Vec<String>,
}

impl Flags {
    fn new() -> Self {
        Self {
            status: FlagStatus::Ok,
            reasons: Vec::new(),
        }
    }

    fn raise(&mut self, tier: FlagStatus, reason: impl Into<String>) {
        self.status = self.status.max(tier);
        self.reasons.push(reason.into());
    }

    fn warn(&mut self, reason: impl Into<String>) {
        self.raise(FlagStatus::Warning, reason);
    }

    fn review(&mut self, reason: impl Into<String>) {
        self.raise(FlagStatus::Review, reason);
    }

    fn finish(self) -> FlagResult {
        FlagResult {
            status: self.status,
            reasons: self.reasons,
        }
    }
}

/// Assign a quality flag to one row.
///
/// `geocode` is the resolver's answer, if any. `offset` is the directional
/// offset parsed from the locality text, if any.
pub fn classify(
    record: &LocationRecord,
    geocode: Option<&GeocodeResult>,
    offset: Option<&OffsetSpec>,
) -> FlagResult {
    let mut flags = Flags::new();

    let precise = record.precise_location.as_str();
    let city = record.city.as_str();
    let location_text = format!("{} {}", precise, city).trim().to_string();

    // Warning tier
    if !record.has_state() {
        flags.warn(MISSING_STATE);
    }
    if (record.has_county() || record.has_state()) && record.is_county_state_only() {
        flags.warn(COUNTY_STATE_ONLY);
    }
    if geocode.is_none() && !record.has_coordinates() {
        flags.warn(NO_COORDINATES);
    }

    // Review tier: text heuristics
    if offset.is_some() {
        flags.review(OFFSET_DETECTED);
    } else if has_bare_offset(precise) {
        flags.review(BARE_OFFSET);
    }
    if VAGUE_RE.is_match(precise) {
        flags.review(VAGUE_REFERENCE);
    }
    if WATER_RE.is_match(&location_text) {
        flags.review(WATER_FEATURE);
    }
    if PARK_RE.is_match(&location_text) {
        if location_text.split_whitespace().count() <= 3 {
            flags.review(PARK_NAME_ONLY);
        } else {
            flags.review(PARK_WITH_DETAIL);
        }
    }
    if is_abbreviated(precise) || is_abbreviated(city) {
        flags.review(ABBREVIATED);
    } else if is_acronym(precise) {
        flags.review(ACRONYM);
    }
    if MULTI_COUNTY_RE.is_match(&record.county) {
        flags.review(MULTIPLE_COUNTIES);
    }
    if precise.contains(['(', ')', '[', ']']) {
        flags.review(PARENTHETICAL);
    }

    // Post-geocode consistency
    if let Some(result) = geocode {
        if result.location_type == LocationType::GeometricCenter {
            flags.review(GEOMETRIC_CENTER);
        }
        if let Some(expected) = state_mismatch(&record.province_state, &result.formatted_address) {
            flags.warn(format!("state mismatch (expected {})", expected));
        }
        if is_unexpected_country(&result.formatted_address) {
            flags.warn(UNEXPECTED_COUNTRY);
        }
    }

    flags.finish()
}

fn is_abbreviated(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    SINGLE_LETTER_ABBREV_RE.is_match(text)
        || LISTED_ABBREV_RE.is_match(text)
        || (text.chars().count() <= 6 && text.contains('.'))
}

/// Short all-caps text such as "ISB" or "UCR".
fn is_acronym(text: &str) -> bool {
    let text = text.trim();
    text.chars().count() <= 4
        && text.chars().any(char::is_alphabetic)
        && !text.chars().any(char::is_lowercase)
}

/// Returns the expected state when a US state was given but the resolver's
/// address mentions neither its name nor its postal code.
fn state_mismatch<'a>(expected: &'a str, formatted_address: &str) -> Option<&'a str> {
    let expected = expected.trim();
    if expected.is_empty() || formatted_address.trim().is_empty() {
        return None;
    }

    let lower = expected.to_lowercase();
    let (name, code) = US_STATES
        .iter()
        .find(|(name, code)| *name == lower || code.eq_ignore_ascii_case(&lower))?;

    let address_lower = formatted_address.to_lowercase();
    let name_found = address_lower.contains(name);
    let code_found = formatted_address
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token.eq_ignore_ascii_case(code));

    if name_found || code_found {
        None
    } else {
        Some(expected)
    }
}

fn is_unexpected_country(formatted_address: &str) -> bool {
    COUNTRY_RE.is_match(formatted_address) && !US_RE.is_match(formatted_address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::parse_offset;

    fn record(state: &str, county: &str, city: &str, precise: &str) -> LocationRecord {
        LocationRecord {
            province_state: state.into(),
            county: county.into(),
            city: city.into(),
            precise_location: precise.into(),
            ..Default::default()
        }
    }

    fn geocoded(address: &str, location_type: LocationType) -> GeocodeResult {
        GeocodeResult {
            latitude: 33.24,
            longitude: -115.52,
            formatted_address: address.into(),
            location_type,
        }
    }

    #[test]
    fn test_offset_row_is_review() {
        let r = record("California", "Imperial County", "", "5mi NW of Niland");
        let offset = parse_offset(&r.precise_location);
        let g = geocoded("Niland, CA 92257, USA", LocationType::Approximate);
        let flag = classify(&r, Some(&g), offset.as_ref());
        assert_eq!(flag.status, FlagStatus::Review);
        assert!(flag.has_reason("directional offset detected"));
    }

    #[test]
    fn test_missing_state_and_city_is_warning() {
        let r = record("", "Imperial County", "", "");
        let flag = classify(&r, None, None);
        assert_eq!(flag.status, FlagStatus::Warning);
        assert!(flag.has_reason("missing state"));
        assert!(flag.has_reason("no city"));
    }

    #[test]
    fn test_clean_row_is_ok() {
        let r = record("California", "Imperial County", "Brawley", "");
        let g = geocoded("Brawley, CA 92227, USA", LocationType::Approximate);
        let flag = classify(&r, Some(&g), None);
        assert_eq!(flag.status, FlagStatus::Ok);
        assert!(flag.reasons.is_empty());
        assert_eq!(flag.reason(), "");
    }

    #[test]
    fn test_vague_reference() {
        let r = record("California", "Imperial County", "Niland", "near the old mill");
        let g = geocoded("Niland, CA, USA", LocationType::Approximate);
        let flag = classify(&r, Some(&g), parse_offset(&r.precise_location).as_ref());
        assert_eq!(flag.status, FlagStatus::Review);
        assert!(flag.has_reason("vague reference"));
        assert!(!flag.has_reason("directional offset"));
    }

    #[test]
    fn test_vicinity_of_and_vic() {
        let g = geocoded("Niland, CA, USA", LocationType::Approximate);
        for text in ["vicinity of Niland", "Vic. Niland", "BEHIND the school"] {
            let r = record("California", "", "Niland", text);
            assert!(classify(&r, Some(&g), None).has_reason("vague reference"), "{}", text);
        }
    }

    #[test]
    fn test_water_feature_case_insensitive() {
        let r = record("California", "", "", "Alamo RIVER crossing");
        let g = geocoded("Alamo River, CA, USA", LocationType::Approximate);
        let flag = classify(&r, Some(&g), None);
        assert_eq!(flag.status, FlagStatus::Review);
        assert!(flag.has_reason("water feature"));
    }

    #[test]
    fn test_water_word_needs_boundary() {
        let r = record("California", "", "Lakewood", "");
        let g = geocoded("Lakewood, CA, USA", LocationType::Approximate);
        assert!(!classify(&r, Some(&g), None).has_reason("water feature"));
    }

    #[test]
    fn test_park_name_only_vs_detail() {
        let g = geocoded("CA, USA", LocationType::Approximate);

        let r = record("California", "", "", "Anza-Borrego State Park");
        let flag = classify(&r, Some(&g), None);
        assert!(flag.reasons.contains(&PARK_NAME_ONLY.to_string()));

        let r = record("California", "", "", "Palm Canyon trail inside Anza-Borrego State Park");
        let flag = classify(&r, Some(&g), None);
        assert!(flag.reasons.contains(&PARK_WITH_DETAIL.to_string()));
    }

    #[test]
    fn test_multiple_review_reasons_retained() {
        let r = record(
            "California",
            "Imperial County",
            "",
            "near Salton Sea shore, wildlife refuge",
        );
        let g = geocoded("Salton Sea, CA, USA", LocationType::Approximate);
        let flag = classify(&r, Some(&g), None);
        assert_eq!(flag.status, FlagStatus::Review);
        assert!(flag.has_reason("vague reference"));
        assert!(flag.has_reason("water feature"));
        assert!(flag.has_reason("park/natural area"));
        assert_eq!(flag.reason().matches("; ").count(), flag.reasons.len() - 1);
    }

    #[test]
    fn test_warning_dominates_review() {
        let r = record("", "", "", "5mi NW of Niland, near creek (old road)");
        let offset = parse_offset(&r.precise_location);
        let g = geocoded("Niland, CA, USA", LocationType::GeometricCenter);
        let flag = classify(&r, Some(&g), offset.as_ref());
        assert_eq!(flag.status, FlagStatus::Warning);
        assert!(flag.has_reason("missing state"));
        assert!(flag.has_reason("directional offset"));
        assert!(flag.has_reason("parenthetical"));
        assert!(flag.has_reason("geometric center"));
    }

    #[test]
    fn test_abbreviations() {
        let g = geocoded("CA, USA", LocationType::Approximate);
        for text in ["I.S.B.", "R. Road crossing", "Mt. Signal", "Jct. Hwy 78 and 111"] {
            let r = record("California", "", "", text);
            assert!(classify(&r, Some(&g), None).has_reason("abbreviated"), "{}", text);
        }
        let r = record("California", "", "Ft. Yuma", "");
        assert!(classify(&r, Some(&g), None).has_reason("abbreviated"));

        let r = record("California", "", "Brawley", "Highway 86 bridge");
        assert!(!classify(&r, Some(&g), None).has_reason("abbreviated"));
    }

    #[test]
    fn test_short_acronym_is_review() {
        let g = geocoded("Riverside, CA, USA", LocationType::Approximate);
        for text in ["ISB", "UCR"] {
            let r = record("California", "", "", text);
            let flag = classify(&r, Some(&g), None);
            assert_eq!(flag.status, FlagStatus::Review, "{}", text);
            assert!(flag.has_reason("acronym"), "{}", text);
        }
        for text in ["Yuma", "1234", "CHOCOLATE MTNS"] {
            let r = record("California", "", "", text);
            assert!(!classify(&r, Some(&g), None).has_reason("acronym"), "{}", text);
        }
    }

    #[test]
    fn test_bare_offset_flagged() {
        let r = record("California", "", "Niland", "10 mi E");
        let g = geocoded("Niland, CA, USA", LocationType::Approximate);
        let flag = classify(&r, Some(&g), None);
        assert!(flag.has_reason("without reference point"));
    }

    #[test]
    fn test_multiple_counties() {
        let r = record("California", "Imperial / Riverside", "Mecca", "");
        let g = geocoded("Mecca, CA, USA", LocationType::Approximate);
        assert!(classify(&r, Some(&g), None).has_reason("multiple counties"));
    }

    #[test]
    fn test_no_coordinates_is_warning() {
        let r = record("California", "Imperial County", "Brawley", "");
        let flag = classify(&r, None, None);
        assert_eq!(flag.status, FlagStatus::Warning);
        assert!(flag.has_reason("no coordinates"));
    }

    #[test]
    fn test_supplied_coordinates_not_missing() {
        let mut r = record("California", "Imperial County", "Brawley", "");
        r.latitude = Some(33.1);
        r.longitude = Some(-115.5);
        let flag = classify(&r, None, None);
        assert_eq!(flag.status, FlagStatus::Ok);
    }

    #[test]
    fn test_state_mismatch() {
        let r = record("California", "", "Niland", "");
        let g = geocoded("Niland, AZ 85000, USA", LocationType::Approximate);
        let flag = classify(&r, Some(&g), None);
        assert_eq!(flag.status, FlagStatus::Warning);
        assert!(flag.has_reason("state mismatch (expected California)"));
    }

    #[test]
    fn test_state_abbreviation_matches() {
        assert_eq!(state_mismatch("California", "Niland, CA 92257, USA"), None);
        assert_eq!(state_mismatch("CA", "Niland, California, USA"), None);
        assert_eq!(state_mismatch("ca", "Calipatria, NV, USA"), Some("ca"));
        // Non-US regions are not checked.
        assert_eq!(state_mismatch("Sonora", "Hermosillo, Son., Mexico"), None);
    }

    #[test]
    fn test_unexpected_country() {
        assert!(is_unexpected_country("Niland, Ontario, Canada"));
        assert!(!is_unexpected_country("Canada Creek, MI, USA"));
        assert!(!is_unexpected_country("Dukes, FL, United States"));
        assert!(!is_unexpected_country("Dukeville, NC"));
    }

    #[test]
    fn test_status_ordering() {
        assert!(FlagStatus::Warning > FlagStatus::Review);
        assert!(FlagStatus::Review > FlagStatus::Ok);
        assert_eq!(FlagStatus::Review.to_string(), "REVIEW");
    }
}
