//! Builds the query string sent to the geocoder from a record's fields.

use crate::offset::{parse_offset, OffsetSpec};
use crate::record::LocationRecord;

/// The text to send to the resolver, plus any offset stripped from it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledQuery {
    pub query: String,
    pub offset: Option<OffsetSpec>,
}

impl AssembledQuery {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// Assemble a most-specific-first, comma-separated query.
///
/// When the locality text is a directional offset ("5mi NW of Niland") only
/// its reference place goes into the query and the offset is returned for
/// later correction. Otherwise the locality text is used verbatim.
pub fn build_query(record: &LocationRecord) -> AssembledQuery {
    let precise = record.precise_location.trim();
    let offset = parse_offset(precise);

    let lead = match &offset {
        Some(spec) => spec.base_text.as_str(),
        None => precise,
    };

    let county = normalize_county(&record.county);
    let parts = [
        lead,
        record.city.trim(),
        county.as_str(),
        record.province_state.trim(),
        record.country.trim(),
    ];

    let query = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    AssembledQuery { query, offset }
}

/// "Imperial" → "Imperial County"; names already ending in "county" are kept.
fn normalize_county(county: &str) -> String {
    let county = county.trim();
    if county.is_empty() || county.to_lowercase().ends_with("county") {
        county.to_string()
    } else {
        format!("{} County", county)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::Direction;

    fn record(state: &str, county: &str, city: &str, precise: &str) -> LocationRecord {
        LocationRecord {
            province_state: state.into(),
            county: county.into(),
            city: city.into(),
            precise_location: precise.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_offset_strips_prefix() {
        let q = build_query(&record("California", "Imperial County", "", "5mi NW of Niland"));
        assert_eq!(q.query, "Niland, Imperial County, California");
        let offset = q.offset.unwrap();
        assert_eq!(offset.direction, Direction::NW);
        assert_eq!(offset.base_text, "Niland");
    }

    #[test]
    fn test_verbatim_when_no_offset() {
        let q = build_query(&record(
            "California",
            "Imperial County",
            "Niland",
            "near the old mill",
        ));
        assert_eq!(q.query, "near the old mill, Niland, Imperial County, California");
        assert!(q.offset.is_none());
    }

    #[test]
    fn test_unsupported_unit_kept_verbatim() {
        let q = build_query(&record("California", "", "", "8 km S of Brawley"));
        assert_eq!(q.query, "8 km S of Brawley, California");
        assert!(q.offset.is_none());
    }

    #[test]
    fn test_skips_empty_fields() {
        let q = build_query(&record("California", "", "Brawley", ""));
        assert_eq!(q.query, "Brawley, California");
    }

    #[test]
    fn test_county_suffix_added() {
        let q = build_query(&record("California", "Imperial", "Calipatria", ""));
        assert_eq!(q.query, "Calipatria, Imperial County, California");

        let q = build_query(&record("California", "imperial county", "", ""));
        assert_eq!(q.query, "imperial county, California");
    }

    #[test]
    fn test_country_appended_when_present() {
        let mut r = record("Baja California", "", "Mexicali", "");
        r.country = "Mexico".into();
        assert_eq!(build_query(&r).query, "Mexicali, Baja California, Mexico");
    }

    #[test]
    fn test_all_empty() {
        let q = build_query(&LocationRecord::default());
        assert!(q.is_empty());
        assert!(q.offset.is_none());
    }
}
