//! Input locality records.

/// One input row's location fields. Text fields are trimmed; absent
/// columns read as empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationRecord {
    pub province_state: String,
    pub county: String,
    pub city: String,
    /// The `prec_location` column: free-text locality as written on the label.
    pub precise_location: String,
    /// Optional `country` column.
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationRecord {
    /// Pre-supplied coordinates, if both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }

    pub fn has_state(&self) -> bool {
        !self.province_state.is_empty()
    }

    pub fn has_county(&self) -> bool {
        !self.county.is_empty()
    }

    pub fn has_city(&self) -> bool {
        !self.city.is_empty()
    }

    pub fn has_precise_location(&self) -> bool {
        !self.precise_location.is_empty()
    }

    /// Nothing finer than county or state: no city and no locality text.
    pub fn is_county_state_only(&self) -> bool {
        !self.has_city() && !self.has_precise_location()
    }
}

/// Parse a coordinate cell. Blank or non-numeric text counts as absent.
pub fn parse_coordinate(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
