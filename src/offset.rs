//! Directional offset parsing for locality text.
//!
//! Specimen labels often describe a point relative to a named place:
//! "5mi NW of Niland", "3.5 miles south of Brawley". This module pulls the
//! distance, compass direction and reference text apart so the reference
//! can be geocoded on its own and the offset applied afterwards.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// One of the 16 compass points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl Direction {
    /// All points in clockwise order starting at north.
    pub const ALL: [Direction; 16] = [
        Self::N,
        Self::NNE,
        Self::NE,
        Self::ENE,
        Self::E,
        Self::ESE,
        Self::SE,
        Self::SSE,
        Self::S,
        Self::SSW,
        Self::SW,
        Self::WSW,
        Self::W,
        Self::WNW,
        Self::NW,
        Self::NNW,
    ];

    /// Bearing in degrees clockwise from true north.
    pub fn bearing(self) -> f64 {
        match self {
            Self::N => 0.0,
            Self::NNE => 22.5,
            Self::NE => 45.0,
            Self::ENE => 67.5,
            Self::E => 90.0,
            Self::ESE => 112.5,
            Self::SE => 135.0,
            Self::SSE => 157.5,
            Self::S => 180.0,
            Self::SSW => 202.5,
            Self::SW => 225.0,
            Self::WSW => 247.5,
            Self::W => 270.0,
            Self::WNW => 292.5,
            Self::NW => 315.0,
            Self::NNW => 337.5,
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NNE => "NNE",
            Self::NE => "NE",
            Self::ENE => "ENE",
            Self::E => "E",
            Self::ESE => "ESE",
            Self::SE => "SE",
            Self::SSE => "SSE",
            Self::S => "S",
            Self::SSW => "SSW",
            Self::SW => "SW",
            Self::WSW => "WSW",
            Self::W => "W",
            Self::WNW => "WNW",
            Self::NW => "NW",
            Self::NNW => "NNW",
        }
    }

    /// The point 180° away.
    pub fn reverse(self) -> Self {
        Self::ALL[(self as usize + 8) % 16]
    }

    /// Parse an abbreviation ("nnw") or a spelled-out name ("North-West").
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
            .collect::<String>()
            .to_uppercase();

        let spelled = match normalized.as_str() {
            "NORTH" => Some(Self::N),
            "SOUTH" => Some(Self::S),
            "EAST" => Some(Self::E),
            "WEST" => Some(Self::W),
            "NORTHEAST" => Some(Self::NE),
            "NORTHWEST" => Some(Self::NW),
            "SOUTHEAST" => Some(Self::SE),
            "SOUTHWEST" => Some(Self::SW),
            _ => None,
        };

        spelled.or_else(|| {
            Self::ALL
                .iter()
                .copied()
                .find(|d| d.abbreviation() == normalized)
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Only statute miles are recognized on labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
}

/// A parsed "<distance> <unit> <direction> of <place>" phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetSpec {
    pub distance: f64,
    pub unit: DistanceUnit,
    pub direction: Direction,
    pub base_text: String,
}

impl OffsetSpec {
    pub fn distance_miles(&self) -> f64 {
        match self.unit {
            DistanceUnit::Miles => self.distance,
        }
    }

    /// Short description written to the `offset_applied` column, e.g. "5mi NW (315°)".
    pub fn describe(&self) -> String {
        format!(
            "{}mi {} ({}\u{00B0})",
            self.distance,
            self.direction,
            self.direction.bearing()
        )
    }
}

// Three-letter points come first so "NNW" never stops at "N".
const COMPASS_ALTERNATION: &str = "NNE|NNW|ENE|ESE|SSE|SSW|WSW|WNW|NE|NW|SE|SW|N|E|S|W";
const SPELLED_ALTERNATION: &str =
    r"north[\s-]?east|north[\s-]?west|south[\s-]?east|south[\s-]?west|north|south|east|west";
const DISTANCE: &str = r"(\d+(?:\.\d+)?|\.\d+)";
const MILES: &str = r"(?:miles|mile|mi)\.?";

static OFFSET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(&format!(
            r"(?i)^{DISTANCE}\s*{MILES}\s+({COMPASS_ALTERNATION})\.?\s+of\s+(.+)$"
        )),
        compile(&format!(
            r"(?i)^{DISTANCE}\s*{MILES}\s+({SPELLED_ALTERNATION})\s+of\s+(.+)$"
        )),
    ]
});

static BARE_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)\b{DISTANCE}\s*{MILES}\s+(?:{COMPASS_ALTERNATION}|{SPELLED_ALTERNATION})\.?$"
    ))
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid offset regex")
}

/// Extract a directional offset from the start of `text`.
///
/// Returns `None` when the text does not fully match one of the recognized
/// shapes. Unsupported units ("km", "m") and zero distances never match.
pub fn parse_offset(text: &str) -> Option<OffsetSpec> {
    let trimmed = text.trim();
    OFFSET_PATTERNS
        .iter()
        .find_map(|pattern| offset_from_captures(pattern, trimmed))
}

fn offset_from_captures(pattern: &Regex, text: &str) -> Option<OffsetSpec> {
    let caps = pattern.captures(text)?;

    let distance: f64 = caps.get(1)?.as_str().parse().ok()?;
    if !distance.is_finite() || distance <= 0.0 {
        return None;
    }

    let direction = Direction::from_label(caps.get(2)?.as_str())?;
    let base_text = caps.get(3)?.as_str().trim();
    if base_text.is_empty() {
        return None;
    }

    Some(OffsetSpec {
        distance,
        unit: DistanceUnit::Miles,
        direction,
        base_text: base_text.to_string(),
    })
}

/// True when the text ends in a distance and direction with no reference
/// place, as in "10 mi E".
pub fn has_bare_offset(text: &str) -> bool {
    BARE_OFFSET.is_match(text.trim())
}
