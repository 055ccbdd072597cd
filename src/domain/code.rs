//! Code resolver for fixed-width division codes.
//!
//! The leading digits of a code encode its ancestry: 2 digits name the
//! province, 4 the city and 6 the area. Ancestor keys are always normalised
//! to 6 characters by right-padding with `0`, so `"11"`, `"1100"` and
//! `"110000"` all resolve to the same province key.

use std::fmt;

use crate::domain::entities::Level;
use crate::domain::error::DomainError;

/// Width of a normalised ancestor key.
pub const KEY_WIDTH: usize = 6;

/// Take the first `len` characters of `code` and pad them to [`KEY_WIDTH`].
fn padded_prefix(code: &str, level: Level) -> Result<String, DomainError> {
    let len = level.prefix_len();
    if code.len() < len {
        return Err(DomainError::CodeTooShort {
            code: code.to_string(),
            level,
            required: len,
        });
    }
    let prefix = code
        .get(..len)
        .filter(|p| p.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| DomainError::NonNumericCode(code.to_string()))?;
    let mut key = String::with_capacity(KEY_WIDTH);
    key.push_str(prefix);
    while key.len() < KEY_WIDTH {
        key.push('0');
    }
    Ok(key)
}

/// True if `declared` names `key`, either in full or as its prefix with
/// the trailing `0` padding left off (`"11"` names `"110000"`).
pub fn names_key(declared: &str, key: &str) -> bool {
    declared.bytes().all(|b| b.is_ascii_digit())
        && key
            .strip_prefix(declared)
            .is_some_and(|rest| rest.bytes().all(|b| b == b'0'))
}

/// Key of the province containing `code`.
pub fn province_of(code: &str) -> Result<String, DomainError> {
    padded_prefix(code, Level::Province)
}

/// Key of the city containing `code`.
pub fn city_of(code: &str) -> Result<String, DomainError> {
    padded_prefix(code, Level::City)
}

/// Key of the area containing `code`.
pub fn area_of(code: &str) -> Result<String, DomainError> {
    padded_prefix(code, Level::Area)
}

/// A code split once into its ancestor keys.
///
/// Keys for levels deeper than the code's own level are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DivisionCode {
    raw: String,
    level: Level,
    province: String,
    city: Option<String>,
    area: Option<String>,
    street_suffix: Option<String>,
}

impl DivisionCode {
    /// Parse `code` as a code of `level`, resolving every ancestor key.
    pub fn parse(code: &str, level: Level) -> Result<Self, DomainError> {
        let province = province_of(code)?;
        let city = match level {
            Level::Province => None,
            _ => Some(city_of(code)?),
        };
        let area = match level {
            Level::Area | Level::Street => Some(area_of(code)?),
            _ => None,
        };
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::NonNumericCode(code.to_string()));
        }
        let street_suffix = match level {
            Level::Street => Some(code[KEY_WIDTH..].to_string()),
            _ => None,
        };
        Ok(Self {
            raw: code.to_string(),
            level,
            province,
            city,
            area,
            street_suffix,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn province(&self) -> &str {
        &self.province
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    pub fn street_suffix(&self) -> Option<&str> {
        self.street_suffix.as_deref()
    }

    /// Key identifying this code at `level`, None if `level` is deeper than the code.
    pub fn key_at(&self, level: Level) -> Option<&str> {
        match level {
            Level::Province => Some(self.province()),
            Level::City => self.city(),
            Level::Area => self.area(),
            Level::Street => (self.level == Level::Street).then_some(self.raw.as_str()),
        }
    }

    /// The key this code is registered under in its own level's lookup table.
    pub fn own_key(&self) -> &str {
        self.key_at(self.level).unwrap_or(&self.raw)
    }

    /// Key of the directly containing node, None for provinces.
    pub fn parent_key(&self) -> Option<&str> {
        self.level.parent().and_then(|parent| self.key_at(parent))
    }
}

impl fmt::Display for DivisionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
