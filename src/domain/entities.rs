//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parent code carried by every province row.
pub const ROOT_PARENT_CODE: &str = "0";

/// One of the four fixed levels of the division hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Province,
    City,
    Area,
    Street,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Province, Level::City, Level::Area, Level::Street];

    /// Depth of a node at this level, provinces are 1.
    pub fn depth(self) -> i32 {
        match self {
            Level::Province => 1,
            Level::City => 2,
            Level::Area => 3,
            Level::Street => 4,
        }
    }

    /// Number of leading code characters identifying this level.
    pub fn prefix_len(self) -> usize {
        match self {
            Level::Province => 2,
            Level::City => 4,
            Level::Area | Level::Street => 6,
        }
    }

    /// Level directly above this one, None for provinces.
    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Province => None,
            Level::City => Some(Level::Province),
            Level::Area => Some(Level::City),
            Level::Street => Some(Level::Area),
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Level::Province => "provinces",
            Level::City => "cities",
            Level::Area => "areas",
            Level::Street => "streets",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Province => "province",
            Level::City => "city",
            Level::Area => "area",
            Level::Street => "street",
        };
        f.write_str(name)
    }
}

/// A record as delivered by the dataset, before any hierarchy is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent_code: String,
}

impl FlatRecord {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        parent_code: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            parent_code: parent_code.into(),
        }
    }
}

/// The four record collections, each in original file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub provinces: Vec<FlatRecord>,
    pub cities: Vec<FlatRecord>,
    pub areas: Vec<FlatRecord>,
    pub streets: Vec<FlatRecord>,
}

impl RecordSet {
    pub fn level(&self, level: Level) -> &[FlatRecord] {
        match level {
            Level::Province => &self.provinces,
            Level::City => &self.cities,
            Level::Area => &self.areas,
            Level::Street => &self.streets,
        }
    }

    pub fn level_mut(&mut self, level: Level) -> &mut Vec<FlatRecord> {
        match level {
            Level::Province => &mut self.provinces,
            Level::City => &mut self.cities,
            Level::Area => &mut self.areas,
            Level::Street => &mut self.streets,
        }
    }

    pub fn len(&self) -> usize {
        Level::ALL.iter().map(|&l| self.level(l).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload of a forest node. `left`, `right` and `depth` stay 0 until indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaData {
    pub code: String,
    pub name: String,
    pub parent_code: String,
    pub level: Level,
    pub left: i32,
    pub right: i32,
    pub depth: i32,
}

impl AreaData {
    /// Node payload for `record`. `parent_code` is the code of the node it is
    /// attached to, None for provinces which get [`ROOT_PARENT_CODE`].
    pub fn from_record(record: &FlatRecord, level: Level, parent_code: Option<&str>) -> Self {
        let parent_code = parent_code.unwrap_or(ROOT_PARENT_CODE).to_string();
        Self {
            code: record.code.clone(),
            name: record.name.clone(),
            parent_code,
            level,
            left: 0,
            right: 0,
            depth: 0,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.left > 0 && self.right > self.left
    }

    /// True if `other` lies strictly inside this node's range.
    pub fn contains(&self, other: &AreaData) -> bool {
        self.left < other.left && other.right < self.right
    }

    pub fn to_row(&self) -> NestedRow {
        NestedRow {
            code: self.code.clone(),
            name: self.name.clone(),
            parent_code: self.parent_code.clone(),
            depth: self.depth,
            left: self.left,
            right: self.right,
        }
    }
}

impl fmt::Display for AreaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.name)
    }
}

/// One emitted table row of the nested-set encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedRow {
    pub code: String,
    pub name: String,
    pub parent_code: String,
    pub depth: i32,
    pub left: i32,
    pub right: i32,
}
