use crate::core::errors::{Result, SearchError};
use crate::pattern::grid::{self, Point};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const MIN_CODE_LEN: usize = 4;
pub const MAX_CODE_LEN: usize = 9;

/// A gesture code: the digit string of a legal path of 4 to 9 points.
///
/// Stored inline so a full candidate pool is one flat allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    len: u8,
    points: [Point; MAX_CODE_LEN],
}

impl Code {
    /// Build a code from a path already known to be legal.
    pub(crate) fn from_path_unchecked(path: &[Point]) -> Self {
        debug_assert!((MIN_CODE_LEN..=MAX_CODE_LEN).contains(&path.len()));
        let mut points = [0; MAX_CODE_LEN];
        points[..path.len()].copy_from_slice(path);
        Self {
            len: path.len() as u8,
            points,
        }
    }

    /// Build a code from a path, checking length and every move.
    pub fn from_path(path: &[Point]) -> Result<Self> {
        let render = || path.iter().map(|p| p.to_string()).collect::<String>();

        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&path.len()) {
            return Err(SearchError::invalid_code(
                render(),
                format!(
                    "length {} outside {}..={}",
                    path.len(),
                    MIN_CODE_LEN,
                    MAX_CODE_LEN
                ),
            ));
        }

        for i in 0..path.len() {
            if !grid::is_valid_move(&path[..i], path[i]) {
                return Err(SearchError::invalid_code(
                    render(),
                    format!("illegal move to {} at position {}", path[i], i + 1),
                ));
            }
        }

        Ok(Self::from_path_unchecked(path))
    }

    /// Parse a digit string such as `"12369"`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut path = Vec::with_capacity(MAX_CODE_LEN);
        for c in s.chars() {
            match c.to_digit(10) {
                Some(d) if d >= 1 => path.push(d as Point),
                _ => {
                    return Err(SearchError::invalid_code(
                        s,
                        format!("'{}' is not a grid point", c),
                    ))
                }
            }
        }
        Self::from_path(&path)
    }

    /// The path this code encodes.
    pub fn path(&self) -> &[Point] {
        &self.points[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Codes order like their digit strings, so a prefix sorts first.
impl Ord for Code {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path().cmp(other.path())
    }
}

impl PartialOrd for Code {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in self.path() {
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({})", self)
    }
}

impl FromStr for Code {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
