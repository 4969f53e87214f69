use crate::pattern::code::{Code, MAX_CODE_LEN, MIN_CODE_LEN};
use crate::pattern::grid::{self, Point, MAX_POINT, MIN_POINT};
use serde::Serialize;

/// Number of legal codes on the 3x3 grid.
pub const TOTAL_CODES: usize = 389_112;

/// Enumerate every legal code.
///
/// Depth-first from each start point in ascending order, trying next points
/// in ascending order, recording a code at every node of length >= 4. The
/// result is therefore sorted like the digit strings.
pub fn generate_codes() -> Vec<Code> {
    let mut codes = Vec::with_capacity(TOTAL_CODES);
    let mut path: Vec<Point> = Vec::with_capacity(MAX_CODE_LEN);
    // resume[d] is the next point to try when extending a path of length d + 1
    let mut resume: Vec<Point> = Vec::with_capacity(MAX_CODE_LEN);

    for start in MIN_POINT..=MAX_POINT {
        path.push(start);
        resume.push(MIN_POINT);

        while let Some(&from) = resume.last() {
            if path.len() == MAX_CODE_LEN {
                resume.pop();
                path.pop();
                continue;
            }

            match (from..=MAX_POINT).find(|&p| grid::is_valid_move(&path, p)) {
                Some(next) => {
                    if let Some(slot) = resume.last_mut() {
                        *slot = next + 1;
                    }
                    path.push(next);
                    if path.len() >= MIN_CODE_LEN {
                        codes.push(Code::from_path_unchecked(&path));
                    }
                    resume.push(MIN_POINT);
                }
                None => {
                    resume.pop();
                    path.pop();
                }
            }
        }
    }

    codes
}

/// The immutable, ordered set of candidates for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    codes: Vec<Code>,
    // strictly ascending, so lookups can binary search
    sorted: bool,
}

impl CandidatePool {
    /// Generate the full pool.
    pub fn generate() -> Self {
        Self::from_codes(generate_codes())
    }

    /// Wrap an explicit list of codes, kept in the given order.
    pub fn from_codes(codes: Vec<Code>) -> Self {
        let sorted = codes.windows(2).all(|w| w[0] < w[1]);
        Self { codes, sorted }
    }

    /// Whether the codes are in strictly ascending order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Code> {
        self.codes.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Code> + '_ {
        self.codes.iter()
    }

    pub fn as_slice(&self) -> &[Code] {
        &self.codes
    }

    /// Index of `code`, if present.
    pub fn position(&self, code: &Code) -> Option<usize> {
        if self.sorted {
            self.codes.binary_search(code).ok()
        } else {
            self.codes.iter().position(|c| c == code)
        }
    }

    pub fn stats(&self) -> PoolStats {
        let mut by_length = [0usize; MAX_CODE_LEN - MIN_CODE_LEN + 1];
        for code in &self.codes {
            by_length[code.len() - MIN_CODE_LEN] += 1;
        }
        PoolStats {
            total: self.codes.len(),
            by_length,
        }
    }
}

/// Code counts per length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: usize,
    /// Index 0 holds length 4, index 5 holds length 9.
    pub by_length: [usize; MAX_CODE_LEN - MIN_CODE_LEN + 1],
}

impl PoolStats {
    pub fn count_for(&self, len: usize) -> usize {
        if (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
            self.by_length[len - MIN_CODE_LEN]
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pool_size_and_length_counts() {
        let pool = CandidatePool::generate();
        assert_eq!(pool.len(), TOTAL_CODES);

        let stats = pool.stats();
        assert_eq!(
            stats.by_length,
            [1_624, 7_152, 26_016, 72_912, 140_704, 140_704]
        );
        assert_eq!(stats.count_for(3), 0);
    }

    #[test]
    fn test_pool_order_head_and_tail() {
        let pool = CandidatePool::generate();
        let head: Vec<String> = pool.iter().take(9).map(|c| c.to_string()).collect();
        assert_eq!(
            head,
            vec![
                "1234",
                "12345",
                "123456",
                "1234567",
                "12345678",
                "123456789",
                "1234568",
                "12345687",
                "123456879",
            ]
        );
        assert_eq!(pool.get(pool.len() - 1).unwrap().to_string(), "987654321");
    }

    #[test]
    fn test_position_lookup() {
        let pool = CandidatePool::generate();
        let code = Code::parse("5123").unwrap();
        let index = pool.position(&code).unwrap();
        assert_eq!(pool.get(index), Some(code));

        let small = CandidatePool::from_codes(vec![
            Code::parse("9876").unwrap(),
            Code::parse("1234").unwrap(),
        ]);
        assert_eq!(small.position(&Code::parse("1234").unwrap()), Some(1));
        assert_eq!(small.position(&Code::parse("4321").unwrap()), None);
    }

    #[test]
    fn test_sorted_flag_computed_once() {
        assert!(CandidatePool::generate().is_sorted());

        let codes: Vec<Code> = ["1236", "1235", "1234"]
            .iter()
            .map(|s| Code::parse(s).unwrap())
            .collect();
        let reversed = CandidatePool::from_codes(codes.clone());
        assert!(!reversed.is_sorted());
        assert_eq!(reversed.position(&codes[2]), Some(2));

        let mut ascending = codes;
        ascending.reverse();
        let ascending = CandidatePool::from_codes(ascending);
        assert!(ascending.is_sorted());
        assert_eq!(ascending.position(&Code::parse("1236").unwrap()), Some(2));
        assert_eq!(ascending.position(&Code::parse("1238").unwrap()), None);
    }
}
