//! Properties of the generated candidate pool

use gesture_search::pattern::{generate_codes, is_valid_move, CandidatePool, MAX_CODE_LEN, MIN_CODE_LEN};
use gesture_search::{Code, TOTAL_CODES};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

#[test]
fn test_generation_is_deterministic() {
    let first = generate_codes();
    let second = generate_codes();
    assert_eq!(first.len(), second.len());
    assert!(first == second);
}

#[test]
fn test_pool_size_and_length_distribution() {
    let pool = CandidatePool::generate();
    assert_eq!(pool.len(), TOTAL_CODES);
    assert_eq!(TOTAL_CODES, 389_112);

    let stats = pool.stats();
    let counts: Vec<usize> = (MIN_CODE_LEN..=MAX_CODE_LEN)
        .map(|len| stats.count_for(len))
        .collect();
    assert_eq!(counts, vec![1624, 7152, 26016, 72912, 140704, 140704]);
}

#[test]
fn test_every_code_is_a_legal_path() {
    let pool = CandidatePool::generate();
    for code in pool.iter() {
        let path = code.path();
        assert!(
            (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&path.len()),
            "bad length: {}",
            code
        );
        assert!(path.iter().all(|p| (1..=9).contains(p)), "bad point: {}", code);

        let distinct: HashSet<_> = path.iter().collect();
        assert_eq!(distinct.len(), path.len(), "repeated point: {}", code);

        for i in 1..path.len() {
            assert!(
                is_valid_move(&path[..i], path[i]),
                "illegal step {} in {}",
                i,
                code
            );
        }
    }
}

#[test]
fn test_pool_has_no_duplicates() {
    let pool = CandidatePool::generate();
    let unique: HashSet<Code> = pool.iter().copied().collect();
    assert_eq!(unique.len(), pool.len());
}

#[test]
fn test_pool_order_is_depth_first() {
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
    assert_eq!(pool.get(56).map(|c| c.to_string()).as_deref(), Some("123475689"));
    assert_eq!(pool.get(pool.len() - 1).map(|c| c.to_string()).as_deref(), Some("987654321"));

    // Depth-first order from ascending start points is lexicographic.
    assert!(pool.as_slice().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_jump_codes_are_excluded() {
    let pool = CandidatePool::generate();
    let rendered: HashSet<String> = pool.iter().map(|c| c.to_string()).collect();
    for illegal in ["1379", "4612", "2817", "9137"] {
        assert!(!rendered.contains(illegal), "{} should not be in the pool", illegal);
        assert!(Code::parse(illegal).is_err());
    }

    let legal = Code::parse("2138").unwrap();
    assert!(rendered.contains("2138"));
    assert!(pool.position(&legal).is_some());
}
