//! Case-insensitive natural ordering for directory listings.
//!
//! Listing order decides bundle concatenation order, so it must be stable
//! and match the classic `strnatcasecmp` rules byte for byte:
//!
//! - `file2` sorts before `file10`
//! - ASCII letters fold to upper case, so `_` sorts after letters
//! - leading zeros are skipped only at the start of a name
//! - a digit run starting with `0` elsewhere compares digit by digit, so
//!   `file010` sorts before `file9`
//! - runs of whitespace are skipped
//!
//! Names that compare equal fall back to a byte comparison.

use std::cmp::Ordering;

/// Compare two names using case-insensitive natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_cmp_bytes(a.as_bytes(), b.as_bytes()).then_with(|| a.cmp(b))
}

/// Sort names in place using [`natural_cmp`].
pub fn sort_natural(names: &mut [String]) {
    names.sort_by(|a, b| natural_cmp(a, b));
}

fn natural_cmp_bytes(a: &[u8], b: &[u8]) -> Ordering {
    if a.is_empty() || b.is_empty() {
        return a.len().cmp(&b.len());
    }

    let mut i = skip_leading_zeros(a);
    let mut j = skip_leading_zeros(b);

    loop {
        while is_space(byte(a, i)) {
            i += 1;
        }
        while is_space(byte(b, j)) {
            j += 1;
        }

        if byte(a, i).is_ascii_digit() && byte(b, j).is_ascii_digit() {
            let ord = if byte(a, i) == b'0' || byte(b, j) == b'0' {
                compare_left(a, &mut i, b, &mut j)
            } else {
                compare_right(a, &mut i, b, &mut j)
            };
            if ord != Ordering::Equal {
                return ord;
            }
            match (i >= a.len(), j >= b.len()) {
                (true, true) => return Ordering::Equal,
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                // Compare the bytes after the runs
                (false, false) => {}
            }
        }

        let ca = byte(a, i).to_ascii_uppercase();
        let cb = byte(b, j).to_ascii_uppercase();
        if ca != cb {
            return ca.cmp(&cb);
        }

        i += 1;
        j += 1;
        match (i >= a.len(), j >= b.len()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
    }
}

/// Byte at `i`, or `0` past the end.
fn byte(s: &[u8], i: usize) -> u8 {
    s.get(i).copied().unwrap_or(0)
}

/// C `isspace`: space, `\t`, `\n`, `\v`, `\f`, `\r`.
fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t'..=b'\r')
}

fn is_digit_at(s: &[u8], i: usize) -> bool {
    byte(s, i).is_ascii_digit()
}

/// Index of the first byte after leading zeros that precede another digit.
fn skip_leading_zeros(s: &[u8]) -> usize {
    let mut i = 0;
    while byte(s, i) == b'0' && is_digit_at(s, i + 1) {
        i += 1;
    }
    i
}

/// Left-aligned runs: the first differing digit wins.
fn compare_left(a: &[u8], i: &mut usize, b: &[u8], j: &mut usize) -> Ordering {
    loop {
        match (is_digit_at(a, *i), is_digit_at(b, *j)) {
            (false, false) => return Ordering::Equal,
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            (true, true) => {
                let ord = a[*i].cmp(&b[*j]);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
        *i += 1;
        *j += 1;
    }
}

/// Right-aligned runs: the longer run wins, otherwise the first differing
/// digit.
fn compare_right(a: &[u8], i: &mut usize, b: &[u8], j: &mut usize) -> Ordering {
    let mut bias = Ordering::Equal;
    loop {
        match (is_digit_at(a, *i), is_digit_at(b, *j)) {
            (false, false) => return bias,
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            (true, true) => {
                if bias == Ordering::Equal {
                    bias = a[*i].cmp(&b[*j]);
                }
            }
        }
        *i += 1;
        *j += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| (*s).to_owned()).collect();
        sort_natural(&mut names);
        names
    }

    #[test]
    fn test_numbers_sort_by_value() {
        assert_eq!(
            sorted(&["file10.js", "file2.js", "file1.js"]),
            vec!["file1.js", "file2.js", "file10.js"]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(sorted(&["b.css", "A.css", "c.css"]), vec!["A.css", "b.css", "c.css"]);
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(natural_cmp("1-a", "01-b"), Ordering::Less);
        assert_eq!(natural_cmp("002", "10"), Ordering::Less);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(natural_cmp("app", "app.js"), Ordering::Less);
    }

    #[test]
    fn test_ties_are_deterministic() {
        assert_eq!(natural_cmp("File", "file"), Ordering::Less);
        assert_eq!(natural_cmp("file", "file"), Ordering::Equal);
    }

    #[test]
    fn test_punctuation_sorts_after_letters() {
        assert_eq!(sorted(&["a_b.js", "ab.js"]), vec!["ab.js", "a_b.js"]);
        assert_eq!(natural_cmp("a-b", "ab"), Ordering::Less);
    }

    #[test]
    fn test_zero_padded_runs_compare_digit_by_digit() {
        assert_eq!(sorted(&["file9.js", "file010.js"]), vec!["file010.js", "file9.js"]);
        assert_eq!(natural_cmp("file01", "file1"), Ordering::Less);
    }

    #[test]
    fn test_whitespace_runs_skipped() {
        assert_eq!(natural_cmp("a  b", "a b"), Ordering::Less);
        assert_eq!(natural_cmp_bytes(b"a  b", b"a b"), Ordering::Equal);
    }

    #[test]
    fn test_empty_names() {
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
        assert_eq!(natural_cmp("", ""), Ordering::Equal);
    }

    #[test]
    fn test_mixed_segments() {
        assert_eq!(
            sorted(&["v1.10.js", "v1.9.js", "v1.2.js"]),
            vec!["v1.2.js", "v1.9.js", "v1.10.js"]
        );
    }
}
