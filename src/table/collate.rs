//! String orderings used by the table engine and the leaderboard.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercased characters with diacritics stripped: "Émile" -> "emile".
fn base_chars(s: &str) -> Vec<char> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Locale-style ordering. Base letters decide first (case and accents
/// ignored), then unaccented before accented, then lowercase before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let primary = base_chars(a).cmp(&base_chars(b));
    if primary != Ordering::Equal {
        return primary;
    }

    let accented = a
        .nfd()
        .flat_map(char::to_lowercase)
        .cmp(b.nfd().flat_map(char::to_lowercase));
    if accented != Ordering::Equal {
        return accented;
    }

    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            return match (ca.is_lowercase(), cb.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => ca.cmp(&cb),
            };
        }
    }
    a.len().cmp(&b.len())
}

/// Numeric-aware ordering on base letters: digit runs compare by value,
/// everything else ignoring case and accents. "item 2" < "item 10";
/// "Abc" == "abc"; "café" == "cafe".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = base_chars(a);
    let b = base_chars(b);
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let si = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let sj = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let ord = cmp_digit_runs(&a[si..i], &b[sj..j]);
            if ord != Ordering::Equal {
                return ord;
            }
            continue;
        }

        let ord = a[i].cmp(&b[j]);
        if ord != Ordering::Equal {
            return ord;
        }
        i += 1;
        j += 1;
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn cmp_digit_runs(a: &[char], b: &[char]) -> Ordering {
    let trim = |run: &[char]| -> usize { run.iter().take_while(|c| **c == '0').count() };
    let a = &a[trim(a)..];
    let b = &b[trim(b)..];
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_cmp_is_case_insensitive_first() {
        assert_eq!(locale_cmp("alice", "Bob"), Ordering::Less);
        assert_eq!(locale_cmp("Bob", "alice"), Ordering::Greater);
        assert_eq!(locale_cmp("Zed", "zebra"), Ordering::Greater);
    }

    #[test]
    fn test_locale_cmp_splits_case_ties() {
        assert_eq!(locale_cmp("alice", "Alice"), Ordering::Less);
        assert_eq!(locale_cmp("Alice", "alice"), Ordering::Greater);
        assert_eq!(locale_cmp("Alice", "Alice"), Ordering::Equal);
    }

    #[test]
    fn test_locale_cmp_folds_accents() {
        assert_eq!(locale_cmp("Émile", "Zoe"), Ordering::Less);
        assert_eq!(locale_cmp("Élodie", "Eloise"), Ordering::Less);
        assert_eq!(locale_cmp("Ana", "Ángel"), Ordering::Less);
        assert_eq!(locale_cmp("Rene", "René"), Ordering::Less);
        assert_eq!(locale_cmp("René", "Rene"), Ordering::Greater);
        assert_eq!(locale_cmp("rené", "René"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_numbers() {
        assert_eq!(natural_cmp("item 2", "item 10"), Ordering::Less);
        assert_eq!(natural_cmp("P10", "P9"), Ordering::Greater);
        assert_eq!(natural_cmp("007", "7"), Ordering::Equal);
    }

    #[test]
    fn test_natural_cmp_ignores_case() {
        assert_eq!(natural_cmp("Open", "open"), Ordering::Equal);
        assert_eq!(natural_cmp("closed", "Open"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_ignores_accents() {
        assert_eq!(natural_cmp("élan", "eve"), Ordering::Less);
        assert_eq!(natural_cmp("café", "CAFE"), Ordering::Equal);
        assert_eq!(natural_cmp("Zoë 2", "zoe 10"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_prefix() {
        assert_eq!(natural_cmp("abc", "abcd"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }
}
