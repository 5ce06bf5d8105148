//! Order-insensitive match of assembled tokens against canonical abbreviations.

use std::collections::HashSet;

/// First canonical abbreviation whose `_`-separated token set equals the set
/// of `tokens`.
///
/// Order and repetition are ignored: `["NO", "USER", "NO"]` matches
/// `"USER_NO"`. Blank canonical entries and an empty token list never match.
pub fn find_permutation_match<'a, S>(tokens: &[S], canonical: &'a [String]) -> Option<&'a str>
where
    S: AsRef<str>,
{
    if tokens.is_empty() {
        return None;
    }
    let wanted: HashSet<&str> = tokens.iter().map(AsRef::as_ref).collect();

    canonical
        .iter()
        .filter(|c| !c.trim().is_empty())
        .find(|c| c.split('_').collect::<HashSet<_>>() == wanted)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_set_equal_match_wins() {
        let list = canonical(&["USER_NO_X", "USER_NO", "NO_USER"]);
        assert_eq!(find_permutation_match(&["NO", "USER"], &list), Some("USER_NO"));
        assert_eq!(find_permutation_match(&["USER", "NO"], &list), Some("USER_NO"));
    }

    #[test]
    fn test_no_match_when_sets_differ() {
        let list = canonical(&["USER_NO"]);
        assert_eq!(find_permutation_match(&["NO"], &list), None);
        assert_eq!(find_permutation_match(&["USER", "NO", "DT"], &list), None);
    }

    #[test]
    fn test_repetition_collapses() {
        let list = canonical(&["USER_NO"]);
        assert_eq!(
            find_permutation_match(&["NO", "USER", "NO"], &list),
            Some("USER_NO")
        );
        let list = canonical(&["NO_NO_USER"]);
        assert_eq!(find_permutation_match(&["USER", "NO"], &list), Some("NO_NO_USER"));
    }

    #[test]
    fn test_empty_inputs_never_match() {
        let list = canonical(&["", "USER_NO"]);
        assert_eq!(find_permutation_match::<&str>(&[], &list), None);
        assert_eq!(find_permutation_match(&["USER"], &[]), None);
    }

    #[test]
    fn test_single_token_matches_single_canonical() {
        let list = canonical(&["ACNT"]);
        assert_eq!(
            find_permutation_match(&["ACNT".to_string()], &list),
            Some("ACNT")
        );
    }
}
