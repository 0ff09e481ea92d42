//! Additions-only diff between two options files.
//!
//! Both files are reduced to their `key = value` pairs, compared line by
//! line with a longest-common-subsequence diff, and only the lines that are
//! new in the candidate are kept. Removals are not reported.

use std::sync::OnceLock;

use regex::Regex;

fn pair_regex() -> &'static Regex {
    static PAIR: OnceLock<Regex> = OnceLock::new();
    PAIR.get_or_init(|| Regex::new(r"([^=\s]+)\s*=\s*([^=\s]+)").expect("pair regex is valid"))
}

/// Ordered `key = value` pairs found in `text`.
///
/// Lines without a pair (section headers, comments, blanks) are skipped.
pub fn parse_pairs(text: &str) -> Vec<(String, String)> {
    let re = pair_regex();
    text.lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Render pairs back into canonical `key = value` lines.
pub fn render_pairs(pairs: &[(String, String)]) -> Vec<String> {
    pairs.iter().map(|(k, v)| format!("{} = {}", k, v)).collect()
}

/// Canonical `key = value` lines of an options file.
pub fn canonical_lines(text: &str) -> Vec<String> {
    render_pairs(&parse_pairs(text))
}

/// One line of a line diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLine<'a> {
    Unchanged(&'a str),
    Added(&'a str),
    Removed(&'a str),
}

/// Line diff turning `baseline` into `candidate`.
pub fn diff_lines<'a>(baseline: &'a [String], candidate: &'a [String]) -> Vec<DiffLine<'a>> {
    let (n, m) = (baseline.len(), candidate.len());

    // lcs[i][j] = LCS length of baseline[i..] and candidate[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if baseline[i] == candidate[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut out = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if baseline[i] == candidate[j] {
            out.push(DiffLine::Unchanged(&baseline[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            out.push(DiffLine::Removed(&baseline[i]));
            i += 1;
        } else {
            out.push(DiffLine::Added(&candidate[j]));
            j += 1;
        }
    }
    out.extend(baseline[i..].iter().map(|l| DiffLine::Removed(l.as_str())));
    out.extend(candidate[j..].iter().map(|l| DiffLine::Added(l.as_str())));
    out
}

/// Lines introduced by `candidate` relative to `baseline`, newline-joined.
pub fn additions(baseline: &str, candidate: &str) -> String {
    let baseline = canonical_lines(baseline);
    let candidate = canonical_lines(candidate);
    diff_lines(&baseline, &candidate)
        .into_iter()
        .filter_map(|line| match line {
            DiffLine::Added(text) => Some(text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additions_only_reports_candidate_lines() {
        let diff = additions("a = 1\nb = 2", "a = 1\nb = 3\nc = 4");
        assert_eq!(diff, "b = 3\nc = 4");
        assert!(!diff.contains("b = 2"));
    }

    #[test]
    fn test_removed_lines_are_not_reported() {
        let diff = additions("a = 1\nb = 2\nc = 3", "a = 1\nc = 3");
        assert_eq!(diff, "");
    }

    #[test]
    fn test_empty_inputs_yield_empty_diff() {
        assert_eq!(additions("", ""), "");
        assert_eq!(additions("a = 1", ""), "");
        assert_eq!(additions("", "a = 1"), "a = 1");
    }

    #[test]
    fn test_parse_is_tolerant_of_spacing_and_noise() {
        let text = "[DBOptions]\n  max_background_jobs=4\n# comment\nwrite_buffer_size =  67108864  \n\n";
        assert_eq!(
            canonical_lines(text),
            vec!["max_background_jobs = 4", "write_buffer_size = 67108864"]
        );
    }

    #[test]
    fn test_parse_then_render_preserves_well_formed_lines() {
        let text = "b = 2\na = 1\nmax_open_files = -1";
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(canonical_lines(text), lines);
    }

    #[test]
    fn test_ini_sections_diff_by_pairs() {
        let baseline = "[DBOptions]\n  max_background_jobs=2\n[CFOptions \"default\"]\n  write_buffer_size=67108864\n";
        let candidate = "[DBOptions]\n  max_background_jobs=8\n[CFOptions \"default\"]\n  write_buffer_size=67108864\n  max_write_buffer_number=4\n";
        assert_eq!(
            additions(baseline, candidate),
            "max_background_jobs = 8\nmax_write_buffer_number = 4"
        );
    }

    #[test]
    fn test_diff_lines_classifies_every_line() {
        let baseline = vec!["a = 1".to_string(), "b = 2".to_string()];
        let candidate = vec!["a = 1".to_string(), "b = 3".to_string()];
        assert_eq!(
            diff_lines(&baseline, &candidate),
            vec![
                DiffLine::Unchanged("a = 1"),
                DiffLine::Removed("b = 2"),
                DiffLine::Added("b = 3"),
            ]
        );
    }
}
