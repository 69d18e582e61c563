//! Name-matching features: how well the candidate's labels match the head
//! mention. Labels that fail every test accumulate in the candidate's
//! non-matching list, which later feeds the non-matching magnitude and the
//! name-conflict flag.

use krantlink_model::Feature;
use rapidfuzz::distance::levenshtein;
use rapidfuzz::fuzz;

use crate::retrieval::Candidate;

fn lev_distance(a: &str, b: &str) -> usize {
    levenshtein::distance(a.chars(), b.chars())
}

fn lev_ratio(a: &str, b: &str) -> f64 {
    fuzz::ratio(a.chars(), b.chars())
}

/// Every word of `ne` occurs in `label`.
fn word_subset(ne: &str, label: &str) -> bool {
    let label_words: Vec<&str> = label.split_whitespace().collect();
    ne.split_whitespace().all(|w| label_words.contains(&w))
}

/// Match the main label against the normalised head mention.
pub(crate) fn pref_label_match(cand: &mut Candidate, ne: &str) {
    cand.non_matching.clear();
    let label = cand.document.pref_label.clone();

    if word_subset(ne, &label) {
        if label == ne {
            cand.features.set(Feature::MatchStrPrefLabelExact, 1.0);
        } else if label.ends_with(ne) {
            cand.features.set(Feature::MatchStrPrefLabelEnd, 1.0);
        } else if label.contains(ne) {
            cand.features.set(Feature::MatchStrPrefLabel, 1.0);
        } else {
            cand.non_matching.push(label);
        }
    } else {
        cand.non_matching.push(label);
    }
}

/// Match the alternative labels; counts pass through `tanh(n · 0.25)`.
pub(crate) fn alt_label_match(cand: &mut Candidate, ne: &str) {
    let labels = cand.document.alt_label.clone();
    if labels.is_empty() {
        return;
    }

    let mut exact = 0u32;
    let mut end = 0u32;
    let mut within = 0u32;
    for label in labels {
        if word_subset(ne, &label) {
            if label == ne {
                exact += 1;
            } else if label.ends_with(ne) {
                end += 1;
            } else if label.contains(ne) {
                within += 1;
            } else {
                cand.non_matching.push(label);
            }
        } else {
            cand.non_matching.push(label);
        }
    }

    cand.features
        .set(Feature::MatchStrAltLabelExact, (f64::from(exact) * 0.25).tanh());
    cand.features
        .set(Feature::MatchStrAltLabelEnd, (f64::from(end) * 0.25).tanh());
    cand.features
        .set(Feature::MatchStrAltLabel, (f64::from(within) * 0.25).tanh());
}

/// Align the preceding parts of the stripped mention against a label whose
/// last word already matched. A pointer advances monotonically over the
/// label's non-final words; every mention part must land somewhere.
fn parts_align(source: &[&str], target: &[&str]) -> bool {
    let heads = &target[..target.len() - 1];
    let mut pos = 0usize;

    for part in &source[..source.len() - 1] {
        let remaining = &heads[pos..];
        if remaining.is_empty() {
            return false;
        }
        let found = if part.chars().count() > 1 {
            // Full word, or one edit away (spelling variants of first names)
            remaining
                .iter()
                .position(|p| p == part)
                .or_else(|| remaining.iter().position(|p| lev_distance(p, part) == 1))
        } else {
            // Initials match on first letter
            let initial = part.chars().next();
            remaining.iter().position(|p| p.chars().next() == initial)
        };
        match found {
            Some(i) => pos += i + 1,
            None => return false,
        }
    }
    true
}

/// Match the last part of the stripped mention against the labels that have
/// not matched yet, requiring a compatible alignment of preceding parts.
pub(crate) fn last_part_match(cand: &mut Candidate, stripped: &str) {
    if cand.non_matching.is_empty() {
        return;
    }
    let source: Vec<&str> = stripped.split_whitespace().collect();
    let Some(source_last) = source.last() else {
        return;
    };

    let mut count = 0u32;
    cand.non_matching.retain(|label| {
        let target: Vec<&str> = label.split_whitespace().collect();
        if source.len() > target.len() {
            return true;
        }
        let Some(target_last) = target.last() else {
            return true;
        };
        if lev_distance(source_last, target_last) > 1 {
            return true;
        }
        if !parts_align(&source, &target) {
            return true;
        }
        count += 1;
        false
    });

    cand.features
        .set(Feature::MatchStrLastPart, (f64::from(count) * 0.25).tanh());
}

/// For single-word mentions of a person candidate: a non-matching label
/// starting with the mention matches when the rest of the label occurs in
/// the article OCR; otherwise such labels are a conflict.
pub(crate) fn first_part_match(cand: &mut Candidate, ne: &str, ocr_norm: &str) {
    if ne.split_whitespace().count() > 1 {
        return;
    }
    if cand.document.last_part.is_none() {
        return;
    }

    let applicable: Vec<String> = cand
        .non_matching
        .iter()
        .filter(|l| {
            let words: Vec<&str> = l.split_whitespace().collect();
            words.len() > 1 && words[0] == ne
        })
        .cloned()
        .collect();
    if applicable.is_empty() {
        return;
    }

    cand.features.set(Feature::MatchStrFirstPart, -1.0);
    for label in applicable {
        let rest = label
            .split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ");
        if ocr_norm.contains(&rest) {
            cand.features.set(Feature::MatchStrFirstPart, 1.0);
            cand.non_matching.retain(|l| l != &label);
        }
    }
}

/// Set the name-conflict flag: no label matched in any way.
pub(crate) fn name_conflict(cand: &mut Candidate) {
    let sum: f64 = [
        Feature::MatchStrPrefLabelExact,
        Feature::MatchStrPrefLabelEnd,
        Feature::MatchStrAltLabelExact,
        Feature::MatchStrAltLabelEnd,
        Feature::MatchStrLastPart,
        Feature::MatchStrFirstPart,
    ]
    .iter()
    .map(|&f| cand.features.get(f))
    .sum();

    cand.features
        .set(Feature::MatchStrConflict, if sum == 0.0 { 1.0 } else { 0.0 });
}

/// Levenshtein-ratio features over all label families, rescaled to [-1, 1].
pub(crate) fn levenshtein_features(cand: &mut Candidate, ne: &str) {
    let pref = cand.document.pref_label.clone();
    cand.features
        .set(Feature::MatchStrLsrPref, lev_ratio(ne, &pref) * 2.0 - 1.0);

    let wd_labels = cand.document.wd_alt_label.clone();
    if !wd_labels.is_empty() {
        let ratios: Vec<f64> = wd_labels.iter().map(|l| lev_ratio(ne, l)).collect();
        let max = ratios.iter().copied().fold(f64::MIN, f64::max);
        let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
        cand.features.set(Feature::MatchStrLsrWdMax, max * 2.0 - 1.0);
        cand.features.set(Feature::MatchStrLsrWdMean, mean * 2.0 - 1.0);
    }

    let labels: Vec<String> = cand
        .document
        .alt_label
        .iter()
        .filter(|l| !wd_labels.contains(l))
        .cloned()
        .collect();
    if !labels.is_empty() {
        let ratios: Vec<f64> = labels.iter().map(|l| lev_ratio(ne, l)).collect();
        let max = ratios.iter().copied().fold(f64::MIN, f64::max);
        let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
        cand.features.set(Feature::MatchStrLsrAltMax, max * 2.0 - 1.0);
        cand.features.set(Feature::MatchStrLsrAltMean, mean * 2.0 - 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krantlink_kb::KbDocument;

    fn candidate(doc: KbDocument) -> Candidate {
        Candidate::new(doc, 0, 0)
    }

    fn doc(pref: &str) -> KbDocument {
        KbDocument {
            id: "x".into(),
            pref_label: pref.into(),
            ..Default::default()
        }
    }

    #[test]
    fn pref_label_exact_and_end() {
        let mut c = candidate(doc("jan de vries"));
        pref_label_match(&mut c, "jan de vries");
        assert_eq!(c.features.get(Feature::MatchStrPrefLabelExact), 1.0);

        let mut c = candidate(doc("dr jan de vries"));
        pref_label_match(&mut c, "jan de vries");
        assert_eq!(c.features.get(Feature::MatchStrPrefLabelEnd), 1.0);
        assert!(c.non_matching.is_empty());
    }

    #[test]
    fn pref_label_requires_word_subset() {
        // "de" and "vries" appear, but "jan" does not: non-matching.
        let mut c = candidate(doc("piet de vries"));
        pref_label_match(&mut c, "jan de vries");
        assert_eq!(c.features.get(Feature::MatchStrPrefLabelExact), 0.0);
        assert_eq!(c.non_matching, vec!["piet de vries".to_string()]);
    }

    #[test]
    fn alt_labels_accumulate_through_tanh() {
        let mut d = doc("jan de vries");
        d.alt_label = vec!["jan de vries".into(), "j de vries".into()];
        let mut c = candidate(d);
        pref_label_match(&mut c, "jan de vries");
        alt_label_match(&mut c, "jan de vries");
        assert!((c.features.get(Feature::MatchStrAltLabelExact) - 0.25f64.tanh()).abs() < 1e-12);
        // "j de vries" lacks "jan": joins non_matching
        assert_eq!(c.non_matching, vec!["j de vries".to_string()]);
    }

    #[test]
    fn last_part_accepts_initials() {
        let mut c = candidate(doc("x"));
        c.non_matching = vec!["jan de vries".into()];
        last_part_match(&mut c, "j de vries");
        assert!(c.non_matching.is_empty());
        assert!(c.features.get(Feature::MatchStrLastPart) > 0.0);
    }

    #[test]
    fn last_part_accepts_one_edit_on_surname() {
        let mut c = candidate(doc("x"));
        c.non_matching = vec!["jan de vriess".into()];
        last_part_match(&mut c, "jan de vries");
        assert!(c.non_matching.is_empty());
    }

    #[test]
    fn last_part_rejects_conflicting_initial() {
        let mut c = candidate(doc("x"));
        c.non_matching = vec!["piet de vries".into()];
        last_part_match(&mut c, "k de vries");
        // "k" does not match "piet" or "de" by first letter... "piet" starts
        // with p, "de" with d: conflict, label stays.
        assert_eq!(c.non_matching.len(), 1);
        assert_eq!(c.features.get(Feature::MatchStrLastPart), 0.0);
    }

    #[test]
    fn last_part_rejects_longer_mention() {
        let mut c = candidate(doc("x"));
        c.non_matching = vec!["vries".into()];
        last_part_match(&mut c, "jan de vries");
        assert_eq!(c.non_matching.len(), 1);
    }

    #[test]
    fn last_part_alignment_is_monotonic() {
        // "b a vries" against "a b vries": "b" lands on position 1, leaving
        // nothing for "a" to land on.
        let mut c = candidate(doc("x"));
        c.non_matching = vec!["a b vries".into()];
        last_part_match(&mut c, "b a vries");
        assert_eq!(c.non_matching.len(), 1);
    }

    #[test]
    fn first_part_matches_against_ocr() {
        let mut d = doc("kennedy");
        d.last_part = Some("kennedy".into());
        let mut c = candidate(d);
        c.non_matching = vec!["kennedy airport".into()];
        first_part_match(&mut c, "kennedy", "het kennedy airport in new york");
        assert_eq!(c.features.get(Feature::MatchStrFirstPart), 1.0);
        assert!(c.non_matching.is_empty());
    }

    #[test]
    fn first_part_conflicts_when_rest_is_absent() {
        let mut d = doc("kennedy");
        d.last_part = Some("kennedy".into());
        let mut c = candidate(d);
        c.non_matching = vec!["kennedy airport".into()];
        first_part_match(&mut c, "kennedy", "de president werd herdacht");
        assert_eq!(c.features.get(Feature::MatchStrFirstPart), -1.0);
        assert_eq!(c.non_matching.len(), 1);
    }

    #[test]
    fn name_conflict_when_nothing_matched() {
        let mut c = candidate(doc("willem drees"));
        pref_label_match(&mut c, "jan de vries");
        last_part_match(&mut c, "jan de vries");
        name_conflict(&mut c);
        assert_eq!(c.features.get(Feature::MatchStrConflict), 1.0);
    }

    #[test]
    fn no_conflict_after_pref_end_match() {
        let mut c = candidate(doc("dr jan de vries"));
        pref_label_match(&mut c, "jan de vries");
        name_conflict(&mut c);
        assert_eq!(c.features.get(Feature::MatchStrConflict), 0.0);
    }

    #[test]
    fn levenshtein_ratio_bounds() {
        let mut d = doc("jan de vries");
        d.wd_alt_label = vec!["jan vries".into()];
        d.alt_label = vec!["jan vries".into(), "johannes de vries".into()];
        let mut c = candidate(d);
        levenshtein_features(&mut c, "jan de vries");
        assert_eq!(c.features.get(Feature::MatchStrLsrPref), 1.0);
        for f in [
            Feature::MatchStrLsrWdMax,
            Feature::MatchStrLsrWdMean,
            Feature::MatchStrLsrAltMax,
            Feature::MatchStrLsrAltMean,
        ] {
            let v = c.features.get(f);
            assert!((-1.0..=1.0).contains(&v), "{f}: {v}");
        }
    }
}
