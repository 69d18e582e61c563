//! A mention: one recognised span in the article OCR, with everything the
//! clustering and retrieval stages need derived up front.

use once_cell::sync::Lazy;
use regex::Regex;

use krantlink_lexicon::{self as lexicon, Role};

use crate::text::{last_part, normalize, tokenize};

/// Tokens kept on each side of a mention.
const WINDOW: usize = 20;

const QUOTE_CHARS: [char; 6] = ['"', '\'', '„', '”', '‚', '’'];

#[derive(Debug, Clone)]
pub struct Mention {
    /// Exact surface form as tagged by the NER service.
    pub text: String,
    /// NER type tag (`person`, `location`, `organisation`, …), if any.
    pub tag: Option<String>,
    /// Byte span of the first occurrence at or after the document cursor.
    pub span: Option<(usize, usize)>,
    pub window_left: Vec<String>,
    pub window_right: Vec<String>,
    /// Quote characters found bracketing the span.
    pub quotes: u32,
    /// Matched title word, when the mention starts with or follows a title.
    pub title_form: Option<String>,
    pub role: Option<&'static Role>,
    pub role_form: Option<String>,
    pub norm: String,
    /// Norm minus a leading title or role word.
    pub stripped: String,
    pub last_part: String,
    pub valid: bool,
    /// Entity type inferred from title, role or preposition context.
    pub alt_type: Option<&'static str>,
    substituted: bool,
}

impl Mention {
    pub fn new(text: &str, tag: Option<&str>, ocr: &str, doc_pos: usize) -> Self {
        let norm = normalize(text);
        let span = find_span(ocr, text, doc_pos);
        let (window_left, window_right) = windows(ocr, span);
        let quotes = count_quotes(ocr, text, span);

        let first_norm_word = norm.split_whitespace().next().map(str::to_string);

        // Titles appear as the first word of the mention or just before it.
        let mut probe: Vec<String> = Vec::new();
        if let Some(w) = &first_norm_word {
            probe.push(w.clone());
        }
        if let Some(prev) = window_left.last() {
            probe.push(normalize(prev));
        }
        let title_form = probe.iter().find(|w| lexicon::is_title(w)).cloned();

        // Roles may additionally follow the mention after a comma.
        let mut role_probe = probe;
        if let Some((_, end)) = span
            && !window_right.is_empty()
            && ocr[end..].starts_with(',')
        {
            role_probe.push(normalize(&window_right[0]));
        }
        let (role, role_form) = role_probe
            .iter()
            .find_map(|w| lexicon::role_for_word(w).map(|r| (r, w.clone())))
            .map(|(r, w)| (Some(r), Some(w)))
            .unwrap_or((None, None));

        let stripped = strip_leading(&norm, &first_norm_word, &title_form, &role_form);
        let last = last_part(&stripped);

        let valid = stripped.split_whitespace().any(|w| w.chars().count() >= 2)
            && !last.is_empty()
            && !is_date(&norm);

        let alt_type = infer_alt_type(&title_form, role, &window_left);

        Self {
            text: text.to_string(),
            tag: tag.map(str::to_string),
            span,
            window_left,
            window_right,
            quotes,
            title_form,
            role,
            role_form,
            norm,
            stripped,
            last_part: last,
            valid,
            alt_type,
            substituted: false,
        }
    }

    /// End of the span, used as the document cursor for the next mention.
    pub fn end_pos(&self) -> Option<usize> {
        self.span.map(|(_, end)| end)
    }

    pub fn word_count(&self) -> usize {
        self.norm.split_whitespace().count()
    }

    pub fn first_word(&self) -> Option<&str> {
        self.norm.split_whitespace().next()
    }

    pub fn last_word(&self) -> Option<&str> {
        self.norm.split_whitespace().next_back()
    }

    pub fn is_person(&self) -> bool {
        self.tag.as_deref() == Some("person")
    }

    /// Try one spelling regularisation on the stripped form. Applies only
    /// when exactly one rewrite rule matches, and at most once per mention.
    pub fn substitute(&mut self) -> bool {
        if self.substituted {
            return false;
        }

        static SCH_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(^|\s)([a-zA-Z]{2,})sch(e?)($|\s)").unwrap());
        static TRAILING_V_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(^|\s)([a-zA-Z]{2,})v($|\s)").unwrap());
        static TRAILING_W_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(^|\s)([a-zA-Z]{2,})w($|\s)").unwrap());

        let mut subs: Vec<String> = Vec::new();

        if self.stripped.contains('y') {
            subs.push(self.stripped.replace('y', "ij"));
        }
        if self.stripped.ends_with('s') {
            subs.push(self.stripped[..self.stripped.len() - 1].to_string());
        }
        if SCH_RE.is_match(&self.stripped) {
            subs.push(
                SCH_RE
                    .replace_all(&self.stripped, "$1${2}s$3$4")
                    .into_owned(),
            );
        }
        if TRAILING_V_RE.is_match(&self.stripped) {
            subs.push(
                TRAILING_V_RE
                    .replace_all(&self.stripped, "$1${2}w$3")
                    .into_owned(),
            );
        }
        if TRAILING_W_RE.is_match(&self.stripped) {
            subs.push(
                TRAILING_W_RE
                    .replace_all(&self.stripped, "$1${2}v$3")
                    .into_owned(),
            );
        }

        if subs.len() != 1 {
            return false;
        }

        let sub = subs.remove(0);
        self.norm = self.norm.replace(&self.stripped, &sub);
        self.stripped = sub;
        self.last_part = last_part(&self.stripped);
        self.substituted = true;
        true
    }
}

/// A mention is a date when its norm contains a month name and a digit word.
fn is_date(norm: &str) -> bool {
    let words: Vec<&str> = norm.split_whitespace().collect();
    words.iter().any(|w| lexicon::MONTHS.contains(w))
        && words
            .iter()
            .any(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_digit()))
}

fn find_span(ocr: &str, text: &str, doc_pos: usize) -> Option<(usize, usize)> {
    if text.is_empty() {
        return None;
    }
    let rel = ocr.get(doc_pos..)?.find(text)?;
    let start = doc_pos + rel;
    Some((start, start + text.len()))
}

fn windows(ocr: &str, span: Option<(usize, usize)>) -> (Vec<String>, Vec<String>) {
    let Some((start, end)) = span else {
        return (Vec::new(), Vec::new());
    };

    let mut left = Vec::new();
    if let Some(p) = ocr[..start].rfind([' ', '\n'])
        && p > 0
    {
        left = tokenize(&ocr[..p]);
        if left.len() > WINDOW {
            left = left.split_off(left.len() - WINDOW);
        }
    }

    let mut right = Vec::new();
    if let Some(i) = ocr[end..].find([' ', '\n']) {
        right = tokenize(&ocr[end + i..]);
        right.truncate(WINDOW);
    }

    (left, right)
}

fn count_quotes(ocr: &str, text: &str, span: Option<(usize, usize)>) -> u32 {
    let Some((start, end)) = span else {
        return 0;
    };
    let mut quotes = 0;
    let positions = [
        ocr[..start].chars().next_back(),
        text.chars().next(),
        text.chars().next_back(),
        ocr[end..].chars().next(),
    ];
    for c in positions.into_iter().flatten() {
        if QUOTE_CHARS.contains(&c) {
            quotes += 1;
        }
    }
    quotes
}

fn strip_leading(
    norm: &str,
    first_word: &Option<String>,
    title_form: &Option<String>,
    role_form: &Option<String>,
) -> String {
    let Some(first) = first_word else {
        return norm.to_string();
    };
    let leading = title_form
        .as_ref()
        .is_some_and(|t| t == first)
        || role_form.as_ref().is_some_and(|r| r == first);
    if leading {
        norm.split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        norm.to_string()
    }
}

fn infer_alt_type(
    title_form: &Option<String>,
    role: Option<&'static Role>,
    window_left: &[String],
) -> Option<&'static str> {
    if title_form.is_some() {
        return Some("person");
    }
    if let Some(role) = role
        && let Some(t) = role.unique_entity_type()
    {
        return Some(t);
    }
    if let Some(prev) = window_left.last() {
        let prev = normalize(prev);
        if matches!(prev.as_str(), "in" | "te" | "uit") {
            return Some("location");
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const OCR: &str = "Gisteren sprak minister Jan de Vries, politicus uit Den Haag, \
        over de begroting. Ook \"De Telegraaf\" meldde dat J. de Vries in Amsterdam was.";

    #[test]
    fn position_and_windows() {
        let m = Mention::new("Jan de Vries", Some("person"), OCR, 0);
        let (start, end) = m.span.unwrap();
        assert_eq!(&OCR[start..end], "Jan de Vries");
        assert_eq!(m.window_left.last().map(String::as_str), Some("minister"));
        assert_eq!(m.window_right.first().map(String::as_str), Some("politicus"));
    }

    #[test]
    fn cursor_separates_identical_surface_forms() {
        let first = Mention::new("de Vries", None, OCR, 0);
        let second = Mention::new("de Vries", None, OCR, first.end_pos().unwrap());
        assert!(first.span.unwrap().0 < second.span.unwrap().0);
    }

    #[test]
    fn missing_phrase_has_no_span() {
        let m = Mention::new("Willem Drees", Some("person"), OCR, 0);
        assert!(m.span.is_none());
        assert!(m.window_left.is_empty());
        assert!(m.window_right.is_empty());
        assert_eq!(m.quotes, 0);
    }

    #[test]
    fn title_from_left_window_is_detected() {
        let m = Mention::new("Jan de Vries", Some("person"), OCR, 0);
        // "minister" is a role word, not a title; no title here
        assert!(m.title_form.is_none());
        assert_eq!(m.role.unwrap().name, "politician");
        assert_eq!(m.role_form.as_deref(), Some("minister"));
        assert_eq!(m.alt_type, Some("person"));
        assert_eq!(m.stripped, "jan de vries");
    }

    #[test]
    fn leading_title_is_stripped() {
        let ocr = "De heer Pietersen was aanwezig.";
        let m = Mention::new("heer Pietersen", None, ocr, 0);
        assert_eq!(m.title_form.as_deref(), Some("heer"));
        assert_eq!(m.stripped, "pietersen");
        assert_eq!(m.last_part, "pietersen");
        assert_eq!(m.alt_type, Some("person"));
    }

    #[test]
    fn role_after_comma_is_detected() {
        let m = Mention::new("Jan de Vries", Some("person"), OCR, 0);
        // role found from left window; the comma path also applies to spans
        // directly followed by ", politicus"
        assert!(m.role.is_some());
    }

    #[test]
    fn quotes_are_counted() {
        let m = Mention::new("De Telegraaf", Some("organisation"), OCR, 0);
        assert_eq!(m.quotes, 2);
    }

    #[test]
    fn preposition_implies_location() {
        let m = Mention::new("Amsterdam", None, OCR, 0);
        assert_eq!(m.alt_type, Some("location"));
    }

    #[test]
    fn date_mentions_are_invalid() {
        let ocr = "Het gebeurde in Maart 1920 te Leiden.";
        let m = Mention::new("Maart 1920", None, ocr, 0);
        assert!(!m.valid);
        // A bare month without digits is not a date
        let m = Mention::new("Maart", None, ocr, 0);
        assert!(m.valid);
    }

    #[test]
    fn single_letter_mention_is_invalid() {
        let ocr = "De A is een rivier.";
        let m = Mention::new("A", None, ocr, 0);
        assert!(!m.valid);
        assert_eq!(m.last_part, "");
    }

    #[test]
    fn substitute_y_to_ij() {
        let ocr = "Dat schreef Van Dyk destijds.";
        let mut m = Mention::new("Van Dyk", Some("person"), ocr, 0);
        assert!(m.substitute());
        assert_eq!(m.stripped, "van dijk");
        assert_eq!(m.norm, "van dijk");
        assert_eq!(m.last_part, "dijk");
    }

    #[test]
    fn substitute_requires_unique_rule() {
        // Both the y rule and the trailing-s rule match: ambiguous, no-op.
        let ocr = "De familie Dyks woonde hier.";
        let mut m = Mention::new("Dyks", None, ocr, 0);
        assert!(!m.substitute());
        assert_eq!(m.stripped, "dyks");
    }

    #[test]
    fn substitute_sch_to_s() {
        let ocr = "Het Haagsche leven bloeide.";
        let mut m = Mention::new("Haagsche", None, ocr, 0);
        assert!(m.substitute());
        assert_eq!(m.stripped, "haagse");
    }

    #[test]
    fn substitute_applies_at_most_once() {
        let ocr = "Dat schreef Van Dyk destijds.";
        let mut m = Mention::new("Van Dyk", Some("person"), ocr, 0);
        assert!(m.substitute());
        let after = m.stripped.clone();
        assert!(!m.substitute());
        assert_eq!(m.stripped, after);
    }

    #[test]
    fn trailing_v_and_w_swap() {
        let ocr = "De heer Asov vertrok; ook Asow kwam.";
        let mut m = Mention::new("Asov", None, ocr, 0);
        assert!(m.substitute());
        assert_eq!(m.stripped, "asow");

        let mut m = Mention::new("Asow", None, ocr, 0);
        assert!(m.substitute());
        assert_eq!(m.stripped, "asov");
    }
}
