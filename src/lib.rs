use std::collections::{HashMap, HashSet};

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueStats {
    pub dialogue_count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub authors: Vec<String>,
    pub subreddit: String,
    pub trigger_warnings: Vec<String>,
    pub emails: Vec<String>,
    pub dates: Vec<String>,
    pub dialogue_stats: DialogueStats,
    pub spoilers: Vec<String>,
    pub zalgo_glitch: bool,
    pub entities: Vec<String>,
    pub creepiness_score: f64,
}

impl AnalysisReport {
    /// The report returned for empty input: every field present, every value empty.
    pub fn empty() -> Self {
        Self {
            authors: vec![],
            subreddit: HP.unknown_subreddit.to_string(),
            trigger_warnings: vec![],
            emails: vec![],
            dates: vec![],
            dialogue_stats: DialogueStats {
                dialogue_count: 0,
                percentage: 0.0,
            },
            spoilers: vec![],
            zalgo_glitch: false,
            entities: vec![],
            creepiness_score: 0.0,
        }
    }
}

impl Default for AnalysisReport {
    fn default() -> Self {
        Self::empty()
    }
}

/// Response shape of the analysis service: a status, a short preview of the
/// text that was analyzed, and the report itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: String,
    pub extracted_text_preview: String,
    pub data: AnalysisReport,
}

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

struct Hyperparameters {
    unknown_subreddit: &'static str,
    entity_top_n: usize,
    entity_min_chars: usize,
    creepiness_amplification: f64,
    score_max: f64,
    zalgo_min_run: usize,
    decimal_places: i32,
    preview_chars: usize,
}

static HP: Hyperparameters = Hyperparameters {
    unknown_subreddit: "Unknown Frequency",
    entity_top_n: 5,
    entity_min_chars: 3,
    creepiness_amplification: 5.0,
    score_max: 100.0,
    zalgo_min_run: 1,
    decimal_places: 2,
    preview_chars: 200,
};

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

// "Written by" is listed first so "Written by u/name" yields the bare handle.
static AUTHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\bwritten by:?\s*(?:u/)?|\bu/)([\w\-.]+)").unwrap());

static SUBREDDIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)subreddit:?\s*(r/[A-Za-z0-9_]+)").unwrap());

static TRIGGER_WARNING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:TW|CW|Trigger Warning)[\s:]+([^\r\n]+)").unwrap());

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static SPOILER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r">!(.*?)!<").unwrap());

// Combining Diacritical Marks, their Extended block, and the Supplement block.
const COMBINING_MARKS: &str = r"[\x{0300}-\x{036F}\x{1AB0}-\x{1AFF}\x{1DC0}-\x{1DFF}]";

static ZALGO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{COMBINING_MARKS}{{{},}}", HP.zalgo_min_run.max(1))).unwrap()
});

static CAPITALIZED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z][a-z]*\b").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateForm {
    Absolute,
    Relative,
}

// Order matters: at equal start positions the earlier form wins.
static DATE_PATTERNS: Lazy<PatternTable<DateForm>> = Lazy::new(|| {
    PatternTable::new(&[
        (
            DateForm::Absolute,
            r"(?i)(\d{1,2}[-/|dhnrst\s]*\w+[-/,\s]*\d{2,4})",
        ),
        (
            DateForm::Relative,
            r"(?i)(\d+\s+(?:hours?|minutes?|days?|years?)\s+ago)",
        ),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteStyle {
    Straight,
    Smart,
}

static QUOTE_PATTERNS: Lazy<PatternTable<QuoteStyle>> = Lazy::new(|| {
    PatternTable::new(&[
        (QuoteStyle::Straight, r#""([^"]*)""#),
        (QuoteStyle::Smart, r"\u{201C}([^\u{201D}]*)\u{201D}"),
    ])
});

// ---------------------------------------------------------------------------
// Word lists
// ---------------------------------------------------------------------------

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "The", "A", "An", "And", "But", "Or", "Nor", "For", "Yet", "So", "If", "Then", "Than",
        "Because", "While", "When", "Where", "What", "Which", "Who", "Whom", "Why", "How", "I",
        "Me", "My", "Mine", "You", "Your", "Yours", "He", "Him", "His", "She", "Her", "Hers",
        "It", "Its", "We", "Us", "Our", "Ours", "They", "Them", "Their", "Theirs", "This", "That",
        "These", "Those", "There", "Here", "Some", "Any", "All", "Each", "Every", "No", "Not",
        "Yes", "Just", "Now", "Only", "Also", "After", "Before", "With", "Without", "From",
        "Into", "About", "Once", "Even", "Still", "Maybe",
    ]
    .into_iter()
    .collect()
});

const CREEPY_WORDS: &[&str] = &[
    // Death and violence
    "dead", "death", "die", "kill", "murder", "blood", "corpse", "grave", "funeral", "knife",
    // Darkness
    "dark", "shadow", "night", "midnight", "basement",
    // Supernatural
    "ghost", "demon", "spirit", "haunt", "possessed", "curse", "ritual", "creature", "monster",
    "entity",
    // Fear
    "fear", "terror", "horror", "afraid", "scream", "dread", "panic",
    // Watching
    "watch", "stare", "stalk", "follow", "whisper",
    // Flight
    "run", "escape", "hide", "trapped",
    // Uncanny
    "wrong", "strange", "uncanny", "smile", "mirror", "faceless",
    // Pain
    "pain", "hurt", "bleed",
    // Body
    "teeth", "skin", "flesh", "eyes", "bones", "rotting",
];

static CREEPY_MATCHER: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(CREEPY_WORDS).unwrap());

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn round_to_precision(value: f64) -> f64 {
    let factor = 10f64.powi(HP.decimal_places);
    (value * factor).round() / factor
}

fn word_count(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

fn deduplicate(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            unique.push(item);
        }
    }
    unique
}

/// Dedup keyed on the lowercase form; the first spelling seen is the one kept.
fn deduplicate_ignore_case(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for item in items {
        if seen.insert(item.to_lowercase()) {
            unique.push(item);
        }
    }
    unique
}

/// One match produced by a tagged pattern table.
#[derive(Debug, Clone, Copy)]
struct Fragment<'t, K> {
    kind: K,
    matched: &'t str,
    inner: &'t str,
}

/// An ordered list of tagged alternatives compiled into one regex.
///
/// Each alternative carries exactly one capture group holding its payload,
/// so group `i + 1` tells which alternative matched. Precedence is the
/// regex's own leftmost-first alternation and the scan stays linear.
struct PatternTable<K> {
    kinds: Vec<K>,
    re: Regex,
}

impl<K: Copy> PatternTable<K> {
    fn new(alternatives: &[(K, &str)]) -> Self {
        let combined = alternatives
            .iter()
            .map(|(_, src)| format!("(?:{src})"))
            .collect::<Vec<_>>()
            .join("|");
        let re = Regex::new(&combined).unwrap();
        assert_eq!(
            re.captures_len(),
            alternatives.len() + 1,
            "every alternative needs exactly one capture group"
        );
        Self {
            kinds: alternatives.iter().map(|(kind, _)| *kind).collect(),
            re,
        }
    }

    /// Non-overlapping matches in document order, tagged with their alternative.
    fn scan<'t>(&self, text: &'t str) -> Vec<Fragment<'t, K>> {
        self.re
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let (kind, inner) = self
                    .kinds
                    .iter()
                    .enumerate()
                    .find_map(|(i, kind)| caps.get(i + 1).map(|m| (*kind, m.as_str())))?;
                Some(Fragment {
                    kind,
                    matched: whole.as_str(),
                    inner,
                })
            })
            .collect()
    }
}

fn follows_sentence_boundary(text: &str, start: usize) -> bool {
    if start == 0 {
        return true;
    }
    let mut before = text[..start].chars().rev();
    match (before.next(), before.next()) {
        (Some(space), Some(punct)) if space.is_whitespace() => matches!(punct, '.' | '?' | '!'),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Reddit handles from `u/name` mentions and `Written by` bylines.
///
/// Matching is case-insensitive and handles keep their original casing.
/// `u/Bob` and `u/bob` are the same author; the first spelling is reported.
pub fn extract_authors(text: &str) -> Vec<String> {
    let handles = AUTHOR_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()));
    deduplicate_ignore_case(handles)
}

/// First `Subreddit: r/name` marker, or the unknown-frequency sentinel.
pub fn extract_subreddit(text: &str) -> String {
    SUBREDDIT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| HP.unknown_subreddit.to_string(), |m| m.as_str().to_string())
}

/// Remainder of every `TW`/`CW`/`Trigger Warning` line, in order, repeats kept.
pub fn extract_trigger_warnings(text: &str) -> Vec<String> {
    TRIGGER_WARNING_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

pub fn extract_emails(text: &str) -> Vec<String> {
    deduplicate(EMAIL_RE.find_iter(text).map(|m| m.as_str().to_string()))
}

/// Absolute dates (`10/10/2023`, `31st October 1998`) and relative ones
/// (`3 days ago`). Deliberately loose: false positives are expected.
pub fn extract_dates(text: &str) -> Vec<String> {
    let fragments = DATE_PATTERNS.scan(text);
    tracing::trace!(
        absolute = fragments.iter().filter(|f| f.kind == DateForm::Absolute).count(),
        relative = fragments.iter().filter(|f| f.kind == DateForm::Relative).count(),
        "dates scanned"
    );
    fragments.into_iter().map(|f| f.matched.to_string()).collect()
}

/// Count quoted fragments and the share of the text (in characters) they cover.
pub fn analyze_dialogue(text: &str) -> DialogueStats {
    let fragments = QUOTE_PATTERNS.scan(text);
    tracing::trace!(
        straight = fragments.iter().filter(|f| f.kind == QuoteStyle::Straight).count(),
        smart = fragments.iter().filter(|f| f.kind == QuoteStyle::Smart).count(),
        "quotes scanned"
    );

    let dialogue_chars: usize = fragments.iter().map(|f| f.inner.chars().count()).sum();
    let total_chars = text.chars().count().max(1);

    DialogueStats {
        dialogue_count: fragments.len(),
        percentage: round_to_precision(dialogue_chars as f64 / total_chars as f64 * 100.0),
    }
}

/// Inner text of each `>!spoiler!<` pair, in order.
pub fn extract_spoilers(text: &str) -> Vec<String> {
    SPOILER_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// True when the text carries stacked combining marks ("zalgo" text).
pub fn detect_zalgo(text: &str) -> bool {
    ZALGO_RE.is_match(text)
}

/// Most frequent capitalized words that are not sentence openers or stopwords.
///
/// Ties keep first-occurrence order.
pub fn extract_entities(text: &str) -> Vec<String> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for m in CAPITALIZED_RE.find_iter(text) {
        let word = m.as_str();
        if follows_sentence_boundary(text, m.start())
            || word.chars().count() < HP.entity_min_chars
            || STOPWORDS.contains(word)
        {
            continue;
        }
        match index.get(word) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(word, order.len());
                order.push((word, 1));
            }
        }
    }

    // sort_by is stable, so equal counts stay in first-seen order
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(HP.entity_top_n)
        .map(|(word, _)| word.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Density of distinct creepy lexicon hits, amplified and clamped to 0-100.
pub fn creepiness_score(text: &str) -> f64 {
    let wc = word_count(text);
    if wc == 0 {
        return 0.0;
    }

    let mut hit = vec![false; CREEPY_WORDS.len()];
    // Full Unicode lowercasing: some non-ASCII letters fold into ASCII ones.
    let lowered = text.to_lowercase();
    for m in CREEPY_MATCHER.find_overlapping_iter(&lowered) {
        hit[m.pattern().as_usize()] = true;
    }
    let hits = hit.iter().filter(|h| **h).count();

    let raw = hits as f64 / wc as f64 * 100.0 * HP.creepiness_amplification;
    round_to_precision(raw.min(HP.score_max))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

#[tracing::instrument(skip_all, fields(bytes = text.len()))]
pub fn analyze(text: &str) -> AnalysisReport {
    if text.is_empty() {
        tracing::debug!("empty input");
        return AnalysisReport::empty();
    }

    let report = AnalysisReport {
        authors: extract_authors(text),
        subreddit: extract_subreddit(text),
        trigger_warnings: extract_trigger_warnings(text),
        emails: extract_emails(text),
        dates: extract_dates(text),
        dialogue_stats: analyze_dialogue(text),
        spoilers: extract_spoilers(text),
        zalgo_glitch: detect_zalgo(text),
        entities: extract_entities(text),
        creepiness_score: creepiness_score(text),
    };

    tracing::debug!(
        authors = report.authors.len(),
        warnings = report.trigger_warnings.len(),
        emails = report.emails.len(),
        dates = report.dates.len(),
        dialogue = report.dialogue_stats.dialogue_count,
        spoilers = report.spoilers.len(),
        zalgo = report.zalgo_glitch,
        score = report.creepiness_score,
        "analysis complete"
    );
    report
}

/// First `preview_chars` characters of the text followed by an ellipsis.
pub fn preview(text: &str) -> String {
    let head: String = text.chars().take(HP.preview_chars).collect();
    format!("{head}...")
}

pub fn envelope(text: &str) -> Envelope {
    Envelope {
        status: "success".to_string(),
        extracted_text_preview: preview(text),
        data: analyze(text),
    }
}
