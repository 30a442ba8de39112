//! Character-level Unicode folding for Japanese search input.
//!
//! `normalize` maps free text to the canonical comparison form used by
//! mention search: ASCII is half-width, letters are lowercase, kana is
//! full-width hiragana, and whitespace is trimmed and collapsed. A query typed
//! in any width or kana script therefore matches a name indexed in any other.

/// Check the full Hiragana block (U+3040..U+309F). This includes a few unassigned
/// codepoints (U+3040, U+3097-3098) but these never appear in typed names,
/// so the simpler block-level check is preferred over an exact range.
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF). Includes rarely-used symbols
/// (゠ U+30A0, ヿ U+30FF) but no unassigned codepoints.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

/// Half-width katakana and punctuation block (U+FF61..U+FF9F).
pub fn is_halfwidth_katakana(c: char) -> bool {
    ('\u{FF61}'..='\u{FF9F}').contains(&c)
}

/// Convert a hiragana string to katakana.
/// Non-hiragana characters (ー, ASCII, etc.) are passed through unchanged.
pub fn hiragana_to_katakana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{3041}'..='\u{3096}').contains(&c) {
                char::from_u32(c as u32 + 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Convert a katakana string to hiragana.
/// ヷ..ヺ have no hiragana counterpart and pass through, as does ー.
pub fn katakana_to_hiragana(s: &str) -> String {
    s.chars().map(katakana_char_to_hiragana).collect()
}

fn katakana_char_to_hiragana(c: char) -> char {
    if ('\u{30A1}'..='\u{30F6}').contains(&c) {
        char::from_u32(c as u32 - 0x60).unwrap_or(c)
    } else {
        c
    }
}

/// Full-width forms for U+FF61..U+FF9F, indexed by `c - 0xFF61`.
/// The sound marks map to their combining forms so the composition pass
/// can merge them with the preceding kana.
const HALFWIDTH_KANA: [char; 63] = [
    '。', '「', '」', '、', '・', 'ヲ', 'ァ', 'ィ', 'ゥ', 'ェ', 'ォ', 'ャ', 'ュ', 'ョ', 'ッ', 'ー',
    'ア', 'イ', 'ウ', 'エ', 'オ', 'カ', 'キ', 'ク', 'ケ', 'コ', 'サ', 'シ', 'ス', 'セ', 'ソ', 'タ',
    'チ', 'ツ', 'テ', 'ト', 'ナ', 'ニ', 'ヌ', 'ネ', 'ノ', 'ハ', 'ヒ', 'フ', 'ヘ', 'ホ', 'マ', 'ミ',
    'ム', 'メ', 'モ', 'ヤ', 'ユ', 'ヨ', 'ラ', 'リ', 'ル', 'レ', 'ロ', 'ワ', 'ン', '\u{3099}',
    '\u{309A}',
];

const COMBINING_VOICED: char = '\u{3099}';
const COMBINING_SEMI_VOICED: char = '\u{309A}';

/// Fold one character to its full-width kana / half-width ASCII form.
fn fold_width(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        '\u{3000}' => ' ',
        '\u{FF61}'..='\u{FF9F}' => HALFWIDTH_KANA[(c as u32 - 0xFF61) as usize],
        _ => c,
    }
}

/// Katakana whose voiced form is the next codepoint (カ→ガ ... ト→ド, ハ行).
fn takes_voiced_mark(c: char) -> bool {
    matches!(
        c,
        'カ' | 'キ'
            | 'ク'
            | 'ケ'
            | 'コ'
            | 'サ'
            | 'シ'
            | 'ス'
            | 'セ'
            | 'ソ'
            | 'タ'
            | 'チ'
            | 'ツ'
            | 'テ'
            | 'ト'
            | 'ハ'
            | 'ヒ'
            | 'フ'
            | 'ヘ'
            | 'ホ'
    )
}

fn takes_semi_voiced_mark(c: char) -> bool {
    matches!(c, 'ハ' | 'ヒ' | 'フ' | 'ヘ' | 'ホ')
}

/// Merge `base` with a following sound mark. Hiragana bases are handled by
/// lifting them to katakana first; the caller folds the result back.
fn compose(base: char, mark: char) -> Option<char> {
    let kata = if ('\u{3041}'..='\u{3096}').contains(&base) {
        char::from_u32(base as u32 + 0x60)?
    } else {
        base
    };
    let composed = match mark {
        COMBINING_VOICED if kata == 'ウ' => 'ヴ',
        COMBINING_VOICED if takes_voiced_mark(kata) => char::from_u32(kata as u32 + 1)?,
        COMBINING_SEMI_VOICED if takes_semi_voiced_mark(kata) => char::from_u32(kata as u32 + 2)?,
        _ => return None,
    };
    Some(composed)
}

/// Width-fold and merge sound marks. Marks with nothing to attach to become
/// the spacing forms ゛ / ゜.
fn fold_and_compose(text: &str) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(text.len());
    for c in text.chars().map(fold_width) {
        if c == COMBINING_VOICED || c == COMBINING_SEMI_VOICED {
            if let Some(composed) = out.last().and_then(|&prev| compose(prev, c)) {
                out.pop();
                out.push(composed);
                continue;
            }
            out.push(if c == COMBINING_VOICED { '゛' } else { '゜' });
            continue;
        }
        out.push(c);
    }
    out
}

/// Canonical comparison form of `text`.
///
/// Pure, total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let folded: String = fold_and_compose(text)
        .into_iter()
        .flat_map(|c| katakana_char_to_hiragana(c).to_lowercase())
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `haystack` contains an already-normalized query.
pub fn contains_normalized(haystack: &str, normalized_query: &str) -> bool {
    normalize(haystack).contains(normalized_query)
}

/// Script- and case-insensitive substring test.
pub fn matches(haystack: &str, needle: &str) -> bool {
    contains_normalized(haystack, &normalize(needle))
}

/// Length in Unicode scalar values, the unit for every text limit.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Longest prefix of `s` with at most `max` chars.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
