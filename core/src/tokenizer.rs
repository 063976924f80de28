use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)[\p{L}\p{M}\p{N}]+(?:'[\p{L}\p{M}]+)?").expect("valid regex");
    static ref TAG: Regex = Regex::new(r"<[^<>]*>").expect("valid regex");
    static ref ENTITY: Regex = Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","also","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","else","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "just","let's","may","me","might","more","most","must","mustn't","my","myself",
            "no","nor","not","now","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","shall","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","upon","us","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","will","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Replace leaked HTML tags and character entities with spaces.
pub fn strip_markup(text: &str) -> Cow<'_, str> {
    if !text.contains('<') && !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let without_tags = TAG.replace_all(text, " ");
    Cow::Owned(ENTITY.replace_all(&without_tags, " ").into_owned())
}

/// Turn one lowercased word into an index term, or `None` if it is filtered out.
fn term_for(word: &str) -> Option<String> {
    if is_stopword(word) || word.chars().count() < 2 { return None; }
    Some(STEMMER.stem(word).into_owned())
}

/// Tokenize text into (term, position) using markup stripping, NFKC normalization,
/// lowercase, stopword removal, and stemming. Positions count every word, filtered or not.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    let normalized = strip_markup(text).nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for (pos, mat) in WORD.find_iter(&normalized).enumerate() {
        if let Some(term) = term_for(mat.as_str()) {
            tokens.push((term, pos));
        }
    }
    tokens
}

/// Ordered sequence of terms; what the index and the query engine both see.
pub fn normalize(text: &str) -> Vec<String> {
    tokenize(text).into_iter().map(|(term, _)| term).collect()
}

/// Terms with their byte ranges in `text`, which must already be markup-free.
pub fn term_spans(text: &str) -> impl Iterator<Item = (String, Range<usize>)> + '_ {
    WORD.find_iter(text).filter_map(|mat| {
        let word = mat.as_str().nfkc().collect::<String>().to_lowercase();
        term_for(&word).map(|term| (term, mat.range()))
    })
}
