use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref IRREGULAR: HashMap<&'static str, &'static str> = {
        let pairs: &[(&str, &str)] = &[
            ("children","child"),("men","man"),("women","woman"),("people","person"),("mice","mouse"),
            ("feet","foot"),("teeth","tooth"),("geese","goose"),("data","datum"),("criteria","criterion"),
            ("phenomena","phenomenon"),("analyses","analysis"),("theses","thesis"),("indices","index"),
            ("matrices","matrix"),("appendices","appendix"),
            ("is","be"),("are","be"),("was","be"),("were","be"),("been","be"),("being","be"),
            ("has","have"),("had","have"),("having","have"),("did","do"),("does","do"),("done","do"),
            ("went","go"),("gone","go"),("ran","run"),("made","make"),("found","find"),("took","take"),
            ("taken","take"),("gave","give"),("given","give"),("knew","know"),("known","know"),
            ("wrote","write"),("written","write"),("began","begin"),("begun","begin"),("saw","see"),("seen","see"),
            ("better","good"),("best","good"),("worse","bad"),("worst","bad"),
        ];
        pairs.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// How terms are reduced to a canonical form before indexing and querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextNormalization {
    Lemmatization,
    Stemming,
}

impl TextNormalization {
    pub const ALL: [TextNormalization; 2] = [TextNormalization::Lemmatization, TextNormalization::Stemming];

    /// Suffix used in persisted index file names.
    pub fn file_suffix(self) -> &'static str {
        match self {
            TextNormalization::Lemmatization => "corpus_lemmas",
            TextNormalization::Stemming => "corpus_stems",
        }
    }

    pub fn code(self) -> char {
        match self {
            TextNormalization::Lemmatization => 'l',
            TextNormalization::Stemming => 's',
        }
    }
}

impl fmt::Display for TextNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextNormalization::Lemmatization => f.write_str("lemmatization"),
            TextNormalization::Stemming => f.write_str("stemming"),
        }
    }
}

impl FromStr for TextNormalization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "l" | "lemmatization" => Ok(TextNormalization::Lemmatization),
            "s" | "stemming" => Ok(TextNormalization::Stemming),
            other => Err(Error::InvalidNormalization(other.to_string())),
        }
    }
}

/// Tokenize text: accent folding, lowercase, stopword removal. Apostrophes are dropped
/// from the surviving words.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded = text.nfkd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase();
    RE.find_iter(&folded)
        .map(|m| m.as_str())
        .filter(|token| !is_stopword(token))
        .map(|token| token.replace('\'', ""))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Tokenize and reduce each token with the given method.
pub fn normalize(text: &str, method: TextNormalization) -> Vec<String> {
    let tokens = tokenize(text);
    match method {
        TextNormalization::Stemming => tokens.iter().map(|t| STEMMER.stem(t).into_owned()).collect(),
        TextNormalization::Lemmatization => tokens.iter().map(|t| lemmatize(t)).collect(),
    }
}

/// Dictionary-free English lemmatizer: irregular forms first, then plural suffixes.
///
/// Verb inflections other than the irregular table are left alone; stripping -ing/-ed
/// without a lexicon does more harm than good.
pub fn lemmatize(token: &str) -> String {
    if let Some(lemma) = IRREGULAR.get(token) {
        return (*lemma).to_string();
    }
    let len = token.chars().count();
    if len > 4 && token.ends_with("ies") {
        return format!("{}y", &token[..token.len() - 3]);
    }
    if token.ends_with("sses") || token.ends_with("xes") || token.ends_with("ches") || token.ends_with("shes") || token.ends_with("zzes") {
        return token[..token.len() - 2].to_string();
    }
    if len > 3 && token.ends_with('s') && !(token.ends_with("ss") || token.ends_with("us") || token.ends_with("is")) {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}
