use crate::io::table::{locate_column, open_table, parse_number, Delimiter};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordClass {
    Function,
    Content,
    Unclassified,
}

impl WordClass {
    pub fn as_str(self) -> &'static str {
        match self {
            WordClass::Function => "function",
            WordClass::Content => "content",
            WordClass::Unclassified => "NaN",
        }
    }
}

/// Function/content split over Universal POS tags.
pub fn word_class(upos: &str) -> WordClass {
    match upos {
        "ADP" | "AUX" | "CCONJ" | "SCONJ" | "DET" | "PRON" | "PART" | "INTJ" | "ADV" => {
            WordClass::Function
        }
        "NOUN" | "VERB" | "ADJ" | "PROPN" => WordClass::Content,
        _ => WordClass::Unclassified,
    }
}

/// Lowercase with ASCII punctuation removed (`c'era` → `cera`).
pub fn clean_token(token: &str) -> String {
    token
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}

/// ASCII punctuation removed, case kept.
pub fn clean_lemma(lemma: &str) -> String {
    lemma.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

/// Wordform → Zipf frequency table (e.g. SUBTLEX-IT).
#[derive(Debug, Clone, Default)]
pub struct FrequencyLexicon {
    zipf: HashMap<String, f64>,
}

impl FrequencyLexicon {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            zipf: pairs.into_iter().map(|(w, z)| (w.into(), z)).collect(),
        }
    }

    pub fn from_csv(path: &Path, word_column: &str, zipf_column: &str) -> Result<Self> {
        let delimiter = Delimiter::Auto.resolve(path)?;
        let (mut reader, headers) = open_table(path, delimiter)?;
        let word_idx = locate_column(&headers, word_column, path)?;
        let zipf_idx = locate_column(&headers, zipf_column, path)?;
        let mut zipf = HashMap::new();
        for (row, result) in reader.records().enumerate() {
            let record =
                result.with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;
            let word = record.get(word_idx).unwrap_or("");
            if let Some(z) = record.get(zipf_idx).and_then(|c| parse_number(c, delimiter)) {
                // a repeated wordform keeps its last row
                zipf.insert(word.to_string(), z);
            }
        }
        Ok(Self { zipf })
    }

    pub fn len(&self) -> usize {
        self.zipf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zipf.is_empty()
    }

    pub fn lookup(&self, cleaned_token: &str) -> Option<f64> {
        self.zipf.get(cleaned_token).copied()
    }
}

/// One token as emitted by the external tagger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub sentence_id: usize,
    pub token: String,
    pub lemma: String,
    pub upos: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub token_id: usize,
    pub sentence_id: usize,
    pub token: String,
    pub lemma: String,
    pub pos: String,
    pub zipf: Option<f64>,
    pub word_class: WordClass,
}

/// Drop punctuation tokens, clean the rest and attach frequency and class.
pub fn annotate_tokens(tokens: &[TaggedToken], lexicon: &FrequencyLexicon) -> Vec<AnnotatedToken> {
    tokens
        .iter()
        .filter(|t| t.upos != "PUNCT")
        .enumerate()
        .map(|(i, t)| {
            let token = clean_token(&t.token);
            AnnotatedToken {
                token_id: i + 1,
                sentence_id: t.sentence_id,
                zipf: lexicon.lookup(&token),
                token,
                lemma: clean_lemma(&t.lemma),
                pos: t.upos.clone(),
                word_class: word_class(&t.upos),
            }
        })
        .collect()
}

/// Read tagger output with `sentence_id`, `token`, `lemma`, `upos` columns.
pub fn read_tagged_tokens(path: &Path) -> Result<Vec<TaggedToken>> {
    let delimiter = Delimiter::Auto.resolve(path)?;
    let (mut reader, headers) = open_table(path, delimiter)?;
    let sentence_idx = locate_column(&headers, "sentence_id", path)?;
    let token_idx = locate_column(&headers, "token", path)?;
    let lemma_idx = locate_column(&headers, "lemma", path)?;
    let upos_idx = locate_column(&headers, "upos", path)?;
    let mut out = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let sentence_id = record
            .get(sentence_idx)
            .unwrap_or("")
            .parse::<usize>()
            .with_context(|| format!("{}: row {} sentence_id", path.display(), row + 1))?;
        out.push(TaggedToken {
            sentence_id,
            token: cell(token_idx),
            lemma: cell(lemma_idx),
            upos: cell(upos_idx),
        });
    }
    Ok(out)
}

/// `;`-separated with decimal commas, the layout downstream spreadsheets expect.
pub fn write_annotated_tokens(path: &Path, rows: &[AnnotatedToken]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "token_id",
        "sentence_ids",
        "tokens_no_punct",
        "lemma_no_punct",
        "PoS",
        "Zipf_freq",
        "type_of_words",
    ])?;
    for row in rows {
        let zipf = row
            .zipf
            .map(|z| z.to_string().replace('.', ","))
            .unwrap_or_default();
        writer.write_record([
            row.token_id.to_string().as_str(),
            row.sentence_id.to_string().as_str(),
            row.token.as_str(),
            row.lemma.as_str(),
            row.pos.as_str(),
            zipf.as_str(),
            row.word_class.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
