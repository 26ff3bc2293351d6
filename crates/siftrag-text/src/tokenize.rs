use std::borrow::Cow;
use tantivy::tokenizer::{LowerCaser, TextAnalyzer, TokenStream, WhitespaceTokenizer};

/// Lowercase + whitespace tokenizer shared by indexing and querying.
///
/// No stemming and no stop-word removal: "Goals," and "goals" are different
/// terms, exactly as a plain `lower().split()` would treat them.
///
/// Tantivy's whitespace tokenizer only splits on ASCII whitespace, so other
/// Unicode whitespace (no-break space, em space, ideographic space) is
/// mapped to a plain space first.
#[derive(Clone)]
pub struct SparseTokenizer {
	analyzer: TextAnalyzer,
}

impl Default for SparseTokenizer {
	fn default() -> Self {
		let analyzer = TextAnalyzer::builder(WhitespaceTokenizer::default()).filter(LowerCaser).build();
		Self { analyzer }
	}
}

impl SparseTokenizer {
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let text = normalize_whitespace(text);
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(&text);
		let mut tokens = Vec::new();
		while stream.advance() { tokens.push(stream.token().text.clone()); }
		tokens
	}
}

fn normalize_whitespace(text: &str) -> Cow<'_, str> {
	if text.chars().all(|c| c.is_ascii() || !c.is_whitespace()) { return Cow::Borrowed(text); }
	Cow::Owned(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }).collect())
}
