/// Tokens examined when sampling a transcript for its language mix.
const SAMPLE_SIZE: usize = 500;

/// Ratio strictly above which a language class counts as "present" for
/// mixed-language detection: 20%/80% is not mixed, 21%/79% is.
const MIX_THRESHOLD: f64 = 0.20;

const VIETNAMESE_DIACRITICS: &str = "àáảãạăằắẳẵặâầấẩẫậđèéẻẽẹêềếểễệìíỉĩịòóỏõọôồốổỗộơờớởỡợùúủũụưừứửữựỳýỷỹỵ";

/// Common Vietnamese function words, including undiacritized spellings
/// (common in casual typing) that the diacritic check alone would miss.
const VIETNAMESE_COMMON_WORDS: &[&str] = &[
	"va", "cua", "la", "co", "duoc", "nay", "cho", "voi", "khong", "mot", "cac", "nhung", "de", "da", "se", "toi", "chung", "minh", "rat", "của", "là", "có", "được", "với",
	"không", "một", "các", "những", "để", "đã", "sẽ", "tôi", "chúng", "mình", "rất",
];

const ENGLISH_COMMON_WORDS: &[&str] = &[
	"the", "and", "is", "are", "was", "were", "have", "has", "will", "would", "could", "should", "this", "that", "with", "for", "from", "meeting", "team", "we", "you", "they",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenLang {
	Vietnamese,
	English,
}

fn normalize(token: &str) -> String {
	token.to_lowercase().chars().filter(|c| c.is_alphanumeric()).collect()
}

fn classify(token: &str) -> Option<TokenLang> {
	let normalized = normalize(token);
	if normalized.is_empty() {
		return None;
	}

	if normalized.chars().any(|c| VIETNAMESE_DIACRITICS.contains(c)) {
		return Some(TokenLang::Vietnamese);
	}
	if VIETNAMESE_COMMON_WORDS.contains(&normalized.as_str()) {
		return Some(TokenLang::Vietnamese);
	}
	if normalized.is_ascii() && ENGLISH_COMMON_WORDS.contains(&normalized.as_str()) {
		return Some(TokenLang::English);
	}

	None
}

/// Inspects the first 500 tokens of `text` and classifies each as
/// Vietnamese or English. Returns `(is_mixed, primary_language,
/// ratio_string)`.
#[must_use]
pub fn detect_language_mix(text: &str) -> (bool, String, String) {
	let tokens: Vec<&str> = text.split_whitespace().take(SAMPLE_SIZE).collect();
	let total = tokens.len().max(1);

	let (mut vn_count, mut en_count) = (0usize, 0usize);
	for token in &tokens {
		match classify(token) {
			Some(TokenLang::Vietnamese) => vn_count += 1,
			Some(TokenLang::English) => en_count += 1,
			None => {}
		}
	}

	#[allow(clippy::cast_precision_loss)]
	let vn_ratio = vn_count as f64 / total as f64;
	#[allow(clippy::cast_precision_loss)]
	let en_ratio = en_count as f64 / total as f64;

	let is_mixed = vn_ratio > MIX_THRESHOLD && en_ratio > MIX_THRESHOLD;

	// Tie-breaker: whichever ratio is higher wins; an exact tie defaults to
	// Vietnamese, the pipeline's configured default language.
	let primary = if en_ratio > vn_ratio { "en" } else { "vi" };

	let ratio_string = format!("vi:{:.1}%,en:{:.1}%", vn_ratio * 100.0, en_ratio * 100.0);

	(is_mixed, primary.to_string(), ratio_string)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn repeat_words(word: &str, n: usize) -> String {
		std::iter::repeat(word).take(n).collect::<Vec<_>>().join(" ")
	}

	#[test]
	fn pure_vietnamese_is_not_mixed() {
		let text = repeat_words("không", 50);
		let (is_mixed, primary, _) = detect_language_mix(&text);
		assert!(!is_mixed);
		assert_eq!(primary, "vi");
	}

	#[test]
	fn pure_english_is_not_mixed() {
		let text = repeat_words("the", 50);
		let (is_mixed, primary, _) = detect_language_mix(&text);
		assert!(!is_mixed);
		assert_eq!(primary, "en");
	}

	#[test]
	fn exactly_20_80_split_is_not_mixed() {
		// 20 vietnamese tokens + 80 english tokens = 100 total, 20%/80%.
		let text = format!("{} {}", repeat_words("không", 20), repeat_words("the", 80));
		let (is_mixed, _, _) = detect_language_mix(&text);
		assert!(!is_mixed, "exactly 20%/80% must not count as mixed");
	}

	#[test]
	fn just_over_20_80_split_is_mixed() {
		// 21 vietnamese + 79 english = 100 total, 21%/79%.
		let text = format!("{} {}", repeat_words("không", 21), repeat_words("the", 79));
		let (is_mixed, _, _) = detect_language_mix(&text);
		assert!(is_mixed, "21%/79% must count as mixed");
	}

	#[test]
	fn primary_language_follows_higher_ratio() {
		let text = format!("{} {}", repeat_words("không", 30), repeat_words("the", 70));
		let (_, primary, _) = detect_language_mix(&text);
		assert_eq!(primary, "en");
	}

	#[test]
	fn only_first_500_tokens_are_sampled() {
		let mostly_vietnamese = format!("{} {}", repeat_words("không", 500), repeat_words("the", 5000));
		let (is_mixed, primary, _) = detect_language_mix(&mostly_vietnamese);
		assert!(!is_mixed, "the english tail beyond token 500 must not be counted");
		assert_eq!(primary, "vi");
	}
}
