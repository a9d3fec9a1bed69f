/// Lowercased ASCII-alphabetic words of at least `min_word_length` chars.
///
/// A word is a maximal run of word characters (alphanumerics and `_`);
/// runs containing anything other than ASCII letters are dropped whole, so
/// `abc123` and `café` produce nothing.
pub fn tokenize(text: &str, min_word_length: usize) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty() && word.bytes().all(|b| b.is_ascii_alphabetic()))
        .filter(|word| word.len() >= min_word_length)
        .map(|word| word.to_ascii_lowercase())
        .collect()
}
