use crate::traits::TextSplitter;

/// Default splitter: alphanumeric runs, keeping intra-word `'` and `-`.
/// Callers lowercase before tokenizing; the splitter does not.
pub struct WordSplitter;

impl TextSplitter for WordSplitter {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();

        for ch in text.chars() {
            if ch.is_alphanumeric() || (matches!(ch, '\'' | '-') && !current.is_empty()) {
                current.push(ch);
            } else {
                push_token(&mut tokens, &mut current);
            }
        }
        push_token(&mut tokens, &mut current);

        tokens
    }
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    let token = current.trim_end_matches(['\'', '-']);
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_punctuation_and_whitespace() {
        let tokens = WordSplitter.tokenize("this is spam, honestly: spam!");
        assert_eq!(tokens, vec!["this", "is", "spam", "honestly", "spam"]);
    }

    #[test]
    fn keeps_intra_word_apostrophe_and_hyphen() {
        let tokens = WordSplitter.tokenize("don't re-sell anything");
        assert_eq!(tokens, vec!["don't", "re-sell", "anything"]);
    }

    #[test]
    fn drops_dangling_punctuation() {
        let tokens = WordSplitter.tokenize("weird- 'quoted'");
        assert_eq!(tokens, vec!["weird", "quoted"]);
    }

    #[test]
    fn empty_text_yields_no_tokens() {
        assert!(WordSplitter.tokenize("").is_empty());
        assert!(WordSplitter.tokenize("  ...  ").is_empty());
    }
}
