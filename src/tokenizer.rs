/// Splits a statement into whitespace-separated words.
///
/// There is no quoting: `'New York'` becomes the two words `'New` and
/// `York'`. Punctuation stays attached to its word, so `(1,` is one word.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns its words in order.
    ///
    /// # Example
    /// ```
    /// # use probedb::tokenizer::Tokenizer;
    /// let words = Tokenizer::new("SELECT *  FROM\tusers").tokenize();
    /// assert_eq!(words, vec!["SELECT", "*", "FROM", "users"]);
    /// ```
    pub fn tokenize(&mut self) -> Vec<String> {
        let mut words = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            words.push(self.read_word());
        }

        words
    }

    // --- Navigation Helpers ---

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();

        while !self.is_at_end() && !self.current_char().is_whitespace() {
            word.push(self.current_char());
            self.advance();
        }

        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        let tokens = Tokenizer::new("CREATE TABLE users").tokenize();
        assert_eq!(tokens, vec!["CREATE", "TABLE", "users"]);
    }

    #[test]
    fn test_tokenize_keeps_punctuation_attached() {
        let tokens = Tokenizer::new("INSERT INTO student VALUES (1, 'Jon', 22)").tokenize();

        assert_eq!(
            tokens,
            vec!["INSERT", "INTO", "student", "VALUES", "(1,", "'Jon',", "22)"]
        );
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        let tokens = Tokenizer::new("  a \t b\n\nc  ").tokenize();
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(Tokenizer::new("").tokenize().is_empty());
        assert!(Tokenizer::new("   \t").tokenize().is_empty());
    }
}
