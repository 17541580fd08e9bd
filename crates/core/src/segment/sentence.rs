use regex::Regex;

use super::phrase::Phrase;

lazy_static::lazy_static! {
    static ref EXPLANATION_START: Regex = Regex::new(r"[^a-zA-Z0-9$ %']").unwrap();
}

pub struct Explanation;

impl Explanation {
    /// Byte offset of the first character that cannot belong to an English
    /// expression.
    pub fn find(text: &str) -> Option<usize> {
        EXPLANATION_START.find(text).map(|m| m.start())
    }
}

/// Splits one dictionary line into expression and explanation.
#[derive(Debug, Clone, Default)]
pub struct Sentence {
    phrase: Phrase,
}

impl Sentence {
    pub fn new(phrase: Phrase) -> Self {
        Self { phrase }
    }

    pub fn phrase(&self) -> &Phrase {
        &self.phrase
    }

    /// Normalize the tags, then split before the first tag, or failing that
    /// before the first explanation character.
    pub fn refine(&self, line: &str) -> (String, Option<String>) {
        let line = self.phrase.replace_all(line);

        if let Some(first) = self.phrase.find_all(&line).first() {
            let (expression, explanation) = line.split_at(first.start);
            return (expression.to_string(), Some(explanation.to_string()));
        }

        match Explanation::find(&line) {
            Some(pos) if pos > 0 => {
                let (expression, explanation) = line.split_at(pos);
                (expression.to_string(), Some(explanation.to_string()))
            }
            _ => (line, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refine(line: &str) -> (String, Option<String>) {
        Sentence::default().refine(line)
    }

    #[test]
    fn test_explanation_find() {
        assert_eq!(Explanation::find("give up 放弃"), Some(8));
        assert_eq!(Explanation::find("50% off $5 don't"), None);
        assert_eq!(Explanation::find("(be) able"), Some(0));
    }

    #[test]
    fn test_refine_split_at_tag() {
        assert_eq!(
            refine("abandon v. 放弃，抛弃"),
            ("abandon ".to_string(), Some("v. 放弃，抛弃".to_string()))
        );
    }

    #[test]
    fn test_refine_normalizes_tag() {
        assert_eq!(
            refine("give up u 放弃"),
            ("give up ".to_string(), Some("v. 放弃".to_string()))
        );
        assert_eq!(
            refine("happy adj 快乐的"),
            ("happy ".to_string(), Some("adj. 快乐的".to_string()))
        );
    }

    #[test]
    fn test_refine_first_tag_wins() {
        assert_eq!(
            refine("run n. 跑 v. 奔跑"),
            ("run ".to_string(), Some("n. 跑 v. 奔跑".to_string()))
        );
    }

    #[test]
    fn test_refine_split_at_explanation() {
        assert_eq!(
            refine("give up 放弃"),
            ("give up ".to_string(), Some("放弃".to_string()))
        );
        assert_eq!(
            refine("don't worry 别担心"),
            ("don't worry ".to_string(), Some("别担心".to_string()))
        );
    }

    #[test]
    fn test_refine_without_explanation() {
        assert_eq!(refine("hello world"), ("hello world".to_string(), None));
        assert_eq!(refine("放弃"), ("放弃".to_string(), None));
    }

    #[test]
    fn test_refine_leading_tag() {
        assert_eq!(refine("v. 抛弃"), (String::new(), Some("v. 抛弃".to_string())));
    }
}
