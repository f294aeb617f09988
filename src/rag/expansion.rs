//! Rule-based query expansion.

/// Adds phrasings to a question when it contains any trigger word.
#[derive(Debug, Clone)]
pub struct ExpansionRule {
    /// Lowercase substrings that activate the rule.
    pub triggers: Vec<String>,
    /// Variant templates; `{query}` is replaced with the original question.
    pub templates: Vec<String>,
}

impl ExpansionRule {
    pub fn new(triggers: &[&str], templates: &[&str]) -> Self {
        Self {
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            templates: templates.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.triggers.iter().any(|t| lowered.contains(t.as_str()))
    }
}

/// Expands a question into the list of queries run against the index.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    rules: Vec<ExpansionRule>,
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new(vec![
            ExpansionRule::new(
                &["lyrics", "song"],
                &["complete text of {query}", "full lyrics {query}", "song content {query}"],
            ),
            ExpansionRule::new(
                &["quote", "said"],
                &["exact words {query}", "transcript {query}", "mentioned {query}"],
            ),
        ])
    }
}

impl QueryExpander {
    pub fn new(rules: Vec<ExpansionRule>) -> Self {
        Self { rules }
    }

    /// Add a rule after the existing ones.
    pub fn with_rule(mut self, rule: ExpansionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The question itself, followed by the variants of every matching rule
    /// in rule order.
    pub fn expand(&self, question: &str) -> Vec<String> {
        let lowered = question.to_lowercase();
        let mut queries = vec![question.to_string()];

        for rule in self.rules.iter().filter(|r| r.matches(&lowered)) {
            queries.extend(rule.templates.iter().map(|t| t.replace("{query}", question)));
        }

        queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_question_is_unchanged() {
        let queries = QueryExpander::default().expand("What is ownership?");
        assert_eq!(queries, vec!["What is ownership?".to_string()]);
    }

    #[test]
    fn test_lyrics_and_quote_rules_stack() {
        let q = "What Song lyrics were quoted?";
        let queries = QueryExpander::default().expand(q);
        assert_eq!(
            queries,
            vec![
                q.to_string(),
                format!("complete text of {}", q),
                format!("full lyrics {}", q),
                format!("song content {}", q),
                format!("exact words {}", q),
                format!("transcript {}", q),
                format!("mentioned {}", q),
            ]
        );
    }

    #[test]
    fn test_custom_rule() {
        let expander = QueryExpander::default()
            .with_rule(ExpansionRule::new(&["recipe"], &["ingredients {query}"]));
        assert_eq!(
            expander.expand("the recipe"),
            vec!["the recipe".to_string(), "ingredients the recipe".to_string()]
        );
    }
}
