//! Ordered, first-match-wins rule tables.
//!
//! Categorization, operation tagging and noise stripping are all expressed
//! as `(pattern, value)` rows evaluated top to bottom.

use regex::Regex;

/// One row of a [`RuleTable`].
#[derive(Debug, Clone)]
pub struct Rule<T> {
    pub pattern: Regex,
    pub value: T,
}

impl<T> Rule<T> {
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// An ordered list of rules. Order is the priority.
#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    rules: Vec<Rule<T>>,
}

impl<T> RuleTable<T> {
    /// Build a table from `(regex, value)` rows, keeping their order.
    pub fn from_rows<I>(rows: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'static str, T)>,
    {
        let rules = rows
            .into_iter()
            .map(|(pattern, value)| {
                Ok(Rule {
                    pattern: Regex::new(pattern)?,
                    value,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Value of the first rule whose pattern matches `text`.
    pub fn first_match(&self, text: &str) -> Option<&T> {
        self.rules
            .iter()
            .find(|r| r.is_match(text))
            .map(|r| &r.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule<T>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleTable<&'static str> {
    /// Apply every rule in order as a substitution, each row's value being
    /// the replacement text.
    pub fn replace_all(&self, text: &str) -> String {
        self.rules.iter().fold(text.to_string(), |acc, rule| {
            rule.pattern.replace_all(&acc, rule.value).into_owned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let table = RuleTable::from_rows([
            (r"(?i)fee", "fee"),
            (r"(?i)transfer", "transfer"),
        ])
        .unwrap();
        assert_eq!(table.first_match("transfer fee"), Some(&"fee"));
        assert_eq!(table.first_match("incoming transfer"), Some(&"transfer"));
        assert_eq!(table.first_match("coffee shop"), Some(&"fee"));
        assert_eq!(table.first_match("groceries"), None);
    }

    #[test]
    fn test_replace_all_runs_in_order() {
        let table = RuleTable::from_rows([(r"ab", "b"), (r"bb", "X")]).unwrap();
        assert_eq!(table.replace_all("abb"), "X");
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(RuleTable::from_rows([(r"(unclosed", 1)]).is_err());
    }
}
