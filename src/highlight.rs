use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A piece of field text, marked when it is an occurrence of a highlight
/// term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub content: String,
    pub highlighted: bool,
}

impl Span {
    pub fn plain(content: &str) -> Self {
        Self {
            content: content.to_string(),
            highlighted: false,
        }
    }

    fn marked(content: &str) -> Self {
        Self {
            content: content.to_string(),
            highlighted: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightAction {
    Add,
    Remove,
}

/// Highlight terms of one screen. Terms keep the casing they were added
/// with; membership and matching ignore case.
#[derive(Debug, Clone, Default)]
pub struct HighlightSet {
    terms: Vec<String>,
    // Rebuilt on every change; `None` when there are no terms.
    matcher: Option<Regex>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn has_term(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        self.terms.iter().any(|stored| stored.to_lowercase() == needle)
    }

    pub fn add_term(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() || self.has_term(term) {
            return false;
        }

        self.terms.push(term.to_string());
        self.rebuild_matcher();
        debug!(term, terms = self.terms.len(), "added highlight");
        true
    }

    pub fn remove_term(&mut self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        let before = self.terms.len();
        self.terms.retain(|stored| stored.to_lowercase() != needle);
        if self.terms.len() == before {
            return false;
        }

        self.rebuild_matcher();
        debug!(term, terms = self.terms.len(), "removed highlight");
        true
    }

    /// What the context menu offers for a text selection.
    pub fn action_for(&self, selection: &str) -> Option<HighlightAction> {
        let selection = selection.trim();
        if selection.is_empty() {
            return None;
        }

        if self.has_term(selection) {
            Some(HighlightAction::Remove)
        } else {
            Some(HighlightAction::Add)
        }
    }

    pub fn toggle(&mut self, selection: &str) -> Option<HighlightAction> {
        let action = self.action_for(selection)?;
        match action {
            HighlightAction::Add => self.add_term(selection),
            HighlightAction::Remove => self.remove_term(selection),
        };
        Some(action)
    }

    /// Splits `text` into spans that concatenate back to `text`. Empty text
    /// yields no spans.
    pub fn segment(&self, text: &str) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }

        let Some(matcher) = self.matcher.as_ref() else {
            return vec![Span::plain(text)];
        };

        let mut spans: Vec<Span> = Vec::new();
        let mut cursor = 0;
        for found in matcher.find_iter(text) {
            if found.is_empty() {
                continue;
            }
            if !self.has_term(found.as_str()) {
                // Case folding can match text that lower-casing does not
                // consider equal; leave such pieces in the plain run.
                continue;
            }
            push_plain(&mut spans, &text[cursor..found.start()]);
            spans.push(Span::marked(found.as_str()));
            cursor = found.end();
        }
        push_plain(&mut spans, &text[cursor..]);

        spans
    }

    fn rebuild_matcher(&mut self) {
        if self.terms.is_empty() {
            self.matcher = None;
            return;
        }

        // Alternation order is declaration order; the engine prefers the
        // leftmost alternative, so earlier terms win at a shared position.
        let pattern = self
            .terms
            .iter()
            .map(|term| regex::escape(term))
            .collect::<Vec<_>>()
            .join("|");

        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(regex) => self.matcher = Some(regex),
            Err(err) => {
                warn!("unable to build the highlight pattern: {err}");
                self.matcher = None;
            }
        }
    }
}

fn push_plain(spans: &mut Vec<Span>, content: &str) {
    if content.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if !last.highlighted => last.content.push_str(content),
        _ => spans.push(Span::plain(content)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(spans: &[Span]) -> String {
        spans.iter().map(|span| span.content.as_str()).collect()
    }

    fn marked(spans: &[Span]) -> Vec<&str> {
        spans
            .iter()
            .filter(|span| span.highlighted)
            .map(|span| span.content.as_str())
            .collect()
    }

    #[test]
    fn highlights_a_trailing_term() {
        let mut set = HighlightSet::new();
        set.add_term("engineer");

        let spans = set.segment("John is a highly skilled engineer");
        assert_eq!(
            spans,
            vec![
                Span::plain("John is a highly skilled "),
                Span::marked("engineer"),
            ]
        );
    }

    #[test]
    fn output_preserves_source_casing() {
        let mut set = HighlightSet::new();
        set.add_term("ai");

        let spans = set.segment("AI ACCOUNTANT with in house Ai");
        assert_eq!(marked(&spans), vec!["AI", "Ai"]);
        assert_eq!(joined(&spans), "AI ACCOUNTANT with in house Ai");
    }

    #[test]
    fn pattern_characters_match_literally() {
        let mut set = HighlightSet::new();
        set.add_term("C++");
        set.add_term("(beta)");
        set.add_term(".*");

        let text = "Built in C++ (beta) with no .* wildcards, not C or CC";
        let spans = set.segment(text);
        assert_eq!(joined(&spans), text);
        assert_eq!(marked(&spans), vec!["C++", "(beta)", ".*"]);
    }

    #[test]
    fn first_declared_term_wins_at_a_shared_position() {
        let mut set = HighlightSet::new();
        set.add_term("data");
        set.add_term("database");

        let spans = set.segment("database");
        assert_eq!(spans, vec![Span::marked("data"), Span::plain("base")]);

        let mut reversed = HighlightSet::new();
        reversed.add_term("database");
        reversed.add_term("data");
        assert_eq!(reversed.segment("database"), vec![Span::marked("database")]);
    }

    #[test]
    fn all_occurrences_are_marked() {
        let mut set = HighlightSet::new();
        set.add_term("seed");

        let spans = set.segment("Seed stage, seed funding");
        assert_eq!(
            spans,
            vec![
                Span::marked("Seed"),
                Span::plain(" stage, "),
                Span::marked("seed"),
                Span::plain(" funding"),
            ]
        );
    }

    #[test]
    fn empty_inputs() {
        let set = HighlightSet::new();
        assert!(set.segment("").is_empty());
        assert_eq!(set.segment("plain text"), vec![Span::plain("plain text")]);

        let mut with_terms = HighlightSet::new();
        with_terms.add_term("x");
        assert!(with_terms.segment("").is_empty());
    }

    #[test]
    fn membership_ignores_case() {
        let mut set = HighlightSet::new();
        assert!(set.add_term("Engineer"));
        assert!(set.has_term("engineer"));
        assert!(!set.add_term("ENGINEER"));
        assert_eq!(set.terms(), &["Engineer".to_string()]);

        assert!(set.remove_term("engineer"));
        assert!(set.is_empty());
        assert!(!set.remove_term("engineer"));
    }

    #[test]
    fn blank_terms_are_ignored() {
        let mut set = HighlightSet::new();
        assert!(!set.add_term("   "));
        assert!(set.is_empty());
        assert_eq!(set.action_for("  "), None);
    }

    #[test]
    fn toggle_follows_the_context_menu_action() {
        let mut set = HighlightSet::new();
        assert_eq!(set.action_for(" Seed "), Some(HighlightAction::Add));
        assert_eq!(set.toggle(" Seed "), Some(HighlightAction::Add));
        assert_eq!(set.terms(), &["Seed".to_string()]);

        assert_eq!(set.action_for("seed"), Some(HighlightAction::Remove));
        assert_eq!(set.toggle("seed"), Some(HighlightAction::Remove));
        assert!(set.is_empty());
        assert_eq!(set.segment("Seed"), vec![Span::plain("Seed")]);
    }
}
