//! The question type shared by the aggregator and dispatcher.
//!
//! `FeedItem` carries only the fields the monitor reads from a search result.
//! Items are transient: after they've been announced only their `id`
//! survives, as a ledger entry.

use serde::Deserialize;

/// A single search result, normalised from the API body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedItem {
    /// Question id, unique per site.  Used as the ledger key.
    #[serde(rename = "question_id")]
    pub id: u64,

    /// Display title, as returned by the API.
    pub title: String,

    /// Canonical question URL.  The API appends a slug segment that
    /// [`shorten_link`] strips.
    pub link: String,

    /// Whether the question has an accepted (or upvoted) answer.
    #[serde(default)]
    pub answered: bool,
}

impl FeedItem {
    /// The chat line announcing this item:
    /// `"<title> [<short link>]"`, plus `" [Answered]"` when answered.
    pub fn message(&self) -> String {
        let answered = if self.answered { " [Answered]" } else { "" };
        format!("{} [{}]{}", self.title, shorten_link(&self.link), answered)
    }
}

/// Drop the final `/`-separated segment of `link`.
///
/// Pure string surgery: no URL parsing, no special-casing of trailing
/// slashes.
pub fn shorten_link(link: &str) -> String {
    let segments: Vec<&str> = link.split('/').collect();
    segments[..segments.len() - 1].join("/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Shorthand constructor for tests.
    pub fn make_item(id: u64, title: &str, link: &str, answered: bool) -> FeedItem {
        FeedItem {
            id,
            title: title.to_string(),
            link: link.to_string(),
            answered,
        }
    }

    #[test]
    fn shorten_drops_last_segment() {
        assert_eq!(
            shorten_link("https://stackoverflow.com/q/123/456"),
            "https://stackoverflow.com/q/123"
        );
        assert_eq!(
            shorten_link("https://stackoverflow.com/questions/42/how-to-own-a-pointer"),
            "https://stackoverflow.com/questions/42"
        );
    }

    #[test]
    fn shorten_trailing_slash_drops_empty_segment() {
        assert_eq!(shorten_link("https://example.com/a/"), "https://example.com/a");
    }

    #[test]
    fn shorten_without_slash_is_empty() {
        assert_eq!(shorten_link("no-slashes"), "");
        assert_eq!(shorten_link(""), "");
    }

    #[test]
    fn message_for_unanswered_question() {
        let item = make_item(42, "How to own a pointer", ".../42/99", false);
        assert_eq!(item.message(), "How to own a pointer [.../42]");
    }

    #[test]
    fn message_marks_answered_questions() {
        let item = make_item(
            7,
            "Borrowing in loops",
            "https://stackoverflow.com/questions/7/borrowing-in-loops",
            true,
        );
        assert_eq!(
            item.message(),
            "Borrowing in loops [https://stackoverflow.com/questions/7] [Answered]"
        );
    }

    #[test]
    fn deserializes_search_result_fields() {
        let json = r#"{
            "question_id": 99,
            "title": "A title",
            "link": "https://superuser.com/questions/99/a-title",
            "answered": true,
            "score": 3,
            "tags": ["linux"]
        }"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item, make_item(99, "A title", "https://superuser.com/questions/99/a-title", true));
    }
}
