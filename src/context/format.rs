//! Prompt text for the journal context.

use crate::config::SectionMatching;
use crate::models::{JournalSource, RecentNote};
use chrono::{Local, TimeZone};
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

/// Fenced code block, non-greedy, spanning lines.
static CODE_BLOCK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").unwrap_or_else(|_| unreachable!()));

/// Removes every fenced code block (paired triple backticks) from `content`.
#[must_use]
pub fn strip_code_blocks(content: &str) -> String {
    CODE_BLOCK_PATTERN.replace_all(content, "").into_owned()
}

/// Formats a millisecond timestamp as a local `M/D/YYYY` date.
#[must_use]
pub fn format_local_date(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| "Invalid Date".to_string(), |dt| dt.format("%-m/%-d/%Y").to_string())
}

/// Renders the journal and recent notes into the user message.
///
/// The month and year sections are picked out of `journal` again according
/// to `matching`; with [`SectionMatching::Title`] a daily note titled
/// "... Monthly ..." lands in the month section too.
#[must_use]
pub fn format_notes_for_prompt(
    journal: &[RecentNote],
    recent: &[RecentNote],
    matching: SectionMatching,
) -> String {
    let mut prompt = String::from("User's recent journal:\n");

    push_section(&mut prompt, "Recent Daily Notes", journal.iter());

    let month = |note: &&RecentNote| match matching {
        SectionMatching::Title => note.title.contains("Monthly"),
        SectionMatching::Source => note.source == Some(JournalSource::Monthly),
    };
    push_section(&mut prompt, "Current Month Note", journal.iter().filter(month));

    let year = |note: &&RecentNote| match matching {
        SectionMatching::Title => note.title.contains("Yearly"),
        SectionMatching::Source => note.source == Some(JournalSource::Yearly),
    };
    push_section(&mut prompt, "Current Year Note", journal.iter().filter(year));

    if !recent.is_empty() {
        prompt.push_str("\nRecently created or modified notes:\n");
        for note in recent {
            let _ = writeln!(
                prompt,
                "- {} (Modified: {})",
                note.title,
                format_local_date(note.mtime)
            );
        }
    }

    prompt
}

fn push_section<'a>(
    prompt: &mut String,
    heading: &str,
    notes: impl Iterator<Item = &'a RecentNote>,
) {
    let mut notes = notes.peekable();
    if notes.peek().is_none() {
        return;
    }

    let _ = writeln!(prompt, "\n{heading}:");
    for note in notes {
        let _ = writeln!(
            prompt,
            "\n{} ({}):\n{}",
            note.title,
            format_local_date(note.ctime),
            note.content.as_deref().unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn journal_note(title: &str, ctime: i64, content: &str, source: JournalSource) -> RecentNote {
        RecentNote::new(title, ctime, ctime)
            .with_content(content)
            .with_source(source)
    }

    #[test]
    fn test_strip_inline_and_multiline_blocks() {
        assert_eq!(strip_code_blocks("ok ```code``` here"), "ok  here");
        assert_eq!(
            strip_code_blocks("a\n```\nx\n```\nb\n```js\ny\n```\nc"),
            "a\n\nb\n\nc"
        );
    }

    #[test]
    fn test_strip_without_blocks_is_identity() {
        let text = "no fences, just `inline` code";
        assert_eq!(strip_code_blocks(text), text);
    }

    #[test]
    fn test_strip_leaves_unpaired_fence() {
        assert_eq!(strip_code_blocks("```a``` tail ```"), " tail ```");
    }

    proptest! {
        #[test]
        fn prop_strip_is_idempotent(s in "[a-z `\n]{0,80}") {
            let once = strip_code_blocks(&s);
            let twice = strip_code_blocks(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_strip_without_backticks_is_identity(s in "[^`]{0,80}") {
            prop_assert_eq!(strip_code_blocks(&s), s);
        }
    }

    #[test]
    fn test_empty_inputs_render_header_only() {
        let prompt = format_notes_for_prompt(&[], &[], SectionMatching::Title);
        assert_eq!(prompt, "User's recent journal:\n");
    }

    #[test]
    fn test_daily_section_layout() {
        let journal = vec![journal_note("Day1", 100, "ok  here", JournalSource::Daily)];
        let prompt = format_notes_for_prompt(&journal, &[], SectionMatching::Title);
        let expected = format!(
            "User's recent journal:\n\nRecent Daily Notes:\n\nDay1 ({}):\nok  here\n",
            format_local_date(100)
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_recent_section_lists_titles_only() {
        let recent = vec![RecentNote::new("Garden", 1, 2).with_content("secret body")];
        let prompt = format_notes_for_prompt(&[], &recent, SectionMatching::Title);
        assert!(prompt.contains("\nRecently created or modified notes:\n"));
        assert!(prompt.contains(&format!("- Garden (Modified: {})\n", format_local_date(2))));
        assert!(!prompt.contains("secret body"));
    }

    #[test]
    fn test_title_matching_picks_by_substring() {
        let journal = vec![
            journal_note("Monthly musings", 3, "daily", JournalSource::Daily),
            journal_note("June", 2, "month", JournalSource::Monthly),
            journal_note("2024 Yearly", 1, "year", JournalSource::Yearly),
        ];
        let prompt = format_notes_for_prompt(&journal, &[], SectionMatching::Title);

        let month = prompt.split("Current Month Note:").nth(1).unwrap();
        let month = month.split("Current Year Note:").next().unwrap();
        assert!(month.contains("Monthly musings"));
        assert!(!month.contains("June"));
        assert!(prompt.contains("\nCurrent Year Note:\n\n2024 Yearly"));
    }

    #[test]
    fn test_source_matching_ignores_titles() {
        let journal = vec![
            journal_note("Monthly musings", 3, "daily", JournalSource::Daily),
            journal_note("June", 2, "month", JournalSource::Monthly),
        ];
        let prompt = format_notes_for_prompt(&journal, &[], SectionMatching::Source);

        let month = prompt.split("Current Month Note:").nth(1).unwrap();
        assert!(month.contains("June"));
        assert!(!month.contains("Monthly musings"));
        assert!(!prompt.contains("Current Year Note"));
    }

    #[test]
    fn test_absent_content_renders_empty() {
        let journal = vec![RecentNote::new("Blank", 5, 5)];
        let prompt = format_notes_for_prompt(&journal, &[], SectionMatching::Title);
        assert!(prompt.ends_with(&format!("Blank ({}):\n\n", format_local_date(5))));
    }

    #[test]
    fn test_local_date_format() {
        let millis = Local
            .with_ymd_and_hms(2024, 6, 5, 12, 0, 0)
            .single()
            .unwrap()
            .timestamp_millis();
        assert_eq!(format_local_date(millis), "6/5/2024");
    }
}
