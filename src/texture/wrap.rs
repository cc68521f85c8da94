const ELLIPSIS: &str = "...";

/// Greedy word wrap for card body text.
///
/// A candidate line is measured with its trailing space, and a break only
/// happens once the line already holds a word, so a single over-long word
/// still gets a line of its own. When more than `max_lines` lines result, the
/// last kept line loses its final word and gets an ellipsis; words keep being
/// dropped until the ellipsised line fits `max_width`.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    max_lines: usize,
    measure: impl Fn(&str) -> f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = format!("{current}{word} ");
        if measure(&candidate) > max_width && !current.is_empty() {
            lines.push(current.trim().to_string());
            current = format!("{word} ");
        } else {
            current = candidate;
        }
    }
    lines.push(current.trim().to_string());

    if max_lines == 0 {
        return Vec::new();
    }
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = ellipsize(last, max_width, &measure);
        }
    }
    lines
}

fn ellipsize(line: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> String {
    let mut kept = match line.rfind(' ') {
        Some(cut) => &line[..cut],
        None => "",
    };
    loop {
        let candidate = format!("{kept}{ELLIPSIS}");
        if kept.is_empty() || measure(&candidate) <= max_width {
            return candidate;
        }
        kept = match kept.rfind(' ') {
            Some(cut) => &kept[..cut],
            None => "",
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("hello there", 20.0, 4, chars), vec!["hello there"]);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        assert_eq!(wrap_text("", 20.0, 4, chars), vec![""]);
    }

    #[test]
    fn breaks_when_trailing_space_overflows() {
        // "aaaa bbbb " is 10 wide, so a width of 9 forces the break.
        assert_eq!(wrap_text("aaaa bbbb", 9.0, 4, chars), vec!["aaaa", "bbbb"]);
        assert_eq!(wrap_text("aaaa bbbb", 10.0, 4, chars), vec!["aaaa bbbb"]);
    }

    #[test]
    fn long_word_keeps_its_own_line() {
        assert_eq!(
            wrap_text("a extraordinarily b", 5.0, 4, chars),
            vec!["a", "extraordinarily", "b"]
        );
    }

    #[test]
    fn overflow_truncates_fourth_line_with_ellipsis() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let lines = wrap_text(text, 12.0, 4, chars);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "seven...");
        assert!(lines.iter().all(|line| chars(line) <= 12.0));
    }

    #[test]
    fn ellipsis_drops_more_words_until_it_fits() {
        let lines = wrap_text("xx yy zz ab cd ef gh", 8.0, 2, chars);
        assert_eq!(lines, vec!["xx yy", "zz..."]);

        assert_eq!(ellipsize("ab cd ef", 6.0, &chars), "ab...");
        assert_eq!(ellipsize("abcdefgh", 3.0, &chars), "...");
    }
}
