use crate::style::{faint, reset};
use unicode_width::UnicodeWidthChar;

const ESC: char = '\x1b';

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

// Escape sequences run from ESC to the first ASCII letter and take no columns.
pub fn visual_width(line: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for ch in line.chars() {
        if ch == ESC {
            in_escape = true;
        }
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        width += char_width(ch);
    }
    width
}

pub fn block_width(lines: &[String]) -> usize {
    lines.iter().map(|l| visual_width(l)).max().unwrap_or(0)
}

pub fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_escape = false;
    for ch in line.chars() {
        if ch == ESC {
            in_escape = true;
        }
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        out.push(ch);
    }
    out
}

pub fn split_at_visual(line: &str, column: usize) -> (String, String) {
    let mut left = String::with_capacity(line.len());
    let mut right = String::new();
    let mut width = 0;
    let mut in_escape = false;

    for ch in line.chars() {
        if ch == ESC {
            in_escape = true;
        }
        if in_escape {
            if width < column {
                left.push(ch);
            } else {
                right.push(ch);
            }
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }

        let w = char_width(ch);
        if width < column && width + w <= column {
            left.push(ch);
        } else {
            right.push(ch);
        }
        width += w;
    }
    (left, right)
}

fn active_style(line: &str) -> String {
    let reset = reset();
    let mut active = String::new();
    let mut current = String::new();
    let mut in_escape = false;
    for ch in line.chars() {
        if ch == ESC {
            in_escape = true;
            current.clear();
        }
        if !in_escape {
            continue;
        }
        current.push(ch);
        if ch.is_ascii_alphabetic() {
            in_escape = false;
            if current == reset || current == "\x1b[m" {
                active.clear();
            } else {
                active.push_str(&current);
            }
        }
    }
    active
}

pub fn overlay_lines(background: &[String], foreground: &[String], x: usize, y: usize) -> Vec<String> {
    let mut out = background.to_vec();
    let fg_width = block_width(foreground);

    for (i, fg_line) in foreground.iter().enumerate() {
        let target = y + i;
        if target >= out.len() {
            continue;
        }
        let bg_line = &out[target];
        let (left, _) = split_at_visual(bg_line, x);
        let (hidden, right) = split_at_visual(bg_line, x + fg_width);
        let left_width = visual_width(&left);
        let padding = " ".repeat(x.saturating_sub(left_width));

        let composed = if bg_line.contains(ESC) || fg_line.contains(ESC) {
            // isolate the panel from the background's open styles, then
            // restore whatever was in effect where the right part resumes
            format!(
                "{}{}{}{}{}{}{}",
                left,
                padding,
                reset(),
                fg_line,
                reset(),
                active_style(&hidden),
                right
            )
        } else {
            format!("{}{}{}{}", left, padding, fg_line, right)
        };
        out[target] = composed;
    }
    out
}

pub fn overlay(background: &str, foreground: &str, x: usize, y: usize) -> String {
    let bg: Vec<String> = background.split('\n').map(str::to_string).collect();
    let fg: Vec<String> = foreground.split('\n').map(str::to_string).collect();
    overlay_lines(&bg, &fg, x, y).join("\n")
}

pub fn center(bg_w: usize, bg_h: usize, fg_w: usize, fg_h: usize) -> (usize, usize) {
    (bg_w.saturating_sub(fg_w) / 2, bg_h.saturating_sub(fg_h) / 2)
}

pub fn dim(line: &str) -> String {
    if line.is_empty() {
        return String::new();
    }
    let (reset, faint) = (reset(), faint());
    let refaint = format!("{}{}", reset, faint);
    format!("{}{}{}", faint, line.replace(&reset, &refaint), reset)
}

pub fn pad_to_width(line: &str, width: usize) -> String {
    let current = visual_width(line);
    if current >= width {
        return line.to_string();
    }
    format!("{}{}", line, " ".repeat(width - current))
}

pub fn fit_to_width(line: &str, width: usize) -> String {
    let (mut left, right) = split_at_visual(line, width);
    if !right.is_empty() && left.contains(ESC) {
        left.push_str(&reset());
    }
    pad_to_width(&left, width)
}

pub fn truncate_to_width(text: &str, max: usize) -> String {
    if visual_width(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let budget = max - 1;
    let mut width = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = char_width(ch);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

pub fn join_horizontal(blocks: &[Vec<String>]) -> Vec<String> {
    let height = blocks.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = blocks.iter().map(|b| block_width(b)).collect();
    (0..height)
        .map(|row| {
            blocks
                .iter()
                .zip(&widths)
                .map(|(block, width)| match block.get(row) {
                    Some(line) => pad_to_width(line, *width),
                    None => " ".repeat(*width),
                })
                .collect::<String>()
        })
        .collect()
}

pub fn center_line(line: &str, width: usize) -> String {
    let current = visual_width(line);
    if current >= width {
        return line.to_string();
    }
    let left = (width - current) / 2;
    pad_to_width(&format!("{}{}", " ".repeat(left), line), width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";
    const FAINT: &str = "\x1b[2m";

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(str::to_string).collect()
    }

    #[test]
    fn width_ignores_escapes_and_counts_wide_glyphs() {
        assert_eq!(visual_width("abc"), 3);
        assert_eq!(visual_width(&format!("{}abc{}", RED, RESET)), 3);
        assert_eq!(visual_width("界a"), 3);
        assert_eq!(visual_width("😀"), 2);
    }

    #[test]
    fn split_plain_text() {
        assert_eq!(split_at_visual("hello", 2), ("he".into(), "llo".into()));
        assert_eq!(split_at_visual("hello", 0), ("".into(), "hello".into()));
        assert_eq!(split_at_visual("hello", 9), ("hello".into(), "".into()));
    }

    #[test]
    fn split_never_cuts_a_wide_character() {
        let (left, right) = split_at_visual("ab界cd", 3);
        assert_eq!(left, "ab");
        assert_eq!(right, "界cd");
        let (left, right) = split_at_visual("ab界cd", 4);
        assert_eq!(left, "ab界");
        assert_eq!(right, "cd");
    }

    #[test]
    fn split_keeps_escape_sequences_whole() {
        let line = format!("{}ab{}cd", RED, RESET);
        let (left, right) = split_at_visual(&line, 2);
        assert_eq!(left, format!("{}ab", RED));
        assert_eq!(right, format!("{}cd", RESET));
    }

    #[test]
    fn split_then_concat_reproduces_line() {
        let line = format!(
            "{}x{}界{} 😀 \x1b[38;2;1;2;3mmixed{} ✔ end",
            RED, RESET, FAINT, RESET
        );
        for col in 0..=visual_width(&line) + 2 {
            let (left, right) = split_at_visual(&line, col);
            assert_eq!(format!("{}{}", left, right), line, "column {}", col);
            assert!(visual_width(&left) <= col);
        }
    }

    #[test]
    fn overlay_plain_block_in_the_middle() {
        let bg = "..........\n..........\n..........";
        let out = overlay(bg, "AB\nCD", 4, 1);
        assert_eq!(out, "..........\n....AB....\n....CD....");
    }

    #[test]
    fn plain_rows_are_left_padding_panel_right() {
        let bg = vec!["abcdefghij".to_string(), "abc".to_string()];
        let panel = vec!["XYZ".to_string(), "XYZ".to_string()];
        let out = overlay_lines(&bg, &panel, 5, 0);
        assert_eq!(out[0], format!("{}{}{}", "abcde", "XYZ", "ij"));
        assert_eq!(out[1], format!("{}{}{}", "abc", "  ", "XYZ"));
        assert!(out.iter().all(|line| !line.contains(ESC)));
    }

    #[test]
    fn overlay_skips_rows_outside_background() {
        let bg = ".....\n.....";
        let out = overlay(bg, "XX\nYY\nZZ", 1, 1);
        assert_eq!(out, ".....\n.XX..");
    }

    #[test]
    fn overlay_pads_short_rows() {
        let bg = ["ab".to_string()];
        let out = overlay_lines(&bg, &["XY".to_string()], 5, 0);
        assert_eq!(out, vec!["ab   XY".to_string()]);
    }

    #[test]
    fn overlay_preserves_style_on_both_sides() {
        let bg = vec![format!("{}abcdefgh{}", RED, RESET)];
        let out = overlay_lines(&bg, &["XY".to_string()], 3, 0);
        assert_eq!(strip_ansi(&out[0]), "abcXYfgh");
        assert!(out[0].starts_with(&format!("{}abc", RED)));
        assert!(out[0].ends_with(&format!("{}{}fgh{}", RESET, RED, RESET)));
        assert_eq!(visual_width(&out[0]), 8);
    }

    #[test]
    fn overlay_over_wide_glyphs_keeps_columns() {
        let bg = vec!["界界界界".to_string()];
        let out = overlay_lines(&bg, &["X".to_string()], 3, 0);
        // the glyph straddling column 3 cannot be kept on the left
        assert_eq!(out[0], "界 X界界");
        assert_eq!(visual_width(&out[0]), 8);
    }

    #[test]
    fn centering_uses_floor_division() {
        assert_eq!(center(80, 24, 30, 9), (25, 7));
        assert_eq!(center(81, 25, 30, 10), (25, 7));
        assert_eq!(center(10, 5, 30, 9), (0, 0));
    }

    #[test]
    fn dim_reapplies_faint_after_resets() {
        let line = format!("{}a{}b", RED, RESET);
        assert_eq!(
            dim(&line),
            format!("{}{}a{}{}b{}", FAINT, RED, RESET, FAINT, RESET)
        );
        assert_eq!(dim(""), "");
    }

    #[test]
    fn truncate_and_fit() {
        assert_eq!(truncate_to_width("Buy milk", 20), "Buy milk");
        assert_eq!(truncate_to_width("Buy milk and eggs", 8), "Buy mil…");
        assert_eq!(truncate_to_width("界界界", 4), "界…");
        let fitted = fit_to_width(&format!("{}abcdef{}", RED, RESET), 3);
        assert_eq!(fitted, format!("{}abc{}", RED, RESET));
        assert_eq!(fit_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn join_horizontal_pads_blocks() {
        let joined = join_horizontal(&[lines("ab\nc"), lines("XYZ\nW\nV")]);
        assert_eq!(joined, vec!["abXYZ", "c W  ", "  V  "]);
    }
}
