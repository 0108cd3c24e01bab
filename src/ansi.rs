use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

const ESC: char = '\x1b';

pub fn to_text(lines: &[String]) -> Text<'static> {
    Text::from(lines.iter().map(|l| to_line(l)).collect::<Vec<_>>())
}

pub fn to_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut style = Style::default();
    let mut buf = String::new();
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        if ch != ESC {
            buf.push(ch);
            continue;
        }
        let mut sequence = String::new();
        let mut terminator = None;
        for next in chars.by_ref() {
            if next.is_ascii_alphabetic() {
                terminator = Some(next);
                break;
            }
            sequence.push(next);
        }
        if terminator != Some('m') {
            continue;
        }
        if !buf.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut buf), style));
        }
        let params = sequence.trim_start_matches('[');
        style = apply_sgr(style, params);
    }
    if !buf.is_empty() {
        spans.push(Span::styled(buf, style));
    }
    Line::from(spans)
}

fn apply_sgr(mut style: Style, params: &str) -> Style {
    if params.is_empty() {
        return Style::default();
    }
    let codes: Vec<u16> = params
        .split(';')
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    let mut i = 0;
    while i < codes.len() {
        match codes[i] {
            0 => style = Style::default(),
            1 => style = style.add_modifier(Modifier::BOLD),
            2 => style = style.add_modifier(Modifier::DIM),
            3 => style = style.add_modifier(Modifier::ITALIC),
            4 => style = style.add_modifier(Modifier::UNDERLINED),
            7 => style = style.add_modifier(Modifier::REVERSED),
            22 => style = style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style = style.remove_modifier(Modifier::ITALIC),
            24 => style = style.remove_modifier(Modifier::UNDERLINED),
            27 => style = style.remove_modifier(Modifier::REVERSED),
            code @ 30..=37 => style = style.fg(Color::Indexed((code - 30) as u8)),
            code @ 90..=97 => style = style.fg(Color::Indexed((code - 90 + 8) as u8)),
            39 => style.fg = Some(Color::Reset),
            code @ 40..=47 => style = style.bg(Color::Indexed((code - 40) as u8)),
            code @ 100..=107 => style = style.bg(Color::Indexed((code - 100 + 8) as u8)),
            49 => style.bg = Some(Color::Reset),
            code @ (38 | 48) => {
                let (color, used) = extended_color(&codes[i + 1..]);
                if let Some(color) = color {
                    style = if code == 38 { style.fg(color) } else { style.bg(color) };
                }
                i += used;
            }
            _ => {}
        }
        i += 1;
    }
    style
}

fn extended_color(args: &[u16]) -> (Option<Color>, usize) {
    match args {
        [2, r, g, b, ..] => (Some(Color::Rgb(*r as u8, *g as u8, *b as u8)), 4),
        [5, n, ..] => (Some(Color::Indexed(*n as u8)), 2),
        _ => (None, args.len()),
    }
}
