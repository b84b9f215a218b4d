use nu_ansi_term::{Color, Style};

fn styled(color: Color, text: &str, is_bold: bool) -> String {
    let style = if is_bold {
        color.bold()
    } else {
        Style::new().fg(color)
    };
    style.paint(text).to_string()
}

pub fn red(text: &str) -> String {
    styled(Color::LightRed, text, false)
}

pub fn yellow(text: &str) -> String {
    styled(Color::Yellow, text, false)
}

pub fn cyan(text: &str) -> String {
    styled(Color::Cyan, text, false)
}

pub fn white(text: &str) -> String {
    styled(Color::LightGray, text, false)
}

/// 補足情報（ヒント、既定動作の説明など）
pub fn dim(text: &str) -> String {
    Style::new().dimmed().paint(text).to_string()
}

pub fn bold(text: &str) -> String {
    Style::new().bold().paint(text).to_string()
}

pub fn bold_magenta(text: &str) -> String {
    styled(Color::Magenta, text, true)
}

pub fn bold_green(text: &str) -> String {
    styled(Color::LightGreen, text, true)
}

pub fn bold_yellow(text: &str) -> String {
    styled(Color::Yellow, text, true)
}

pub fn bold_blue(text: &str) -> String {
    styled(Color::LightBlue, text, true)
}
