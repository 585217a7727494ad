// src/summary_pdf/canvas.rs

/// PostScript points per millimetre.
pub const MM: f32 = 72.0 / 25.4;

/// A4 in points.
pub const A4_WIDTH: f32 = 595.2756;
pub const A4_HEIGHT: f32 = 841.8898;

/// The three standard Helvetica faces; no font embedding needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    /// Resource name used in the page's font dictionary.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    /// `x` is the right edge of the text.
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub font: Font,
    pub size: f32,
    pub align: Align,
    pub text: String,
}

impl TextRun {
    /// Left edge of the text once alignment is applied.
    pub fn origin_x(&self) -> f32 {
        match self.align {
            Align::Left => self.x,
            Align::Right => self.x - text_width(&self.text, self.size),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Text(TextRun),
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
}

/// Display list for one page, in absolute coordinates (origin bottom-left).
///
/// Sections draw into it top to bottom; nothing is encoded until the whole
/// document has been laid out.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub marks: Vec<Mark>,
    font: Font,
    size: f32,
}

impl PageLayout {
    pub fn a4() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            marks: Vec::new(),
            font: Font::Regular,
            size: 10.0,
        }
    }

    pub fn set_font(&mut self, font: Font, size: f32) {
        self.font = font;
        self.size = size;
    }

    pub fn draw_string(&mut self, x: f32, y: f32, text: impl Into<String>) {
        self.push_text(x, y, Align::Left, text.into());
    }

    pub fn draw_right_string(&mut self, x: f32, y: f32, text: impl Into<String>) {
        self.push_text(x, y, Align::Right, text.into());
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.marks.push(Mark::Line { x1, y1, x2, y2 });
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.marks.iter().filter_map(|m| match m {
            Mark::Text(t) => Some(t),
            Mark::Line { .. } => None,
        })
    }

    fn push_text(&mut self, x: f32, y: f32, align: Align, text: String) {
        self.marks.push(Mark::Text(TextRun {
            x,
            y,
            font: self.font,
            size: self.size,
            align,
            text,
        }));
    }
}

// ---------------------------------------------------------------------------
// Text metrics & encoding
// ---------------------------------------------------------------------------

/// Helvetica advance widths (1/1000 em) for WinAnsi 32..=126.
///
/// Right-aligned runs are numbers in the regular face; the bold face is
/// slightly wider, so measuring bold text with this table under-estimates.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const DEFAULT_WIDTH: u16 = 556;

/// Width of `text` in points at `size`, after WinAnsi encoding.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = encode_win_ansi(text)
        .iter()
        .map(|&b| match b {
            32..=126 => HELVETICA_WIDTHS[(b - 32) as usize] as u32,
            _ => DEFAULT_WIDTH as u32,
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Encode for the standard fonts' WinAnsiEncoding.
///
/// Turkish letters outside the code page are transliterated; anything else
/// unrepresentable becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            'ş' => b's',
            'Ş' => b'S',
            'ğ' => b'g',
            'Ğ' => b'G',
            'ı' => b'i',
            'İ' => b'I',
            '€' => 0x80,
            '–' => 0x96,
            '—' => 0x97,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        // four digits + '.'
        let w = text_width("0.000", 10.0);
        assert!((w - 25.02).abs() < 1e-3, "width {w}");
        assert_eq!(text_width("", 12.0), 0.0);
    }

    #[test]
    fn test_right_aligned_origin() {
        let mut page = PageLayout::a4();
        page.set_font(Font::Regular, 10.0);
        page.draw_right_string(100.0, 50.0, "0.000");
        let run = page.texts().next().unwrap();
        assert!((run.origin_x() - (100.0 - 25.02)).abs() < 1e-3);
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("CBAM"), b"CBAM".to_vec());
        assert_eq!(encode_win_ansi("Dilovası"), b"Dilovasi".to_vec());
        assert_eq!(encode_win_ansi("Çerkeşli"), vec![0xC7, b'e', b'r', b'k', b'e', b's', b'l', b'i']);
        assert_eq!(encode_win_ansi("CO₂"), b"CO?".to_vec());
    }

    #[test]
    fn test_font_state_applies_to_following_runs() {
        let mut page = PageLayout::a4();
        page.set_font(Font::Bold, 12.0);
        page.draw_string(10.0, 10.0, "Heading");
        page.set_font(Font::Regular, 9.0);
        page.draw_string(10.0, 0.0, "Body");
        let runs: Vec<_> = page.texts().collect();
        assert_eq!(runs[0].font, Font::Bold);
        assert_eq!(runs[1].size, 9.0);
    }
}
