//! Page layout for the assessment report.
//!
//! Positions are in millimetres from the top-left corner of an A4 page, with
//! `y` naming the text baseline.

use chrono::NaiveDate;

use crate::application::ApplicationData;
use crate::result::{format_score, EligibilityResult, RiskLevel};
use crate::view::DISCLAIMER;

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_MM: f64 = 15.0;
pub const TOP_MM: f64 = 20.0;
pub const LINE_HEIGHT_MM: f64 = 6.0;

/// Content below this line moves to a new page.
pub const PAGE_BREAK_MM: f64 = 270.0;
/// A section header below this line starts on a new page.
pub const SECTION_BREAK_MM: f64 = 250.0;

const TEXT_WIDTH_MM: f64 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const FOOTER_MM: f64 = PAGE_HEIGHT_MM - 10.0;
const PT_PER_MM: f64 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const GREEN: Rgb = Rgb(34, 197, 94);
pub const AMBER: Rgb = Rgb(245, 158, 11);
pub const RED: Rgb = Rgb(239, 68, 68);
pub const INDIGO: Rgb = Rgb(99, 102, 241);
pub const GREY: Rgb = Rgb(100, 100, 100);

pub fn risk_color(level: RiskLevel) -> Rgb {
    match level {
        RiskLevel::Low => GREEN,
        RiskLevel::Medium => AMBER,
        RiskLevel::High => RED,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x_mm: f64,
    pub y_mm: f64,
    pub size: f64,
    pub font: Font,
    pub color: Rgb,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

impl Page {
    pub fn contains(&self, text: &str) -> bool {
        self.runs.iter().any(|run| run.text == text)
    }
}

// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
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

/// Approximate rendered width. Bold text is measured with regular metrics.
pub fn text_width_mm(text: &str, size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 32..=126 => u32::from(HELVETICA_WIDTHS[(code - 32) as usize]),
            _ => 556,
        })
        .sum();
    f64::from(units) / 1000.0 * size / PT_PER_MM
}

/// Greedy word wrap to `max_width_mm`. Words wider than a line are split.
pub fn wrap(text: &str, size: f64, max_width_mm: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if text_width_mm(&candidate, size) <= max_width_mm {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            for c in word.chars() {
                line.push(c);
                if text_width_mm(&line, size) > max_width_mm && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::replace(&mut line, c.to_string()));
                }
            }
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Cursor over a growing list of pages.
struct Writer {
    pages: Vec<Page>,
    y: f64,
}

impl Writer {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: TOP_MM,
        }
    }

    fn page_mut(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP_MM;
    }

    fn break_if_below(&mut self, limit: f64) {
        if self.y > limit {
            self.new_page();
        }
    }

    fn text(&mut self, x_mm: f64, text: String, size: f64, font: Font, color: Rgb) {
        let y_mm = self.y;
        self.page_mut().runs.push(TextRun {
            x_mm,
            y_mm,
            size,
            font,
            color,
            text,
        });
    }

    fn centered(&mut self, text: &str, size: f64, font: Font) {
        let x = (PAGE_WIDTH_MM - text_width_mm(text, size)) / 2.0;
        self.text(x.max(0.0), text.to_string(), size, font, BLACK);
    }

    fn heading(&mut self, text: &str, size: f64, color: Rgb) {
        self.text(MARGIN_MM, text.to_string(), size, Font::Bold, color);
    }

    /// Body paragraph, wrapped, breaking pages between lines.
    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, 10.0, TEXT_WIDTH_MM) {
            self.break_if_below(PAGE_BREAK_MM);
            self.text(MARGIN_MM, line, 10.0, Font::Regular, BLACK);
            self.y += LINE_HEIGHT_MM;
        }
    }

    fn numbered(&mut self, title: &str, color: Rgb, items: &[String], header_break: f64) {
        if items.is_empty() {
            return;
        }
        self.y += 10.0;
        self.break_if_below(header_break);
        self.heading(title, 12.0, color);
        self.y += 7.0;
        for (index, item) in items.iter().enumerate() {
            self.paragraph(&format!("{}. {}", index + 1, item));
        }
    }

    fn finish(mut self) -> Vec<Page> {
        let x = (PAGE_WIDTH_MM - text_width_mm(DISCLAIMER, 8.0)) / 2.0;
        for page in &mut self.pages {
            page.runs.push(TextRun {
                x_mm: x.max(0.0),
                y_mm: FOOTER_MM,
                size: 8.0,
                font: Font::Regular,
                color: GREY,
                text: DISCLAIMER.to_string(),
            });
        }
        self.pages
    }
}

/// Lay out the full report.
pub fn layout_report(data: &ApplicationData, result: &EligibilityResult, generated: NaiveDate) -> Vec<Page> {
    let mut w = Writer::new();

    w.centered("UK Visa Eligibility Assessment", 20.0, Font::Bold);
    w.y += 15.0;
    w.centered(&format!("Generated: {}", generated.format("%d/%m/%Y")), 10.0, Font::Regular);

    w.y += 15.0;
    w.heading("Applicant Information", 14.0, BLACK);
    w.y += 8.0;
    let info = &data.personal_info;
    let travel = &data.travel_details;
    let applicant = [
        format!("Name: {} {}", info.given_name, info.family_name),
        format!("Nationality: {}", info.nationality),
        format!("Purpose of Visit: {}", travel.purpose),
        format!("Duration: {} days", travel.duration_days),
    ];
    for line in applicant {
        w.text(MARGIN_MM, line, 10.0, Font::Regular, BLACK);
        w.y += LINE_HEIGHT_MM;
    }

    w.y += 9.0;
    w.heading("Assessment Result", 14.0, BLACK);
    w.y += 8.0;
    w.text(
        MARGIN_MM,
        format!("Risk Level: {}", result.risk_level),
        12.0,
        Font::Bold,
        risk_color(result.risk_level),
    );
    w.y += 7.0;
    w.text(
        MARGIN_MM,
        format!("Score: {}/100", format_score(result.score)),
        10.0,
        Font::Regular,
        BLACK,
    );

    w.y += 10.0;
    w.heading("Summary", 12.0, BLACK);
    w.y += 7.0;
    w.paragraph(&result.summary);

    w.numbered("Strengths", GREEN, &result.strengths, PAGE_BREAK_MM);
    w.numbered("Areas of Concern", RED, &result.weaknesses, PAGE_BREAK_MM);
    w.numbered("Recommendations", INDIGO, &result.recommendations, SECTION_BREAK_MM);

    w.finish()
}
