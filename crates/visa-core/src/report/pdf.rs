//! Minimal PDF 1.4 writer for laid-out text pages.
//!
//! Uses the two standard Helvetica faces with WinAnsi encoding, so no fonts
//! are embedded. Characters outside Latin-1 are written as `?`.

use super::layout::{Font, Page, Rgb, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

const PT_PER_MM: f64 = 72.0 / 25.4;

// Fixed object numbers; pages start after the fonts.
const CATALOG: usize = 1;
const PAGES: usize = 2;
const FONT_REGULAR: usize = 3;
const FONT_BOLD: usize = 4;
const FIRST_PAGE: usize = 5;

/// Serialize pages to a complete PDF document.
pub fn encode(pages: &[Page]) -> Vec<u8> {
    let mut out = PdfBuffer::new();
    out.raw(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let page_ids: Vec<usize> = (0..pages.len()).map(|i| FIRST_PAGE + 2 * i).collect();

    out.object(CATALOG, format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES).as_bytes());

    let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
    out.object(
        PAGES,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );

    out.object(
        FONT_REGULAR,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    out.object(
        FONT_BOLD,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );

    for (page, id) in pages.iter().zip(&page_ids) {
        let content_id = id + 1;
        out.object(
            *id,
            format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 {} 0 R /F2 {} 0 R >> >> /Contents {} 0 R >>",
                PAGES,
                PAGE_WIDTH_MM * PT_PER_MM,
                PAGE_HEIGHT_MM * PT_PER_MM,
                FONT_REGULAR,
                FONT_BOLD,
                content_id
            )
            .as_bytes(),
        );

        let stream = content_stream(page);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        out.object(content_id, &body);
    }

    out.finish(CATALOG)
}

fn content_stream(page: &Page) -> Vec<u8> {
    let mut stream = Vec::new();
    for run in &page.runs {
        let font = match run.font {
            Font::Regular => "F1",
            Font::Bold => "F2",
        };
        let Rgb(r, g, b) = run.color;
        let x = run.x_mm * PT_PER_MM;
        let y = (PAGE_HEIGHT_MM - run.y_mm) * PT_PER_MM;

        stream.extend_from_slice(
            format!(
                "BT /{} {} Tf {:.3} {:.3} {:.3} rg {:.2} {:.2} Td (",
                font,
                run.size,
                f64::from(r) / 255.0,
                f64::from(g) / 255.0,
                f64::from(b) / 255.0,
                x,
                y
            )
            .as_bytes(),
        );
        escape_into(&run.text, &mut stream);
        stream.extend_from_slice(b") Tj ET\n");
    }
    stream
}

/// Write `text` as the body of a PDF literal string.
fn escape_into(text: &str, out: &mut Vec<u8>) {
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\n' | '\r' | '\t' => out.push(b' '),
            c if (c as u32) < 0x20 => {}
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
}

/// Output buffer that records object offsets for the xref table.
struct PdfBuffer {
    bytes: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfBuffer {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            offsets: Vec::new(),
        }
    }

    fn raw(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets.push((id, self.bytes.len()));
        self.raw(format!("{} 0 obj\n", id).as_bytes());
        self.raw(body);
        self.raw(b"\nendobj\n");
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        self.offsets.sort_unstable();
        let size = self.offsets.last().map(|(id, _)| id + 1).unwrap_or(1);
        let xref_at = self.bytes.len();

        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        let mut next = 1;
        for (id, offset) in &self.offsets {
            while next < *id {
                table.push_str("0000000000 65535 f \n");
                next += 1;
            }
            table.push_str(&format!("{:010} 00000 n \n", offset));
            next += 1;
        }
        table.push_str(&format!(
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, root, xref_at
        ));
        self.raw(table.as_bytes());
        self.bytes
    }
}
