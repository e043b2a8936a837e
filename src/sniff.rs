//! Content type detection from leading bytes.
//!
//! A reduced form of the WHATWG MIME sniffing table: only the first
//! [`SNIFF_LEN`] bytes are looked at, and the answer is always one of the
//! strings returned below.

/// How many leading bytes are considered.
pub const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_UTF8: &str = "text/plain; charset=utf-8";

// Tags that mark an HTML document when they open it (case-insensitive,
// followed by a space or `>`).
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML", b"<HTML", b"<HEAD", b"<SCRIPT", b"<IFRAME", b"<H1", b"<DIV",
    b"<FONT", b"<TABLE", b"<A", b"<STYLE", b"<TITLE", b"<B", b"<BODY", b"<BR", b"<P",
    b"<!--",
];

// Exact prefixes.
const PREFIXES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_UTF8),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x00\x00\x02\x00", "image/x-icon"),
    (b"BM", "image/bmp"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"OggS\x00", "application/ogg"),
    (b"MThd\x00\x00\x00\x06", "audio/midi"),
    (b"ID3", "audio/mpeg"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00\x61\x73\x6D", "application/wasm"),
];

// `<4 bytes tag> ???? <4 bytes form>` container formats.
const CONTAINERS: &[(&[u8], &[u8], &str)] = &[
    (b"RIFF", b"WEBPVP", "image/webp"),
    (b"RIFF", b"WAVE", "audio/wave"),
    (b"RIFF", b"AVI ", "video/avi"),
    (b"FORM", b"AIFF", "audio/aiff"),
];

/// Returns the MIME type of `data`, judged from at most [`SNIFF_LEN`] bytes.
///
/// Falls back to `text/plain; charset=utf-8` when nothing matches and no
/// binary control bytes are present, else `application/octet-stream`.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let trimmed = trim_leading_ws(data);
    if is_html(trimmed) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if let Some(&(_, mime)) = PREFIXES.iter().find(|&&(p, _)| data.starts_with(p)) {
        return mime;
    }

    for &(tag, form, mime) in CONTAINERS {
        if data.starts_with(tag) && data.get(8..8 + form.len()) == Some(form) {
            return mime;
        }
    }

    if is_mp4(data) {
        return "video/mp4";
    }

    if data.iter().any(|b| is_binary(*b)) {
        OCTET_STREAM
    } else {
        TEXT_UTF8
    }
}

fn trim_leading_ws(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn is_html(data: &[u8]) -> bool {
    HTML_TAGS.iter().any(|&tag| {
        data.len() > tag.len()
            && data[..tag.len()].eq_ignore_ascii_case(tag)
            && matches!(data[tag.len()], b' ' | b'>')
    })
}

// ISO base media: a box size, then `ftyp`, then a brand containing `mp4`.
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }
    (8..box_size)
        .step_by(4)
        .filter(|&i| i != 12)
        .any(|i| data.get(i..i + 3) == Some(&b"mp4"[..]))
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
