//! Content-type sniffing from the leading bytes of a stream.
//!
//! Mirrors the standard WHATWG-style signature table so that upload
//! filtering keys off what a file actually is, never off the
//! client-supplied extension.

/// At most this many leading bytes are consulted.
pub const SNIFF_LEN: usize = 512;

const EXACT_SIGNATURES: &[(&[u8], &str)] = &[
    (b"\xfe\xff", "text/plain; charset=utf-16be"),
    (b"\xff\xfe", "text/plain; charset=utf-16le"),
    (b"\xef\xbb\xbf", "text/plain; charset=utf-8"),
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x00\x00\x02\x00", "image/x-icon"),
    (b".snd", "audio/basic"),
    (b"ID3", "audio/mpeg"),
    (b"OggS\x00", "application/ogg"),
    (b"MThd\x00\x00\x00\x06", "audio/midi"),
    (b"\x1aE\xdf\xa3", "video/webm"),
    (b"\x00\x01\x00\x00", "font/ttf"),
    (b"OTTO", "font/otf"),
    (b"ttcf", "font/collection"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"Rar!\x1a\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1a\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00asm", "application/wasm"),
];

struct MaskedSig {
    mask: &'static [u8],
    pattern: &'static [u8],
    content_type: &'static str,
}

const MASKED_SIGNATURES: &[MaskedSig] = &[
    MaskedSig {
        // FORM....AIFF, container size in bytes 4..8 ignored.
        mask: b"\xff\xff\xff\xff\x00\x00\x00\x00\xff\xff\xff\xff",
        pattern: b"FORM\x00\x00\x00\x00AIFF",
        content_type: "audio/aiff",
    },
    MaskedSig {
        // MP3 frame sync without an ID3 tag (MPEG-1 layer 3).
        mask: b"\xff\xfe",
        pattern: b"\xff\xfa",
        content_type: "audio/mpeg",
    },
];

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Classifies the leading bytes of a stream as a MIME content type.
///
/// Always returns a valid type; when no signature matches, the data is
/// reported as `text/plain; charset=utf-8` unless it contains bytes that
/// never appear in plain text, in which case it is
/// `application/octet-stream`.
pub fn detect_content_type(head: &[u8]) -> &'static str {
    let head = &head[..head.len().min(SNIFF_LEN)];
    let trimmed = skip_leading_whitespace(head);

    if let Some(content_type) = sniff_html(trimmed) {
        return content_type;
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }
    for (signature, content_type) in EXACT_SIGNATURES {
        if head.starts_with(signature) {
            return content_type;
        }
    }
    for sig in MASKED_SIGNATURES {
        if masked_match(head, sig) {
            return sig.content_type;
        }
    }
    if let Some(content_type) = sniff_riff(head) {
        return content_type;
    }
    if let Some(content_type) = sniff_mp4(head) {
        return content_type;
    }
    // Embedded OpenType carries no leading magic; the two bytes at offset
    // 34 are its only fixed marker, so it is checked last among signatures.
    if head.len() >= 36 && &head[34..36] == b"LP" {
        return "application/vnd.ms-fontobject";
    }

    if head.iter().any(|&b| is_binary_byte(b)) {
        "application/octet-stream"
    } else {
        "text/plain; charset=utf-8"
    }
}

fn skip_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

// A tag match requires a tag-terminating byte after it, so "<p" in an
// arbitrary text file does not turn the whole file into HTML.
fn sniff_html(data: &[u8]) -> Option<&'static str> {
    for tag in HTML_TAGS {
        if data.len() < tag.len() + 1 {
            continue;
        }
        if data[..tag.len()].eq_ignore_ascii_case(tag) {
            let terminator = data[tag.len()];
            if terminator == b' ' || terminator == b'>' {
                return Some("text/html; charset=utf-8");
            }
        }
    }
    None
}

fn masked_match(data: &[u8], sig: &MaskedSig) -> bool {
    data.len() >= sig.pattern.len()
        && sig
            .mask
            .iter()
            .zip(sig.pattern)
            .zip(data)
            .all(|((mask, pat), byte)| byte & mask == *pat)
}

fn sniff_riff(data: &[u8]) -> Option<&'static str> {
    if !data.starts_with(b"RIFF") || data.len() < 12 {
        return None;
    }
    match &data[8..12] {
        b"WAVE" => Some("audio/wave"),
        b"AVI " => Some("video/avi"),
        b"WEBP" => Some("image/webp"),
        _ => None,
    }
}

// An MP4 starts with an ftyp box whose brand fields (major brand at 8,
// compatible brands from 16 on; 12..16 is the minor version) name an
// "mp4" variant.
fn sniff_mp4(data: &[u8]) -> Option<&'static str> {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return None;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 {
        return None;
    }
    let mut offset = 8;
    while offset + 3 <= box_size {
        if offset != 12 && &data[offset..offset + 3] == b"mp4" {
            return Some("video/mp4");
        }
        offset += 4;
    }
    None
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}
