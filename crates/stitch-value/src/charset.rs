use std::fmt;

/// Byte-to-text decodings available to the `|charset:<name>` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    UsAscii,
    Latin1,
    Utf16Be,
    Utf16Le,
}

impl Charset {
    /// Looks up a charset by its Java name or a common alias, case-insensitively.
    /// `default` is the platform default, taken to be UTF-8.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        let charset = match normalized.as_str() {
            "default" | "utf-8" | "utf8" => Charset::Utf8,
            "us-ascii" | "ascii" => Charset::UsAscii,
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Charset::Latin1,
            "utf-16be" | "utf-16" => Charset::Utf16Be,
            "utf-16le" => Charset::Utf16Le,
            _ => return None,
        };
        Some(charset)
    }

    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decodes `bytes`, replacing malformed sequences with U+FFFD.
pub fn decode_bytes(bytes: &[u8], charset: Charset) -> String {
    match charset {
        Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Charset::UsAscii => bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
            .collect(),
        Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        Charset::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        Charset::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let chunks = bytes.chunks_exact(2);
    let dangling = !chunks.remainder().is_empty();
    let units = chunks.map(|pair| unit([pair[0], pair[1]]));
    let mut out: String = char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if dangling {
        out.push(char::REPLACEMENT_CHARACTER);
    }
    out
}
