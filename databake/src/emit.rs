//! Rendering a [`Baked`] file as a C++ fragment for the static file runtime.
use std::{
    borrow::Cow,
    fmt::{self, Write as _},
    io,
};

use crate::Baked;

/// Include line for the header that defines `UTIL_FILE` and `UTIL_COMPRESSED_FILE`.
pub const HEADER: &str = "#include <util/staticfile.hpp>";

pub const BYTES_PER_LINE: usize = 16;

/// Writes `bytes` as comma separated decimals, breaking the line after every
/// [`BYTES_PER_LINE`] values and after the last one.
///
/// # Errors
/// Propagates errors from `out`.
pub fn write_bytes<W: fmt::Write + ?Sized>(out: &mut W, bytes: &[u8]) -> fmt::Result {
    let last = bytes.len().saturating_sub(1);
    for (i, byte) in bytes.iter().enumerate() {
        write!(out, "{byte}")?;
        if i == last {
            out.write_char('\n')?;
        } else if i % BYTES_PER_LINE == BYTES_PER_LINE - 1 {
            out.write_str(",\n")?;
        } else {
            out.write_char(',')?;
        }
    }
    Ok(())
}

/// Escapes `name` for use inside a C string literal.
///
/// Quotes, backslashes and control characters are escaped; everything else,
/// including non-ASCII text, is kept as is.
#[must_use]
pub fn escape_name(name: &str) -> Cow<'_, str> {
    if !name.chars().any(|c| c == '"' || c == '\\' || c.is_ascii_control()) {
        return Cow::Borrowed(name);
    }

    let mut escaped = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            // Octal escapes stop after three digits, unlike hex ones.
            c if c.is_ascii_control() => {
                let _ = write!(escaped, "\\{:03o}", c as u32);
            }
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

impl fmt::Display for Baked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        writeln!(f)?;
        writeln!(f, "static const unsigned char data[]{{")?;
        write_bytes(f, &self.data)?;
        writeln!(f, "}};")?;
        writeln!(f)?;
        writeln!(
            f,
            "{}(\"{}\", {}, data);",
            self.macro_name(),
            escape_name(&self.name),
            self.data.len()
        )
    }
}

impl Baked {
    /// Writes the fragment to `out` in a single call, so a failure never
    /// leaves half a fragment behind.
    ///
    /// # Errors
    /// Propagates errors from `out`.
    pub fn write_to<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(self.to_string().as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    fn body(bytes: &[u8]) -> String {
        let mut out = String::new();
        write_bytes(&mut out, bytes).unwrap();
        out
    }

    #[test]
    fn breaks_after_sixteen_values() {
        let bytes: Vec<u8> = (0..18).collect();
        assert_eq!(body(&bytes), "0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,\n16,17\n");
    }

    #[test]
    fn full_last_line_has_no_trailing_comma() {
        let bytes: Vec<u8> = (0..32).collect();
        let out = body(&bytes);
        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with("31\n"));
        assert!(out.lines().all(|line| line.split(',').filter(|v| !v.is_empty()).count() == 16));
    }

    #[test]
    fn line_count_is_rounded_up() {
        for len in [1, 15, 16, 17, 255, 256, 1000] {
            let bytes = vec![255; len];
            let out = body(&bytes);
            assert_eq!(out.matches('\n').count(), len.div_ceil(BYTES_PER_LINE), "len {len}");
            assert_eq!(out.split(',').count(), len);
            assert!(!out.contains(",\n") || len > BYTES_PER_LINE);
        }
    }

    #[test]
    fn empty_buffer_has_no_lines() {
        assert_eq!(body(&[]), "");
    }

    #[test]
    fn plain_names_are_borrowed() {
        assert!(matches!(escape_name("gfx/font 8x8.png"), Cow::Borrowed(_)));
        assert_eq!(escape_name("dáta.bin"), "dáta.bin");
    }

    #[test]
    fn special_characters_are_escaped() {
        assert_eq!(escape_name(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_name("tab\there\n"), "tab\\there\\n");
        assert_eq!(escape_name("bell\u{7}1"), "bell\\0071");
    }

    #[test]
    fn renders_plain_fragment() {
        let baked = Config::new()
            .bake_bytes("assets/tiles.png", (0..18).collect())
            .unwrap();
        assert_eq!(
            baked.to_string(),
            "#include <util/staticfile.hpp>\n\
             \n\
             static const unsigned char data[]{\n\
             0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,\n\
             16,17\n\
             };\n\
             \n\
             UTIL_FILE(\"assets/tiles.png\", 18, data);\n"
        );
    }

    #[test]
    fn renders_empty_fragment() {
        let baked = Config::new().bake_bytes("empty", Vec::new()).unwrap();
        assert_eq!(
            baked.to_string(),
            "#include <util/staticfile.hpp>\n\nstatic const unsigned char data[]{\n};\n\nUTIL_FILE(\"empty\", 0, data);\n"
        );
    }

    #[test]
    fn renders_compressed_fragment_with_compressed_length() {
        let baked = Config::new()
            .compress(true)
            .bake_bytes("zeros", vec![0; 1024])
            .unwrap();
        let out = baked.to_string();
        assert!(out.ends_with(&format!("UTIL_COMPRESSED_FILE(\"zeros\", {}, data);\n", baked.len())));
        assert!(baked.len() < 1024);
    }

    #[test]
    fn write_to_matches_display() {
        let baked = Config::new().bake_bytes("x", vec![1, 2, 3]).unwrap();
        let mut out = Vec::new();
        baked.write_to(&mut out).unwrap();
        assert_eq!(out, baked.to_string().into_bytes());
    }
}
