use crate::{NntpError, Result};
use crc32fast::Hasher;

use super::params::{parse_ybegin, parse_yend, parse_ypart};
use super::types::YencDecoded;

/// Decode yEnc encoded data
///
/// # Arguments
/// * `input` - yEnc encoded data as bytes including =ybegin, data lines, and =yend
///
/// # Returns
/// Decoded binary data with header/trailer information
///
/// # Example
/// ```ignore
/// let encoded = b"=ybegin line=128 size=5 name=test.bin\r\n\
///                 Hello\r\n\
///                 =yend size=5 crc32=abcdef12\r\n";
/// let decoded = decode(encoded)?;
/// assert_eq!(decoded.data, b"Hello");
/// ```
pub fn decode(input: &[u8]) -> Result<YencDecoded> {
    // Split into lines by looking for LF
    let mut lines = Vec::new();
    let mut start = 0;

    for (i, &byte) in input.iter().enumerate() {
        if byte == b'\n' {
            lines.push(&input[start..i]);
            start = i + 1;
        }
    }

    // Add last line if it doesn't end with \n
    if start < input.len() {
        lines.push(&input[start..]);
    }

    if lines.is_empty() {
        return Err(NntpError::InvalidResponse("Empty yEnc input".to_string()));
    }

    // Parse header (must be ASCII)
    let header_str = std::str::from_utf8(lines[0])
        .map_err(|_| NntpError::InvalidResponse("Invalid UTF-8 in header".to_string()))?
        .trim_end_matches('\r');
    let header = parse_ybegin(header_str)?;

    // Check for multi-part
    let mut part = None;
    let mut data_start = 1;

    if lines.len() > 1
        && let Ok(line_str) = std::str::from_utf8(lines[1])
        && line_str.starts_with("=ypart ")
    {
        part = Some(parse_ypart(line_str.trim_end_matches('\r'))?);
        data_start = 2;
    }

    // Find trailer line (=yend)
    let trailer_idx = lines
        .iter()
        .rposition(|line| {
            std::str::from_utf8(line)
                .map(|s| s.starts_with("=yend "))
                .unwrap_or(false)
        })
        .ok_or_else(|| NntpError::InvalidResponse("Missing =yend trailer".to_string()))?;

    // Parse trailer (must be ASCII)
    let trailer_str = std::str::from_utf8(lines[trailer_idx])
        .map_err(|_| NntpError::InvalidResponse("Invalid UTF-8 in trailer".to_string()))?
        .trim_end_matches('\r');
    let trailer = parse_yend(trailer_str)?;

    // Decode data lines
    let mut decoded = Vec::with_capacity(trailer.size as usize);
    let mut hasher = Hasher::new();

    for line in &lines[data_start..trailer_idx] {
        decode_line_bytes(line, &mut decoded)?;
    }

    // Calculate CRC32
    hasher.update(&decoded);
    let calculated_crc32 = hasher.finalize();

    Ok(YencDecoded {
        header,
        part,
        trailer,
        data: decoded,
        calculated_crc32,
    })
}

/// Decode a single yEnc encoded line (bytes version)
///
/// yEnc encoding: output = (input + 42) mod 256
/// yEnc decoding: output = (input - 42) mod 256
///
/// Escape sequences: =X means (X - 64 - 42) mod 256
/// Critical escapes: NUL(0), TAB(9), LF(10), CR(13), SPACE(32), '='(61)
fn decode_line_bytes(line: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut i = 0;

    while i < line.len() {
        let byte = line[i];

        // Skip CR if it appears at end of line
        if byte == b'\r' {
            i += 1;
            continue;
        }

        if byte == b'=' {
            // Escape sequence
            if i + 1 >= line.len() {
                return Err(NntpError::InvalidResponse(
                    "Incomplete escape sequence at end of line".to_string(),
                ));
            }

            i += 1;
            let escaped = line[i];

            // Decode: (escaped - 64 - 42) mod 256
            let decoded = escaped.wrapping_sub(64).wrapping_sub(42);
            output.push(decoded);
        } else {
            // Regular byte: decode as (byte - 42) mod 256
            let decoded = byte.wrapping_sub(42);
            output.push(decoded);
        }

        i += 1;
    }

    Ok(())
}
