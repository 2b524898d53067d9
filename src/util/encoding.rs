use anyhow::{Result, anyhow};
use encoding::DecoderTrap;
use encoding::label::encoding_from_whatwg_label;

/// read to end and detect char-encoding and decode to utf-8
/// (ignore unknown character)
/// ref. https://github.com/thuleqaid/rust-chardet
pub fn encode_to_utf8<R>(input: &mut R) -> Result<String>
where
    R: std::io::Read,
{
    let mut reader: Vec<u8> = Vec::new();

    input
        .read_to_end(&mut reader)
        .map_err(|e| anyhow!("Could not read file: {}", e))?;

    encode_to_utf8_raw(&reader)
}

/// Decode bytes to text; valid UTF-8 is taken as is, anything else goes through detection
pub fn encode_to_utf8_raw(input: &[u8]) -> Result<String> {
    if let Ok(text) = std::str::from_utf8(input) {
        // drop a leading BOM
        return Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string());
    }

    // result.0 Encode, result.1 Confidence, result.2 Language
    let result = chardet::detect(input);
    tracing::debug!(
        "detected charset {} (confidence {:.2})",
        result.0,
        result.1
    );

    let coder = encoding_from_whatwg_label(chardet::charset2encoding(&result.0));
    if let Some(c) = coder {
        c.decode(input, DecoderTrap::Ignore)
            .map_err(|e| anyhow!("Error:{:?}", e))
    } else {
        tracing::warn!(
            "cannot find character encodings: {:?}, decoding lossily",
            &result
        );
        Ok(String::from_utf8_lossy(input).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let text = "Café これはテストです。";
        assert_eq!(encode_to_utf8_raw(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn test_bom_is_removed() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"hello");
        assert_eq!(encode_to_utf8_raw(&bytes).unwrap(), "hello");
    }

    #[test]
    fn test_read_from_reader() {
        let mut input = std::io::Cursor::new("line one\nline two".as_bytes());
        assert_eq!(encode_to_utf8(&mut input).unwrap(), "line one\nline two");
    }

    #[test]
    fn test_non_utf8_input_is_decoded() {
        // "café" in latin-1; exact detection varies, but decoding must not fail or lose ASCII
        let bytes = b"caf\xe9 au lait, caf\xe9 cr\xe8me";
        let decoded = encode_to_utf8_raw(bytes).unwrap();
        assert!(decoded.starts_with("caf"));
        assert!(decoded.contains(" au lait"));
    }
}
