// Test helpers for building synthetic PNG files
// Every helper produces well-formed chunks with correct CRCs unless noted

#[cfg(test)]
pub(crate) mod helpers {
    use std::io::Write;

    use crc32fast::Hasher;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    use crate::character::png_text::PNG_SIGNATURE;

    const TEST_IHDR: [u8; 13] = [
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00,
    ];

    const TEST_IDAT: [u8; 12] = [
        0x78, 0xDA, 0x63, 0x60, 0x60, 0x60, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01,
    ];

    /// Encode one chunk: length, type, data, CRC.
    pub fn chunk(chunk_type: [u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + data.len());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(&chunk_type);
        out.extend_from_slice(data);
        let mut hasher = Hasher::new();
        hasher.update(&chunk_type);
        hasher.update(data);
        out.extend_from_slice(&hasher.finalize().to_be_bytes());
        out
    }

    pub fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    pub fn text_chunk(keyword: &str, text: &[u8]) -> Vec<u8> {
        let mut data = keyword.as_bytes().to_vec();
        data.push(0);
        data.extend_from_slice(text);
        chunk(*b"tEXt", &data)
    }

    pub fn ztxt_chunk(keyword: &str, text: &[u8]) -> Vec<u8> {
        let mut data = keyword.as_bytes().to_vec();
        data.push(0);
        data.push(0); // compression method: zlib
        data.extend_from_slice(&zlib(text));
        chunk(*b"zTXt", &data)
    }

    /// The bytes of an `iTXt` chunk after the keyword's null terminator.
    pub fn itxt_body(flag: u8, lang: &str, translated: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![flag, 0];
        body.extend_from_slice(lang.as_bytes());
        body.push(0);
        body.extend_from_slice(translated.as_bytes());
        body.push(0);
        body.extend_from_slice(payload);
        body
    }

    pub fn itxt_chunk(keyword: &str, text: &[u8], compressed: bool) -> Vec<u8> {
        let payload = if compressed { zlib(text) } else { text.to_vec() };
        let mut data = keyword.as_bytes().to_vec();
        data.push(0);
        data.extend_from_slice(&itxt_body(compressed as u8, "", "", &payload));
        chunk(*b"iTXt", &data)
    }

    /// A 1x1 PNG with `chunks` placed between IHDR and IDAT.
    pub fn png_with_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(&chunk(*b"IHDR", &TEST_IHDR));
        for extra in chunks {
            png.extend_from_slice(extra);
        }
        png.extend_from_slice(&chunk(*b"IDAT", &TEST_IDAT));
        png.extend_from_slice(&chunk(*b"IEND", &[]));
        png
    }

    /// Deterministic filler bytes that look like compressed image data.
    pub fn noise(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect()
    }

    pub fn v2_card_json(name: &str) -> String {
        serde_json::json!({
            "spec": "chara_card_v2",
            "spec_version": "2.0",
            "data": {
                "name": name,
                "description": format!("Test character {}", name),
                "personality": "Friendly and helpful",
                "scenario": "Testing environment",
                "first_mes": "Hello! I'm a test character.",
                "mes_example": "{{user}}: Hi\n{{char}}: Hello!",
                "creator_notes": "Built by the test helpers",
                "tags": ["test", "helper"]
            }
        })
        .to_string()
    }

    pub fn v1_card_json(name: &str) -> String {
        serde_json::json!({
            "name": name,
            "description": format!("Legacy character {}", name),
            "personality": "Old-fashioned",
            "first_mes": "Greetings.",
        })
        .to_string()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::character::png_text::ChunkCursor;

        #[test]
        fn test_png_with_chunks_layout() {
            let png = png_with_chunks(&[text_chunk("chara", b"x")]);
            assert_eq!(&png[..8], &PNG_SIGNATURE);
            let chunks: Vec<_> = ChunkCursor::new(&png).collect();
            assert_eq!(chunks.len(), 4);
            assert!(chunks.iter().all(|c| c.crc_matches()));
        }

        #[test]
        fn test_noise_is_deterministic() {
            assert_eq!(noise(64, 1), noise(64, 1));
            assert_ne!(noise(64, 1), noise(64, 2));
        }
    }
}
