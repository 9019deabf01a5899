// Integration tests for card extraction
// These tests run whole PNG files through signature check, chunk walk and scan

#[cfg(test)]
mod integration_tests {

    use std::fs;

    use base64::prelude::BASE64_STANDARD;
    use base64::Engine as _;
    use serde_json::Value;
    use tempfile::TempDir;

    use crate::character::service::{extract_character, CardExtractor, CardSource, ExtractError};
    use crate::character::test_helpers::helpers::{
        itxt_chunk, noise, png_with_chunks, text_chunk, v1_card_json, v2_card_json, ztxt_chunk,
    };
    use crate::character::CharacterMetadata;

    fn data_field(json: &str, key: &str) -> Value {
        let value: Value = serde_json::from_str(json).unwrap();
        value["data"][key].clone()
    }

    #[test]
    fn test_text_chunk_v2_fields_match_data_object() {
        let json = v2_card_json("Alice");
        let png = png_with_chunks(&[text_chunk("chara", json.as_bytes())]);

        let card = extract_character(&png).unwrap().unwrap();
        assert_eq!(card.name, data_field(&json, "name"));
        assert_eq!(card.description, data_field(&json, "description"));
        assert_eq!(card.personality, data_field(&json, "personality"));
        assert_eq!(card.scenario, data_field(&json, "scenario"));
        assert_eq!(card.first_mes, data_field(&json, "first_mes"));
        assert_eq!(card.mes_example, data_field(&json, "mes_example"));
        assert_eq!(
            card.creator_notes.as_deref(),
            data_field(&json, "creator_notes").as_str()
        );
        assert_eq!(
            card.tags,
            Some(vec!["test".to_string(), "helper".to_string()])
        );
        assert_eq!(card.system_prompt, None);
    }

    #[test]
    fn test_base64_text_chunk_like_sillytavern_writes() {
        let encoded = BASE64_STANDARD.encode(v2_card_json("Encoded"));
        let png = png_with_chunks(&[text_chunk("chara", encoded.as_bytes())]);
        let card = extract_character(&png).unwrap().unwrap();
        assert_eq!(card.name, "Encoded");
    }

    #[test]
    fn test_compressed_chunk_matches_plain_chunk() {
        let json = v2_card_json("Twin");
        let plain = png_with_chunks(&[text_chunk("chara", json.as_bytes())]);
        let compressed = png_with_chunks(&[ztxt_chunk("chara", json.as_bytes())]);

        let from_plain = extract_character(&plain).unwrap().unwrap();
        let from_compressed = extract_character(&compressed).unwrap().unwrap();
        assert_eq!(from_plain, from_compressed);
    }

    #[test]
    fn test_international_chunks_with_and_without_compression() {
        let json = v1_card_json("Intl");
        for compressed in [false, true] {
            let png = png_with_chunks(&[itxt_chunk("character", json.as_bytes(), compressed)]);
            let extraction = CardExtractor::default().extract(&png).unwrap().unwrap();
            assert_eq!(extraction.metadata.name, "Intl");
            assert!(matches!(extraction.source, CardSource::Chunk { .. }));
        }
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let png = png_with_chunks(&[ztxt_chunk("chara", v2_card_json("Again").as_bytes())]);
        let extractor = CardExtractor::default();
        let first = extractor.extract(&png).unwrap();
        let second = extractor.extract(&png).unwrap();
        assert_eq!(first, second);

        let mut appended = png_with_chunks(&[]);
        appended.extend_from_slice(v1_card_json("Tail").as_bytes());
        assert_eq!(
            extract_character(&appended).unwrap(),
            extract_character(&appended).unwrap()
        );
    }

    #[test]
    fn test_signature_mismatch_is_fatal_regardless_of_content() {
        let mut png = png_with_chunks(&[text_chunk("chara", v2_card_json("Hidden").as_bytes())]);
        png[1] = b'X';
        assert!(matches!(
            extract_character(&png),
            Err(ExtractError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_brute_force_finds_bare_json_without_chunks() {
        let mut png = png_with_chunks(&[]);
        png.extend_from_slice(&noise(2048, 5));
        png.extend_from_slice(
            br#"{"name":"Aria","description":"A wandering bard","personality":"Curious"}"#,
        );
        png.extend_from_slice(&noise(64, 9));

        let extraction = CardExtractor::default().extract(&png).unwrap().unwrap();
        assert_eq!(
            extraction.metadata,
            CharacterMetadata {
                name: "Aria".to_string(),
                description: "A wandering bard".to_string(),
                personality: "Curious".to_string(),
                scenario: String::new(),
                first_mes: String::new(),
                mes_example: String::new(),
                creator_notes: None,
                system_prompt: None,
                tags: None,
            }
        );
        assert!(matches!(extraction.source, CardSource::Scan { .. }));
    }

    #[test]
    fn test_brute_force_finds_card_in_private_chunk() {
        let png = png_with_chunks(&[text_chunk("Comment", v2_card_json("Misfiled").as_bytes())]);
        let extraction = CardExtractor::default().extract(&png).unwrap().unwrap();
        assert_eq!(extraction.metadata.name, "Misfiled");
        assert!(matches!(extraction.source, CardSource::Scan { .. }));
    }

    #[test]
    fn test_invalid_card_shapes_are_not_returned() {
        let png = png_with_chunks(&[text_chunk(
            "chara",
            br#"{"data":{"description":"nameless"},"description":"also nameless"}"#,
        )]);
        assert_eq!(extract_character(&png).unwrap(), None);
    }

    #[test]
    fn test_png_without_card_reports_absence() {
        let png = png_with_chunks(&[text_chunk("Software", b"paint.net 5.0")]);
        assert_eq!(extract_character(&png).unwrap(), None);
    }

    #[test]
    fn test_extract_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("card.png");
        let png = png_with_chunks(&[ztxt_chunk("chara", v2_card_json("OnDisk").as_bytes())]);
        fs::write(&path, &png).unwrap();

        let extraction = CardExtractor::default().extract_file(&path).unwrap().unwrap();
        assert_eq!(extraction.metadata.name, "OnDisk");
    }
}
