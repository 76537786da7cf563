//! Legacy markdown embedding of image attachments.

use {
    ferry_config::AttachmentsConfig,
    ferry_media::base64::{estimate_base64_decoded_bytes, is_valid_base64},
};

use crate::{ChatAttachment, Error, Result};

/// Decoded bytes allowed per image on the markdown path.
pub const LEGACY_MAX_BYTES: usize = 2_000_000;

/// Append image attachments to `message` as markdown images with data URLs.
///
/// Only `image/*` attachments are accepted and nothing is sniffed. Content is
/// validated after trimming but embedded as sent; data URL prefixes are not
/// stripped here.
#[deprecated(
    note = "use AttachmentParser::parse; providers do not read markdown data URLs as images"
)]
pub fn build_message_with_attachments(
    message: &str,
    attachments: &[Option<ChatAttachment>],
    max_bytes: Option<usize>,
) -> Result<String> {
    let max_bytes = max_bytes.unwrap_or(LEGACY_MAX_BYTES);
    if attachments.is_empty() {
        return Ok(message.to_string());
    }

    let mut blocks = Vec::new();
    for (index, attachment) in attachments.iter().enumerate() {
        let Some(attachment) = attachment else {
            continue;
        };
        let label = attachment.label(index);

        let Some(content) = attachment.content_str() else {
            return Err(Error::NonStringContent { label });
        };
        let mime = attachment.mime_type.as_deref().unwrap_or_default();
        if !mime.starts_with("image/") {
            return Err(Error::UnsupportedMime { label });
        }

        let b64 = content.trim();
        if !is_valid_base64(b64) {
            return Err(Error::InvalidBase64 { label });
        }
        let size = estimate_base64_decoded_bytes(b64);
        if size == 0 || size > max_bytes {
            return Err(Error::SizeLimit {
                label,
                size,
                max: max_bytes,
            });
        }

        let alt = underscore_whitespace(&label);
        blocks.push(format!("![{alt}](data:{mime};base64,{content})"));
    }

    if blocks.is_empty() {
        return Ok(message.to_string());
    }
    let separator = if message.trim().is_empty() {
        ""
    } else {
        "\n\n"
    };
    Ok(format!("{message}{separator}{}", blocks.join("\n\n")))
}

/// [`build_message_with_attachments`] capped at `chat.attachments.legacy_max_bytes`.
#[deprecated(
    note = "use AttachmentParser::from_config; providers do not read markdown data URLs as images"
)]
pub fn build_message_with_config(
    message: &str,
    attachments: &[Option<ChatAttachment>],
    config: &AttachmentsConfig,
) -> Result<String> {
    #[allow(deprecated)]
    build_message_with_attachments(message, attachments, Some(config.legacy_max_bytes))
}

/// Replace each run of whitespace with a single `_`.
fn underscore_whitespace(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut in_space = false;
    for ch in label.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used, deprecated)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn png(name: &str) -> Option<ChatAttachment> {
        Some(
            ChatAttachment::new(PNG)
                .with_mime_type("image/png")
                .with_file_name(name),
        )
    }

    #[rstest]
    #[case("my cat.png", "my_cat.png")]
    #[case("a \t\n b", "a_b")]
    #[case(" lead", "_lead")]
    #[case("plain", "plain")]
    fn replaces_whitespace_runs(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(underscore_whitespace(input), expected);
    }

    #[test]
    fn empty_message_gets_block_only() {
        let out = build_message_with_attachments("", &[png("dot.png")], None).unwrap();
        assert_eq!(out, format!("![dot.png](data:image/png;base64,{PNG})"));
    }

    #[test]
    fn blocks_follow_message_after_blank_line() {
        let out =
            build_message_with_attachments("see", &[png("a b.png"), png("c.png")], None)
                .unwrap();
        assert_eq!(
            out,
            format!(
                "see\n\n![a_b.png](data:image/png;base64,{PNG})\n\n![c.png](data:image/png;base64,{PNG})"
            )
        );
    }

    #[test]
    fn no_attachments_returns_message() {
        assert_eq!(
            build_message_with_attachments("hi", &[], None).unwrap(),
            "hi"
        );
        assert_eq!(
            build_message_with_attachments("hi", &[None, None], None).unwrap(),
            "hi"
        );
    }

    #[test]
    fn rejects_non_image_mime() {
        let audio = ChatAttachment::new("T2dnUw==").with_mime_type("audio/ogg");
        let err = build_message_with_attachments("", &[Some(audio)], None).unwrap_err();
        assert_eq!(err.to_string(), "attachment attachment-1: only image/* supported");
    }

    #[test]
    fn rejects_missing_mime() {
        let err = build_message_with_attachments("", &[Some(ChatAttachment::new(PNG))], None)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMime { .. }));
    }

    #[test]
    fn data_url_prefix_is_not_stripped() {
        let att = ChatAttachment::new(format!("data:image/png;base64,{PNG}"))
            .with_mime_type("image/png")
            .with_file_name("x.png");
        let err = build_message_with_attachments("", &[Some(att)], None).unwrap_err();
        assert_eq!(err.to_string(), "attachment x.png: invalid base64 content");
    }

    #[test]
    fn enforces_size_limit() {
        let err = build_message_with_attachments("", &[png("big.png")], Some(10)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "attachment big.png: exceeds size limit (70 > 10 bytes)"
        );
    }

    #[test]
    fn default_ceiling_is_two_megabytes() {
        let blank = |quads: usize| {
            Some(
                ChatAttachment::new("AAAA".repeat(quads))
                    .with_mime_type("image/png")
                    .with_file_name("blank.png"),
            )
        };

        // 666_666 quads decode to 1_999_998 bytes.
        assert!(build_message_with_attachments("", &[blank(666_666)], None).is_ok());

        let err = build_message_with_attachments("", &[blank(666_668)], None).unwrap_err();
        assert!(matches!(err, Error::SizeLimit {
            size: 2_000_004,
            max: LEGACY_MAX_BYTES,
            ..
        }));
        assert_eq!(
            err.to_string(),
            "attachment blank.png: exceeds size limit (2000004 > 2000000 bytes)"
        );
    }

    #[test]
    fn config_sets_legacy_ceiling() {
        let config = AttachmentsConfig {
            legacy_max_bytes: 64,
            ..AttachmentsConfig::default()
        };
        let err = build_message_with_config("", &[png("dot.png")], &config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "attachment dot.png: exceeds size limit (70 > 64 bytes)"
        );

        let roomy = AttachmentsConfig::default();
        let out = build_message_with_config("hi", &[png("dot.png")], &roomy).unwrap();
        assert_eq!(out, format!("hi\n\n![dot.png](data:image/png;base64,{PNG})"));
    }

    #[test]
    fn embeds_untrimmed_content() {
        let att = ChatAttachment::new(format!(" {PNG}\n"))
            .with_mime_type("image/png")
            .with_file_name("p.png");
        let out = build_message_with_attachments("", &[Some(att)], None).unwrap();
        assert_eq!(out, format!("![p.png](data:image/png;base64, {PNG}\n)"));
    }

    #[test]
    fn non_string_content_fails() {
        let att = ChatAttachment {
            content: Some(serde_json::json!({"bytes": []})),
            mime_type: Some("image/png".into()),
            ..ChatAttachment::default()
        };
        let err = build_message_with_attachments("", &[png("ok.png"), Some(att)], None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "attachment attachment-2: content must be base64 string"
        );
    }
}
