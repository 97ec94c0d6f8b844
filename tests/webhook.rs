//! End-to-end webhook exchange: encrypt → XML → parse → verify → decrypt.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;

use pigeon_secure::{Envelope, EnvelopeCodec, EnvelopeConfig, EnvelopeError};

fn config(app_id: &str) -> EnvelopeConfig {
    EnvelopeConfig {
        app_id: app_id.to_owned(),
        token: "webhook-token".to_owned(),
        encoded_aes_key: STANDARD_NO_PAD.encode(b"0123456789abcdef0123456789abcdef"),
    }
}

#[test]
fn outbound_then_inbound_round_trip() {
    let codec = EnvelopeCodec::new(config("app-1")).unwrap();
    let content = r#"<xml><ToUserName><![CDATA[account-1]]></ToUserName>
        <MsgType><![CDATA[text]]></MsgType>
        <Content><![CDATA[你好]]></Content></xml>"#;

    let envelope = codec
        .encrypt(content.as_bytes(), "1524409354", "ad306db6")
        .unwrap();
    let wire = envelope.to_xml().unwrap();

    // The receiving side parses the document and authenticates it before
    // decrypting.
    let received = Envelope::from_xml(&wire).unwrap();
    let plaintext = codec.decrypt(&received).unwrap();
    assert_eq!(plaintext, content.as_bytes());
}

#[test]
fn tampered_ciphertext_is_rejected_before_decryption() {
    let codec = EnvelopeCodec::new(config("app-1")).unwrap();
    let mut envelope = codec.encrypt(b"payload", "1524409354", "n-1").unwrap();
    envelope.ciphertext.insert(0, 'A');
    assert!(matches!(
        codec.decrypt(&envelope),
        Err(EnvelopeError::SignatureMismatch)
    ));
}

#[test]
fn envelope_from_another_app_is_rejected() {
    let sender = EnvelopeCodec::new(config("app-a")).unwrap();
    let receiver = EnvelopeCodec::new(config("app-b")).unwrap();
    let envelope = sender.encrypt(b"payload", "1", "n").unwrap();
    // Same key and token, wrong identity suffix.
    assert!(matches!(
        receiver.decrypt(&envelope),
        Err(EnvelopeError::IdentityMismatch)
    ));
}
