//! AES-GCM known-answer tests and end-to-end behavior.
//!
//! Vectors are from the original GCM submission test cases (McGrew &
//! Viega), the same set NIST reuses in the GCM validation suite.

#![cfg(feature = "aes")]

use gcm::{BlockCipherRegistry, Error, GcmDecryption, GcmEncryption};
use hex_literal::hex;
use proptest::prelude::*;

fn encryptor(tag_size: usize) -> GcmEncryption {
    let registry = BlockCipherRegistry::default();
    GcmEncryption::for_algorithm(&registry, "AES-128", tag_size).unwrap()
}

fn decryptor(tag_size: usize) -> GcmDecryption {
    let registry = BlockCipherRegistry::default();
    GcmDecryption::for_algorithm(&registry, "AES-128", tag_size).unwrap()
}

/// One-shot seal: returns ciphertext || tag.
fn seal(key: &[u8], nonce: &[u8], ad: &[u8], pt: &[u8], tag_size: usize) -> Vec<u8> {
    let mut enc = encryptor(tag_size);
    enc.set_key(key).unwrap();
    enc.set_associated_data(ad).unwrap();
    enc.start(nonce).unwrap();

    let mut buffer = pt.to_vec();
    enc.finish(&mut buffer, 0).unwrap();
    buffer
}

/// One-shot open.
fn open(
    key: &[u8],
    nonce: &[u8],
    ad: &[u8],
    ct_and_tag: &[u8],
    tag_size: usize,
) -> Result<Vec<u8>, Error> {
    let mut dec = decryptor(tag_size);
    dec.set_key(key).unwrap();
    dec.set_associated_data(ad).unwrap();
    dec.start(nonce).unwrap();

    let mut buffer = ct_and_tag.to_vec();
    dec.finish(&mut buffer, 0)?;
    Ok(buffer)
}

#[test]
fn empty_message_zero_key() {
    let out = seal(&[0u8; 16], &[0u8; 12], &[], &[], 16);
    assert_eq!(out, hex!("58e2fccefa7e3061367f1d57a4e7455a"));

    let pt = open(&[0u8; 16], &[0u8; 12], &[], &out, 16).unwrap();
    assert!(pt.is_empty());
}

#[test]
fn single_zero_block_zero_key() {
    let out = seal(&[0u8; 16], &[0u8; 12], &[], &[0u8; 16], 16);
    assert_eq!(
        out[..16],
        hex!("0388dace60b6a392f328c2b971b2fe78")
    );
    assert_eq!(
        out[16..],
        hex!("ab6e47d42cec13bdf53a67b21257bddf")
    );
}

const TC_KEY: [u8; 16] = hex!("feffe9928665731c6d6a8f9467308308");
const TC_NONCE: [u8; 12] = hex!("cafebabefacedbaddecaf888");
const TC_AD: [u8; 20] = hex!("feedfacedeadbeeffeedfacedeadbeefabaddad2");
const TC_PT: [u8; 60] = hex!(
    "d9313225f88406e5a55909c5aff5269a"
    "86a7a9531534f7da2e4c303d8a318a72"
    "1c3c0c95956809532fcf0e2449a6b525"
    "b16aedf5aa0de657ba637b39"
);
const TC_CT: [u8; 60] = hex!(
    "42831ec2217774244b7221b784d0d49c"
    "e3aa212f2c02a4e035c17e2329aca12e"
    "21d514b25466931c7d8f6a5aac84aa05"
    "1ba30b396a0aac973d58e091"
);

#[test]
fn partial_block_with_associated_data() {
    let out = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16);
    assert_eq!(out[..60], TC_CT);
    assert_eq!(out[60..], hex!("5bc94fbc3221a5db94fae95ae7121a47"));

    let pt = open(&TC_KEY, &TC_NONCE, &TC_AD, &out, 16).unwrap();
    assert_eq!(pt, TC_PT);
}

#[test]
fn non_96_bit_nonce_goes_through_ghash() {
    // 8-byte nonce from the same test-case family.
    let nonce = hex!("cafebabefacedbad");
    let out = seal(&TC_KEY, &nonce, &TC_AD, &TC_PT, 16);
    assert_eq!(
        out[..60],
        hex!(
            "61353b4c2806934a777ff51fa22a4755"
            "699b2a714fcdc6f83766e5f97b6c7423"
            "73806900e49f24b22b097544d4896b42"
            "4989b5e1ebac0f07c23f4598"
        )
    );
    assert_eq!(out[60..], hex!("3612d2e79e3b0785561be14aaca2fccb"));

    let pt = open(&TC_KEY, &nonce, &TC_AD, &out, 16).unwrap();
    assert_eq!(pt, TC_PT);
}

#[test]
fn tampered_tag_is_rejected() {
    let mut out = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16);
    let last = out.len() - 1;
    out[last] ^= 0x01;

    assert_eq!(
        open(&TC_KEY, &TC_NONCE, &TC_AD, &out, 16),
        Err(Error::IntegrityFailure)
    );
}

#[test]
fn tampered_ciphertext_is_rejected() {
    let mut out = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16);
    out[0] ^= 0x80;

    assert_eq!(
        open(&TC_KEY, &TC_NONCE, &TC_AD, &out, 16),
        Err(Error::IntegrityFailure)
    );
}

#[test]
fn tampered_associated_data_is_rejected() {
    let out = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16);

    let mut ad = TC_AD;
    ad[3] ^= 0x04;
    assert_eq!(
        open(&TC_KEY, &TC_NONCE, &ad, &out, 16),
        Err(Error::IntegrityFailure)
    );
}

#[test]
fn wrong_nonce_of_same_length_is_rejected() {
    let out = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16);

    let mut nonce = TC_NONCE;
    nonce[11] ^= 0xff;
    assert_eq!(
        open(&TC_KEY, &nonce, &TC_AD, &out, 16),
        Err(Error::IntegrityFailure)
    );
}

#[test]
fn rejected_message_buffer_is_wiped() {
    let mut out = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16);
    let last = out.len() - 1;
    out[last] ^= 0x01;

    let mut dec = decryptor(16);
    dec.set_key(&TC_KEY).unwrap();
    dec.set_associated_data(&TC_AD).unwrap();
    dec.start(&TC_NONCE).unwrap();
    assert_eq!(dec.finish(&mut out, 0), Err(Error::IntegrityFailure));

    // No plaintext (or ciphertext) survives in the caller's buffer.
    assert!(out.is_empty());
}

#[test]
fn streaming_matches_one_shot() {
    let one_shot = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16);

    let mut enc = encryptor(16);
    enc.set_key(&TC_KEY).unwrap();
    enc.set_associated_data(&TC_AD).unwrap();
    enc.start(&TC_NONCE).unwrap();

    // Two full blocks through process, the rest through finish.
    let mut buffer = TC_PT.to_vec();
    enc.process(&mut buffer[..32]).unwrap();
    enc.finish(&mut buffer, 32).unwrap();
    assert_eq!(buffer, one_shot);

    let mut dec = decryptor(16);
    dec.set_key(&TC_KEY).unwrap();
    dec.set_associated_data(&TC_AD).unwrap();
    dec.start(&TC_NONCE).unwrap();

    let mut buffer = one_shot.clone();
    dec.process(&mut buffer[..16]).unwrap();
    dec.finish(&mut buffer, 16).unwrap();
    assert_eq!(buffer, TC_PT);
}

#[test]
fn truncated_tags() {
    for tag_size in [12, 13, 14, 15] {
        let out = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, tag_size);
        assert_eq!(out.len(), TC_PT.len() + tag_size);
        // Truncation keeps the leading tag bytes.
        assert_eq!(
            out[60..],
            hex!("5bc94fbc3221a5db94fae95ae7121a47")[..tag_size]
        );

        let pt = open(&TC_KEY, &TC_NONCE, &TC_AD, &out, tag_size).unwrap();
        assert_eq!(pt, TC_PT);
    }
}

#[test]
fn deprecated_64_bit_tag_round_trips() {
    let out = seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 8);
    assert_eq!(out.len(), TC_PT.len() + 8);

    let pt = open(&TC_KEY, &TC_NONCE, &TC_AD, &out, 8).unwrap();
    assert_eq!(pt, TC_PT);

    let mut bad = out;
    bad[60] ^= 1;
    assert_eq!(
        open(&TC_KEY, &TC_NONCE, &TC_AD, &bad, 8),
        Err(Error::IntegrityFailure)
    );
}

#[test]
fn key_reuse_across_messages() {
    let mut enc = encryptor(16);
    enc.set_key(&TC_KEY).unwrap();

    // Second message keyed once, started twice.
    enc.set_associated_data(&TC_AD).unwrap();
    enc.start(&TC_NONCE).unwrap();
    let mut first = TC_PT.to_vec();
    enc.finish(&mut first, 0).unwrap();

    enc.start(&TC_NONCE).unwrap();
    let mut second = TC_PT.to_vec();
    enc.finish(&mut second, 0).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16));
}

#[test]
fn reset_abandons_in_flight_message() {
    let mut enc = encryptor(16);
    enc.set_key(&TC_KEY).unwrap();
    enc.set_associated_data(&TC_AD).unwrap();
    enc.start(&TC_NONCE).unwrap();

    let mut partial = vec![0u8; 16];
    enc.process(&mut partial).unwrap();
    enc.reset();

    // Reset drops the associated-data baseline along with the in-flight
    // message, so the next message authenticates empty associated data
    // and the abandoned bytes do not leak into it.
    enc.start(&TC_NONCE).unwrap();
    let mut buffer = TC_PT.to_vec();
    enc.finish(&mut buffer, 0).unwrap();
    assert_eq!(buffer, seal(&TC_KEY, &TC_NONCE, &[], &TC_PT, 16));

    // Re-supplying the associated data restores the original baseline.
    enc.set_associated_data(&TC_AD).unwrap();
    enc.start(&TC_NONCE).unwrap();
    let mut buffer = TC_PT.to_vec();
    enc.finish(&mut buffer, 0).unwrap();
    assert_eq!(buffer, seal(&TC_KEY, &TC_NONCE, &TC_AD, &TC_PT, 16));
}

#[test]
fn cleared_mode_requires_rekeying() {
    let mut enc = encryptor(16);
    enc.set_key(&TC_KEY).unwrap();
    enc.clear();

    assert!(matches!(
        enc.start(&TC_NONCE),
        Err(Error::InvalidState { .. })
    ));
}

#[test]
fn names_and_providers() {
    let enc = encryptor(16);
    assert_eq!(enc.name(), "AES-128/GCM(128)");
    assert_eq!(enc.update_granularity(), 16);
    assert!(["clmul", "soft"].contains(&enc.provider()));

    let registry = BlockCipherRegistry::default();
    let short = GcmEncryption::for_algorithm(&registry, "AES-256", 12).unwrap();
    assert_eq!(short.name(), "AES-256/GCM(96)");
}

#[test]
fn unknown_cipher_name_is_reported() {
    let registry = BlockCipherRegistry::default();
    let err = GcmEncryption::for_algorithm(&registry, "Twofish", 16).unwrap_err();
    assert_eq!(err, Error::AlgorithmNotFound("Twofish".into()));
}

proptest! {
    #[test]
    fn round_trip(
        key in proptest::array::uniform32(any::<u8>()),
        nonce in proptest::collection::vec(any::<u8>(), 1..32),
        ad in proptest::collection::vec(any::<u8>(), 0..64),
        pt in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let registry = BlockCipherRegistry::default();

        let mut enc = GcmEncryption::for_algorithm(&registry, "AES-256", 16).unwrap();
        enc.set_key(&key).unwrap();
        enc.set_associated_data(&ad).unwrap();
        enc.start(&nonce).unwrap();
        let mut buffer = pt.clone();
        enc.finish(&mut buffer, 0).unwrap();

        prop_assert_eq!(buffer.len(), pt.len() + 16);

        let mut dec = GcmDecryption::for_algorithm(&registry, "AES-256", 16).unwrap();
        dec.set_key(&key).unwrap();
        dec.set_associated_data(&ad).unwrap();
        dec.start(&nonce).unwrap();
        dec.finish(&mut buffer, 0).unwrap();

        prop_assert_eq!(buffer, pt);
    }

    #[test]
    fn sealing_is_deterministic(
        key in proptest::array::uniform16(any::<u8>()),
        nonce in proptest::collection::vec(any::<u8>(), 1..32),
        pt in proptest::collection::vec(any::<u8>(), 0..128),
    ) {
        let a = seal(&key, &nonce, &[], &pt, 16);
        let b = seal(&key, &nonce, &[], &pt, 16);
        prop_assert_eq!(a, b);
    }
}
