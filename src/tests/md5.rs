// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

use crate::md5;

use serial_test::parallel;

#[test]
#[parallel]
fn test_md5_known_answers() {
    assert_eq!(
        hex::encode(md5::digest(b"")),
        "d41d8cd98f00b204e9800998ecf8427e"
    );
    assert_eq!(
        hex::encode(md5::digest(b"abc")),
        "900150983cd24fb0d6963f7d28e17f72"
    );
    assert_eq!(
        hex::encode(md5::digest(b"message digest")),
        "f96b697d7cb7938d525a2f31aaf161d0"
    );
    assert_eq!(
        hex::encode(md5::digest(
            b"12345678901234567890123456789012345678901234567890\
              123456789012345678901234567890"
        )),
        "57edf4a22be3c955ac49da2e2107b67a"
    );
}

#[test]
#[parallel]
fn test_md5_block_boundaries() {
    // 55 bytes pads within one block, 56 and 64 spill into a second
    for len in [55usize, 56, 63, 64, 65, 128] {
        let data = vec![0xA5u8; len];
        let d1 = md5::digest(&data);
        let d2 = md5::digest(&data);
        assert_eq!(d1, d2);
        let mut other = data.clone();
        other[len - 1] ^= 1;
        assert_ne!(md5::digest(&other), d1);
    }
}
