//! End-to-end checks of the depth wire format through the public API.

use lfdepth_rs::core::depth::{
    decode_rgb, encode_pixel, linearize_depth, normalize_depth, quantize_depth, FAR_SENTINEL,
};

#[test]
fn test_full_range_roundtrip() {
    for depth in 0..=u16::MAX {
        let [r, g, _b] = encode_pixel(depth);
        let recovered = u16::from(r) | (u16::from(g) << 8);
        assert_eq!(recovered, depth);
    }
}

#[test]
fn test_encoded_frame_decodes_to_image() {
    // A 3x2 frame whose bottom row holds increasing depths; the encoded
    // buffer is bottom-to-top, exactly as readback produces it.
    let (width, height) = (3u32, 2u32);
    let bottom = [100u16, 200, 300];
    let top = [40000u16, 50000, 60000];

    let mut encoded = Vec::new();
    for depth in bottom.iter().chain(top.iter()) {
        encoded.extend_from_slice(&encode_pixel(*depth));
    }

    let image = decode_rgb(&encoded, width, height).unwrap();
    assert_eq!(image.width(), width);
    assert_eq!(image.height(), height);
    for (x, expected) in top.iter().enumerate() {
        assert_eq!(image.get(x as u32, 0), *expected);
    }
    for (x, expected) in bottom.iter().enumerate() {
        assert_eq!(image.get(x as u32, 1), *expected);
    }
}

#[test]
fn test_shader_math_mirror_quantizes_like_the_gpu() {
    // Host-side replay of the fragment shader: hardware depth in [0, 1] ->
    // view-space depth -> normalized -> quantized 16-bit.
    let (near, far) = (1.0f32, 100.0f32);

    // The far plane lands exactly on the sentinel
    assert_eq!(
        quantize_depth(normalize_depth(linearize_depth(1.0, near, far), near, far)),
        FAR_SENTINEL
    );
    // The near plane quantizes to zero
    assert_eq!(
        quantize_depth(normalize_depth(linearize_depth(0.0, near, far), near, far)),
        0
    );
}
