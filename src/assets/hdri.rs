//! Radiance HDR environment maps

use image::ImageFormat;

use super::AssetError;
use crate::scene::{EnvironmentMap, EnvironmentMapping};

/// Decode a Radiance `.hdr` panorama into a linear equirectangular map
pub fn decode_environment(bytes: &[u8]) -> Result<EnvironmentMap, AssetError> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)?;
    let (width, height) = (decoded.width(), decoded.height());
    let texels = decoded.into_rgba32f().pixels().map(|p| p.0).collect();

    Ok(EnvironmentMap {
        width,
        height,
        texels,
        mapping: EnvironmentMapping::Equirectangular,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_hdr_bytes() {
        let result = decode_environment(b"definitely not radiance");
        assert!(matches!(result, Err(AssetError::Image(_))));
    }

    #[test]
    fn test_decodes_flat_radiance_image() {
        // 2x1 uncompressed RGBE: (1, 1, 1) and (0.5, 0.5, 0.5)
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
        bytes.extend_from_slice(&[128, 128, 128, 129, 128, 128, 128, 128]);

        let env = decode_environment(&bytes).unwrap();
        assert_eq!((env.width, env.height), (2, 1));
        assert_eq!(env.texels.len(), 2);
        assert!((env.texels[0][0] - 1.0).abs() < 1e-3);
        assert!((env.texels[1][0] - 0.5).abs() < 1e-3);
    }
}
