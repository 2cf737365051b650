use crate::AssetLoadError;
use portal_common::{ColorSpace, TextureImage};
use std::path::Path;

pub(crate) fn load(path: &Path) -> Result<TextureImage, AssetLoadError> {
    let bytes = std::fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureImage {
        width,
        height,
        rgba: rgba.into_raw(),
        flip_y: false,
        color_space: ColorSpace::Srgb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn loads_png_as_srgb_without_flip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baked.png");
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.save(&path).unwrap();

        let tex = load(&path).unwrap();
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.rgba.len(), 3 * 2 * 4);
        assert_eq!(&tex.rgba[..4], &[255, 0, 0, 255]);
        assert!(!tex.flip_y);
        assert_eq!(tex.color_space, ColorSpace::Srgb);
    }

    #[test]
    fn undecodable_bytes_are_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baked.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(matches!(load(&path), Err(AssetLoadError::Image(_))));
    }
}
