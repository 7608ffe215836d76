//! 画像の前処理サービス
//!
//! base64 ペイロードのデコード、前景の再配置、背景の合成を提供

use super::errors::GenerationError;
use super::value_objects::ForegroundRatio;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use image::{Rgb, RgbImage, Rgba, RgbaImage, imageops};
use tracing::debug;

/// パディングの有無を問わない標準 base64
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 背景合成に使う中間グレー (0.5)
const BACKGROUND_LEVEL: f32 = 0.5;

/// data-URI もしくは生の base64 文字列を RGB 画像にデコード
///
/// 最初のカンマまでをプレフィックスとして取り除く。
pub fn decode_image(data: &str) -> Result<RgbImage, GenerationError> {
    let payload = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };

    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = PAYLOAD_ENGINE
        .decode(payload.as_bytes())
        .map_err(|e| GenerationError::Decode(format!("invalid base64: {e}")))?;

    let image = image::load_from_memory(&bytes)
        .map_err(|e| GenerationError::Decode(format!("invalid image: {e}")))?;

    debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded image payload"
    );

    Ok(image.to_rgb8())
}

/// 不透明領域を正方形キャンバスの中央に配置し、一辺に対して `ratio` を占めるよう余白を付ける
pub fn resize_foreground(
    image: &RgbaImage,
    ratio: ForegroundRatio,
) -> Result<RgbaImage, GenerationError> {
    let (min_x, min_y, max_x, max_y) =
        foreground_bounds(image).ok_or(GenerationError::NoForeground)?;

    let fg_width = max_x - min_x + 1;
    let fg_height = max_y - min_y + 1;
    let foreground = imageops::crop_imm(image, min_x, min_y, fg_width, fg_height).to_image();

    // まず正方形に、次に比率に合わせて拡張
    let size = fg_width.max(fg_height);
    let padded_size = ((size as f32 / ratio.value()) as u32).max(size);

    let offset_x = (size - fg_width) / 2 + (padded_size - size) / 2;
    let offset_y = (size - fg_height) / 2 + (padded_size - size) / 2;

    let mut canvas = RgbaImage::from_pixel(padded_size, padded_size, Rgba([0, 0, 0, 0]));
    imageops::replace(&mut canvas, &foreground, i64::from(offset_x), i64::from(offset_y));

    debug!(
        foreground = %format!("{fg_width}x{fg_height}"),
        canvas = padded_size,
        "Resized foreground"
    );

    Ok(canvas)
}

/// RGBA 画像を中間グレーの背景に合成して RGB に変換
pub fn composite_on_gray(image: &RgbaImage) -> RgbImage {
    let mut output = RgbImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = f32::from(pixel[3]) / 255.0;
        let blend = |channel: u8| -> u8 {
            let value = f32::from(channel) / 255.0 * alpha + (1.0 - alpha) * BACKGROUND_LEVEL;
            (value * 255.0) as u8
        };
        output.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    output
}

/// アルファが 0 より大きい画素の外接矩形 (両端を含む)
fn foreground_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> String {
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        STANDARD.encode(buffer)
    }

    #[test]
    fn test_decode_data_uri_png() {
        let source = RgbImage::from_pixel(6, 4, Rgb([200, 10, 30]));
        let data = format!(
            "data:image/png;base64,{}",
            encode(DynamicImage::ImageRgb8(source), ImageFormat::Png)
        );

        let decoded = decode_image(&data).unwrap();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([200, 10, 30]));
    }

    #[test]
    fn test_decode_raw_base64_jpeg() {
        let source = RgbImage::from_pixel(16, 16, Rgb([128, 128, 128]));
        let data = encode(DynamicImage::ImageRgb8(source), ImageFormat::Jpeg);

        let decoded = decode_image(&data).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
    }

    #[test]
    fn test_decode_converts_rgba_to_rgb() {
        let source = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 100]));
        let data = encode(DynamicImage::ImageRgba8(source), ImageFormat::Png);

        let decoded = decode_image(&data).unwrap();
        assert_eq!(decoded.get_pixel(1, 1), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_decode_tolerates_missing_padding_and_line_breaks() {
        let source = RgbImage::from_pixel(5, 5, Rgb([9, 9, 9]));
        let data = encode(DynamicImage::ImageRgb8(source), ImageFormat::Png);
        let unpadded = data.trim_end_matches('=');
        let wrapped: String = unpadded
            .as_bytes()
            .chunks(60)
            .map(|chunk| format!("{}\n", std::str::from_utf8(chunk).unwrap()))
            .collect();

        assert!(decode_image(&wrapped).is_ok());
    }

    #[test]
    fn test_decode_rejects_malformed_base64() {
        let result = decode_image("data:image/png;base64,@@not-base64@@");
        match result {
            Err(GenerationError::Decode(message)) => assert!(!message.is_empty()),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_non_image_bytes() {
        let data = STANDARD.encode(b"definitely not an image");
        assert!(matches!(
            decode_image(&data),
            Err(GenerationError::Decode(_))
        ));
        assert!(matches!(decode_image(""), Err(GenerationError::Decode(_))));
    }

    #[test]
    fn test_resize_foreground_centers_on_square_canvas() {
        // 20x10 の画像に 4x2 の不透明領域
        let mut image = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 0]));
        for x in 3..7 {
            for y in 5..7 {
                image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }

        let ratio = ForegroundRatio::new(0.5).unwrap();
        let resized = resize_foreground(&image, ratio).unwrap();

        // 一辺 4 の正方形を 0.5 で拡張 -> 8
        assert_eq!(resized.dimensions(), (8, 8));
        let (min_x, min_y, max_x, max_y) = foreground_bounds(&resized).unwrap();
        assert_eq!((max_x - min_x + 1, max_y - min_y + 1), (4, 2));
        assert_eq!((min_x, min_y), (2, 3));
    }

    #[test]
    fn test_resize_foreground_with_full_ratio_keeps_size() {
        let image = RgbaImage::from_pixel(7, 7, Rgba([10, 20, 30, 255]));
        let resized = resize_foreground(&image, ForegroundRatio::new(1.0).unwrap()).unwrap();
        assert_eq!(resized.dimensions(), (7, 7));
        assert_eq!(resized.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_resize_foreground_requires_foreground() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 0]));
        assert!(matches!(
            resize_foreground(&image, ForegroundRatio::default()),
            Err(GenerationError::NoForeground)
        ));
    }

    #[test]
    fn test_composite_on_gray() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([255, 0, 0, 0]));

        let composited = composite_on_gray(&image);
        assert_eq!(composited.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(composited.get_pixel(1, 0), &Rgb([127, 127, 127]));
    }
}
