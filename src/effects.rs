use image::{DynamicImage, GrayImage, ImageBuffer, ImageOutputFormat, Luma, Pixel, Rgb, Rgba, RgbaImage};
use serde::{Deserialize, Serialize, Serializer};
use std::io::Cursor;

use crate::error::DashboardError;

/// Named image transforms offered in the product viewer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Effect {
    #[default]
    None,
    Grayscale,
    Rotate,
    Blur,
    Sharpen,
    EdgeEnhance,
    Brightness,
}

impl Effect {
    /// Picker order
    pub const ALL: [Effect; 7] = [
        Effect::None,
        Effect::Grayscale,
        Effect::Rotate,
        Effect::Blur,
        Effect::Sharpen,
        Effect::EdgeEnhance,
        Effect::Brightness,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Effect::None => "None",
            Effect::Grayscale => "Grayscale",
            Effect::Rotate => "Rotate",
            Effect::Blur => "Blur",
            Effect::Sharpen => "Sharpen",
            Effect::EdgeEnhance => "Edge Enhance",
            Effect::Brightness => "Brightness +30%",
        }
    }

    /// Looks an effect up by its label; unknown names fall through to `None`
    pub fn from_label(label: &str) -> Effect {
        Effect::ALL
            .into_iter()
            .find(|e| e.label() == label)
            .unwrap_or(Effect::None)
    }
}

impl From<String> for Effect {
    fn from(label: String) -> Self {
        Effect::from_label(&label)
    }
}

impl Serialize for Effect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Angle used by the "Rotate" effect, counter-clockwise
pub const ROTATION_DEGREES: f64 = 45.0;

/// Factor used by the "Brightness +30%" effect
pub const BRIGHTNESS_FACTOR: f32 = 1.3;

/// Square convolution kernel with an integer divisor
struct Kernel {
    size: usize,
    weights: &'static [i32],
    scale: i32,
}

const BLUR: Kernel = Kernel {
    size: 5,
    weights: &[
        1, 1, 1, 1, 1,
        1, 0, 0, 0, 1,
        1, 0, 0, 0, 1,
        1, 0, 0, 0, 1,
        1, 1, 1, 1, 1,
    ],
    scale: 16,
};

const SHARPEN: Kernel = Kernel {
    size: 3,
    weights: &[
        -2, -2, -2,
        -2, 32, -2,
        -2, -2, -2,
    ],
    scale: 16,
};

const EDGE_ENHANCE: Kernel = Kernel {
    size: 3,
    weights: &[
        -1, -1, -1,
        -1, 10, -1,
        -1, -1, -1,
    ],
    scale: 2,
};

/// Applies an effect and returns a new image; the input is left untouched
///
/// # Arguments
/// * `image` - Decoded product image
/// * `effect` - Transform to apply
///
/// # Returns
/// * `DynamicImage` - Transformed copy. `Effect::None` yields a pixel-equal clone.
pub fn apply_effect(image: &DynamicImage, effect: Effect) -> DynamicImage {
    match effect {
        Effect::None => image.clone(),
        Effect::Grayscale => grayscale(image),
        Effect::Rotate => rotate_about_center(image, ROTATION_DEGREES),
        Effect::Blur => convolve(image, &BLUR),
        Effect::Sharpen => convolve(image, &SHARPEN),
        Effect::EdgeEnhance => convolve(image, &EDGE_ENHANCE),
        Effect::Brightness => brighten(image, BRIGHTNESS_FACTOR),
    }
}

/// Same as [`apply_effect`] but takes the effect label as entered by the user
pub fn apply_named_effect(image: &DynamicImage, name: &str) -> DynamicImage {
    apply_effect(image, Effect::from_label(name))
}

// ITU-R 601-2 luma (299/587/114) in 16.16 fixed point; alpha is dropped
fn grayscale(image: &DynamicImage) -> DynamicImage {
    let rgb = image.to_rgb8();
    let luma = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        Luma([l as u8])
    });
    DynamicImage::ImageLuma8(luma)
}

/// Rotates counter-clockwise about the image centre without growing the canvas
///
/// Nearest-neighbour sampling. Corners that no source pixel covers become black,
/// or transparent black when the image carries alpha.
pub fn rotate_about_center(image: &DynamicImage, degrees: f64) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(rotate_buffer(buf, degrees, Luma([0]))),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(rotate_buffer(buf, degrees, Rgb([0, 0, 0]))),
        other => DynamicImage::ImageRgba8(rotate_buffer(&other.to_rgba8(), degrees, Rgba([0, 0, 0, 0]))),
    }
}

fn rotate_buffer<P>(src: &ImageBuffer<P, Vec<u8>>, degrees: f64, fill: P) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = src.dimensions();
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let (sin, cos) = degrees.to_radians().sin_cos();

    ImageBuffer::from_fn(width, height, |x, y| {
        // Inverse mapping from the pixel centre back into the source (y grows downwards)
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        let sx = (cx + dx * cos - dy * sin).floor();
        let sy = (cy + dx * sin + dy * cos).floor();
        if sx >= 0.0 && sy >= 0.0 && sx < width as f64 && sy < height as f64 {
            *src.get_pixel(sx as u32, sy as u32)
        } else {
            fill
        }
    })
}

// Colour channels are convolved with edge clamping, alpha is carried over
fn convolve(image: &DynamicImage, kernel: &Kernel) -> DynamicImage {
    let src = image.to_rgba8();
    let (width, height) = src.dimensions();
    let radius = (kernel.size / 2) as i64;

    let out: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
        let mut acc = [0i32; 3];
        for ky in 0..kernel.size {
            for kx in 0..kernel.size {
                let weight = kernel.weights[ky * kernel.size + kx];
                if weight == 0 {
                    continue;
                }
                let sx = (x as i64 + kx as i64 - radius).clamp(0, width as i64 - 1) as u32;
                let sy = (y as i64 + ky as i64 - radius).clamp(0, height as i64 - 1) as u32;
                let pixel = src.get_pixel(sx, sy);
                for (c, total) in acc.iter_mut().enumerate() {
                    *total += weight * pixel[c] as i32;
                }
            }
        }

        let alpha = src.get_pixel(x, y)[3];
        let [r, g, b] = acc.map(|total| divide_round(total, kernel.scale).clamp(0, 255) as u8);
        Rgba([r, g, b, alpha])
    });

    DynamicImage::ImageRgba8(out)
}

fn divide_round(value: i32, divisor: i32) -> i32 {
    (value as f64 / divisor as f64).round() as i32
}

fn brighten(image: &DynamicImage, factor: f32) -> DynamicImage {
    let scale = |v: u8| (v as f32 * factor).round().min(255.0) as u8;
    match image {
        DynamicImage::ImageLuma8(buf) => {
            let mut out = buf.clone();
            out.pixels_mut().for_each(|p| p[0] = scale(p[0]));
            DynamicImage::ImageLuma8(out)
        }
        DynamicImage::ImageRgb8(buf) => {
            let mut out = buf.clone();
            out.pixels_mut().for_each(|p| p.0 = p.0.map(scale));
            DynamicImage::ImageRgb8(out)
        }
        other => {
            let mut out = other.to_rgba8();
            for p in out.pixels_mut() {
                for c in 0..3 {
                    p[c] = scale(p[c]);
                }
            }
            DynamicImage::ImageRgba8(out)
        }
    }
}

/// Encodes an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, DashboardError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::Png)?;
    Ok(buffer.into_inner())
}
