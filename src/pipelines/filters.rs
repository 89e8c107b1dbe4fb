// SPDX-License-Identifier: GPL-3.0-only

//! CPU image filters for the live preview
//!
//! Every filter is a pure image → image transform on RGBA frames. A chain is
//! applied in list order; an empty chain returns the input unchanged.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Filter types for the preview and captured output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// No filter applied
    #[default]
    Standard,
    /// Black & white / monochrome
    Mono,
    /// Warm brownish tint
    Sepia,
    /// High contrast black & white
    Noir,
    /// Boosted saturation and contrast
    Vivid,
    /// Blue color temperature shift
    Cool,
    /// Orange/amber color temperature
    Warm,
    /// Lifted blacks with muted colors
    Fade,
    /// Two-color gradient mapping
    Duotone,
    /// Darkened edges
    Vignette,
    /// Inverted colors
    Negative,
    /// Reduced color levels
    Posterize,
    /// Partially inverted tones
    Solarize,
    /// RGB channel split
    ChromaticAberration,
    /// Pencil sketch
    Pencil,
}

impl FilterType {
    pub const ALL: [FilterType; 15] = [
        FilterType::Standard,
        FilterType::Mono,
        FilterType::Sepia,
        FilterType::Noir,
        FilterType::Vivid,
        FilterType::Cool,
        FilterType::Warm,
        FilterType::Fade,
        FilterType::Duotone,
        FilterType::Vignette,
        FilterType::Negative,
        FilterType::Posterize,
        FilterType::Solarize,
        FilterType::ChromaticAberration,
        FilterType::Pencil,
    ];

    /// Apply this filter to `image`
    pub fn apply(self, image: &RgbaImage) -> RgbaImage {
        match self {
            FilterType::Standard => image.clone(),
            FilterType::Pencil => apply_pencil(image),
            FilterType::ChromaticAberration => apply_chromatic_aberration(image),
            filter => apply_per_pixel(image, filter),
        }
    }
}

/// Apply `filters` in order; `None` when the chain is empty
///
/// Returning `None` lets callers keep sharing the unfiltered buffer.
pub fn apply_chain(image: &RgbaImage, filters: &[FilterType]) -> Option<RgbaImage> {
    let (first, rest) = filters.split_first()?;
    let mut output = first.apply(image);
    for filter in rest {
        output = filter.apply(&output);
    }
    Some(output)
}

fn apply_per_pixel(image: &RgbaImage, filter: FilterType) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut output = image.clone();

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let mut r = r as f32 / 255.0;
        let mut g = g as f32 / 255.0;
        let mut b = b as f32 / 255.0;

        apply_filter_rgb(&mut r, &mut g, &mut b, filter, x, y, width, height);

        *pixel = Rgba([to_byte(r), to_byte(g), to_byte(b), a]);
    }

    output
}

/// Sobel edge detection on luminance, drawn as dark lines on paper
fn apply_pencil(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let sample = |x: i64, y: i64| -> f32 {
        let x = x.clamp(0, width as i64 - 1) as u32;
        let y = y.clamp(0, height as i64 - 1) as u32;
        let [r, g, b, _] = image.get_pixel(x, y).0;
        luminance(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    };

    // Pseudo-random paper texture
    let hash = |x: u32, y: u32| -> f32 {
        let p = (x as f32 * 127.1 + y as f32 * 311.7) * 0.01;
        (p.sin() * 43758.5453).fract().abs()
    };

    RgbaImage::from_fn(width, height, |px, py| {
        let x = px as i64;
        let y = py as i64;

        let tl = sample(x - 1, y - 1);
        let tm = sample(x, y - 1);
        let tr = sample(x + 1, y - 1);
        let ml = sample(x - 1, y);
        let mr = sample(x + 1, y);
        let bl = sample(x - 1, y + 1);
        let bm = sample(x, y + 1);
        let br = sample(x + 1, y + 1);

        let gx = -tl - 2.0 * ml - bl + tr + 2.0 * mr + br;
        let gy = -tl - 2.0 * tm - tr + bl + 2.0 * bm + br;
        let edge = (gx * gx + gy * gy).sqrt();

        let pencil = 1.0 - edge * 2.0;
        let paper = 0.95 + hash(px, py) * 0.05;
        let value = to_byte(pencil * paper);

        Rgba([value, value, value, image.get_pixel(px, py).0[3]])
    })
}

/// Red sampled to the right, blue to the left
fn apply_chromatic_aberration(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let offset = (width as f32 * 0.004).max(1.0) as i64;
    let column = |x: i64| x.clamp(0, width as i64 - 1) as u32;

    RgbaImage::from_fn(width, height, |px, py| {
        let x = px as i64;
        let center = image.get_pixel(px, py).0;
        let red = image.get_pixel(column(x + offset), py).0[0];
        let blue = image.get_pixel(column(x - offset), py).0[2];
        Rgba([red, center[1], blue, center[3]])
    })
}

#[inline]
fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

#[inline]
fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Apply a per-pixel filter effect to RGB values in place
#[inline]
#[allow(clippy::too_many_arguments)]
fn apply_filter_rgb(
    r: &mut f32,
    g: &mut f32,
    b: &mut f32,
    filter: FilterType,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) {
    match filter {
        FilterType::Standard | FilterType::Pencil | FilterType::ChromaticAberration => {}

        FilterType::Mono => {
            let gray = luminance(*r, *g, *b);
            *r = gray;
            *g = gray;
            *b = gray;
        }

        FilterType::Sepia => {
            let lum = luminance(*r, *g, *b);
            *r = (lum * 1.2 + 0.1).clamp(0.0, 1.0);
            *g = (lum * 0.9 + 0.05).clamp(0.0, 1.0);
            *b = (lum * 0.7).clamp(0.0, 1.0);
        }

        FilterType::Noir => {
            let lum = luminance(*r, *g, *b);
            let adjusted = ((lum - 0.5) * 2.0 + 0.5).clamp(0.0, 1.0);
            *r = adjusted;
            *g = adjusted;
            *b = adjusted;
        }

        FilterType::Vivid => {
            let lum = luminance(*r, *g, *b);
            for channel in [&mut *r, &mut *g, &mut *b] {
                let saturated = (lum + (*channel - lum) * 1.4).clamp(0.0, 1.0);
                *channel = ((saturated - 0.5) * 1.15 + 0.5).clamp(0.0, 1.0);
            }
        }

        FilterType::Cool => {
            *r = (*r * 0.9).clamp(0.0, 1.0);
            *g = (*g * 0.95).clamp(0.0, 1.0);
            *b = (*b * 1.1).clamp(0.0, 1.0);
        }

        FilterType::Warm => {
            *r = (*r * 1.1).clamp(0.0, 1.0);
            *b = (*b * 0.85).clamp(0.0, 1.0);
        }

        FilterType::Fade => {
            *r = (*r * 0.85 + 0.1).clamp(0.0, 1.0);
            *g = (*g * 0.85 + 0.1).clamp(0.0, 1.0);
            *b = (*b * 0.85 + 0.1).clamp(0.0, 1.0);
            let lum = luminance(*r, *g, *b);
            *r = (lum + (*r - lum) * 0.7).clamp(0.0, 1.0);
            *g = (lum + (*g - lum) * 0.7).clamp(0.0, 1.0);
            *b = (lum + (*b - lum) * 0.7).clamp(0.0, 1.0);
        }

        FilterType::Duotone => {
            let lum = luminance(*r, *g, *b);
            let dark = (0.1, 0.1, 0.4);
            let light = (1.0, 0.9, 0.5);
            *r = dark.0 + lum * (light.0 - dark.0);
            *g = dark.1 + lum * (light.1 - dark.1);
            *b = dark.2 + lum * (light.2 - dark.2);
        }

        FilterType::Vignette => {
            let dx = x as f32 / width as f32 - 0.5;
            let dy = y as f32 / height as f32 - 0.5;
            let dist = (dx * dx + dy * dy).sqrt();
            let vignette = 1.0 - smoothstep(0.3, 0.9, dist);
            *r *= vignette;
            *g *= vignette;
            *b *= vignette;
        }

        FilterType::Negative => {
            *r = 1.0 - *r;
            *g = 1.0 - *g;
            *b = 1.0 - *b;
        }

        FilterType::Posterize => {
            let levels = 4.0;
            *r = (*r * levels).floor() / levels;
            *g = (*g * levels).floor() / levels;
            *b = (*b * levels).floor() / levels;
        }

        FilterType::Solarize => {
            for channel in [&mut *r, &mut *g, &mut *b] {
                if *channel > 0.5 {
                    *channel = 1.0 - *channel;
                }
            }
        }
    }
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> RgbaImage {
        RgbaImage::from_fn(8, 6, |x, y| Rgba([(x * 30) as u8, (y * 40) as u8, 200, 255]))
    }

    #[test]
    fn test_empty_chain_is_identity() {
        assert!(apply_chain(&test_image(), &[]).is_none());
        assert_eq!(FilterType::Standard.apply(&test_image()), test_image());
    }

    #[test]
    fn test_mono_is_gray() {
        let output = FilterType::Mono.apply(&test_image());
        for pixel in output.pixels() {
            assert_eq!(pixel.0[0], pixel.0[1]);
            assert_eq!(pixel.0[1], pixel.0[2]);
        }
    }

    #[test]
    fn test_negative_twice_restores_input() {
        let image = test_image();
        let output = apply_chain(&image, &[FilterType::Negative, FilterType::Negative]).unwrap();
        assert_eq!(output, image);
    }

    #[test]
    fn test_chain_order_matters() {
        let image = test_image();
        let sepia_then_negative =
            apply_chain(&image, &[FilterType::Sepia, FilterType::Negative]).unwrap();
        let negative_then_sepia =
            apply_chain(&image, &[FilterType::Negative, FilterType::Sepia]).unwrap();

        assert_eq!(
            sepia_then_negative,
            FilterType::Negative.apply(&FilterType::Sepia.apply(&image))
        );
        assert_ne!(sepia_then_negative, negative_then_sepia);
    }

    #[test]
    fn test_filters_preserve_dimensions_and_alpha() {
        let image = RgbaImage::from_pixel(5, 3, Rgba([120, 60, 30, 77]));
        for filter in FilterType::ALL {
            let output = filter.apply(&image);
            assert_eq!(output.dimensions(), image.dimensions(), "{:?}", filter);
            assert!(output.pixels().all(|p| p.0[3] == 77), "{:?}", filter);
        }
    }

    #[test]
    fn test_empty_image_is_handled() {
        let image = RgbaImage::new(0, 0);
        for filter in FilterType::ALL {
            assert_eq!(filter.apply(&image).dimensions(), (0, 0));
        }
    }
}
