//! Synthesised thumbnails for the recent-apps switcher.
//!
//! There is no way to snapshot a live frame, so each app gets a schematic
//! picture instead: a diagonal gradient in the app's colour, a few shapes hinting
//! at its layout, and its icon in the corner when one is available.

use anyhow::{Context, Result};
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use std::{io::Cursor, path::Path};

use crate::apps::AppId;

pub const PREVIEW_WIDTH: u32 = 200;
pub const PREVIEW_HEIGHT: u32 = 120;
const ICON_SIZE: u32 = 24;
const ICON_OFFSET: i64 = 10;
const DARKEN_BY: u8 = 30;

pub fn background_color(app_id: &AppId) -> [u8; 3] {
    match app_id.as_str() {
        "camera" => [0x1a, 0x1a, 0x1a],
        "gallery" => [0x2d, 0x2d, 0x2d],
        "calcul" => [0x20, 0x20, 0x20],
        "notes" => [0xf5, 0xf5, 0xdc],
        "security" => [0x2d, 0x4f, 0x4f],
        "browser" => [0xff, 0xff, 0xff],
        _ => [0x00, 0x66, 0x66],
    }
}

fn darken(color: [u8; 3]) -> [u8; 3] {
    color.map(|channel| channel.saturating_sub(DARKEN_BY))
}

/// Looks for `icons/<id>.png` under the web root.
pub fn load_icon(web_root: &Path, app_id: &AppId) -> Option<RgbaImage> {
    let path = web_root.join("icons").join(format!("{}.png", app_id.as_str()));
    if !path.is_file() {
        return None;
    }
    match image::open(&path) {
        Ok(icon) => Some(icon.to_rgba8()),
        Err(err) => {
            log::debug!("icon {} unreadable: {err}", path.display());
            None
        }
    }
}

pub fn render_preview(app_id: &AppId, icon: Option<&RgbaImage>) -> RgbaImage {
    let mut canvas = gradient(background_color(app_id));
    draw_layout(app_id, &mut canvas);

    if let Some(icon) = icon {
        let scaled = imageops::resize(icon, ICON_SIZE, ICON_SIZE, imageops::FilterType::Triangle);
        imageops::overlay(&mut canvas, &scaled, ICON_OFFSET, ICON_OFFSET);
    }

    canvas
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .context("failed to encode preview as PNG")?;
    Ok(bytes.into_inner())
}

/// Renders and encodes in one go; meant for `spawn_blocking`.
pub fn build_preview(app_id: &AppId, web_root: &Path) -> Result<Vec<u8>> {
    let icon = load_icon(web_root, app_id);
    encode_png(&render_preview(app_id, icon.as_ref()))
}

fn gradient(start: [u8; 3]) -> RgbaImage {
    let end = darken(start);
    let span = (PREVIEW_WIDTH + PREVIEW_HEIGHT - 2) as f32;
    RgbaImage::from_fn(PREVIEW_WIDTH, PREVIEW_HEIGHT, |x, y| {
        let t = (x + y) as f32 / span;
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba([
            mix(start[0], end[0]),
            mix(start[1], end[1]),
            mix(start[2], end[2]),
            255,
        ])
    })
}

fn draw_layout(app_id: &AppId, canvas: &mut RgbaImage) {
    let (w, h) = canvas.dimensions();
    match app_id.as_str() {
        "camera" => {
            fill_circle(canvas, w as i32 - 30, h as i32 - 30, 20, [255, 255, 255, 230]);
            fill_rect(canvas, 20, 20, w - 80, h - 70, [0, 0, 0, 77]);
        }
        "gallery" => {
            for col in 0..3 {
                for row in 0..2 {
                    fill_rect(canvas, 15 + col * 55, 15 + row * 40, 50, 35, [255, 255, 255, 102]);
                }
            }
        }
        "calcul" => {
            fill_rect(canvas, 10, 10, w - 20, 30, [0, 0, 0, 204]);
            for col in 0..4 {
                for row in 0..4 {
                    fill_rect(canvas, 15 + col * 40, 50 + row * 15, 35, 12, [255, 255, 255, 77]);
                }
            }
        }
        "notes" => {
            for line in 0..4 {
                fill_rect(canvas, 10, 30 + line * 15, w - 20, 1, [0, 0, 0, 51]);
            }
            for line in 0..3 {
                fill_rect(canvas, 15, 18 + line * 15, 60 + line * 10, 6, [0, 0, 0, 178]);
            }
        }
        _ => {
            // Stand-in for the centred title.
            fill_rect(canvas, w / 2 - 40, h / 2 - 6, 80, 12, [255, 255, 255, 204]);
        }
    }
}

fn blend(canvas: &mut RgbaImage, x: u32, y: u32, color: [u8; 4]) {
    let pixel = canvas.get_pixel_mut(x, y);
    let alpha = color[3] as f32 / 255.0;
    for channel in 0..3 {
        let under = pixel.0[channel] as f32;
        pixel.0[channel] = (under + (color[channel] as f32 - under) * alpha).round() as u8;
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 4]) {
    let (cw, ch) = canvas.dimensions();
    for py in y..(y + h).min(ch) {
        for px in x..(x + w).min(cw) {
            blend(canvas, px, py, color);
        }
    }
}

fn fill_circle(canvas: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
    let (cw, ch) = canvas.dimensions();
    for py in (cy - radius).max(0)..(cy + radius + 1).min(ch as i32) {
        for px in (cx - radius).max(0)..(cx + radius + 1).min(cw as i32) {
            let (dx, dy) = (px - cx, py - cy);
            if dx * dx + dy * dy <= radius * radius {
                blend(canvas, px as u32, py as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_has_fixed_size_and_decodes_as_png() {
        let png = encode_png(&render_preview(&AppId::from("calcul"), None)).expect("encode");
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).expect("decode");
        assert_eq!(decoded.width(), PREVIEW_WIDTH);
        assert_eq!(decoded.height(), PREVIEW_HEIGHT);
    }

    #[test]
    fn different_apps_get_different_pictures() {
        let notes = render_preview(&AppId::from("notes"), None);
        let camera = render_preview(&AppId::from("camera"), None);
        let weather = render_preview(&AppId::from("weather"), None);
        assert_ne!(notes.as_raw(), camera.as_raw());
        assert_ne!(camera.as_raw(), weather.as_raw());
    }

    #[test]
    fn gradient_runs_from_app_colour_to_darker_corner() {
        let preview = render_preview(&AppId::from("browser"), None);
        assert_eq!(preview.get_pixel(0, 0).0, [255, 255, 255, 255]);
        let corner = preview.get_pixel(PREVIEW_WIDTH - 1, PREVIEW_HEIGHT - 1).0;
        assert_eq!(&corner[..3], &[225, 225, 225]);
    }

    #[test]
    fn icon_is_overlaid_in_the_corner() {
        let icon = RgbaImage::from_pixel(48, 48, Rgba([255, 0, 0, 255]));
        let preview = render_preview(&AppId::from("mail"), Some(&icon));
        assert_eq!(preview.get_pixel(20, 20).0, [255, 0, 0, 255]);
    }

    #[test]
    fn icon_is_picked_up_from_web_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("icons")).expect("icons dir");
        RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]))
            .save(dir.path().join("icons/notes.png"))
            .expect("save icon");

        assert!(load_icon(dir.path(), &AppId::from("notes")).is_some());
        assert!(load_icon(dir.path(), &AppId::from("camera")).is_none());
    }
}
