use std::error::Error;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use image::{Rgb, RgbImage};
use qrcode::QrCode;
use rusttype::{Font, Scale, point};

use crate::round::Round;

const FONT_CANDIDATES: &[&str] = &[
    "Helvetica", "Arial", "DejaVuSans", "LiberationSans", "SegoeUI", "Segoe UI", "NotoSans-Regular", "NotoSans", "Cantarell-Regular"
];

// Card layout, in pixels
const CARD_W: u32 = 795;
const CARD_H: u32 = 1520;
const FONT_PX: f32 = 40.0;
const TITLE_X: u32 = 40;
const TITLE_TOP: u32 = 40;
const TEXT_X: u32 = 50;
const TEXT_MAX_W: u32 = CARD_W - TEXT_X - 40;
const SLOT_H: u32 = 60;
const STRATEGY_TOP: u32 = 120;
const DEPLOYMENT_TOP: u32 = 180;
const SCHEMES_TOP: u32 = 300;
const EVENT_TOP: u32 = 640;
const QR_TOP: u32 = 730;
const QR_QUIET_ZONE: u32 = 4;
const QR_MAX_MODULE_PX: u32 = 10;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Font bytes from the configured path, or the best match among the installed system fonts.
pub fn load_font_data(configured: Option<&Path>) -> Result<Vec<u8>, Box<dyn Error>> {
    if let Some(path) = configured {
        return fs::read(path).map_err(|e| format!("cannot read font {}: {e}", path.display()).into());
    }
    find_system_font_data().ok_or_else(|| "No system font found for rendering; set font_path in params".into())
}

/// Directories the platform keeps installed fonts in.
fn font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = if cfg!(target_os = "macos") {
        vec![PathBuf::from("/System/Library/Fonts"), PathBuf::from("/Library/Fonts")]
    } else if cfg!(target_os = "windows") {
        vec![PathBuf::from("C:/Windows/Fonts")]
    } else {
        vec![PathBuf::from("/usr/share/fonts"), PathBuf::from("/usr/local/share/fonts")]
    };
    dirs.extend(dirs_next::font_dir());
    dirs.retain(|d| d.is_dir());
    dirs
}

/// Position in [`FONT_CANDIDATES`], or `None` for any other family.
fn preferred_rank(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    FONT_CANDIDATES.iter().position(|c| stem.eq_ignore_ascii_case(c))
}

/// Printable ASCII characters the font has a glyph for.
fn ascii_coverage(bytes: &[u8]) -> Option<usize> {
    let font = Font::try_from_bytes(bytes)?;
    Some((' '..='~').filter(|&c| font.glyph(c).id().0 != 0).count())
}

/// Preferred families first, in [`FONT_CANDIDATES`] order; the first one that parses wins.
/// Without any of them, the font covering the most printable ASCII.
fn find_system_font_data() -> Option<Vec<u8>> {
    let mut fonts: Vec<(Option<usize>, PathBuf)> = font_dirs()
        .iter()
        .flat_map(|dir| walkdir::WalkDir::new(dir).follow_links(true))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
        })
        .map(|p| (preferred_rank(&p), p))
        .collect();
    // `None` sorts first, so push unranked fonts behind the ranked ones.
    fonts.sort_by_key(|(rank, _)| rank.unwrap_or(usize::MAX));

    let mut fallback: Option<(usize, Vec<u8>, PathBuf)> = None;
    for (rank, path) in fonts {
        let Ok(bytes) = fs::read(&path) else { continue };
        let Some(coverage) = ascii_coverage(&bytes) else { continue };
        if rank.is_some() {
            log::debug!("using font {}", path.display());
            return Some(bytes);
        }
        if fallback.as_ref().is_none_or(|(best, _, _)| coverage > *best) {
            fallback = Some((coverage, bytes, path));
        }
    }
    fallback.map(|(_, bytes, path)| {
        log::debug!("using font {}", path.display());
        bytes
    })
}

pub struct TextPainter {
    font: Font<'static>,
    scale: Scale,
    line_height: f32,
}

impl TextPainter {
    pub fn new(font_data: Vec<u8>, px: f32) -> Result<Self, Box<dyn Error>> {
        let font = Font::try_from_vec(font_data).ok_or("Invalid font data")?;
        let scale = Scale::uniform(px);
        let v = font.v_metrics(scale);
        let line_height = (v.ascent - v.descent + v.line_gap).ceil();
        Ok(Self { font, scale, line_height })
    }

    pub fn for_cards(font_data: Vec<u8>) -> Result<Self, Box<dyn Error>> {
        Self::new(font_data, FONT_PX)
    }

    fn word_width(&self, word: &str) -> f32 {
        self.font
            .layout(word, self.scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    /// Word-wraps `text` inside the box; lines that don't fit vertically are dropped.
    /// A single line is always drawn even when the box is shorter than one line.
    fn draw_wrapped(&self, img: &mut RgbImage, text: &str, left: u32, top: u32, max_w: u32, max_h: u32, color: Rgb<u8>) {
        let ascent = self.font.v_metrics(self.scale).ascent;
        let max_wf = max_w as f32;
        let max_hf = (max_h as f32).max(self.line_height);
        let space = self.word_width(" ");
        let mut pen_y = 0.0f32;
        let mut line = String::new();
        let mut line_width = 0.0f32;

        for w in text.split_whitespace() {
            let w_width = self.word_width(w);
            if !line.is_empty() && line_width + space + w_width > max_wf {
                self.draw_line(img, &line, left, top, pen_y + ascent, color);
                pen_y += self.line_height;
                line.clear();
                line_width = 0.0;
                if pen_y + self.line_height > max_hf { return; }
            }
            if !line.is_empty() { line.push(' '); line_width += space; }
            line.push_str(w);
            line_width += w_width;
        }
        if !line.is_empty() {
            self.draw_line(img, &line, left, top, pen_y + ascent, color);
        }
    }

    fn draw_line(&self, img: &mut RgbImage, text: &str, left: u32, top: u32, baseline_y: f32, color: Rgb<u8>) {
        let origin = point(left as f32, top as f32 + baseline_y);
        for glyph in self.font.layout(text, self.scale, origin) {
            let Some(bb) = glyph.pixel_bounding_box() else { continue };
            glyph.draw(|x, y, coverage| {
                let (px, py) = (bb.min.x + x as i32, bb.min.y + y as i32);
                if coverage < 0.05 || px < 0 || py < 0 { return; }
                if let Some(dst) = img.get_pixel_mut_checked(px as u32, py as u32) {
                    dst.0 = std::array::from_fn(|i| blend(dst.0[i], color.0[i], coverage));
                }
            });
        }
    }
}

fn blend(under: u8, over: u8, alpha: f32) -> u8 {
    (under as f32 + (over as f32 - under as f32) * alpha).round() as u8
}

/// Paints the QR symbol for `data` with its quiet zone, horizontally centred, starting at `top`.
/// Returns the side length in pixels.
fn draw_qr(img: &mut RgbImage, data: &str, top: u32) -> Result<u32, Box<dyn Error>> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| format!("QR encode error: {e}"))?;
    let modules = code.width() as u32;
    let total = modules + QR_QUIET_ZONE * 2;
    let room = img.width().min(img.height().saturating_sub(top));
    let module_px = (room / total).clamp(1, QR_MAX_MODULE_PX);
    let side = total * module_px;
    if side > room {
        return Err(format!("QR code with {modules} modules does not fit on the card").into());
    }
    let left = (img.width() - side) / 2;

    for y in top..top + side {
        for x in left..left + side { img.put_pixel(x, y, WHITE); }
    }
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != qrcode::Color::Dark { continue; }
        let mx = i as u32 % modules;
        let my = i as u32 / modules;
        let px = left + (QR_QUIET_ZONE + mx) * module_px;
        let py = top + (QR_QUIET_ZONE + my) * module_px;
        for dy in 0..module_px {
            for dx in 0..module_px { img.put_pixel(px + dx, py + dy, BLACK); }
        }
    }
    Ok(side)
}

/// Lays out one round card: summary text on top, QR code of `payload_json` below.
pub fn render_card(round: &Round, event_name: &str, payload_json: &str, painter: &TextPainter) -> Result<RgbImage, Box<dyn Error>> {
    let mut img = RgbImage::from_pixel(CARD_W, CARD_H, WHITE);

    painter.draw_wrapped(&mut img, &round.name, TITLE_X, TITLE_TOP, CARD_W - 2 * TITLE_X, STRATEGY_TOP - TITLE_TOP, BLACK);
    painter.draw_wrapped(&mut img, &round.strategy, TEXT_X, STRATEGY_TOP, TEXT_MAX_W, SLOT_H, BLACK);
    painter.draw_wrapped(&mut img, &round.deployment, TEXT_X, DEPLOYMENT_TOP, TEXT_MAX_W, SCHEMES_TOP - DEPLOYMENT_TOP, BLACK);
    for (i, scheme) in round.schemes.iter().enumerate() {
        let y = SCHEMES_TOP + i as u32 * SLOT_H;
        painter.draw_wrapped(&mut img, scheme, TEXT_X, y, TEXT_MAX_W, SLOT_H, BLACK);
    }
    painter.draw_wrapped(&mut img, event_name, TEXT_X, EVENT_TOP, TEXT_MAX_W, QR_TOP - EVENT_TOP, BLACK);

    draw_qr(&mut img, payload_json, QR_TOP)?;
    Ok(img)
}

pub fn render_card_to_png(round: &Round, event_name: &str, payload_json: &str, painter: &TextPainter, path: &Path) -> Result<(), Box<dyn Error>> {
    let img = render_card(round, event_name, payload_json, painter)?;
    let mut file = File::create(path).map_err(|e| format!("cannot create {}: {e}", path.display()))?;
    img.write_to(&mut file, image::ImageFormat::Png)?;
    Ok(())
}
