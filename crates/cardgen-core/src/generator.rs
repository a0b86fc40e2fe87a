//! Card image generation.
//!
//! [`PngCardGenerator`] draws a placeholder layout (frame, panel, art box)
//! for each card. Text is not rendered.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::card::{CardDto, CardType, MIN_COST};
use crate::config::GeneratorConfig;
use crate::error::{CardgenError, Result};

/// Produces an image file for a card's transport form.
pub trait CardGenerator: fmt::Debug + Send + Sync {
    /// Check that the card can be rendered.
    fn validate(&self, card: &CardDto) -> Result<()>;

    /// Render `card` to `path`, creating parent directories.
    fn generate(&self, card: &CardDto, path: &Path) -> Result<()>;

    /// Release generator resources.
    fn close(&self) -> Result<()>;
}

type Rgba = [u8; 4];

const PANEL_COLOR: Rgba = [0xF4, 0xEC, 0xD8, 0xFF];
const BORDER_COLOR: Rgba = [0x1A, 0x1A, 0x1A, 0xFF];

/// Layout boxes as fractions of the card size: (left, top, right, bottom).
const PANEL_BOX: (f64, f64, f64, f64) = (0.05, 0.035, 0.95, 0.965);
const NAME_BOX: (f64, f64, f64, f64) = (0.083, 0.043, 0.917, 0.081);
const ART_BOX: (f64, f64, f64, f64) = (0.083, 0.095, 0.917, 0.55);
const EFFECT_BOX: (f64, f64, f64, f64) = (0.107, 0.595, 0.893, 0.833);
const TYPE_BOX: (f64, f64, f64, f64) = (0.083, 0.898, 0.917, 0.931);

fn frame_color(card_type: CardType) -> Rgba {
    match card_type {
        CardType::Creature => [0x8B, 0x3A, 0x2B, 0xFF],
        CardType::Spell => [0x2B, 0x4F, 0x8B, 0xFF],
        CardType::Artifact => [0x6E, 0x6E, 0x73, 0xFF],
        CardType::Incantation => [0x5E, 0x2B, 0x8B, 0xFF],
        CardType::Anthem => [0xB8, 0x93, 0x2E, 0xFF],
    }
}

/// Parse `#RGB` or `#RRGGBB` into an opaque colour.
pub fn parse_hex_color(value: &str) -> Option<Rgba> {
    let hex = value.trim().strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgba = [0xFF; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgba[i] = v * 17;
            }
            Some(rgba)
        }
        6 => Some([
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
            0xFF,
        ]),
        _ => None,
    }
}

/// RGBA pixel buffer.
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let pixels = fill
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    fn scale(&self, layout: (f64, f64, f64, f64)) -> (u32, u32, u32, u32) {
        let (left, top, right, bottom) = layout;
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        (
            (left * w) as u32,
            (top * h) as u32,
            (right * w) as u32,
            (bottom * h) as u32,
        )
    }

    fn fill(&mut self, (x0, y0, x1, y1): (u32, u32, u32, u32), color: Rgba) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        for y in y0..y1 {
            let row = y as usize * self.width as usize;
            for x in x0..x1 {
                let offset = (row + x as usize) * 4;
                self.pixels[offset..offset + 4].copy_from_slice(&color);
            }
        }
    }

    /// Filled box with a border of `stroke` pixels.
    fn boxed(&mut self, layout: (f64, f64, f64, f64), stroke: u32, color: Rgba) {
        let (x0, y0, x1, y1) = self.scale(layout);
        self.fill((x0, y0, x1, y1), BORDER_COLOR);
        if x1 > x0 + 2 * stroke && y1 > y0 + 2 * stroke {
            self.fill((x0 + stroke, y0 + stroke, x1 - stroke, y1 - stroke), color);
        }
    }

    fn encode(&self, dpi: u32) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buffer, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(png::Compression::Best);
            if dpi > 0 {
                let per_meter = (f64::from(dpi) / 0.0254).round() as u32;
                encoder.set_pixel_dims(Some(png::PixelDimensions {
                    xppu: per_meter,
                    yppu: per_meter,
                    unit: png::Unit::Meter,
                }));
            }
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(buffer)
    }
}

/// Placeholder renderer writing PNG files.
#[derive(Debug)]
pub struct PngCardGenerator {
    width: u32,
    height: u32,
    dpi: u32,
    art_color: Rgba,
    closed: AtomicBool,
}

impl PngCardGenerator {
    /// Build a generator from the `generator` configuration group.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::ConfigInvalid` if the image format is not PNG,
    /// the placeholder colour is not a hex colour, or the raw image would
    /// exceed `art_processing.max_image_size`.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        if !config.format.eq_ignore_ascii_case("png") {
            return Err(CardgenError::config_invalid(
                "generator.format",
                format!("unsupported image format '{}'", config.format),
            ));
        }
        if config.image_width == 0 || config.image_height == 0 {
            return Err(CardgenError::config_invalid(
                "generator.image_width",
                "image dimensions must be positive",
            ));
        }

        let art = &config.art_processing;
        let raw_size = u64::from(config.image_width) * u64::from(config.image_height) * 4;
        if art.max_image_size > 0 && raw_size > art.max_image_size {
            return Err(CardgenError::config_invalid(
                "generator.art_processing.max_image_size",
                format!(
                    "{}x{} image needs {} bytes, limit is {}",
                    config.image_width, config.image_height, raw_size, art.max_image_size
                ),
            ));
        }

        let art_color = if art.enable_placeholder {
            parse_hex_color(&art.placeholder_color).ok_or_else(|| {
                CardgenError::config_invalid(
                    "generator.art_processing.placeholder_color",
                    format!("'{}' is not a hex colour", art.placeholder_color),
                )
            })?
        } else {
            PANEL_COLOR
        };

        Ok(Self {
            width: config.image_width,
            height: config.image_height,
            dpi: config.dpi,
            art_color,
            closed: AtomicBool::new(false),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&self, card: &CardDto) -> Canvas {
        let mut canvas = Canvas::new(self.width, self.height, frame_color(card.card_type));
        let stroke = (self.width / 250).max(1);

        canvas.boxed(PANEL_BOX, stroke, PANEL_COLOR);
        canvas.boxed(NAME_BOX, stroke, PANEL_COLOR);
        canvas.boxed(ART_BOX, stroke, self.art_color);
        canvas.boxed(EFFECT_BOX, stroke, PANEL_COLOR);
        canvas.boxed(TYPE_BOX, stroke, PANEL_COLOR);
        canvas
    }
}

impl CardGenerator for PngCardGenerator {
    fn validate(&self, card: &CardDto) -> Result<()> {
        if card.name.trim().is_empty() {
            return Err(CardgenError::validation("name", "card name is required"));
        }
        if card.effect.trim().is_empty() {
            return Err(CardgenError::validation("effect", "card effect is required"));
        }
        if card.cost < MIN_COST {
            return Err(CardgenError::validation(
                "cost",
                format!("invalid card cost: {}", card.cost),
            ));
        }
        if card.card_type == CardType::Creature {
            if card.attack.is_some_and(|attack| attack < 0) {
                return Err(CardgenError::validation(
                    "attack",
                    "creature attack cannot be negative",
                ));
            }
            if card.defense.is_some_and(|defense| defense < 0) {
                return Err(CardgenError::validation(
                    "defense",
                    "creature defense cannot be negative",
                ));
            }
        }
        Ok(())
    }

    fn generate(&self, card: &CardDto, path: &Path) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CardgenError::Generator("generator is closed".to_string()));
        }
        self.validate(card)?;

        let bytes = self.render(card).encode(self.dpi)?;
        crate::fs::write_atomic(path, &bytes)?;
        debug!("Rendered {} to {}", card.name, path.display());
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, Creature, Spell};
    use tempfile::tempdir;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            image_width: 75,
            image_height: 105,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#CCCCCC"), Some([0xCC, 0xCC, 0xCC, 0xFF]));
        assert_eq!(parse_hex_color("#0f0"), Some([0x00, 0xFF, 0x00, 0xFF]));
        assert_eq!(parse_hex_color("CCCCCC"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }

    #[test]
    fn test_generate_writes_png_of_configured_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards/creature-Wolf.png");
        let generator = PngCardGenerator::new(&small_config()).unwrap();
        let card: Card = Creature::new("Wolf", 1, "Howls", 2, 2, "Beast").into();

        generator.generate(&card.to_dto(), &path).unwrap();

        let decoder = png::Decoder::new(std::fs::File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (75, 105));
    }

    #[test]
    fn test_validate_rejects_negative_stats() {
        let generator = PngCardGenerator::new(&small_config()).unwrap();
        let mut dto = Card::from(Creature::new("Wolf", 1, "Howls", 2, 2, "")).to_dto();
        dto.attack = Some(-3);
        assert!(generator.validate(&dto).is_err());

        let mut dto = Card::from(Spell::new("Bolt", 1, "Zap")).to_dto();
        dto.cost = -2;
        assert!(generator.validate(&dto).is_err());
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let mut config = small_config();
        config.art_processing.placeholder_color = "grey".to_string();
        assert!(PngCardGenerator::new(&config).is_err());

        let mut config = small_config();
        config.format = "jpeg".to_string();
        assert!(PngCardGenerator::new(&config).is_err());

        let mut config = small_config();
        config.art_processing.max_image_size = 1024;
        assert!(PngCardGenerator::new(&config).is_err());
    }

    #[test]
    fn test_closed_generator_refuses_work() {
        let dir = tempdir().unwrap();
        let generator = PngCardGenerator::new(&small_config()).unwrap();
        generator.close().unwrap();
        let dto = Card::from(Spell::new("Bolt", 1, "Zap")).to_dto();
        let err = generator
            .generate(&dto, &dir.path().join("spell-Bolt.png"))
            .unwrap_err();
        assert!(matches!(err, CardgenError::Generator(_)));
    }
}
