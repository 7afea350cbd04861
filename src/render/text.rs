//! Font loading, discovery and single-line text layout.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::error::{ReelError, ReelResult},
    render::wrap::TextMeasure,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl TextBrushRgba8 {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

/// Stateful helper for building Parley layouts against registered font families.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register font bytes and return the attributes that select exactly this face.
    pub fn register_font(&mut self, font_bytes: &[u8]) -> ReelResult<RegisteredFace> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let (family_id, info) = families
            .into_iter()
            .find_map(|(id, fonts)| fonts.into_iter().next().map(|info| (id, info)))
            .ok_or_else(|| ReelError::render("no font families registered from font bytes"))?;

        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::render("registered font family has no name"))?
            .to_string();
        Ok(RegisteredFace {
            family,
            weight: info.weight(),
            style: info.style(),
            width: info.width(),
        })
    }

    /// Shape `text` as unbounded lines (hard breaks only) with `face` at `size_px`.
    pub fn layout_line(
        &mut self,
        text: &str,
        face: &RegisteredFace,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        use parley::style::StyleProperty;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(StyleProperty::FontStack(parley::style::FontStack::Source(
            std::borrow::Cow::Owned(face.family.clone()),
        )));
        builder.push_default(StyleProperty::FontWeight(face.weight));
        builder.push_default(StyleProperty::FontStyle(face.style));
        builder.push_default(StyleProperty::FontWidth(face.width));
        builder.push_default(StyleProperty::FontSize(size_px));
        builder.push_default(StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Widest line advance of `text` in pixels.
    pub fn measure(&mut self, text: &str, face: &RegisteredFace, size_px: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let layout = self.layout_line(text, face, size_px, TextBrushRgba8::default());
        layout
            .lines()
            .map(|line| line.metrics().advance)
            .fold(0.0, f32::max)
    }
}

/// Family plus the weight, style and width of one registered face.
///
/// Bold and regular files of one typeface usually share a family name; the attributes keep
/// layout on the face that was loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisteredFace {
    pub family: String,
    pub weight: parley::style::FontWeight,
    pub style: parley::style::FontStyle,
    pub width: parley::style::FontWidth,
}

/// One loaded face at a fixed pixel size.
#[derive(Clone, Debug, PartialEq)]
pub struct CardFont {
    pub face: RegisteredFace,
    pub size_px: f32,
}

/// The four text blocks of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRole {
    Category,
    Title,
    Summary,
    Source,
}

/// Pixel sizes of the four card text roles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSizes {
    pub title: f32,
    pub body: f32,
    pub category: f32,
    pub source: f32,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 60.0,
            body: 38.0,
            category: 34.0,
            source: 30.0,
        }
    }
}

/// Bold and regular face paths forming one usable pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontPair {
    pub bold: PathBuf,
    pub regular: PathBuf,
}

impl FontPair {
    pub fn new(bold: impl Into<PathBuf>, regular: impl Into<PathBuf>) -> Self {
        Self {
            bold: bold.into(),
            regular: regular.into(),
        }
    }

    fn exists(&self) -> bool {
        self.bold.is_file() && self.regular.is_file()
    }
}

/// The fonts a card is drawn with: a bold title face and a regular face for everything else.
#[derive(Clone, Debug)]
pub struct FontSet {
    pub title: CardFont,
    pub body: CardFont,
    pub category: CardFont,
    pub source: CardFont,
}

impl FontSet {
    /// Load a set from an explicit bold/regular pair.
    pub fn load(
        engine: &mut TextLayoutEngine,
        pair: &FontPair,
        sizes: FontSizes,
    ) -> ReelResult<Self> {
        let bold = std::fs::read(&pair.bold)
            .with_context(|| format!("read font '{}'", pair.bold.display()))?;
        let regular = std::fs::read(&pair.regular)
            .with_context(|| format!("read font '{}'", pair.regular.display()))?;
        let bold = engine.register_font(&bold)?;
        let regular = engine.register_font(&regular)?;
        let at = |face: &RegisteredFace, size_px: f32| CardFont {
            face: face.clone(),
            size_px,
        };
        Ok(Self {
            title: at(&bold, sizes.title),
            body: at(&regular, sizes.body),
            category: at(&regular, sizes.category),
            source: at(&regular, sizes.source),
        })
    }

    pub fn get(&self, role: TextRole) -> &CardFont {
        match role {
            TextRole::Category => &self.category,
            TextRole::Title => &self.title,
            TextRole::Summary => &self.body,
            TextRole::Source => &self.source,
        }
    }

    pub fn sizes(&self) -> FontSizes {
        FontSizes {
            title: self.title.size_px,
            body: self.body.size_px,
            category: self.category.size_px,
            source: self.source.size_px,
        }
    }

    /// Find and load the first usable pair, preferring `<assets>/fonts` over system locations.
    pub fn discover(engine: &mut TextLayoutEngine, assets_dir: &Path) -> ReelResult<Self> {
        let mut candidates: Vec<FontPair> = bundled_pair(&assets_dir.join("fonts"))
            .into_iter()
            .collect();
        candidates.extend(system_font_candidates());

        for pair in candidates.iter().filter(|p| p.exists()) {
            match Self::load(engine, pair, FontSizes::default()) {
                Ok(set) => {
                    tracing::info!(
                        bold = %pair.bold.display(),
                        regular = %pair.regular.display(),
                        "fonts loaded"
                    );
                    return Ok(set);
                }
                Err(err) => tracing::warn!(
                    bold = %pair.bold.display(),
                    error = %err,
                    "font pair unusable"
                ),
            }
        }
        Err(ReelError::render(format!(
            "no usable bold/regular font pair found (checked {} candidates, bundled dir '{}')",
            candidates.len(),
            assets_dir.join("fonts").display()
        )))
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
}

/// Pair the fonts in `dir`: a file with "bold" (or a trailing `B`/`bd` weight marker) in its stem
/// is the bold face, anything else the regular one.
pub fn bundled_pair(dir: &Path) -> Option<FontPair> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_font_file(p))
        .collect();
    files.sort();

    let is_bold = |p: &PathBuf| {
        let stem = p
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        stem.to_ascii_lowercase().contains("bold") || stem.ends_with('B') || stem.ends_with("bd")
    };
    let bold = files.iter().find(|p| is_bold(p))?.clone();
    let regular = files.iter().find(|p| !is_bold(p)).cloned().unwrap_or_else(|| bold.clone());
    Some(FontPair { bold, regular })
}

/// Well-known Korean-capable system font pairs for the current OS, in preference order.
pub fn system_font_candidates() -> Vec<FontPair> {
    if cfg!(target_os = "windows") {
        vec![
            FontPair::new(
                r"C:\Windows\Fonts\NanumSquareRoundB.ttf",
                r"C:\Windows\Fonts\NanumSquareRoundR.ttf",
            ),
            FontPair::new(
                r"C:\Windows\Fonts\NotoSansKR-Bold.otf",
                r"C:\Windows\Fonts\NotoSansKR-Regular.otf",
            ),
            FontPair::new(r"C:\Windows\Fonts\malgunbd.ttf", r"C:\Windows\Fonts\malgun.ttf"),
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            FontPair::new(
                "/Library/Fonts/AppleSDGothicNeoB.ttc",
                "/Library/Fonts/AppleSDGothicNeo.ttc",
            ),
            FontPair::new(
                "/System/Library/Fonts/AppleSDGothicNeo.ttc",
                "/System/Library/Fonts/AppleSDGothicNeo.ttc",
            ),
            FontPair::new(
                "/System/Library/Fonts/AppleGothic.ttf",
                "/System/Library/Fonts/AppleGothic.ttf",
            ),
        ]
    } else {
        vec![
            FontPair::new(
                "/usr/share/fonts/truetype/nanum/NanumSquareRoundB.ttf",
                "/usr/share/fonts/truetype/nanum/NanumSquareRoundR.ttf",
            ),
            FontPair::new(
                "/usr/share/fonts/truetype/noto/NotoSansCJK-Bold.ttc",
                "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            ),
            FontPair::new(
                "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
                "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            ),
            FontPair::new(
                "/usr/share/fonts/truetype/nanum/NanumGothicBold.ttf",
                "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
            ),
        ]
    }
}

/// [`TextMeasure`] over one [`CardFont`].
pub struct FontMeasure<'a> {
    engine: &'a mut TextLayoutEngine,
    font: &'a CardFont,
}

impl<'a> FontMeasure<'a> {
    pub fn new(engine: &'a mut TextLayoutEngine, font: &'a CardFont) -> Self {
        Self { engine, font }
    }
}

impl TextMeasure for FontMeasure<'_> {
    fn text_width(&mut self, text: &str) -> f32 {
        self.engine
            .measure(text, &self.font.face, self.font.size_px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
