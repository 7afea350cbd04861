//! Card rasterization.

use std::path::{Path, PathBuf};

use crate::{
    collect::NewsItem,
    foundation::{
        context::RunStamp,
        error::{ReelError, ReelResult},
    },
    render::{
        surface::{Template, dims_u16, save_rgb_png},
        text::{CardFont, FontMeasure, FontSet, FontSizes, TextBrushRgba8, TextLayoutEngine, TextRole},
        wrap::{line_count, wrap_text},
    },
};

/// A rendered card on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageArtifact {
    pub path: PathBuf,
    pub stamp: String,
    pub category: String,
    pub title: String,
}

/// Renders one [`NewsItem`] into an image file.
pub trait CardBackend {
    fn render_card(
        &mut self,
        item: &NewsItem,
        out_dir: &Path,
        stamp: &RunStamp,
    ) -> ReelResult<ImageArtifact>;
}

/// Vertical layout of a card, in template pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardLayout {
    pub padding_x: f32,
    pub top_y: f32,
    pub category_gap: f32,
    pub title_gap: f32,
    pub title_spacing: f32,
    pub summary_spacing: f32,
    pub source_spacing: f32,
    pub bottom_margin: f32,
    pub category_color: TextBrushRgba8,
    pub title_color: TextBrushRgba8,
    pub summary_color: TextBrushRgba8,
    pub source_color: TextBrushRgba8,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            padding_x: 80.0,
            top_y: 300.0,
            category_gap: 40.0,
            title_gap: 60.0,
            title_spacing: 8.0,
            summary_spacing: 6.0,
            source_spacing: 2.0,
            bottom_margin: 120.0,
            category_color: TextBrushRgba8::rgba(120, 180, 120, 220),
            title_color: TextBrushRgba8::rgb(30, 30, 30),
            summary_color: TextBrushRgba8::rgb(60, 60, 60),
            source_color: TextBrushRgba8::rgba(100, 100, 100, 200),
        }
    }
}

impl CardLayout {
    /// Top of the source block: bottom margin, the wrapped block, and two spare lines above it.
    pub fn source_top(&self, canvas_height: f32, size_px: f32, lines: usize) -> f32 {
        canvas_height - self.bottom_margin - size_px * lines as f32 - size_px * 2.0
    }
}

/// One positioned multi-line block, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub spacing: f32,
}

/// Blocks for category, title, summary and source in draw order.
#[derive(Clone, Debug, PartialEq)]
pub struct CardPlan {
    pub category: TextBlock,
    pub title: TextBlock,
    pub summary: TextBlock,
    pub source: TextBlock,
}

/// Plan text positions for `item` on a canvas of the given size.
///
/// `wrap` wraps a block's text for its role at the given maximum width.
pub fn plan_card(
    item: &NewsItem,
    layout: &CardLayout,
    canvas: (f32, f32),
    sizes: FontSizes,
    mut wrap: impl FnMut(TextRole, &str, f32) -> String,
) -> CardPlan {
    let (width, height) = canvas;
    let max_width = width - 2.0 * layout.padding_x;
    let x = layout.padding_x;

    let mut y = layout.top_y;
    let category = TextBlock {
        text: format!("[{}]", item.category),
        x,
        y,
        spacing: 0.0,
    };
    y += sizes.category + layout.category_gap;

    let title_text = wrap(TextRole::Title, &item.title, max_width);
    let title_lines = line_count(&title_text);
    let title = TextBlock {
        text: title_text,
        x,
        y,
        spacing: layout.title_spacing,
    };
    y += sizes.title * title_lines as f32 + layout.title_gap;

    let summary = TextBlock {
        text: wrap(TextRole::Summary, &item.summary, max_width),
        x,
        y,
        spacing: layout.summary_spacing,
    };

    let source_text = wrap(TextRole::Source, &item.source_line, max_width);
    let source_y = layout.source_top(height, sizes.source, line_count(&source_text));
    let source = TextBlock {
        text: source_text,
        x,
        y: source_y,
        spacing: layout.source_spacing,
    };

    CardPlan {
        category,
        title,
        summary,
        source,
    }
}

/// CPU card renderer: template background plus four text blocks.
pub struct CardRenderer {
    engine: TextLayoutEngine,
    fonts: FontSet,
    template_path: PathBuf,
    layout: CardLayout,
}

impl CardRenderer {
    pub fn new(engine: TextLayoutEngine, fonts: FontSet, template_path: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            fonts,
            template_path: template_path.into(),
            layout: CardLayout::default(),
        }
    }

    /// Discover fonts under `assets_dir` (then system paths) and use that directory's template.
    pub fn discover(assets_dir: &Path, template_path: impl Into<PathBuf>) -> ReelResult<Self> {
        let mut engine = TextLayoutEngine::new();
        let fonts = FontSet::discover(&mut engine, assets_dir)?;
        Ok(Self::new(engine, fonts, template_path))
    }

    pub fn with_layout(mut self, layout: CardLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Render `item` to premultiplied RGBA8 pixels.
    pub fn rasterize(&mut self, item: &NewsItem) -> ReelResult<(Vec<u8>, u32, u32)> {
        let template = Template::open(&self.template_path)?;
        let (w, h) = dims_u16(template.width, template.height)?;

        let plan = {
            let fonts = &self.fonts;
            let engine = &mut self.engine;
            plan_card(
                item,
                &self.layout,
                (template.width as f32, template.height as f32),
                fonts.sizes(),
                |role, text, max_width| {
                    wrap_text(text, &mut FontMeasure::new(&mut *engine, fonts.get(role)), max_width)
                },
            )
        };

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(template.paint()?);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            template.width as f64,
            template.height as f64,
        ));

        let blocks = [
            (TextRole::Category, &plan.category, self.layout.category_color),
            (TextRole::Title, &plan.title, self.layout.title_color),
            (TextRole::Summary, &plan.summary, self.layout.summary_color),
            (TextRole::Source, &plan.source, self.layout.source_color),
        ];
        for (role, block, color) in blocks {
            let font = self.fonts.get(role).clone();
            self.draw_block(&mut ctx, &font, block, color);
        }

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        Ok((
            pixmap.data_as_u8_slice().to_vec(),
            template.width,
            template.height,
        ))
    }

    /// Render `item` and write it as an RGB PNG at `path`.
    pub fn render_to_path(&mut self, item: &NewsItem, path: &Path) -> ReelResult<()> {
        let (pixels, width, height) = self.rasterize(item)?;
        save_rgb_png(path, &pixels, width, height)
    }

    fn draw_block(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        font: &CardFont,
        block: &TextBlock,
        color: TextBrushRgba8,
    ) {
        let advance = font.size_px + block.spacing;
        for (i, line) in block.text.split('\n').enumerate() {
            if line.is_empty() {
                continue;
            }
            let layout = self
                .engine
                .layout_line(line, &font.face, font.size_px, color);
            let top = block.y + advance * i as f32;
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                block.x as f64,
                top as f64,
            )));
            for l in layout.lines() {
                for item in l.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    // The run's own font: the face layout resolved, not necessarily `font`.
                    ctx.glyph_run(run.run().font())
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }
    }
}

/// `news_<id:03>_<stamp>.png`
pub fn card_file_name(item: &NewsItem, stamp: &RunStamp) -> String {
    format!("news_{:03}_{}.png", item.id, stamp.label())
}

impl CardBackend for CardRenderer {
    #[tracing::instrument(skip_all, fields(id = item.id))]
    fn render_card(
        &mut self,
        item: &NewsItem,
        out_dir: &Path,
        stamp: &RunStamp,
    ) -> ReelResult<ImageArtifact> {
        let path = out_dir.join(card_file_name(item, stamp));
        self.render_to_path(item, &path)?;
        if !path.is_file() {
            return Err(ReelError::render(format!(
                "card was not written: '{}'",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), "card rendered");
        Ok(ImageArtifact {
            path,
            stamp: stamp.label().to_string(),
            category: item.category.clone(),
            title: item.title.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/card.rs"]
mod tests;
