use std::{path::Path, sync::Arc};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Decoded card background in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct Template {
    pub width: u32,
    pub height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl Template {
    pub fn decode(bytes: &[u8]) -> ReelResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode card template")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);

        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    pub fn open(path: &Path) -> ReelResult<Self> {
        if !path.is_file() {
            return Err(ReelError::render(format!(
                "card template not found: '{}'",
                path.display()
            )));
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("read card template '{}'", path.display()))?;
        Self::decode(&bytes)
    }

    /// Paint that fills a `width` x `height` rect with the template.
    pub fn paint(&self) -> ReelResult<vello_cpu::Image> {
        let pixmap = pixmap_from_premul_bytes(&self.rgba8_premul, self.width, self.height)?;
        Ok(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        })
    }
}

pub fn dims_u16(width: u32, height: u32) -> ReelResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::render("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::render("surface height exceeds u16"))?;
    Ok((w, h))
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> ReelResult<vello_cpu::Pixmap> {
    let (w, h) = dims_u16(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(ReelError::render("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Drop alpha from premultiplied RGBA8, recovering straight color channels.
pub fn premul_rgba8_to_rgb8(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u16;
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0]);
            continue;
        }
        for &c in &px[..3] {
            out.push(((c as u16 * 255 + a / 2) / a).min(255) as u8);
        }
    }
    out
}

/// Write premultiplied RGBA8 pixels as an opaque RGB PNG.
pub fn save_rgb_png(path: &Path, rgba8_premul: &[u8], width: u32, height: u32) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    let rgb = premul_rgba8_to_rgb8(rgba8_premul);
    image::save_buffer_with_format(
        path,
        &rgb,
        width,
        height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write card png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
