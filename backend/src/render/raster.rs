use crate::render::RenderError;
use genpdf::elements::Image as PdfImage;
use image::imageops::FilterType;
use image::{load_from_memory, DynamicImage, GenericImageView, RgbImage};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use tempfile::NamedTempFile;

pub const IMAGE_DPI: f64 = 150.0;
const MM_PER_INCH: f64 = 25.4;

/// Shrinks `img` to fit a `max_w_mm` x `max_h_mm` box at [`IMAGE_DPI`],
/// keeping its aspect ratio. Images are never enlarged.
pub fn fit_within(img: DynamicImage, max_w_mm: f64, max_h_mm: f64) -> DynamicImage {
    let (orig_w, orig_h) = img.dimensions();
    let target_w = max_w_mm / MM_PER_INCH * IMAGE_DPI;
    let target_h = max_h_mm / MM_PER_INCH * IMAGE_DPI;

    let scale = (target_w / orig_w as f64)
        .min(target_h / orig_h as f64)
        .min(1.0);
    if scale >= 1.0 {
        return img;
    }
    let new_w = (orig_w as f64 * scale).max(1.0).round() as u32;
    let new_h = (orig_h as f64 * scale).max(1.0).round() as u32;
    img.resize(new_w, new_h, FilterType::Lanczos3)
}

/// Flattens any alpha channel over white; PDF images here are plain RGB.
pub fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    DynamicImage::ImageRgba8(background).to_rgb8()
}

/// Writes `rgb` as an 8-bit RGB PNG into a fresh temp file. The file lives as
/// long as the returned handle.
pub fn write_png_temp(rgb: &RgbImage) -> Result<NamedTempFile, RenderError> {
    let (w, h) = rgb.dimensions();
    let mut tmp = tempfile::Builder::new().suffix(".png").tempfile()?;
    {
        let file = tmp.as_file_mut();
        let mut encoder = PngEncoder::new(file, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgb.as_raw())?;
        writer.finish()?;
    }
    Ok(tmp)
}

/// Turns an uploaded image into a PDF element no larger than the given box.
/// The temp file backing the element must outlive the document render.
pub fn embed_upload(
    bytes: &[u8],
    max_w_mm: f64,
    max_h_mm: f64,
    temp_files: &mut Vec<NamedTempFile>,
) -> Result<PdfImage, RenderError> {
    let img = fit_within(load_from_memory(bytes)?, max_w_mm, max_h_mm);
    embed_rgb(&flatten_to_rgb(&img), IMAGE_DPI, temp_files)
}

/// Embeds an already rasterised image at `dpi`.
pub fn embed_rgb(
    rgb: &RgbImage,
    dpi: f64,
    temp_files: &mut Vec<NamedTempFile>,
) -> Result<PdfImage, RenderError> {
    let tmp = write_png_temp(rgb)?;
    let mut element = PdfImage::from_path(tmp.path())?;
    element.set_dpi(dpi);
    temp_files.push(tmp);
    Ok(element)
}

/// DPI at which `width_px` pixels span `width_mm` on the page.
pub fn dpi_for(width_px: u32, width_mm: f64) -> f64 {
    width_px as f64 / (width_mm / MM_PER_INCH)
}
