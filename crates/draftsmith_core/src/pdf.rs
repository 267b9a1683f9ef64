//! crates/draftsmith_core/src/pdf.rs
//!
//! Assembles the page split plan into a single multi-page PDF.
//!
//! Each slice's band is cropped out of the source raster, encoded as JPEG
//! and embedded as a DCTDecode image XObject drawn into the page's content
//! box. The object graph (catalog, page tree, per-page content streams,
//! xref table, trailer) is written by hand; the format needed here is small
//! enough that no intermediate document model is worth carrying.

use crate::paginate::{
    PageSplitPlan, CONTENT_WIDTH_MM, PAGE_HEIGHT_MM, PAGE_MARGIN_MM, PAGE_WIDTH_MM,
};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbaImage};

const MM_TO_PT: f32 = 72.0 / 25.4;
const JPEG_QUALITY: u8 = 85;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("failed to encode page {page_index} image: {reason}")]
    Encode { page_index: usize, reason: String },
    #[error("page plan does not match the raster: slice [{offset}, {offset}+{height}) exceeds source height {source_height}")]
    PlanMismatch {
        offset: u32,
        height: u32,
        source_height: u32,
    },
}

/// Writes numbered objects into a growing buffer and remembers their byte
/// offsets for the xref table.
struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl ObjectWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        // Binary marker comment so transports treat the file as binary.
        buf.extend_from_slice(&[b'%', 0xe2, 0xe3, 0xcf, 0xd3, b'\n']);
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Object ids are assigned sequentially, starting at 1.
    fn next_id(&self) -> u32 {
        self.offsets.len() as u32 + 1
    }

    fn begin_object(&mut self) -> u32 {
        let id = self.next_id();
        self.offsets.push(self.buf.len());
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        id
    }

    fn write(&mut self, text: &str) {
        self.buf.extend_from_slice(text.as_bytes());
    }

    fn end_object(&mut self) {
        self.buf.extend_from_slice(b"endobj\n");
    }

    fn stream_object(&mut self, dict_extra: &str, data: &[u8]) -> u32 {
        let id = self.begin_object();
        self.write(&format!("<< {}/Length {} >>\nstream\n", dict_extra, data.len()));
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\n");
        self.end_object();
        id
    }

    fn finish(mut self, root_id: u32) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;
        self.write(&format!("xref\n0 {}\n0000000000 65535 f \n", count));
        let entries: String = self
            .offsets
            .iter()
            .map(|off| format!("{:010} 00000 n \n", off))
            .collect();
        self.write(&entries);
        self.write(&format!(
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, root_id, xref_offset
        ));
        self.buf
    }
}

/// Assembles the final artifact. Pages are emitted strictly in slice order,
/// which is authoritative for PDF page order.
pub fn assemble_pdf(raster: &RgbaImage, plan: &PageSplitPlan) -> Result<Vec<u8>, PdfError> {
    let page_w_pt = PAGE_WIDTH_MM * MM_TO_PT;
    let page_h_pt = PAGE_HEIGHT_MM * MM_TO_PT;
    let margin_pt = PAGE_MARGIN_MM * MM_TO_PT;
    let content_w_pt = CONTENT_WIDTH_MM * MM_TO_PT;

    let mut writer = ObjectWriter::new();

    // Object 1: catalog, object 2: page tree. Each page then takes a page
    // object, a content stream, and an image XObject when it has extent.
    let catalog_id = writer.begin_object();
    writer.write("<< /Type /Catalog /Pages 2 0 R >>\n");
    writer.end_object();

    let first_page_id = 3u32;
    let ids_per_page: Vec<u32> = plan
        .slices
        .iter()
        .scan(first_page_id, |next, slice| {
            let id = *next;
            *next += if slice.source_height_px > 0 { 3 } else { 2 };
            Some(id)
        })
        .collect();

    let pages_id = writer.begin_object();
    debug_assert_eq!(pages_id, 2);
    let kids: Vec<String> = ids_per_page.iter().map(|id| format!("{} 0 R", id)).collect();
    writer.write(&format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>\n",
        kids.join(" "),
        plan.slices.len()
    ));
    writer.end_object();

    for slice in &plan.slices {
        let band = if slice.source_height_px > 0 {
            let end = slice.source_offset_px + slice.source_height_px;
            if end > raster.height() {
                return Err(PdfError::PlanMismatch {
                    offset: slice.source_offset_px,
                    height: slice.source_height_px,
                    source_height: raster.height(),
                });
            }
            Some(encode_band_jpeg(raster, slice.source_offset_px, slice.source_height_px)
                .map_err(|reason| PdfError::Encode {
                    page_index: slice.page_index,
                    reason,
                })?)
        } else {
            None
        };

        let page_id = writer.begin_object();
        let content_id = page_id + 1;
        match &band {
            Some(_) => {
                let image_id = page_id + 2;
                writer.write(&format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Resources << /XObject << /Im{} {} 0 R >> >> /Contents {} 0 R >>\n",
                    page_w_pt, page_h_pt, slice.page_index, image_id, content_id
                ));
            }
            None => {
                writer.write(&format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Resources << >> /Contents {} 0 R >>\n",
                    page_w_pt, page_h_pt, content_id
                ));
            }
        }
        writer.end_object();

        match band {
            Some(jpeg) => {
                let band_h_pt = slice.source_height_px as f32 * plan.mm_per_px * MM_TO_PT;
                // The band is drawn at the top of the content box; PDF
                // y-coordinates grow upward.
                let content = format!(
                    "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    content_w_pt,
                    band_h_pt,
                    margin_pt,
                    page_h_pt - margin_pt - band_h_pt,
                    slice.page_index
                );
                writer.stream_object("", content.as_bytes());
                writer.stream_object(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode ",
                        raster.width(),
                        slice.source_height_px
                    ),
                    &jpeg,
                );
            }
            None => {
                writer.stream_object("", b"");
            }
        }
    }

    Ok(writer.finish(catalog_id))
}

fn encode_band_jpeg(raster: &RgbaImage, offset: u32, height: u32) -> Result<Vec<u8>, String> {
    let band = imageops::crop_imm(raster, 0, offset, raster.width(), height).to_image();
    let rgb = image::DynamicImage::ImageRgba8(band).to_rgb8();
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder.encode_image(&rgb).map_err(|e| e.to_string())?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::plan_pages;
    use image::Rgba;

    fn gradient_raster(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |_, y| {
            Rgba([(y % 256) as u8, 64, 128, 255])
        })
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn assembles_one_page_per_slice_in_order() {
        let raster = gradient_raster(190, 600);
        let plan = plan_pages(raster.width(), raster.height()).unwrap();
        assert_eq!(plan.page_count(), 3); // capacity 277px -> ceil(600/277)

        let pdf = assemble_pdf(&raster, &plan).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert_eq!(count(&pdf, b"/Type /Page /Parent"), 3);
        assert_eq!(count(&pdf, b"/Filter /DCTDecode"), 3);
        assert!(count(&pdf, b"/Count 3") == 1);
    }

    #[test]
    fn empty_document_exports_a_single_blank_page() {
        let raster = gradient_raster(190, 1);
        let plan = plan_pages(190, 0).unwrap();
        assert_eq!(plan.page_count(), 1);

        let pdf = assemble_pdf(&raster, &plan).unwrap();
        assert_eq!(count(&pdf, b"/Type /Page /Parent"), 1);
        assert_eq!(count(&pdf, b"/Filter /DCTDecode"), 0);
    }

    #[test]
    fn band_concatenation_reconstructs_the_source() {
        let raster = gradient_raster(50, 1234);
        let plan = plan_pages(raster.width(), raster.height()).unwrap();

        let mut rebuilt = RgbaImage::new(raster.width(), raster.height());
        for slice in &plan.slices {
            let band = imageops::crop_imm(
                &raster,
                0,
                slice.source_offset_px,
                raster.width(),
                slice.source_height_px,
            )
            .to_image();
            imageops::replace(&mut rebuilt, &band, 0, slice.source_offset_px as i64);
        }
        // No pixel row duplicated or skipped.
        assert_eq!(rebuilt.as_raw(), raster.as_raw());
    }

    #[test]
    fn mismatched_plan_is_rejected() {
        let raster = gradient_raster(190, 100);
        let plan = plan_pages(190, 600).unwrap();
        let err = assemble_pdf(&raster, &plan).unwrap_err();
        assert!(matches!(err, PdfError::PlanMismatch { .. }));
    }

    #[test]
    fn xref_table_lists_every_object() {
        let raster = gradient_raster(100, 50);
        let plan = plan_pages(100, 50).unwrap();
        let pdf = assemble_pdf(&raster, &plan).unwrap();
        // catalog + pages + page + content + image = 5 objects, 6 xref rows.
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("xref\n0 6\n"));
        assert!(text.contains("/Size 6 /Root 1 0 R"));
    }
}
