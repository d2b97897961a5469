//! Paginated document assembly.
//!
//! [`DocumentAssembler`] turns the ordered slide images of one video into a
//! PDF with one page per slide. Each image is embedded as a baseline JPEG
//! and drawn into the area inside the page margins. Images that are missing
//! or unreadable are reported and left out; the rest keep their order.
//! Every video gets its document: with nothing to place, it is a single
//! blank page.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use slidegrab::{DocumentAssembler, PageOptions};
//!
//! let slides = vec![PathBuf::from("slides/3_1.jpg"), PathBuf::from("slides/3_2.jpg")];
//! let assembler = DocumentAssembler::new(PageOptions::default());
//! let summary = assembler.write(&slides, "slides/lecture3.pdf")?;
//! println!("{} pages", summary.pages);
//! # Ok::<(), slidegrab::SlideError>(())
//! ```

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use image::codecs::jpeg::JpegEncoder;
use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::{
    configuration::{ImageFit, PageOptions},
    error::SlideError,
};

const POINTS_PER_MM: f32 = 72.0 / 25.4;
const JPEG_QUALITY: u8 = 90;

/// Where a slide lands on its page, in PDF points from the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Drawn width.
    pub width: f32,
    /// Drawn height.
    pub height: f32,
}

/// A document built in memory, not yet written.
#[derive(Debug)]
pub struct AssembledDocument {
    pdf: Document,
    page_count: usize,
    /// Images that became pages, in page order.
    pub pages: Vec<PathBuf>,
    /// Images that were left out.
    pub skipped: Vec<PathBuf>,
}

impl AssembledDocument {
    /// Number of pages, including the blank page of an empty document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Serialise to `path`.
    pub fn save<P: AsRef<Path>>(mut self, path: P) -> Result<(), SlideError> {
        let path = path.as_ref();
        let write_error = |reason: String| SlideError::DocumentWrite {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|error| write_error(error.to_string()))?;
        }

        let file = File::create(path).map_err(|error| write_error(error.to_string()))?;
        let mut writer = BufWriter::new(file);
        self.pdf
            .save_to(&mut writer)
            .map_err(|error| write_error(error.to_string()))
    }
}

/// Summary of a written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Where the document was written.
    pub path: PathBuf,
    /// Number of pages written.
    pub pages: usize,
    /// Images that were left out.
    pub skipped: Vec<PathBuf>,
}

/// Builds one PDF per video from its captured slides.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAssembler {
    page: PageOptions,
}

impl DocumentAssembler {
    /// Use the given page layout.
    pub fn new(page: PageOptions) -> Self {
        Self { page }
    }

    /// Page size in points.
    pub fn page_points(&self) -> (f32, f32) {
        let (width, height) = self.page.page_mm();
        (width * POINTS_PER_MM, height * POINTS_PER_MM)
    }

    /// Where an image of the given pixel size is drawn.
    pub fn placement(&self, image_width: u32, image_height: u32) -> Placement {
        let (page_width, page_height) = self.page_points();
        let margin = self.page.margin_mm * POINTS_PER_MM;
        let area_width = (page_width - 2.0 * margin).max(1.0);
        let area_height = (page_height - 2.0 * margin).max(1.0);

        match self.page.fit {
            ImageFit::Stretch => Placement {
                x: margin,
                y: margin,
                width: area_width,
                height: area_height,
            },
            ImageFit::Contain => {
                let scale = (area_width / image_width.max(1) as f32)
                    .min(area_height / image_height.max(1) as f32);
                let width = image_width as f32 * scale;
                let height = image_height as f32 * scale;
                Placement {
                    x: margin + (area_width - width) / 2.0,
                    y: margin + (area_height - height) / 2.0,
                    width,
                    height,
                }
            }
        }
    }

    /// Build the document in memory, one page per readable image.
    pub fn build(&self, images: &[PathBuf]) -> Result<AssembledDocument, SlideError> {
        let (page_width, page_height) = self.page_points();
        let mut pdf = Document::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let mut kids: Vec<Object> = Vec::new();
        let mut pages = Vec::new();
        let mut skipped = Vec::new();

        for path in images {
            if !path.exists() {
                log::warn!("Slide image does not exist, skipping page: {}", path.display());
                skipped.push(path.clone());
                continue;
            }
            let jpeg = match encode_jpeg(path) {
                Ok(jpeg) => jpeg,
                Err(error) => {
                    log::warn!("Cannot read slide image {}, skipping page: {error}", path.display());
                    skipped.push(path.clone());
                    continue;
                }
            };

            let placement = self.placement(jpeg.width, jpeg.height);

            let image_id = pdf.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(jpeg.width),
                    "Height" => i64::from(jpeg.height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8_i64,
                    "Filter" => "DCTDecode",
                },
                jpeg.bytes,
            ));

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            real(placement.width),
                            Object::Integer(0),
                            Object::Integer(0),
                            real(placement.height),
                            real(placement.x),
                            real(placement.y),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Slide".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode()?));

            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    real(page_width),
                    real(page_height),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Slide" => image_id,
                    },
                },
            });
            kids.push(page_id.into());
            pages.push(path.clone());
        }

        if kids.is_empty() {
            let content_id = pdf.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    real(page_width),
                    real(page_height),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! {},
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len();
        let count = page_count as i64;
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);

        Ok(AssembledDocument {
            pdf,
            page_count,
            pages,
            skipped,
        })
    }

    /// Build and write the document for `images` to `output`.
    pub fn write<P: AsRef<Path>>(
        &self,
        images: &[PathBuf],
        output: P,
    ) -> Result<DocumentSummary, SlideError> {
        let output = output.as_ref();
        let document = self.build(images)?;
        if document.pages.is_empty() {
            log::warn!("No slides for {}, writing a blank page", output.display());
        }

        let pages = document.page_count();
        let skipped = document.skipped.clone();
        document.save(output)?;
        log::info!("Saved {pages}-page document {}", output.display());

        Ok(DocumentSummary {
            path: output.to_path_buf(),
            pages,
            skipped,
        })
    }
}

struct EncodedJpeg {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

/// Decode any supported image and re-encode it as 8-bit RGB JPEG.
fn encode_jpeg(path: &Path) -> Result<EncodedJpeg, SlideError> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(EncodedJpeg {
        bytes,
        width,
        height,
    })
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}
