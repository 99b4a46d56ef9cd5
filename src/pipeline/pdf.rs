//! PDF assembly with lopdf: one page per embedded image.
//!
//! Object graph per page:
//!
//! ```text
//! Page ─┬─ Resources ── XObject /Im<n> ── Image stream ── (SMask stream)
//!       └─ Contents  ── "q w 0 0 h x y cm /Im<n> Do Q"
//! ```
//!
//! All pages share one `Pages` node; the catalog is written in [`PdfComposer::finish`].

use crate::error::RelayError;
use crate::pipeline::encode::EmbeddedImage;
use crate::pipeline::layout::PageLayout;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Incrementally builds an image-only PDF document.
pub struct PdfComposer {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfComposer {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page showing `image` placed according to `layout`.
    pub fn add_image_page(&mut self, image: &EmbeddedImage, layout: &PageLayout) {
        let name = format!("Im{}", self.kids.len() + 1);
        let image_id = self.add_image_xobject(image);

        let mut xobjects = lopdf::Dictionary::new();
        xobjects.set(name.as_str(), Object::Reference(image_id));
        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => Object::Dictionary(xobjects),
        });

        let content = Stream::new(dictionary! {}, content_stream(&name, layout));
        let content_id = self.doc.add_object(Object::Stream(content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(layout.page_width as f32),
                Object::Real(layout.page_height as f32),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        self.kids.push(page_id.into());
    }

    fn add_image_xobject(&mut self, image: &EmbeddedImage) -> ObjectId {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space,
            "BitsPerComponent" => image.bits_per_component as i64,
            "Filter" => image.filter,
        };

        if let Some(alpha) = &image.alpha {
            let mask = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            };
            let mask_id = self
                .doc
                .add_object(Object::Stream(Stream::new(mask, alpha.clone())));
            dict.set("SMask", Object::Reference(mask_id));
        }

        let stream = Stream::new(dict, image.data.clone());
        self.doc.add_object(Object::Stream(stream))
    }

    /// Write the page tree and catalog and serialise the document.
    ///
    /// Fails with [`RelayError::ConversionFailed`] when no page was added.
    pub fn finish(mut self) -> Result<Vec<u8>, RelayError> {
        if self.kids.is_empty() {
            return Err(RelayError::conversion_failed("document has no pages"));
        }

        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| RelayError::conversion_failed(format!("PDF serialisation failed: {}", e)))?;
        Ok(buf)
    }
}

/// Content stream drawing XObject `name` into the layout's content box.
pub fn content_stream(name: &str, layout: &PageLayout) -> Vec<u8> {
    format!(
        "q {:.4} 0 0 {:.4} {:.4} {:.4} cm /{} Do Q",
        layout.content_width, layout.content_height, layout.content_x, layout.content_y, name
    )
    .into_bytes()
}
