//! In-memory PDF builders for unit tests

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

pub fn compressed_stream(content: &[u8]) -> Stream {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        encoder.finish().unwrap(),
    )
}

/// 8-bit grayscale image XObject of the given pixel size
pub fn image_stream(width: u32, height: u32) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0x80; (width * height) as usize],
    )
}

pub struct TestPage {
    streams: Vec<(String, bool)>,
    contents: Option<ObjectId>,
    images: Vec<(String, ObjectId)>,
    resources: Option<ObjectId>,
    rotate: Option<i64>,
}

impl TestPage {
    pub fn new(content: &str) -> Self {
        Self {
            streams: vec![(content.to_string(), false)],
            contents: None,
            images: Vec::new(),
            resources: None,
            rotate: None,
        }
    }

    /// Draw an existing content stream, e.g. one shared with another page
    pub fn drawing(stream: ObjectId) -> Self {
        Self {
            streams: Vec::new(),
            contents: Some(stream),
            images: Vec::new(),
            resources: None,
            rotate: None,
        }
    }

    /// Store the first content stream Flate-compressed
    pub fn compressed(mut self) -> Self {
        self.streams[0].1 = true;
        self
    }

    pub fn with_stream(mut self, content: &str) -> Self {
        self.streams.push((content.to_string(), false));
        self
    }

    pub fn with_image(mut self, name: &str, image: ObjectId) -> Self {
        self.images.push((name.to_string(), image));
        self
    }

    /// Point `/Resources` at a shared, indirect dictionary
    pub fn with_resources(mut self, resources: ObjectId) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_rotation(mut self, angle: i64) -> Self {
        self.rotate = Some(angle);
        self
    }
}

pub struct TestPdf {
    pub doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl TestPdf {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    pub fn add_image(&mut self, width: u32, height: u32) -> ObjectId {
        self.doc.add_object(image_stream(width, height))
    }

    pub fn add_stream(&mut self, content: &str) -> ObjectId {
        self.doc
            .add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()))
    }

    /// Form XObject drawing `content` with its own `/XObject` resources
    pub fn add_form(&mut self, content: &str, xobjects: &[(&str, ObjectId)]) -> ObjectId {
        let mut map = Dictionary::new();
        for (name, id) in xobjects {
            map.set(name.as_bytes().to_vec(), Object::Reference(*id));
        }
        self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                "Resources" => dictionary! { "XObject" => map },
            },
            content.as_bytes().to_vec(),
        ))
    }

    pub fn add_page(&mut self, page: TestPage) -> ObjectId {
        let mut contents: Vec<Object> = page
            .streams
            .iter()
            .map(|(content, compressed)| {
                let stream = if *compressed {
                    compressed_stream(content.as_bytes())
                } else {
                    Stream::new(Dictionary::new(), content.as_bytes().to_vec())
                };
                Object::Reference(self.doc.add_object(stream))
            })
            .collect();
        if let Some(stream) = page.contents {
            contents.push(Object::Reference(stream));
        }

        let mut dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => contents,
        };
        if let Some(resources) = page.resources {
            dict.set("Resources", Object::Reference(resources));
        } else if !page.images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, image) in &page.images {
                xobjects.set(name.as_bytes().to_vec(), Object::Reference(*image));
            }
            dict.set("Resources", dictionary! { "XObject" => xobjects });
        }
        if let Some(angle) = page.rotate {
            dict.set("Rotate", angle);
        }

        let page_id = self.doc.add_object(dict);
        self.page_ids.push(page_id);
        page_id
    }

    pub fn finish(mut self) -> (Document, Vec<ObjectId>) {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| (*id).into()).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        (self.doc, self.page_ids)
    }
}
