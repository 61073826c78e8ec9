//! Builders for small PDFs used across unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SamplePdf {
    pub pages: u32,
    pub with_image: bool,
    pub with_form: bool,
    pub with_annotation: bool,
    /// Extra uncompressed text lines per page, for files that must shrink
    pub filler_lines: usize,
    /// Encrypt with this owner password and an empty user password
    pub owner_password: Option<String>,
}

impl Default for SamplePdf {
    fn default() -> Self {
        Self {
            pages: 1,
            with_image: false,
            with_form: false,
            with_annotation: false,
            filler_lines: 0,
            owner_password: None,
        }
    }
}

impl SamplePdf {
    pub fn pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_image(mut self) -> Self {
        self.with_image = true;
        self
    }

    pub fn with_form(mut self) -> Self {
        self.with_form = true;
        self
    }

    pub fn with_annotation(mut self) -> Self {
        self.with_annotation = true;
        self
    }

    pub fn filler_lines(mut self, lines: usize) -> Self {
        self.filler_lines = lines;
        self
    }

    pub fn with_owner_password(mut self, password: &str) -> Self {
        self.owner_password = Some(password.to_string());
        self
    }

    pub fn build(&self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });

        let mut xobjects = Dictionary::new();
        if self.with_image {
            let image = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 2,
                    "Height" => 2,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![0, 255, 255, 0],
            );
            xobjects.set("Im1", doc.add_object(image));
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        });

        let mut kids = Vec::new();
        for number in 0..self.pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {}", number + 1))]),
            ];
            for line in 0..self.filler_lines {
                operations.push(Operation::new("Td", vec![0.into(), (-1).into()]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("filler line {} of a very repetitive page", line))],
                ));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            };
            if self.with_annotation && number == self.pages - 1 {
                let annot_id = doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Text",
                    "Rect" => vec![100.into(), 100.into(), 120.into(), 120.into()],
                    "Contents" => Object::string_literal("note"),
                });
                page.set("Annots", vec![Object::Reference(annot_id)]);
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.pages as i64,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if self.with_form {
            catalog.set("AcroForm", dictionary! { "Fields" => Vec::<Object>::new() });
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if let Some(owner_password) = &self.owner_password {
            let file_id = Object::string_literal("pdf-squeeze-sample");
            doc.trailer.set("ID", vec![file_id.clone(), file_id]);
            let state = EncryptionState::try_from(EncryptionVersion::V2 {
                document: &doc,
                owner_password: owner_password.as_str(),
                user_password: "",
                key_length: 128,
                permissions: Permissions::all(),
            })
            .unwrap();
            doc.encrypt(&state).unwrap();
        }
        doc
    }

    pub fn write_to(&self, path: &Path) {
        let mut doc = self.build();
        doc.save(path).unwrap();
    }
}

/// Write `size` bytes of non-PDF data
pub fn write_junk(path: &Path, size: usize) {
    std::fs::write(path, vec![b'x'; size]).unwrap();
}
