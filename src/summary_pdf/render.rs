// src/summary_pdf/render.rs

use super::canvas::{Font, Mark, PageLayout, encode_win_ansi};
use crate::error::Result;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use std::path::Path;

/// Build a PDF document from laid-out pages.
pub fn build_document(pages: &[PageLayout]) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    Ok(doc)
}

/// Render and write atomically to `destination`.
pub fn write_pdf(pages: &[PageLayout], destination: &Path) -> Result<()> {
    let mut doc = build_document(pages)?;

    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    doc.save_to(tmp.as_file_mut())?;
    tmp.persist(destination)?;
    Ok(())
}

fn page_operations(page: &PageLayout) -> Vec<Operation> {
    let mut ops = vec![Operation::new("w", vec![0.5_f32.into()])];

    for mark in &page.marks {
        match mark {
            Mark::Text(run) => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![run.font.resource_name().into(), run.size.into()],
                ));
                ops.push(Operation::new(
                    "Td",
                    vec![run.origin_x().into(), run.y.into()],
                ));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_win_ansi(&run.text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            Mark::Line { x1, y1, x2, y2 } => {
                ops.push(Operation::new("m", vec![(*x1).into(), (*y1).into()]));
                ops.push(Operation::new("l", vec![(*x2).into(), (*y2).into()]));
                ops.push(Operation::new("S", vec![]));
            }
        }
    }

    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_document_loads_back() {
        let mut page = PageLayout::a4();
        page.set_font(Font::Bold, 18.0);
        page.draw_string(56.7, 770.0, "CBAM (Ünite)");
        page.line(56.7, 760.0, 538.6, 760.0);

        let mut doc = build_document(&[page]).unwrap();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);
    }

    #[test]
    fn test_operations_follow_marks() {
        let mut page = PageLayout::a4();
        page.draw_string(10.0, 20.0, "a");
        page.line(0.0, 0.0, 1.0, 1.0);
        let ops: Vec<String> = page_operations(&page)
            .into_iter()
            .map(|o| o.operator)
            .collect();
        assert_eq!(ops, ["w", "BT", "Tf", "Td", "Tj", "ET", "m", "l", "S"]);
    }
}
