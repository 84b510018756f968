//! Page-level access to the lopdf object graph
//!
//! The narrow set of document primitives the editor is built on: reading and
//! writing content streams, enumerating image XObjects, detaching shared
//! resources and reading/writing the page rotation.

use crate::error::PdfCleanError;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet};

/// Form XObjects visited per page before descent stops
const MAX_FORMS: usize = 64;

/// An image XObject referenced from a page's resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

fn operation_error(page_id: ObjectId, e: lopdf::Error) -> PdfCleanError {
    PdfCleanError::Operation(format!("Page object {:?}: {}", page_id, e))
}

/// Decoded bytes of one content stream
///
/// Returns `None` when the object is not a stream or uses a filter lopdf
/// cannot decode; such streams must be left untouched.
pub fn read_stream(doc: &Document, stream_id: ObjectId) -> Option<Vec<u8>> {
    doc.get_object(stream_id)
        .and_then(Object::as_stream)
        .ok()
        .and_then(stream_bytes)
}

fn stream_bytes(stream: &Stream) -> Option<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        stream.decompressed_content().ok()
    } else {
        Some(stream.content.clone())
    }
}

/// Replace a content stream's bytes, stored without filters
pub fn write_stream(
    doc: &mut Document,
    stream_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), PdfCleanError> {
    let stream = doc
        .get_object_mut(stream_id)
        .and_then(Object::as_stream_mut)
        .map_err(|e| PdfCleanError::Operation(format!("Stream {:?}: {}", stream_id, e)))?;
    stream.set_plain_content(content);
    Ok(())
}

/// All decodable content of a page, streams joined in drawing order
pub fn page_content(doc: &Document, page_id: ObjectId) -> Vec<u8> {
    let mut content = Vec::new();
    for stream_id in doc.get_page_contents(page_id) {
        match read_stream(doc, stream_id) {
            Some(bytes) => {
                content.extend_from_slice(&bytes);
                content.push(b'\n');
            }
            None => tracing::warn!("Skipping undecodable content stream {:?}", stream_id),
        }
    }
    content
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        _ => Some(obj),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).and_then(|o| o.as_dict().ok())
}

/// Look up a page attribute, inheriting from ancestors in the page tree
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_object(page_id).and_then(Object::as_dict).ok()?;
    // Bounded walk guards against cyclic Parent links
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_object(parent_id).and_then(Object::as_dict).ok()?;
    }
    None
}

/// The page's resource dictionary, own or inherited
pub fn resources<'a>(doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
    inherited(doc, page_id, b"Resources").and_then(|obj| resolve_dict(doc, obj))
}

fn integer(doc: &Document, obj: &Object) -> Option<i64> {
    resolve(doc, obj).and_then(|o| o.as_i64().ok())
}

fn has_subtype(stream: &Stream, kind: &[u8]) -> bool {
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == kind)
}

fn xobject_map<'a>(doc: &'a Document, resources: &'a Dictionary) -> Option<&'a Dictionary> {
    resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
}

fn form_resources<'a>(doc: &'a Document, form: &'a Stream) -> Option<&'a Dictionary> {
    form.dict
        .get(b"Resources")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
}

/// Distinct images the page draws, in resource-dictionary order
///
/// Form XObjects are descended into depth first, so images a form binds in
/// its own resources are listed where the form appears. Each form is visited
/// once and at most [`MAX_FORMS`] forms are visited per page.
pub fn page_images(doc: &Document, page_id: ObjectId) -> Vec<PageImage> {
    let mut images = Vec::new();
    if let Some(resources) = resources(doc, page_id) {
        let mut forms = Vec::new();
        collect_images(doc, resources, &mut forms, &mut images);
    }
    images
}

fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    forms: &mut Vec<ObjectId>,
    images: &mut Vec<PageImage>,
) {
    let Some(xobjects) = xobject_map(doc, resources) else {
        return;
    };

    for (name, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        let Ok(stream) = doc.get_object(*id).and_then(Object::as_stream) else {
            continue;
        };

        if has_subtype(stream, b"Form") {
            if forms.contains(id) || forms.len() >= MAX_FORMS {
                continue;
            }
            forms.push(*id);
            if let Some(nested) = form_resources(doc, stream) {
                collect_images(doc, nested, forms, images);
            }
            continue;
        }
        if !has_subtype(stream, b"Image") || images.iter().any(|image| image.id == *id) {
            continue;
        }

        let width = stream.dict.get(b"Width").ok().and_then(|w| integer(doc, w));
        let height = stream.dict.get(b"Height").ok().and_then(|h| integer(doc, h));
        match (width, height) {
            (Some(width), Some(height)) if width >= 0 && height >= 0 => images.push(PageImage {
                id: *id,
                width: width as u32,
                height: height as u32,
            }),
            _ => tracing::warn!(
                "Image /{} ({:?}) has no usable dimensions",
                String::from_utf8_lossy(name),
                id
            ),
        }
    }
}

/// Give the page its own inline copy of its resources and `/XObject` map
///
/// After this, edits to the page's image table cannot leak into other pages
/// that shared or inherited the same dictionaries.
pub fn detach_resources(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfCleanError> {
    let mut owned = resources(doc, page_id)
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let xobjects = owned
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .cloned();
    if let Some(xobjects) = xobjects {
        owned.set("XObject", Object::Dictionary(xobjects));
    }

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| operation_error(page_id, e))?;
    page.set("Resources", Object::Dictionary(owned));
    Ok(())
}

/// Stop one page from drawing `image_id`
///
/// Drops all `/XObject` names bound to the image and every `Do` invocation
/// of those names in the page's content streams. Forms that draw the image
/// are replaced, for this page only, by edited copies. Returns whether the
/// page reached the image at all.
pub fn remove_image(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
) -> Result<bool, PdfCleanError> {
    detach_resources(doc, page_id)?;

    let Some(mut xobjects) = resources(doc, page_id)
        .and_then(|res| xobject_map(doc, res))
        .cloned()
    else {
        return Ok(false);
    };
    let mut copies = BTreeMap::new();
    let Some(dropped) = unlink_image(doc, &mut xobjects, image_id, &mut copies)? else {
        return Ok(false);
    };

    let page_resources = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .and_then(|page| page.get_mut(b"Resources"))
        .and_then(Object::as_dict_mut)
        .map_err(|e| operation_error(page_id, e))?;
    page_resources.set("XObject", Object::Dictionary(xobjects));

    strip_page_invocations(doc, page_id, &dropped)?;
    Ok(true)
}

/// Drop `image_id` from an XObject map, relinking forms that draw it to
/// edited copies
///
/// Returns `None` when nothing in the map reaches the image, otherwise the
/// names that were bound to it directly.
fn unlink_image(
    doc: &mut Document,
    xobjects: &mut Dictionary,
    image_id: ObjectId,
    copies: &mut BTreeMap<ObjectId, Option<ObjectId>>,
) -> Result<Option<Vec<Vec<u8>>>, PdfCleanError> {
    let bindings: Vec<(Vec<u8>, ObjectId)> = xobjects
        .iter()
        .filter_map(|(name, value)| value.as_reference().ok().map(|id| (name.clone(), id)))
        .collect();

    let mut changed = false;
    let mut dropped = Vec::new();
    for (name, id) in bindings {
        if id == image_id {
            xobjects.remove(&name);
            dropped.push(name);
            changed = true;
        } else if let Some(copy) = form_without_image(doc, id, image_id, copies)? {
            xobjects.set(name, Object::Reference(copy));
            changed = true;
        }
    }
    Ok(changed.then_some(dropped))
}

/// A new copy of form `form_id` that no longer draws `image_id`
///
/// `None` when the object is not a form or never reaches the image. The
/// original form is left untouched for every other user.
fn form_without_image(
    doc: &mut Document,
    form_id: ObjectId,
    image_id: ObjectId,
    copies: &mut BTreeMap<ObjectId, Option<ObjectId>>,
) -> Result<Option<ObjectId>, PdfCleanError> {
    if let Some(copy) = copies.get(&form_id) {
        return Ok(*copy);
    }
    let mut form = match doc.get_object(form_id).and_then(Object::as_stream) {
        Ok(stream) if has_subtype(stream, b"Form") => stream.clone(),
        _ => return Ok(None),
    };
    if copies.len() >= MAX_FORMS {
        return Ok(None);
    }
    // Marked before descending so a form that draws itself stops here
    copies.insert(form_id, None);

    let Some(mut resources) = form_resources(doc, &form).cloned() else {
        return Ok(None);
    };
    let Some(mut xobjects) = xobject_map(doc, &resources).cloned() else {
        return Ok(None);
    };
    let Some(dropped) = unlink_image(doc, &mut xobjects, image_id, copies)? else {
        return Ok(None);
    };

    let copy = doc.new_object_id();
    // A form that draws itself draws its copy from now on
    let cycles: Vec<Vec<u8>> = xobjects
        .iter()
        .filter(|(_, value)| matches!(value, Object::Reference(id) if *id == form_id))
        .map(|(name, _)| name.clone())
        .collect();
    for name in cycles {
        xobjects.set(name, Object::Reference(copy));
    }

    resources.set("XObject", Object::Dictionary(xobjects));
    form.dict.set("Resources", Object::Dictionary(resources));
    if let Some(content) = without_invocations(&form, &dropped, form_id)? {
        form.set_plain_content(content);
    }

    doc.objects.insert(copy, Object::Stream(form));
    tracing::debug!("Form {:?} copied to {:?} without image {:?}", form_id, copy, image_id);
    copies.insert(form_id, Some(copy));
    Ok(Some(copy))
}

/// Content of `stream` minus every `Do` of `names`
///
/// `None` when nothing was removed or the stream cannot be decoded; such
/// streams keep their operators.
fn without_invocations(
    stream: &Stream,
    names: &[Vec<u8>],
    stream_id: ObjectId,
) -> Result<Option<Vec<u8>>, PdfCleanError> {
    if names.is_empty() {
        return Ok(None);
    }
    let Some(bytes) = stream_bytes(stream) else {
        tracing::warn!("Leaving undecodable stream {:?} as is", stream_id);
        return Ok(None);
    };
    let mut content = match Content::decode(&bytes) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Leaving undecodable stream {:?} as is: {}", stream_id, e);
            return Ok(None);
        }
    };

    let before = content.operations.len();
    content.operations.retain(|op| {
        !(op.operator == "Do"
            && matches!(op.operands.first(), Some(Object::Name(n)) if names.contains(n)))
    });
    if content.operations.len() == before {
        return Ok(None);
    }
    content
        .encode()
        .map(Some)
        .map_err(|e| PdfCleanError::Operation(format!("Stream {:?}: {}", stream_id, e)))
}

/// Strip the `Do` operators of `names` from one page's content streams
///
/// A stream that another page also draws is not edited; the page is
/// relinked to an edited copy instead.
fn strip_page_invocations(
    doc: &mut Document,
    page_id: ObjectId,
    names: &[Vec<u8>],
) -> Result<(), PdfCleanError> {
    if names.is_empty() {
        return Ok(());
    }
    let shared: BTreeSet<ObjectId> = doc
        .get_pages()
        .into_values()
        .filter(|id| *id != page_id)
        .flat_map(|id| doc.get_page_contents(id))
        .collect();

    let mut contents = Vec::new();
    let mut relinked = false;
    for stream_id in doc.get_page_contents(page_id) {
        let edited = doc
            .get_object(stream_id)
            .and_then(Object::as_stream)
            .ok()
            .map(|stream| without_invocations(stream, names, stream_id))
            .transpose()?
            .flatten();

        let mut target = stream_id;
        match edited {
            Some(content) if shared.contains(&stream_id) => {
                target = doc.add_object(Stream::new(Dictionary::new(), content));
                relinked = true;
            }
            Some(content) => write_stream(doc, stream_id, content)?,
            None => {}
        }
        contents.push(Object::Reference(target));
    }

    if relinked {
        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| operation_error(page_id, e))?;
        page.set("Contents", Object::Array(contents));
    }
    Ok(())
}

/// Page rotation in degrees, inherited from the page tree, normalized to 0..360
pub fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited(doc, page_id, b"Rotate")
        .and_then(|obj| integer(doc, obj))
        .map(|angle| angle.rem_euclid(360))
        .unwrap_or(0)
}

pub fn set_rotation(doc: &mut Document, page_id: ObjectId, angle: i64) -> Result<(), PdfCleanError> {
    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| operation_error(page_id, e))?;
    page.set("Rotate", Object::Integer(angle));
    Ok(())
}
