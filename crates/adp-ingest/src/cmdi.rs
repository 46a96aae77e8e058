//! Reading and rewriting CMDI metadata documents
//!
//! CMDI documents carry the persistent self-link of the object they
//! describe (`Header/MdSelfLink`), a display title
//! (`Header/MdCollectionDisplayName`), and a resource proxy list pointing
//! at the object's resources. The ingest reads the self-link to recover a
//! pre-assigned identifier and later rewrites both the self-link and the
//! proxy list once repository records and fresh identifiers exist.
//!
//! The rewrite is event-based so everything else in the document, the
//! component section in particular, passes through byte-for-byte.

use crate::error::{IngestError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

const SELF_LINK_TAG: &str = "MdSelfLink";
const TITLE_TAG: &str = "MdCollectionDisplayName";
const PROXY_LIST_TAG: &str = "ResourceProxyList";

/// One entry of the regenerated resource proxy list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceProxy {
    /// Proxy id, unique within the document
    pub id: String,
    /// `ResourceType` element text, e.g. `LandingPage` or `Metadata`
    pub resource_type: String,
    /// Optional mimetype attribute of the `ResourceType` element
    pub mimetype: Option<String>,
    /// `ResourceRef` target; may be empty when an identifier does not
    /// exist yet
    pub reference: String,
}

impl ResourceProxy {
    pub fn new(
        id: impl Into<String>,
        resource_type: impl Into<String>,
        mimetype: Option<&str>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            mimetype: mimetype.map(str::to_string),
            reference: reference.into(),
        }
    }
}

/// Read the self-link of a CMDI document, if present and non-empty
pub fn read_self_link(content: &str) -> Result<Option<String>> {
    read_header_field(content, SELF_LINK_TAG)
}

/// Read the collection display name of a CMDI document
pub fn read_title(content: &str) -> Result<Option<String>> {
    read_header_field(content, TITLE_TAG)
}

fn read_header_field(content: &str, tag: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut in_field = false;
    loop {
        match reader
            .read_event()
            .map_err(|e| IngestError::metadata(format!("malformed metadata document: {e}")))?
        {
            Event::Start(e) if e.local_name().as_ref() == tag.as_bytes() => in_field = true,
            Event::End(e) if e.local_name().as_ref() == tag.as_bytes() => in_field = false,
            Event::Text(text) if in_field => {
                let value = text
                    .unescape()
                    .map_err(|e| {
                        IngestError::metadata(format!("malformed metadata document: {e}"))
                    })?
                    .trim()
                    .to_string();
                return Ok(if value.is_empty() { None } else { Some(value) });
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Rewrite a CMDI document
///
/// Replaces the self-link text when `self_link` is given and regenerates
/// the resource proxy list from `proxies`. The rest of the document is
/// copied unchanged.
pub fn rewrite(
    content: &str,
    self_link: Option<&str>,
    proxies: &[ResourceProxy],
) -> Result<String> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::new());

    loop {
        let event = reader
            .read_event()
            .map_err(|e| IngestError::metadata(format!("malformed metadata document: {e}")))?;
        match event {
            Event::Start(e) if e.local_name().as_ref() == SELF_LINK_TAG.as_bytes() => {
                match self_link {
                    Some(link) => {
                        writer.write_event(Event::Start(e.borrow()))?;
                        writer.write_event(Event::Text(BytesText::new(link)))?;
                        skip_to_end(&mut reader, &e)?;
                        writer.write_event(Event::End(BytesEnd::new(SELF_LINK_TAG)))?;
                    }
                    None => writer.write_event(Event::Start(e))?,
                }
            }
            Event::Start(e) if e.local_name().as_ref() == PROXY_LIST_TAG.as_bytes() => {
                writer.write_event(Event::Start(e.borrow()))?;
                write_proxies(&mut writer, proxies)?;
                skip_to_end(&mut reader, &e)?;
                writer.write_event(Event::End(BytesEnd::new(PROXY_LIST_TAG)))?;
            }
            Event::Empty(e) if e.local_name().as_ref() == PROXY_LIST_TAG.as_bytes() => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                writer.write_event(Event::Start(e))?;
                write_proxies(&mut writer, proxies)?;
                writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| IngestError::metadata(format!("rewritten metadata is not UTF-8: {e}")))
}

fn skip_to_end(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<()> {
    let name = start.name().as_ref().to_owned();
    let mut depth = 1usize;
    loop {
        match reader
            .read_event()
            .map_err(|e| IngestError::metadata(format!("malformed metadata document: {e}")))?
        {
            Event::Start(e) if e.name().as_ref() == name.as_slice() => depth += 1,
            Event::End(e) if e.name().as_ref() == name.as_slice() => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(IngestError::metadata(
                    "unexpected end of metadata document".to_string(),
                ))
            }
            _ => {}
        }
    }
}

fn write_proxies(writer: &mut Writer<Vec<u8>>, proxies: &[ResourceProxy]) -> std::io::Result<()> {
    for proxy in proxies {
        let mut proxy_start = BytesStart::new("ResourceProxy");
        proxy_start.push_attribute(("id", proxy.id.as_str()));
        writer.write_event(Event::Start(proxy_start))?;

        let mut type_start = BytesStart::new("ResourceType");
        if let Some(mimetype) = &proxy.mimetype {
            type_start.push_attribute(("mimetype", mimetype.as_str()));
        }
        writer.write_event(Event::Start(type_start))?;
        writer.write_event(Event::Text(BytesText::new(&proxy.resource_type)))?;
        writer.write_event(Event::End(BytesEnd::new("ResourceType")))?;

        writer.write_event(Event::Start(BytesStart::new("ResourceRef")))?;
        writer.write_event(Event::Text(BytesText::new(&proxy.reference)))?;
        writer.write_event(Event::End(BytesEnd::new("ResourceRef")))?;

        writer.write_event(Event::End(BytesEnd::new("ResourceProxy")))?;
    }
    Ok(())
}
