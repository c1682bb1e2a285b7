use super::escape;
use super::{AttachmentLookup, Located};
use crate::consts::{
    ATTACHMENT, CONTENT_TITLE_ATTR, FILENAME_ATTR, IMAGE, LINK, MACRO_NAME_ATTR, MULTIMEDIA, MULTIMEDIA_MACRO, PAGE,
    PARAMETER, RAW_TEXT_ELEMENTS, STRUCTURED_MACRO, URL, URL_VALUE_ATTR, VIEW_FILE_MACRO, VOID_ELEMENTS,
};
use crate::href::HrefCache;
use crate::media::Media;
use exhume_storage::{quote_segment, sanitize};
use scraper::{ElementRef, Node};
use std::fmt::Write;
use std::path::Path;
use tracing::debug;

const CONTEXT_FILE_MACRO: &str = "view-file";
const CONTEXT_MULTIMEDIA: &str = "multimedia";
const CONTEXT_IMAGE: &str = "image";
const CONTEXT_LINK: &str = "link";

/// The first descendant element called `name`.
fn find<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element.descendants().skip(1).filter_map(ElementRef::wrap).find(|e| e.value().name() == name)
}

/// A non-empty, trimmed attribute of the first descendant called `name`.
fn find_attr<'a>(element: ElementRef<'a>, name: &str, attr: &str) -> Option<&'a str> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == name)
        .find_map(|e| e.value().attr(attr).map(str::trim).filter(|v| !v.is_empty()))
}

/// The `ac:parameter` with the given `ac:name`.
fn parameter<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == PARAMETER && e.value().attr(MACRO_NAME_ATTR) == Some(name))
}

fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// ` width="…" height="…"`, for whichever dimensions are plain integers.
fn size_attrs(element: ElementRef<'_>) -> String {
    let mut attrs = String::new();
    for dimension in ["width", "height"] {
        let value = parameter(element, dimension).map(trimmed_text).unwrap_or_default();
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            let _ = write!(attrs, r#" {dimension}="{value}""#);
        }
    }
    attrs
}

fn label_of(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

pub(super) struct Writer<'p, L: AttachmentLookup + ?Sized> {
    lookup: &'p L,
    hrefs: &'p mut HrefCache,
    page_dir: &'p Path,
    out: String,
}

impl<'p, L: AttachmentLookup + ?Sized> Writer<'p, L> {
    pub(super) fn new(lookup: &'p L, hrefs: &'p mut HrefCache, page_dir: &'p Path, capacity: usize) -> Self {
        Self { lookup, hrefs, page_dir, out: String::with_capacity(capacity) }
    }

    pub(super) fn finish(self) -> String {
        self.out
    }

    pub(super) fn children(&mut self, parent: ElementRef<'_>) {
        let raw = RAW_TEXT_ELEMENTS.contains(&parent.value().name());
        for child in parent.children() {
            match child.value() {
                Node::Text(text) if raw => self.out.push_str(text),
                Node::Text(text) => self.out.push_str(&escape::text(text)),
                Node::Comment(comment) => {
                    let _ = write!(self.out, "<!--{}-->", &**comment);
                },
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.element(element);
                    }
                },
                _ => {},
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        match name {
            STRUCTURED_MACRO => self.structured_macro(element),
            MULTIMEDIA => self.multimedia(element),
            IMAGE => self.image(element),
            LINK => self.link(element),
            _ if name.contains(':') => self.children(element),
            _ => self.plain(element),
        }
    }

    fn plain(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        self.out.push('<');
        self.out.push_str(name);
        for (attr, value) in element.value().attrs().filter(|(attr, _)| !attr.contains(':')) {
            let _ = write!(self.out, r#" {attr}="{}""#, escape::attr(value));
        }
        self.out.push('>');
        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        self.children(element);
        let _ = write!(self.out, "</{name}>");
    }

    fn structured_macro(&mut self, element: ElementRef<'_>) {
        match element.value().attr(MACRO_NAME_ATTR) {
            Some(VIEW_FILE_MACRO) => {
                let filename = parameter(element, "name").and_then(|p| find_attr(p, ATTACHMENT, FILENAME_ATTR));
                match filename {
                    Some(filename) => self.file_macro(element, filename),
                    None => self.children(element),
                }
            },
            Some(MULTIMEDIA_MACRO) => self.multimedia(element),
            _ => self.children(element),
        }
    }

    fn file_macro(&mut self, element: ElementRef<'_>, filename: &str) {
        let located = self.lookup.locate(filename, CONTEXT_FILE_MACRO);
        let href = self.href(&located);
        match Media::classify(filename) {
            media @ (Media::Video | Media::Audio) => self.media(media, &href, filename, &size_attrs(element)),
            Media::Image => self.figure(&href, label_of(filename)),
            Media::File => {
                let folder = self.folder_href(&located);
                self.file_link(&href, label_of(filename), &folder);
            },
        }
    }

    fn multimedia(&mut self, element: ElementRef<'_>) {
        if let Some(filename) = find_attr(element, ATTACHMENT, FILENAME_ATTR) {
            let located = self.lookup.locate(filename, CONTEXT_MULTIMEDIA);
            let href = self.href(&located);
            match Media::classify(filename) {
                media @ (Media::Video | Media::Audio) => self.media(media, &href, filename, &size_attrs(element)),
                Media::Image => self.figure(&href, label_of(filename)),
                Media::File => {
                    let folder = self.folder_href(&located);
                    self.file_link(&href, label_of(filename), &folder);
                },
            }
            return;
        }
        match find_attr(element, URL, URL_VALUE_ATTR) {
            Some(url) if Media::is_streamable(url) => {
                let _ = write!(
                    self.out,
                    r#"<figure class="confluence-video"><video controls preload="metadata" src="{}"></video></figure>"#,
                    escape::attr(url)
                );
            },
            _ => self.children(element),
        }
    }

    fn image(&mut self, element: ElementRef<'_>) {
        if let Some(filename) = find_attr(element, ATTACHMENT, FILENAME_ATTR) {
            let located = self.lookup.locate(filename, CONTEXT_IMAGE);
            let href = self.href(&located);
            self.figure(&href, filename);
        } else if let Some(url) = find_attr(element, URL, URL_VALUE_ATTR) {
            self.figure(url, "");
        } else {
            self.out.push_str("<p>[image]</p>");
        }
    }

    fn link(&mut self, element: ElementRef<'_>) {
        let body = trimmed_text(element);
        if let Some(filename) = find_attr(element, ATTACHMENT, FILENAME_ATTR) {
            let located = self.lookup.locate(filename, CONTEXT_LINK);
            let href = self.href(&located);
            let folder = self.folder_href(&located);
            let label = if body.is_empty() { label_of(filename) } else { body.as_str() };
            self.file_link(&href, label, &folder);
        } else if let Some(title) = find(element, PAGE).and_then(|p| p.value().attr(CONTENT_TITLE_ATTR)).map(str::trim) {
            if title.is_empty() {
                return self.children(element);
            }
            let label = if body.is_empty() { title } else { body.as_str() };
            let _ = write!(
                self.out,
                r#"<p><a href="{}.html">{}</a></p>"#,
                escape::attr(&quote_segment(&sanitize(title))),
                escape::text(label)
            );
        } else {
            self.children(element);
        }
    }

    fn href(&mut self, located: &Located) -> String {
        self.hrefs.href(self.page_dir, &located.path)
    }

    /// The folder holding a found attachment, or the attachment root when the
    /// lookup only guessed.
    fn folder_href(&mut self, located: &Located) -> String {
        let folder = match located.found {
            true => located.path.parent().unwrap_or(self.lookup.root()),
            false => self.lookup.root(),
        };
        self.hrefs.dir_href(self.page_dir, folder)
    }

    fn media(&mut self, media: Media, href: &str, filename: &str, size: &str) {
        let (wrapper, tag, class) = match media {
            Media::Audio => ("p", "audio", "confluence-audio"),
            _ => ("figure", "video", "confluence-video"),
        };
        let size = if media == Media::Video { size } else { "" };
        let source_type = media.source_type(filename).map(|t| format!(r#" type="{t}""#)).unwrap_or_default();
        let href = escape::attr(href);
        debug!(%href, kind = tag, "embedded media");
        let _ = write!(
            self.out,
            r#"<{wrapper} class="{class}"><{tag} controls preload="metadata"{size}><source src="{href}"{source_type}><a href="{href}" target="_blank" rel="noopener">{}</a></{tag}></{wrapper}>"#,
            escape::text(label_of(filename)),
        );
    }

    fn figure(&mut self, href: &str, alt: &str) {
        let href = escape::attr(href);
        let _ = write!(
            self.out,
            r#"<figure class="confluence-image"><a href="{href}" class="zoom" aria-label="Enlarge image"><img src="{href}" class="thumb" alt="{}"></a></figure>"#,
            escape::attr(alt)
        );
    }

    fn file_link(&mut self, href: &str, label: &str, folder: &str) {
        let _ = write!(
            self.out,
            r#"<p><a href="{}" target="_blank" rel="noopener">{}</a> <a class="open-folder" href="{}" target="_blank" title="Open folder" aria-label="Open folder">📁</a></p>"#,
            escape::attr(href),
            escape::text(label),
            escape::attr(folder)
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::markup::tests::{FakeLookup, transform};

    #[test]
    fn test_view_file_image() {
        let lookup = FakeLookup::new(&["B/diagram.png"]);
        let out = transform(
            &lookup,
            r#"<ac:structured-macro ac:name="view-file"><ac:parameter ac:name="name"><ri:attachment ri:filename="diagram.png"/></ac:parameter></ac:structured-macro>"#,
        );
        assert_eq!(
            out,
            r#"<figure class="confluence-image"><a href="../../attachments/B/diagram.png" class="zoom" aria-label="Enlarge image"><img src="../../attachments/B/diagram.png" class="thumb" alt="diagram.png"></a></figure>"#
        );
    }

    #[test]
    fn test_view_file_video_with_numeric_size() {
        let lookup = FakeLookup::new(&["A/intro.mp4"]);
        let out = transform(
            &lookup,
            r#"<ac:structured-macro ac:name="view-file"><ac:parameter ac:name="name"><ri:attachment ri:filename="intro.mp4"/></ac:parameter><ac:parameter ac:name="width">640</ac:parameter><ac:parameter ac:name="height">auto</ac:parameter></ac:structured-macro>"#,
        );
        assert!(out.starts_with(r#"<figure class="confluence-video"><video controls preload="metadata" width="640">"#), "{out}");
        assert!(out.contains(r#"<source src="../../attachments/A/intro.mp4" type="video/mp4">"#), "{out}");
        assert!(!out.contains("height"));
    }

    #[test]
    fn test_view_file_audio() {
        let lookup = FakeLookup::new(&["A/song.mp3"]);
        let out = transform(
            &lookup,
            r#"<ac:structured-macro ac:name="view-file"><ac:parameter ac:name="name"><ri:attachment ri:filename="song.mp3"/></ac:parameter></ac:structured-macro>"#,
        );
        assert!(out.starts_with(r#"<p class="confluence-audio"><audio controls preload="metadata">"#), "{out}");
        assert!(out.contains(r#"type="audio/mp3""#));
    }

    #[test]
    fn test_view_file_generic_has_folder_link() {
        let lookup = FakeLookup::new(&["Specs/report final.pdf"]);
        let out = transform(
            &lookup,
            r#"<ac:structured-macro ac:name="view-file"><ac:parameter ac:name="name"><ri:attachment ri:filename="report final.pdf"/></ac:parameter></ac:structured-macro>"#,
        );
        assert!(out.contains(r#"<a href="../../attachments/Specs/report%20final.pdf" target="_blank" rel="noopener">report final.pdf</a>"#), "{out}");
        assert!(out.contains(r#"class="open-folder" href="../../attachments/Specs/""#), "{out}");
    }

    #[test]
    fn test_missing_attachment_still_renders_and_is_reported() {
        let lookup = FakeLookup::new(&[]);
        let out = transform(&lookup, r#"<ac:link><ri:attachment ri:filename="gone.docx"/></ac:link>"#);
        assert!(out.contains(r#"href="../../attachments/gone.docx""#), "{out}");
        assert!(out.contains(r#"class="open-folder" href="../../attachments/""#), "{out}");
        assert_eq!(lookup.misses.borrow().as_slice(), [("gone.docx".to_string(), "link".to_string())]);
    }

    #[test]
    fn test_image_from_url() {
        let lookup = FakeLookup::new(&[]);
        let out = transform(&lookup, r#"<ac:image><ri:url ri:value="https://example.com/a.png?x=1&amp;y=2"/></ac:image>"#);
        assert_eq!(
            out,
            r#"<figure class="confluence-image"><a href="https://example.com/a.png?x=1&amp;y=2" class="zoom" aria-label="Enlarge image"><img src="https://example.com/a.png?x=1&amp;y=2" class="thumb" alt=""></a></figure>"#
        );
        assert!(lookup.misses.borrow().is_empty());
    }

    #[test]
    fn test_image_without_source_is_placeholder() {
        let lookup = FakeLookup::new(&[]);
        assert_eq!(transform(&lookup, "<ac:image></ac:image>"), "<p>[image]</p>");
    }

    #[test]
    fn test_page_link() {
        let lookup = FakeLookup::new(&[]);
        assert_eq!(
            transform(&lookup, r#"<ac:link><ri:page ri:content-title="Setup: Linux"/></ac:link>"#),
            r#"<p><a href="Setup%20Linux.html">Setup: Linux</a></p>"#
        );
        assert_eq!(
            transform(
                &lookup,
                r#"<ac:link><ri:page ri:content-title="Setup"/><ac:plain-text-link-body><![CDATA[read this]]></ac:plain-text-link-body></ac:link>"#
            ),
            r#"<p><a href="Setup.html">read this</a></p>"#
        );
    }

    #[test]
    fn test_attachment_link_uses_body_label() {
        let lookup = FakeLookup::new(&["A/plan.xlsx"]);
        let out = transform(
            &lookup,
            r#"<ac:link><ri:attachment ri:filename="plan.xlsx"/><ac:plain-text-link-body><![CDATA[The <plan>]]></ac:plain-text-link-body></ac:link>"#,
        );
        assert!(out.contains(r#"rel="noopener">The &lt;plan&gt;</a>"#), "{out}");
    }

    #[test]
    fn test_multimedia_element_and_url() {
        let lookup = FakeLookup::new(&["A/demo.webm"]);
        let out = transform(&lookup, r#"<ac:multimedia><ri:attachment ri:filename="demo.webm"/></ac:multimedia>"#);
        assert!(out.contains(r#"type="video/webm""#), "{out}");

        let out = transform(
            &lookup,
            r#"<ac:structured-macro ac:name="multimedia"><ac:parameter ac:name="name"><ri:url ri:value="https://cdn.example.com/clip.mp4"/></ac:parameter></ac:structured-macro>"#,
        );
        assert_eq!(
            out,
            r#"<figure class="confluence-video"><video controls preload="metadata" src="https://cdn.example.com/clip.mp4"></video></figure>"#
        );
    }
}
