//! 测试用EPUB构造工具
//!
//! 在内存中用ZipWriter拼出EPUB归档，供各模块的单元测试使用。

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::FileOptions;

pub(crate) const MIMETYPE: &str = "application/epub+zip";

/// 生成指向`opf_path`的container.xml
pub(crate) fn container_xml(opf_path: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="{}" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#,
        opf_path
    )
}

/// 按扩展名给出清单项的媒体类型
fn media_type_for(href: &str) -> &'static str {
    match href.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/xhtml+xml",
    }
}

/// 生成OPF内容
///
/// # 参数
/// * `metadata` - metadata元素内部的XML片段
/// * `manifest` - (id, href) 列表
/// * `spine` - idref 列表，以`!`开头的表示`linear="no"`
pub(crate) fn package_xml(metadata: &str, manifest: &[(&str, &str)], spine: &[&str]) -> String {
    let items: String = manifest
        .iter()
        .map(|(id, href)| {
            format!(
                r#"<item id="{}" href="{}" media-type="{}"/>"#,
                id,
                href,
                media_type_for(href)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");
    let itemrefs: String = spine
        .iter()
        .map(|idref| match idref.strip_prefix('!') {
            Some(idref) => format!(r#"<itemref idref="{}" linear="no"/>"#, idref),
            None => format!(r#"<itemref idref="{}"/>"#, idref),
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        {}
    </metadata>
    <manifest>
        {}
    </manifest>
    <spine>
        {}
    </spine>
</package>"#,
        metadata, items, itemrefs
    )
}

pub(crate) fn chapter_xhtml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{0}</title></head>
<body><h1>{0}</h1></body>
</html>"#,
        title
    )
}

/// 内存中的EPUB归档构造器
pub(crate) struct EpubBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl EpubBuilder {
    /// 只包含mimetype的空归档
    pub(crate) fn new() -> Self {
        Self {
            entries: vec![("mimetype".to_string(), MIMETYPE.as_bytes().to_vec())],
        }
    }

    pub(crate) fn entry(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.entries.push((name.to_string(), content.as_ref().to_vec()));
        self
    }

    pub(crate) fn container(self, opf_path: &str) -> Self {
        self.entry("META-INF/container.xml", container_xml(opf_path))
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in self.entries {
            zip.start_file(name, FileOptions::<()>::default())
                .expect("写入zip条目失败");
            zip.write_all(&content).expect("写入zip内容失败");
        }
        zip.finish().expect("完成zip写入失败").into_inner()
    }
}

/// 两章的标准测试书籍：OEBPS/content.opf，c1、c2均为线性章节
pub(crate) fn sample_epub() -> Vec<u8> {
    let opf = package_xml(
        "<dc:title>Sample Book</dc:title>\n        <dc:creator>Sample Author</dc:creator>",
        &[("c1", "text/ch1.xhtml"), ("c2", "text/ch2.xhtml")],
        &["c1", "c2"],
    );
    EpubBuilder::new()
        .container("OEBPS/content.opf")
        .entry("OEBPS/content.opf", opf)
        .entry("OEBPS/text/ch1.xhtml", chapter_xhtml("Chapter 1"))
        .entry("OEBPS/text/ch2.xhtml", chapter_xhtml("Chapter 2"))
        .build()
}

/// 指定章节数的测试书籍
pub(crate) fn epub_with_chapters(count: usize) -> Vec<u8> {
    let ids: Vec<String> = (1..=count).map(|i| format!("c{}", i)).collect();
    let hrefs: Vec<String> = (1..=count).map(|i| format!("ch{:02}.xhtml", i)).collect();
    let manifest: Vec<(&str, &str)> = ids
        .iter()
        .zip(hrefs.iter())
        .map(|(id, href)| (id.as_str(), href.as_str()))
        .collect();
    let spine: Vec<&str> = ids.iter().map(String::as_str).collect();

    let mut builder = EpubBuilder::new()
        .container("OEBPS/content.opf")
        .entry(
            "OEBPS/content.opf",
            package_xml("<dc:title>Long Book</dc:title>", &manifest, &spine),
        );
    for href in &hrefs {
        builder = builder.entry(&format!("OEBPS/{}", href), chapter_xhtml(href));
    }
    builder.build()
}
