//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）文件的XML解析功能。
//!
//! 解析分两步：先流式读取整个文档，收集清单项和脊柱引用；
//! 文档读完后再用完整的清单解析脊柱。清单和脊柱在文档中可能交错出现，
//! 所以不能边读边解析。

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::manifest::{Manifest, ManifestItem};
use crate::epub::opf::metadata::PackageMetadata;
use crate::epub::opf::spine::SpineItem;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

/// OPF文件解析结果
#[derive(Debug, Clone)]
pub struct Package {
    /// 清单项(文件列表)
    pub manifest: Manifest,
    /// 文档中出现的全部脊柱项，包括非线性项
    pub spine_items: Vec<SpineItem>,
    /// 解析后的阅读顺序：线性脊柱项对应的文件路径(相对于OPF文件)
    pub spine: Vec<String>,
    /// 元数据
    pub metadata: PackageMetadata,
}

impl Package {
    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Package, EpubError>` - 解析后的OPF信息，XML格式错误时返回`OpfParseError`
    pub fn parse_xml(xml_content: &[u8]) -> Result<Package> {
        Self::read_package(xml_content).map_err(|e| match e {
            EpubError::XmlError(xml_err) => {
                EpubError::OpfParseError(format!("XML解析错误: {}", xml_err))
            }
            other => other,
        })
    }

    fn read_package(xml_content: &[u8]) -> Result<Package> {
        let mut reader = Reader::from_reader(xml_content);
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut manifest = Manifest::new();
        let mut spine_items = Vec::new();
        let mut metadata = PackageMetadata::new();

        let mut buf = Vec::new();
        let mut text_content = String::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    text_content.clear();
                    let local_name = e.local_name();
                    match local_name.as_ref() {
                        b"item" => Self::parse_manifest_item(e, &mut manifest)?,
                        b"itemref" => Self::parse_spine_item(e, &mut spine_items)?,
                        b"meta" => Self::parse_cover_meta(e, &mut metadata)?,
                        _ => {}
                    }
                }
                Event::End(ref e) => {
                    let local_name = e.local_name();
                    match local_name.as_ref() {
                        // dc:title 和 title 的本地名称都是 title
                        b"title" => metadata.record_title(&text_content),
                        b"creator" | b"author" => metadata.record_author(&text_content),
                        _ => {}
                    }
                    text_content.clear();
                }
                Event::Text(e) => {
                    text_content.push_str(&e.unescape()?);
                }
                Event::CData(e) => {
                    text_content.push_str(&String::from_utf8_lossy(&e));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let spine = Self::resolve_spine(&spine_items, &manifest);

        Ok(Package {
            manifest,
            spine_items,
            spine,
            metadata,
        })
    }

    /// 用完整的清单解析线性脊柱项，清单中不存在的引用被丢弃
    fn resolve_spine(spine_items: &[SpineItem], manifest: &Manifest) -> Vec<String> {
        spine_items
            .iter()
            .filter(|spine_item| spine_item.is_linear())
            .filter_map(|spine_item| {
                let href = manifest.href(&spine_item.idref);
                if href.is_none() {
                    debug!(
                        idref = %spine_item.idref,
                        "spine itemref has no manifest entry; dropped"
                    );
                }
                href.map(str::to_string)
            })
            .collect()
    }

    /// 解析清单项，缺少id或href的条目被忽略
    fn parse_manifest_item(e: &BytesStart, manifest: &mut Manifest) -> Result<()> {
        let mut id = None;
        let mut href = None;
        let mut media_type = None;
        let mut properties = None;

        for attr_result in e.attributes() {
            let attr = attr_result?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.local_name().as_ref() {
                b"id" => id = Some(value),
                b"href" => href = Some(value),
                b"media-type" => media_type = Some(value),
                b"properties" => properties = Some(value),
                _ => {}
            }
        }

        if let (Some(id), Some(href)) = (id, href) {
            manifest.insert(ManifestItem {
                id,
                href,
                media_type,
                properties,
            });
        }

        Ok(())
    }

    /// 解析脊柱项
    fn parse_spine_item(e: &BytesStart, spine_items: &mut Vec<SpineItem>) -> Result<()> {
        let mut idref = None;
        let mut linear = None;

        for attr_result in e.attributes() {
            let attr = attr_result?;
            match attr.key.local_name().as_ref() {
                b"idref" => idref = Some(attr.unescape_value()?.into_owned()),
                b"linear" => linear = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }

        if let Some(idref) = idref {
            spine_items.push(SpineItem::with_linear_attr(idref, linear.as_deref()));
        }

        Ok(())
    }

    /// 处理`<meta name="cover" content="..."/>`
    fn parse_cover_meta(e: &BytesStart, metadata: &mut PackageMetadata) -> Result<()> {
        let mut name = None;
        let mut content = None;

        for attr_result in e.attributes() {
            let attr = attr_result?;
            match attr.key.local_name().as_ref() {
                b"name" => name = Some(attr.unescape_value()?.into_owned()),
                b"content" => content = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }

        if let (Some("cover"), Some(content)) = (name.as_deref(), content) {
            metadata.record_cover_id(&content);
        }

        Ok(())
    }

    /// 清单中被标记为封面的项：`cover-image`属性或元数据声明的封面ID
    pub fn is_declared_cover(&self, item: &ManifestItem) -> bool {
        item.is_cover_image() || self.metadata.cover_id() == Some(item.id.as_str())
    }
}
