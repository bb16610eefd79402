use crate::epub::error::{EpubError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// container.xml在归档中的固定位置
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFile {
    pub full_path: String,
}

/// Container.xml的解析结果
#[derive(Debug, Clone)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 只读取`rootfile`元素的`full-path`属性，`media-type`不参与判断。
    ///
    /// # 参数
    /// * `xml_content` - container.xml的文件内容
    ///
    /// # 返回值
    /// * `Result<Container, EpubError>` - 解析后的Container信息
    pub fn parse_xml(xml_content: &[u8]) -> Result<Container> {
        Self::read_rootfiles(xml_content).map_err(|e| match e {
            EpubError::XmlError(xml_err) => {
                EpubError::ContainerParseError(format!("XML解析错误: {}", xml_err))
            }
            other => other,
        })
    }

    fn read_rootfiles(xml_content: &[u8]) -> Result<Container> {
        let mut reader = Reader::from_reader(xml_content);
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut rootfiles = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let local_name = e.local_name();
                    if local_name.as_ref() == b"rootfile" {
                        for attr_result in e.attributes() {
                            let attr = attr_result?;
                            if attr.key.local_name().as_ref() == b"full-path" {
                                let full_path = attr.unescape_value()?.into_owned();
                                if !full_path.is_empty() {
                                    rootfiles.push(RootFile { full_path });
                                }
                            }
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if rootfiles.is_empty() {
            return Err(EpubError::ContainerParseError(
                "没有找到带full-path属性的rootfile".to_string(),
            ));
        }

        Ok(Container { rootfiles })
    }

    /// 获取OPF文件路径
    ///
    /// 有多个rootfile时以最后出现的为准。
    pub fn rootfile_path(&self) -> &str {
        self.rootfiles
            .last()
            .map(|rf| rf.full_path.as_str())
            .unwrap_or_default()
    }
}
