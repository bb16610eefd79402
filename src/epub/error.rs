use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// 错误分类
///
/// 打开文档时的三类致命错误（归档、解析、文档）之外，
/// 还有设置和书库两类周边错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 归档不可读、损坏或解包时的I/O失败
    Archive,
    /// container.xml或OPF的XML格式错误
    Parse,
    /// 结构合法但无法使用（如没有可阅读的章节）
    Document,
    /// 阅读设置文件读写失败
    Config,
    /// 书库记录相关的失败
    Library,
}

/// Epub相关的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("归档条目路径越界: {0}")]
    UnsafeEntryPath(String),

    #[error("归档中缺少文件: {}", .0.display())]
    MissingEntry(PathBuf),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("OPF文件解析错误: {0}")]
    OpfParseError(String),

    #[error("脊柱中没有可阅读的章节")]
    EmptySpine,

    #[error("章节索引越界: {index}, 共 {total} 章")]
    ChapterOutOfRange { index: usize, total: usize },

    #[error("配置文件错误: {0}")]
    ConfigError(String),

    #[error("书库中没有该书籍: {0}")]
    BookNotFound(uuid::Uuid),

    #[error("书库错误: {0}")]
    LibraryError(String),
}

impl EpubError {
    /// 返回错误所属的分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            EpubError::Io(_)
            | EpubError::Zip(_)
            | EpubError::UnsafeEntryPath(_)
            | EpubError::MissingEntry(_) => ErrorKind::Archive,
            EpubError::XmlError(_)
            | EpubError::ContainerParseError(_)
            | EpubError::OpfParseError(_) => ErrorKind::Parse,
            EpubError::EmptySpine | EpubError::ChapterOutOfRange { .. } => ErrorKind::Document,
            EpubError::ConfigError(_) => ErrorKind::Config,
            EpubError::BookNotFound(_) | EpubError::LibraryError(_) => ErrorKind::Library,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for EpubError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        EpubError::XmlError(quick_xml::Error::InvalidAttr(err))
    }
}
