pub mod archive;
pub mod container;
pub mod cover;
pub mod document;
pub mod error;
pub mod opf;

#[cfg(test)]
pub(crate) mod test_support;

// 重新导出错误处理
pub use error::{EpubError, ErrorKind, Result};

// 重新导出解包相关
pub use archive::{ScratchDir, extract, extract_to_scratch};

// 重新导出容器相关
pub use container::{CONTAINER_PATH, Container, RootFile};

// 重新导出文档模型
pub use cover::CoverImage;
pub use document::{
    ChapterChange,
    ChapterInfo,
    EpubDocument,
    ReadingPosition,
    chapter_display_name,
    strip_chapter_suffix,
};

// 重新导出OPF相关
pub use opf::{
    DEFAULT_AUTHOR,
    DEFAULT_TITLE,
    Manifest,
    ManifestItem,
    Package,
    PackageMetadata,
    SpineItem,
};
