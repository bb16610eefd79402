pub mod epub;
pub mod library;
pub mod settings;

// === 核心API重新导出 ===

/// EPUB文档（主要接口）
pub use epub::EpubDocument;

/// 错误处理
pub use epub::{EpubError, ErrorKind, Result};

// === 数据结构 ===

/// 导航和阅读位置
pub use epub::{ChapterChange, ChapterInfo, ReadingPosition};

/// 封面图片
pub use epub::CoverImage;

/// 书名作者信息
pub use epub::{DEFAULT_AUTHOR, DEFAULT_TITLE, PackageMetadata};

// === 底层组件（高级用法） ===

/// 解包组件
pub use epub::{ScratchDir, extract, extract_to_scratch};

/// 容器组件
pub use epub::{CONTAINER_PATH, Container, RootFile};

/// OPF组件
pub use epub::{Manifest, ManifestItem, Package, SpineItem};

// === 阅读器外围 ===

/// 阅读设置
pub use settings::{FontFamily, ReaderSettings, Theme};

/// 书库
pub use library::{BookRecord, Library};

// === 库信息 ===

/// Zeader库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Zeader库的描述
pub const DESCRIPTION: &str = "EPUB阅读器核心：解包、解析OPF并提供章节导航";

// === 便捷函数 ===

/// 快速打开EPUB文件
///
/// 这是 `EpubDocument::open` 的便捷包装函数。
///
/// # 参数
/// * `path` - EPUB文件路径
///
/// # 返回值
/// * `Result<EpubDocument>` - 打开的文档，位于第一章
///
/// # 示例
///
/// ```no_run
/// let mut doc = zeader::open("book.epub")?;
/// println!("书名: {}", doc.title());
/// while let Some(change) = doc.next_chapter() {
///     println!("第{}章: {}", change.current + 1, doc.current_chapter_title());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<EpubDocument> {
    EpubDocument::open(path)
}
