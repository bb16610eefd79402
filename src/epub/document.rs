//! EPUB文档模型
//!
//! 把解包、container.xml解析、OPF解析和封面查找组合成一个可导航的文档，
//! 并维护当前章节位置。

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::epub::archive::{self, ScratchDir};
use crate::epub::container::{CONTAINER_PATH, Container};
use crate::epub::cover::{self, CoverImage};
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{Package, PackageMetadata};

/// 章节文件名会被去掉的后缀
const CHAPTER_SUFFIXES: [&str; 2] = [".xhtml", ".html"];

/// 一次导航造成的位置变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterChange {
    /// 导航前的章节索引
    pub previous: usize,
    /// 导航后的章节索引
    pub current: usize,
}

/// 书库在保存点记录的阅读位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingPosition {
    pub chapter_index: usize,
    pub progress: f64,
}

/// 章节列表中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterInfo {
    /// 章节在脊柱中的索引
    pub index: usize,
    /// 显示名称（去掉后缀的文件名）
    pub name: String,
    /// 解包后的文件路径
    pub path: PathBuf,
}

/// 一个已打开的EPUB文档
///
/// 文档独占其解包目录，文档被丢弃或调用 [`EpubDocument::close`] 时目录被删除。
/// 构造成功后脊柱至少有一章，当前索引始终在 `0..total_chapters()` 之内。
#[derive(Debug)]
pub struct EpubDocument {
    scratch: ScratchDir,
    package_path: PathBuf,
    base_dir: PathBuf,
    spine: Vec<String>,
    metadata: PackageMetadata,
    cover: Option<CoverImage>,
    current_index: usize,
}

impl EpubDocument {
    /// 从文件路径打开EPUB
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<EpubDocument, EpubError>` - 成功返回文档，失败返回错误
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// 从内存中的归档打开EPUB，解包到系统临时目录
    pub fn from_bytes(archive_bytes: &[u8]) -> Result<Self> {
        let scratch = ScratchDir::create()?;
        Self::load(archive_bytes, scratch)
    }

    /// 从内存中的归档打开EPUB，解包到`scratch_root`下的新目录
    pub fn from_bytes_in<P: AsRef<Path>>(archive_bytes: &[u8], scratch_root: P) -> Result<Self> {
        let scratch = ScratchDir::create_in(scratch_root)?;
        Self::load(archive_bytes, scratch)
    }

    #[instrument(level = "debug", skip_all, fields(scratch = %scratch.path().display()))]
    fn load(archive_bytes: &[u8], scratch: ScratchDir) -> Result<Self> {
        archive::extract(archive_bytes, scratch.path())?;

        let container_bytes = read_entry(scratch.path(), Path::new(CONTAINER_PATH))?;
        let container = Container::parse_xml(&container_bytes)?;
        let rootfile = Path::new(container.rootfile_path());
        if !is_relative_inside(rootfile) {
            return Err(EpubError::UnsafeEntryPath(rootfile.display().to_string()));
        }

        let package_bytes = read_entry(scratch.path(), rootfile)?;
        let mut package = Package::parse_xml(&package_bytes)?;

        let package_path = scratch.path().join(rootfile);
        let base_dir = package_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| scratch.path().to_path_buf());

        package.spine.retain(|href| {
            let inside = archive::resolve_inside(scratch.path(), &base_dir, href).is_some();
            if !inside {
                warn!(href = %href, "spine entry points outside the book; dropped");
            }
            inside
        });
        if package.spine.is_empty() {
            return Err(EpubError::EmptySpine);
        }

        let cover = cover::resolve_cover(&package, &base_dir, scratch.path());

        info!(
            title = package.metadata.title(),
            chapters = package.spine.len(),
            cover = cover.is_some(),
            "epub document opened"
        );

        Ok(Self {
            scratch,
            package_path,
            base_dir,
            spine: package.spine,
            metadata: package.metadata,
            cover,
            current_index: 0,
        })
    }

    /// 书名
    pub fn title(&self) -> &str {
        self.metadata.title()
    }

    /// 作者
    pub fn author(&self) -> &str {
        self.metadata.author()
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// 封面图片（如果找到）
    pub fn cover(&self) -> Option<&CoverImage> {
        self.cover.as_ref()
    }

    /// 解包目录
    pub fn extraction_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// 解包后的OPF文件路径
    pub fn package_path(&self) -> &Path {
        &self.package_path
    }

    /// OPF文件所在目录，章节及其引用的图片、样式表都在其下
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 脊柱中的相对路径，按阅读顺序
    pub fn spine(&self) -> &[String] {
        &self.spine
    }

    /// 章节总数
    pub fn total_chapters(&self) -> usize {
        self.spine.len()
    }

    /// 当前章节索引，从0开始
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 当前章节的完整路径
    pub fn current_chapter_path(&self) -> PathBuf {
        self.base_dir.join(&self.spine[self.current_index])
    }

    /// 当前章节的显示名称
    pub fn current_chapter_title(&self) -> String {
        chapter_display_name(&self.spine[self.current_index])
    }

    /// 指定章节的显示名称，索引越界时返回空字符串
    pub fn chapter_name(&self, index: usize) -> String {
        self.spine
            .get(index)
            .map(|href| chapter_display_name(href))
            .unwrap_or_default()
    }

    /// 指定章节的完整路径
    pub fn chapter_path(&self, index: usize) -> Option<PathBuf> {
        self.spine.get(index).map(|href| self.base_dir.join(href))
    }

    /// 全部章节的列表
    pub fn chapters(&self) -> Vec<ChapterInfo> {
        self.spine
            .iter()
            .enumerate()
            .map(|(index, href)| ChapterInfo {
                index,
                name: chapter_display_name(href),
                path: self.base_dir.join(href),
            })
            .collect()
    }

    pub fn has_next(&self) -> bool {
        self.current_index + 1 < self.spine.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current_index > 0
    }

    /// 前进到下一章，已是最后一章时不做任何事并返回None
    pub fn next_chapter(&mut self) -> Option<ChapterChange> {
        if !self.has_next() {
            return None;
        }
        Some(self.move_to(self.current_index + 1))
    }

    /// 后退到上一章，已是第一章时不做任何事并返回None
    pub fn previous_chapter(&mut self) -> Option<ChapterChange> {
        if !self.has_previous() {
            return None;
        }
        Some(self.move_to(self.current_index - 1))
    }

    /// 直接跳转到指定章节
    ///
    /// # 返回值
    /// * `Ok(None)` - 已经在该章节
    /// * `Err(EpubError::ChapterOutOfRange)` - 索引越界，当前位置不变
    pub fn go_to_chapter(&mut self, index: usize) -> Result<Option<ChapterChange>> {
        if index >= self.spine.len() {
            return Err(EpubError::ChapterOutOfRange {
                index,
                total: self.spine.len(),
            });
        }
        if index == self.current_index {
            return Ok(None);
        }
        Ok(Some(self.move_to(index)))
    }

    /// 恢复保存的阅读位置
    ///
    /// 书籍文件变短时，超出范围的索引会落到最后一章。
    pub fn restore_position(&mut self, chapter_index: usize) -> Option<ChapterChange> {
        let target = chapter_index.min(self.spine.len().saturating_sub(1));
        if target == self.current_index {
            return None;
        }
        Some(self.move_to(target))
    }

    fn move_to(&mut self, index: usize) -> ChapterChange {
        let change = ChapterChange {
            previous: self.current_index,
            current: index,
        };
        self.current_index = index;
        debug!(from = change.previous, to = change.current, "chapter changed");
        change
    }

    /// 阅读进度：当前索引 / 章节总数，取值在 [0, 1) 之间
    pub fn progress(&self) -> f64 {
        if self.spine.is_empty() {
            return 0.0;
        }
        self.current_index as f64 / self.spine.len() as f64
    }

    /// 当前阅读位置，供书库保存
    pub fn reading_position(&self) -> ReadingPosition {
        ReadingPosition {
            chapter_index: self.current_index,
            progress: self.progress(),
        }
    }

    /// 关闭文档并立即删除解包目录
    pub fn close(self) -> Result<()> {
        let EpubDocument { scratch, .. } = self;
        scratch.close()
    }
}

/// 章节显示名称：取文件名并去掉结尾的`.xhtml`或`.html`
pub fn chapter_display_name(href: &str) -> String {
    let file_name = Path::new(href)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| href.to_string());
    strip_chapter_suffix(&file_name).to_string()
}

/// 去掉结尾的`.xhtml`或`.html`，其他后缀保持不变
pub fn strip_chapter_suffix(file_name: &str) -> &str {
    CHAPTER_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or(file_name)
}

/// 读取解包目录中的条目，文件不存在时报告为缺失条目
fn read_entry(root: &Path, relative: &Path) -> Result<Vec<u8>> {
    fs::read(root.join(relative)).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => EpubError::MissingEntry(relative.to_path_buf()),
        _ => EpubError::Io(err),
    })
}

/// 路径是否为不越出根目录的相对路径
fn is_relative_inside(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
