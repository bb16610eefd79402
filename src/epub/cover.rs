//! 封面查找模块
//!
//! 尽力而为地为文档找到一张封面图片，找不到不算错误。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::epub::archive;
use crate::epub::opf::{ManifestItem, Package};

/// 清单中可作为封面的图片扩展名
const COVER_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// 清单中没有匹配项时，在OPF目录下依次尝试的文件名
const SIBLING_COVER_NAMES: [&str; 4] = ["cover.jpg", "cover.jpeg", "cover.png", "cover.gif"];

/// 封面图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    /// 解包后的文件路径
    pub path: PathBuf,
    /// 图片的二进制数据
    pub data: Vec<u8>,
}

impl CoverImage {
    /// 小写的文件扩展名
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }

    /// 根据扩展名推断的媒体类型
    pub fn media_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        }
    }
}

/// 清单项的路径是否像封面：不区分大小写地包含`cover`并以jpg/jpeg/png结尾
fn looks_like_cover(href: &str) -> bool {
    let href = href.to_lowercase();
    href.contains("cover") && COVER_EXTENSIONS.iter().any(|ext| href.ends_with(ext))
}

/// 清单项可以作为封面：路径像封面，且声明的媒体类型（如果有）是图片
fn is_cover_candidate(item: &ManifestItem) -> bool {
    let image_type = item
        .media_type
        .as_deref()
        .is_none_or(|media_type| media_type.starts_with("image/"));
    image_type && looks_like_cover(&item.href)
}

/// 在清单中查找封面
///
/// 按声明顺序检查所有候选项，`accept`返回false的项被跳过。
/// 多个项都符合时，优先选择被声明为封面的项，否则取第一个。
pub fn find_manifest_cover<'a>(
    package: &'a Package,
    mut accept: impl FnMut(&ManifestItem) -> bool,
) -> Option<&'a ManifestItem> {
    let mut first_match = None;

    for item in package.manifest.iter().filter(|item| is_cover_candidate(item)) {
        if !accept(item) {
            continue;
        }
        if package.is_declared_cover(item) {
            return Some(item);
        }
        if first_match.is_none() {
            first_match = Some(item);
        }
    }

    first_match
}

/// 在OPF目录下按固定顺序探测`cover.*`文件
pub fn find_sibling_cover(base_dir: &Path) -> Option<PathBuf> {
    SIBLING_COVER_NAMES
        .iter()
        .map(|name| base_dir.join(name))
        .find(|path| path.is_file())
}

/// 查找并读取封面
///
/// # 参数
/// * `package` - 已解析的OPF
/// * `base_dir` - OPF文件所在的解包目录
/// * `root` - 解包目录，指向其外部的清单项不会被读取
///
/// # 返回值
/// * `Option<CoverImage>` - 没有找到或读取失败时为None
pub fn resolve_cover(package: &Package, base_dir: &Path, root: &Path) -> Option<CoverImage> {
    let manifest_match = find_manifest_cover(package, |item| {
        let inside = archive::resolve_inside(root, base_dir, &item.href).is_some();
        if !inside {
            warn!(href = %item.href, "cover candidate points outside the book; skipped");
        }
        inside
    });

    let path = match manifest_match {
        Some(item) => archive::resolve_inside(root, base_dir, &item.href)?,
        None => find_sibling_cover(base_dir)?,
    };

    match fs::read(&path) {
        Ok(data) => {
            debug!(path = %path.display(), bytes = data.len(), "cover image resolved");
            Some(CoverImage { path, data })
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cover image could not be read");
            None
        }
    }
}
