//! 归档解包模块
//!
//! 把EPUB（ZIP格式）中的全部条目解包到一个独立的临时目录中，
//! 后续的container.xml和OPF解析都在解包后的文件上进行。

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, instrument};
use zip::ZipArchive;

use crate::epub::error::{EpubError, Result};

/// 临时目录名前缀
const SCRATCH_PREFIX: &str = "zeader-";

/// 解包用的临时目录
///
/// 每次创建都会得到一个唯一命名的新目录，同时打开的多本书互不干扰。
/// 目录在值被丢弃时连同内容一起删除。
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// 在系统临时目录下创建
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()?;
        Ok(Self { dir })
    }

    /// 在指定的根目录下创建，根目录不存在时会先创建
    pub fn create_in<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    /// 临时目录的路径
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// 立即删除临时目录，并返回删除过程中的错误
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "scratch directory removed");
        Ok(())
    }
}

/// 把归档中的全部条目解包到`destination`
///
/// 条目按归档中的顺序处理，按需创建中间目录。
///
/// # 参数
/// * `archive_bytes` - ZIP格式的归档内容
/// * `destination` - 解包目标目录
///
/// # 返回值
/// * `Result<()>` - 归档无效、条目路径越出目标目录或写入失败时返回错误
#[instrument(level = "debug", skip(archive_bytes), fields(bytes = archive_bytes.len()))]
pub fn extract(archive_bytes: &[u8], destination: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| EpubError::UnsafeEntryPath(entry.name().to_string()))?;
        let target = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
    }

    debug!(entries = archive.len(), "archive extracted");
    Ok(())
}

/// 把OPF中的相对路径解析到解包目录下
///
/// 先按词法规整`base.join(href)`（处理`.`和`..`，不访问文件系统），
/// 结果不在`root`之内时返回None。绝对路径的`href`同样要落在`root`之内。
///
/// # 参数
/// * `root` - 解包目录
/// * `base` - OPF文件所在目录
/// * `href` - 清单或脊柱中的路径
pub fn resolve_inside(root: &Path, base: &Path, href: &str) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in base.join(href).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            other => resolved.push(other.as_os_str()),
        }
    }

    resolved.starts_with(root).then_some(resolved)
}

/// 创建新的临时目录并把归档解包进去
///
/// 解包失败时临时目录随之删除。
pub fn extract_to_scratch(archive_bytes: &[u8]) -> Result<ScratchDir> {
    let scratch = ScratchDir::create()?;
    extract(archive_bytes, scratch.path())?;
    Ok(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::error::ErrorKind;
    use crate::epub::test_support::{EpubBuilder, sample_epub};

    #[test]
    fn test_extract_preserves_relative_paths() {
        let scratch = extract_to_scratch(&sample_epub()).unwrap();

        assert!(scratch.path().join("mimetype").is_file());
        assert!(scratch.path().join("META-INF/container.xml").is_file());
        assert!(scratch.path().join("OEBPS/content.opf").is_file());
        assert!(scratch.path().join("OEBPS/text/ch1.xhtml").is_file());

        let mimetype = fs::read_to_string(scratch.path().join("mimetype")).unwrap();
        assert_eq!(mimetype, "application/epub+zip");
    }

    #[test]
    fn test_extract_rejects_invalid_archive() {
        let scratch = ScratchDir::create().unwrap();
        let err = extract(b"definitely not a zip file", scratch.path()).unwrap_err();

        assert!(matches!(err, EpubError::Zip(_)));
        assert_eq!(err.kind(), ErrorKind::Archive);
    }

    #[test]
    fn test_extract_rejects_path_traversal() {
        let bytes = EpubBuilder::new()
            .entry("../escaped.txt", "outside")
            .build();
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(root.path()).unwrap();

        let err = extract(&bytes, scratch.path()).unwrap_err();
        assert!(matches!(err, EpubError::UnsafeEntryPath(ref name) if name == "../escaped.txt"));
        assert!(!root.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_resolve_inside() {
        let root = Path::new("/tmp/zeader-x");
        let base = root.join("OEBPS");

        assert_eq!(
            resolve_inside(root, &base, "text/ch1.xhtml"),
            Some(root.join("OEBPS/text/ch1.xhtml"))
        );
        assert_eq!(
            resolve_inside(root, &base, "../images/./cover.png"),
            Some(root.join("images/cover.png"))
        );
        assert_eq!(resolve_inside(root, &base, "../../outside.xhtml"), None);
        assert_eq!(resolve_inside(root, &base, "text/../../../etc/passwd"), None);
        assert_eq!(resolve_inside(root, &base, "/etc/hostname"), None);
        assert_eq!(
            resolve_inside(root, &base, "/tmp/zeader-x/OEBPS/ch.xhtml"),
            Some(root.join("OEBPS/ch.xhtml"))
        );
    }

    #[test]
    fn test_scratch_dirs_are_unique() {
        let first = ScratchDir::create().unwrap();
        let second = ScratchDir::create().unwrap();

        assert_ne!(first.path(), second.path());
        let name = first.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(SCRATCH_PREFIX));
    }

    #[test]
    fn test_scratch_dir_removed_on_drop_and_close() {
        let dropped = extract_to_scratch(&sample_epub()).unwrap();
        let dropped_path = dropped.path().to_path_buf();
        assert!(dropped_path.exists());
        drop(dropped);
        assert!(!dropped_path.exists());

        let closed = extract_to_scratch(&sample_epub()).unwrap();
        let closed_path = closed.path().to_path_buf();
        closed.close().unwrap();
        assert!(!closed_path.exists());
    }
}
