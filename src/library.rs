//! 书库模块
//!
//! 把导入的EPUB复制到书库根目录下统一管理，记录书名、作者、封面和阅读进度，
//! 索引以YAML格式保存在`library.yaml`中。

use crate::epub::document::EpubDocument;
use crate::epub::error::{EpubError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 书籍文件存放的子目录
pub const BOOKS_DIR: &str = "Books";

/// 书库索引文件名
pub const INDEX_FILE: &str = "library.yaml";

/// 书库中的一本书
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// 封面图片相对书库根目录的路径
    #[serde(default)]
    pub cover_file: Option<String>,
    /// epub文件相对书库根目录的路径
    pub file_path: String,
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub last_read: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_chapter: usize,
    #[serde(default)]
    pub reading_progress: f64,
}

#[derive(Debug, Default, Deserialize)]
struct LibraryIndex {
    #[serde(default)]
    books: Vec<BookRecord>,
}

/// 写入时借用记录的索引文件格式，与`LibraryIndex`一致
#[derive(Serialize)]
struct IndexFile<'a> {
    books: &'a [BookRecord],
}

/// 书库
#[derive(Debug)]
pub struct Library {
    root: PathBuf,
    index: LibraryIndex,
}

impl Library {
    /// 打开书库
    ///
    /// 创建`root/Books`目录，存在索引文件时加载已有记录。
    ///
    /// # 参数
    /// * `root` - 书库根目录
    ///
    /// # 返回值
    /// * `Result<Library>` - 目录无法创建或索引格式错误时返回错误
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(BOOKS_DIR))?;

        let index_path = root.join(INDEX_FILE);
        let index = if index_path.exists() {
            let content = fs::read_to_string(&index_path)?;
            serde_yml::from_str(&content)
                .map_err(|e| EpubError::LibraryError(format!("书库索引格式错误: {}", e)))?
        } else {
            LibraryIndex::default()
        };

        debug!(root = %root.display(), books = index.books.len(), "library opened");
        Ok(Self { root, index })
    }

    /// 书库根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 所有书籍，按导入顺序
    pub fn books(&self) -> &[BookRecord] {
        &self.index.books
    }

    pub fn get(&self, id: Uuid) -> Option<&BookRecord> {
        self.index.books.iter().find(|book| book.id == id)
    }

    /// 书籍文件的绝对路径
    pub fn book_path(&self, record: &BookRecord) -> PathBuf {
        self.root.join(&record.file_path)
    }

    /// 读取书籍的封面图片，没有封面时返回None
    pub fn cover_bytes(&self, record: &BookRecord) -> Result<Option<Vec<u8>>> {
        match &record.cover_file {
            Some(cover_file) => Ok(Some(fs::read(self.root.join(cover_file))?)),
            None => Ok(None),
        }
    }

    /// 导入EPUB文件
    ///
    /// 文件必须能作为EPUB打开。任何一步失败时，已写入的文件会被删除，
    /// 书库索引保持不变。
    ///
    /// # 参数
    /// * `source` - 待导入的epub文件路径
    ///
    /// # 返回值
    /// * `Result<BookRecord>` - 新增的书籍记录
    #[instrument(skip_all, fields(source = %source.as_ref().display()))]
    pub fn import<P: AsRef<Path>>(&mut self, source: P) -> Result<BookRecord> {
        let bytes = fs::read(source.as_ref())?;
        let document = EpubDocument::from_bytes(&bytes)?;

        let mut written = Vec::new();
        let stored = self.store_book(&document, &bytes, &mut written);

        if let Err(err) = document.close() {
            warn!(error = %err, "failed to remove extraction directory");
        }

        match stored {
            Ok(record) => {
                self.index.books.push(record.clone());
                info!(id = %record.id, title = %record.title, "book imported");
                Ok(record)
            }
            Err(err) => {
                for path in &written {
                    if let Err(cleanup) = remove_if_exists(path) {
                        warn!(
                            path = %path.display(),
                            error = %cleanup,
                            "failed to clean up after import"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    /// 写入书籍文件和封面，并保存包含新记录的索引
    ///
    /// 写过的文件路径记录在`written`中，失败时由调用方清理。
    fn store_book(
        &self,
        document: &EpubDocument,
        bytes: &[u8],
        written: &mut Vec<PathBuf>,
    ) -> Result<BookRecord> {
        let id = Uuid::new_v4();
        let file_path = format!("{}/{}.epub", BOOKS_DIR, id);
        written.push(self.root.join(&file_path));
        fs::write(self.root.join(&file_path), bytes)?;

        let cover_file = match document.cover() {
            Some(cover) => {
                let extension = cover.extension().unwrap_or_else(|| "img".to_string());
                let cover_file = format!("{}/{}.cover.{}", BOOKS_DIR, id, extension);
                written.push(self.root.join(&cover_file));
                fs::write(self.root.join(&cover_file), &cover.data)?;
                Some(cover_file)
            }
            None => None,
        };

        let record = BookRecord {
            id,
            title: document.title().to_string(),
            author: document.author().to_string(),
            cover_file,
            file_path,
            date_added: Utc::now(),
            last_read: None,
            current_chapter: 0,
            reading_progress: 0.0,
        };

        let mut books = self.index.books.clone();
        books.push(record.clone());
        self.persist(&books)?;
        Ok(record)
    }

    /// 打开书库中的书籍，并恢复到保存的章节
    pub fn open_book(&self, id: Uuid) -> Result<EpubDocument> {
        let record = self.get(id).ok_or(EpubError::BookNotFound(id))?;
        let mut document = EpubDocument::open(self.book_path(record))?;
        document.restore_position(record.current_chapter);
        Ok(document)
    }

    /// 保存阅读进度，索引写入失败时内存中的记录不变
    pub fn save_progress(&mut self, id: Uuid, document: &EpubDocument) -> Result<()> {
        let position = self.position_of(id)?;
        let reading = document.reading_position();

        let mut books = self.index.books.clone();
        let record = &mut books[position];
        record.current_chapter = reading.chapter_index;
        record.reading_progress = reading.progress;
        record.last_read = Some(Utc::now());

        self.persist(&books)?;
        self.index.books = books;
        Ok(())
    }

    /// 从书库中删除书籍及其文件
    ///
    /// 文件删除和索引写入都成功后才从内存中移除记录。
    pub fn remove(&mut self, id: Uuid) -> Result<BookRecord> {
        let position = self.position_of(id)?;
        let record = &self.index.books[position];

        remove_if_exists(&self.root.join(&record.file_path))?;
        if let Some(cover_file) = &record.cover_file {
            remove_if_exists(&self.root.join(cover_file))?;
        }

        let mut books = self.index.books.clone();
        let record = books.remove(position);
        self.persist(&books)?;
        self.index.books = books;

        info!(id = %record.id, "book removed");
        Ok(record)
    }

    fn position_of(&self, id: Uuid) -> Result<usize> {
        self.index
            .books
            .iter()
            .position(|book| book.id == id)
            .ok_or(EpubError::BookNotFound(id))
    }

    /// 把索引写回`library.yaml`
    fn persist(&self, books: &[BookRecord]) -> Result<()> {
        let yaml = serde_yml::to_string(&IndexFile { books })
            .map_err(|e| EpubError::LibraryError(format!("序列化书库索引失败: {}", e)))?;
        fs::write(self.root.join(INDEX_FILE), yaml)?;
        debug!(books = books.len(), "library index saved");
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
