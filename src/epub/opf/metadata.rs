//! 元数据处理模块
//!
//! 保存OPF中的书名、作者和声明的封面ID。

/// 缺少书名时使用的默认值
pub const DEFAULT_TITLE: &str = "Unknown Title";

/// 缺少作者时使用的默认值
pub const DEFAULT_AUTHOR: &str = "Unknown Author";

/// OPF文件中的元数据信息
///
/// 书名和作者都以第一个非空值为准，之后出现的值（无论空与否）不会覆盖。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    title: Option<String>,
    author: Option<String>,
    cover_id: Option<String>,
}

impl PackageMetadata {
    /// 创建新的元数据实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录书名元素的文本
    pub fn record_title(&mut self, text: &str) {
        Self::record_first_non_empty(&mut self.title, text);
    }

    /// 记录作者元素的文本
    pub fn record_author(&mut self, text: &str) {
        Self::record_first_non_empty(&mut self.author, text);
    }

    /// 记录`<meta name="cover" content="..."/>`声明的封面ID
    pub fn record_cover_id(&mut self, id: &str) {
        Self::record_first_non_empty(&mut self.cover_id, id);
    }

    fn record_first_non_empty(slot: &mut Option<String>, text: &str) {
        let content = text.trim();
        if slot.is_none() && !content.is_empty() {
            *slot = Some(content.to_string());
        }
    }

    /// 书名，缺失时为 [`DEFAULT_TITLE`]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// 作者，缺失时为 [`DEFAULT_AUTHOR`]
    pub fn author(&self) -> &str {
        self.author.as_deref().unwrap_or(DEFAULT_AUTHOR)
    }

    /// 元数据中声明的封面清单项ID
    pub fn cover_id(&self) -> Option<&str> {
        self.cover_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let metadata = PackageMetadata::new();
        assert_eq!(metadata.title(), "Unknown Title");
        assert_eq!(metadata.author(), "Unknown Author");
        assert_eq!(metadata.cover_id(), None);
    }

    #[test]
    fn test_first_non_empty_wins() {
        let mut metadata = PackageMetadata::new();
        metadata.record_title("   ");
        metadata.record_title("  Real Title \n");
        metadata.record_title("Second Title");
        metadata.record_title("");

        assert_eq!(metadata.title(), "Real Title");
    }
}
