//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义。

use std::collections::HashMap;

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: Option<String>,
    /// 属性(如nav、cover-image等)
    pub properties: Option<String>,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: String, href: String) -> Self {
        Self {
            id,
            href,
            media_type: None,
            properties: None,
        }
    }

    /// 检查是否包含指定属性
    pub fn has_property(&self, property: &str) -> bool {
        if let Some(properties) = &self.properties {
            properties.split_whitespace().any(|p| p == property)
        } else {
            false
        }
    }

    /// 检查是否为封面图片
    pub fn is_cover_image(&self) -> bool {
        self.has_property("cover-image")
    }
}

/// 清单：按声明顺序保存的清单项，附带按ID的索引
///
/// 重复的ID会覆盖先前条目的内容，但保留其原有位置。
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    index: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入清单项
    pub fn insert(&mut self, item: ManifestItem) {
        match self.index.get(&item.id) {
            Some(&position) => self.items[position] = item,
            None => {
                self.index.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// 根据ID获取清单项
    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    /// 根据ID获取文件路径
    pub fn href(&self, id: &str) -> Option<&str> {
        self.get(id).map(|item| item.href.as_str())
    }

    /// 按声明顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_id_overwrites_in_place() {
        let mut manifest = Manifest::new();
        manifest.insert(ManifestItem::new("a".into(), "a.xhtml".into()));
        manifest.insert(ManifestItem::new("b".into(), "b.xhtml".into()));
        manifest.insert(ManifestItem::new("a".into(), "a2.xhtml".into()));

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.href("a"), Some("a2.xhtml"));
        let order: Vec<&str> = manifest.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_properties() {
        let mut item = ManifestItem::new("img".into(), "images/c.png".into());
        assert!(!item.is_cover_image());

        item.properties = Some("svg cover-image".to_string());
        assert!(item.is_cover_image());
        assert!(item.has_property("svg"));
        assert!(!item.has_property("nav"));
    }
}
