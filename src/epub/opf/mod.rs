//! OPF（Open Packaging Format）文件解析模块
//!
//! 此模块提供EPUB文件中OPF包文件的解析功能，包括清单、脊柱和书名作者信息的提取。

mod manifest;
mod metadata;
mod parser;
mod spine;

// 重新导出公共类型
pub use manifest::{Manifest, ManifestItem};
pub use metadata::{DEFAULT_AUTHOR, DEFAULT_TITLE, PackageMetadata};
pub use parser::Package;
pub use spine::SpineItem;
