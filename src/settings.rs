//! 阅读设置模块
//!
//! 保存用户的显示偏好（字体、字号、行高、边距、主题），
//! 支持YAML文件的读写，并生成注入到章节页面中的样式表。

use crate::epub::error::{EpubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// 配置文件头部的说明注释
const CONFIG_HEADER: &str = "# 阅读设置文件\n# 字体、字号、行高、边距和主题，修改后重新打开书籍生效\n\n";

/// 阅读主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Sepia,
    Dark,
    Night,
}

impl Theme {
    /// 全部主题
    pub const ALL: [Theme; 4] = [Theme::Light, Theme::Sepia, Theme::Dark, Theme::Night];

    /// 显示名称
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Sepia => "Sepia",
            Theme::Dark => "Dark",
            Theme::Night => "Night",
        }
    }

    /// 背景色
    pub fn background_hex(&self) -> &'static str {
        match self {
            Theme::Light => "#FFFFFF",
            Theme::Sepia => "#FAF0DC",
            Theme::Dark => "#333333",
            Theme::Night => "#000000",
        }
    }

    /// 文字颜色
    pub fn text_hex(&self) -> &'static str {
        match self {
            Theme::Light => "#000000",
            Theme::Sepia => "#4D3319",
            Theme::Dark => "#FFFFFF",
            Theme::Night => "#E6E6E6",
        }
    }

    /// 是否为深色主题
    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark | Theme::Night)
    }
}

/// 可选字体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Georgia,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    Palatino,
    Baskerville,
    #[serde(rename = "Helvetica Neue")]
    HelveticaNeue,
    #[serde(rename = "San Francisco")]
    SanFrancisco,
    Avenir,
    Charter,
}

impl FontFamily {
    /// 全部可选字体，按菜单顺序
    pub const ALL: [FontFamily; 8] = [
        FontFamily::Georgia,
        FontFamily::TimesNewRoman,
        FontFamily::Palatino,
        FontFamily::Baskerville,
        FontFamily::HelveticaNeue,
        FontFamily::SanFrancisco,
        FontFamily::Avenir,
        FontFamily::Charter,
    ];

    /// CSS中使用的字体名
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Georgia => "Georgia",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::Palatino => "Palatino",
            FontFamily::Baskerville => "Baskerville",
            FontFamily::HelveticaNeue => "Helvetica Neue",
            FontFamily::SanFrancisco => "San Francisco",
            FontFamily::Avenir => "Avenir",
            FontFamily::Charter => "Charter",
        }
    }
}

/// 阅读设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub font_family: FontFamily,
    /// 字号(px)
    pub font_size: f64,
    pub line_height: f64,
    /// 页面边距(px)
    pub margin: f64,
    /// 亮度，1.0为原始亮度
    pub brightness: f64,
    pub theme: Theme,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            font_family: FontFamily::Georgia,
            font_size: 18.0,
            line_height: 1.6,
            margin: 20.0,
            brightness: 1.0,
            theme: Theme::Light,
        }
    }
}

impl ReaderSettings {
    pub const FONT_SIZE_RANGE: (f64, f64) = (10.0, 40.0);
    pub const LINE_HEIGHT_RANGE: (f64, f64) = (1.0, 3.0);
    pub const MARGIN_RANGE: (f64, f64) = (0.0, 80.0);
    pub const BRIGHTNESS_RANGE: (f64, f64) = (0.1, 1.0);

    /// 从YAML文件加载设置
    ///
    /// 文件不存在时返回默认设置，超出范围的数值会被限制到允许范围内。
    ///
    /// # 参数
    /// * `path` - 设置文件路径
    ///
    /// # 返回值
    /// * `Result<Self>` - 文件无法读取或格式错误时返回`ConfigError`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "settings file not found; using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// 从YAML字符串解析设置
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Self = serde_yml::from_str(content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))?;
        Ok(settings.clamped())
    }

    /// 保存设置到YAML文件，必要时创建父目录
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml_content = serde_yml::to_string(self)
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| EpubError::ConfigError(format!("创建配置目录失败: {}", e)))?;
        }
        fs::write(path, format!("{}{}", CONFIG_HEADER, yaml_content))
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// 把各数值限制到允许范围内
    pub fn clamped(mut self) -> Self {
        self.font_size = clamp_or_default(self.font_size, Self::FONT_SIZE_RANGE, 18.0);
        self.line_height = clamp_or_default(self.line_height, Self::LINE_HEIGHT_RANGE, 1.6);
        self.margin = clamp_or_default(self.margin, Self::MARGIN_RANGE, 20.0);
        self.brightness = clamp_or_default(self.brightness, Self::BRIGHTNESS_RANGE, 1.0);
        self
    }

    /// 生成注入到章节页面的样式表
    pub fn stylesheet(&self) -> String {
        let font = self.font_family.name();
        let size = self.font_size;
        let text = self.theme.text_hex();
        let background = self.theme.background_hex();
        let line_height = css_number(self.line_height);
        let margin = css_number(self.margin);
        let heading = |scale: f64| css_number(size * scale);

        format!(
            r#"* {{
    -webkit-touch-callout: none;
    -webkit-user-select: none;
    user-select: none;
}}

html, body {{
    font-family: '{font}', serif !important;
    font-size: {size}px !important;
    line-height: {line_height} !important;
    color: {text} !important;
    background-color: {background} !important;
    margin: 0 !important;
    padding: {margin}px !important;
    text-align: justify !important;
    -webkit-text-size-adjust: none !important;
}}

body {{
    max-width: 100% !important;
    overflow-x: hidden !important;
}}

p, div, span, li, td, th {{
    font-family: '{font}', serif !important;
    font-size: {size}px !important;
    line-height: {line_height} !important;
    color: {text} !important;
    text-align: justify !important;
}}

h1, h2, h3, h4, h5, h6 {{
    font-family: '{font}', serif !important;
    color: {text} !important;
    font-weight: bold !important;
    margin-top: 1.5em !important;
    margin-bottom: 0.5em !important;
}}

h1 {{ font-size: {h1}px !important; }}
h2 {{ font-size: {h2}px !important; }}
h3 {{ font-size: {h3}px !important; }}
h4 {{ font-size: {h4}px !important; }}
h5 {{ font-size: {h5}px !important; }}
h6 {{ font-size: {size}px !important; }}

a {{
    color: {text} !important;
    text-decoration: underline !important;
}}

img {{
    max-width: 100% !important;
    height: auto !important;
    display: block !important;
    margin: 1em auto !important;
}}

blockquote {{
    margin: 1em 0 !important;
    padding: 0 2em !important;
    border-left: 3px solid {text} !important;
    font-style: italic !important;
}}

code, pre {{
    font-family: 'Menlo', 'Monaco', monospace !important;
    background-color: rgba(128, 128, 128, 0.1) !important;
    padding: 0.2em 0.4em !important;
    border-radius: 3px !important;
}}

table {{
    width: 100% !important;
    border-collapse: collapse !important;
    margin: 1em 0 !important;
}}

th, td {{
    border: 1px solid {text} !important;
    padding: 0.5em !important;
}}
"#,
            size = css_number(size),
            h1 = heading(1.8),
            h2 = heading(1.6),
            h3 = heading(1.4),
            h4 = heading(1.2),
            h5 = heading(1.1),
        )
    }
}

fn clamp_or_default(value: f64, (min, max): (f64, f64), default: f64) -> f64 {
    if value.is_nan() {
        default
    } else {
        value.clamp(min, max)
    }
}

/// CSS数值：最多两位小数，去掉多余的零
fn css_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::error::ErrorKind;
    use rstest::rstest;

    #[test]
    fn test_default_stylesheet() {
        let css = ReaderSettings::default().stylesheet();

        assert!(css.contains("font-family: 'Georgia', serif !important;"));
        assert!(css.contains("font-size: 18px !important;"));
        assert!(css.contains("line-height: 1.6 !important;"));
        assert!(css.contains("padding: 20px !important;"));
        assert!(css.contains("background-color: #FFFFFF !important;"));
        assert!(css.contains("color: #000000 !important;"));
        assert!(css.contains("h1 { font-size: 32.4px !important; }"));
        assert!(css.contains("h5 { font-size: 19.8px !important; }"));
        assert!(css.contains("h6 { font-size: 18px !important; }"));
    }

    #[rstest]
    #[case(Theme::Light, "#FFFFFF", "#000000")]
    #[case(Theme::Sepia, "#FAF0DC", "#4D3319")]
    #[case(Theme::Dark, "#333333", "#FFFFFF")]
    #[case(Theme::Night, "#000000", "#E6E6E6")]
    fn test_theme_colors_in_stylesheet(
        #[case] theme: Theme,
        #[case] background: &str,
        #[case] text: &str,
    ) {
        let settings = ReaderSettings {
            theme,
            ..ReaderSettings::default()
        };
        let css = settings.stylesheet();

        assert!(css.contains(&format!("background-color: {} !important;", background)));
        assert!(css.contains(&format!("border-left: 3px solid {} !important;", text)));
    }

    #[test]
    fn test_font_family_names() {
        let settings = ReaderSettings {
            font_family: FontFamily::TimesNewRoman,
            font_size: 20.0,
            ..ReaderSettings::default()
        };
        let css = settings.stylesheet();

        assert!(css.contains("font-family: 'Times New Roman', serif !important;"));
        assert!(css.contains("h1 { font-size: 36px !important; }"));
        assert_eq!(FontFamily::ALL.len(), 8);
        assert_eq!(FontFamily::ALL[0], FontFamily::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config/settings.yaml");
        let settings = ReaderSettings {
            font_family: FontFamily::HelveticaNeue,
            font_size: 22.0,
            line_height: 1.8,
            margin: 12.0,
            brightness: 0.7,
            theme: Theme::Sepia,
        };

        settings.save(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# 阅读设置文件"));
        assert!(content.contains("Helvetica Neue"));
        assert!(content.contains("sepia"));

        assert_eq!(ReaderSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ReaderSettings::load(dir.path().join("none.yaml")).unwrap();
        assert_eq!(settings, ReaderSettings::default());
    }

    #[test]
    fn test_partial_yaml_and_clamping() {
        let settings =
            ReaderSettings::from_yaml("font_size: 99\ntheme: night\nbrightness: 0\n").unwrap();

        assert_eq!(settings.font_size, 40.0);
        assert_eq!(settings.brightness, 0.1);
        assert_eq!(settings.theme, Theme::Night);
        assert!(settings.theme.is_dark());
        assert_eq!(settings.line_height, 1.6);
        assert_eq!(settings.font_family, FontFamily::Georgia);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ReaderSettings::from_yaml("theme: [not, a, theme]").unwrap_err();
        assert!(matches!(err, EpubError::ConfigError(_)));
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
